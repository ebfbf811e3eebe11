//! 音频模块
//!
//! - `format` / `codec`：PCM参数与样本编解码
//! - `buffer` / `wav`：样本缓冲区与WAV容器
//! - `stream`：基于字节流的增量样本读写
//! - `decoder` / `pipeline`：外部解码进程与帧对齐输出管道

pub mod buffer;
pub mod codec;
pub mod decoder;
pub mod format;
pub mod pipeline;
pub mod stream;
pub mod wav;

pub use buffer::SampleBuffer;
pub use codec::{decode_pcm, encode_pcm};
pub use decoder::{DecodeProcess, DecoderIo, ExitReport, FfmpegDecoder, InputFormat, ProcessHandle};
pub use format::{BitDepth, PcmParams};
pub use pipeline::{Frame, FramePipeline, FrameSequence, FrameStream, PipelineConfig};
pub use stream::{AudioStream, StreamConfig};
pub use wav::{WavHeader, WavStreamWriter};
