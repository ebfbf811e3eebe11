//! pcmkit - PCM音频编解码与外部解码管道
//!
//! 以交错 `f64` 样本为核心表示，提供：
//!
//! ## 核心特性
//! - 8/16/24/32位线性PCM样本编解码（8位无符号，其余有符号小端）
//! - 规范44字节WAV容器的构建、解析与流式写入
//! - 基于任意字节流的增量样本读写与变换
//! - 驱动外部解码进程（默认ffmpeg）输出帧对齐的PCM字节组
//!
//! ```no_run
//! use pcmkit::{FfmpegDecoder, FramePipeline, PcmParams};
//!
//! # fn main() -> pcmkit::AudioResult<()> {
//! let params = PcmParams::new(48_000, 2, 16)?;
//! let input = std::fs::read("song.ogg")?;
//! let frames = FramePipeline::new(FfmpegDecoder::default()).process(&input, params)?;
//! frames.write_wav_file("song.wav")?;
//! # Ok(())
//! # }
//! ```

pub mod audio;
pub mod error;
pub mod tools;

// 重新导出核心类型
pub use audio::{
    AudioStream, BitDepth, FfmpegDecoder, Frame, FramePipeline, FrameSequence, PcmParams,
    PipelineConfig, SampleBuffer, StreamConfig, WavHeader,
};
pub use error::{AudioError, AudioResult, ErrorCategory};
