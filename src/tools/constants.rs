//! 常量和默认配置集中管理
//!
//! 将所有重要常量集中定义，避免"默认值漂移"和重复定义

/// 默认配置值
pub mod defaults {
    /// 默认采样率（Hz）
    pub const SAMPLE_RATE: u32 = 44_100;

    /// 默认声道数
    pub const CHANNELS: u16 = 2;

    /// 默认位深
    pub const BITS_PER_SAMPLE: u16 = 16;

    /// 音频流默认缓冲区大小（样本数）
    ///
    /// `AudioStream::process` 每轮读取、变换、写出的样本上限
    pub const STREAM_BUFFER_SAMPLES: usize = 4096;

    /// 帧管道每次读取的音频帧预算
    pub const FRAMES_PER_CHUNK: usize = 1024;

    /// 喂入线程每次写入解码器stdin的字节数
    pub const FEED_CHUNK_BYTES: usize = 64 * 1024;

    /// 默认外部解码程序
    pub const FFMPEG_PROGRAM: &str = "ffmpeg";
}

/// 帧管道时序限制
pub mod pipeline_limits {
    use std::time::Duration;

    /// 头部读取失败后等待解码进程退出的宽限期
    ///
    /// 进程在宽限期内失败退出时报告外部进程错误，否则报告分帧错误
    pub const HEADER_EXIT_GRACE: Duration = Duration::from_millis(200);

    /// 带时限等待进程退出时的轮询间隔
    pub const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(5);
}

/// WAV容器限制
pub mod wav_limits {
    /// 读取流式头部时单个非音频块允许跳过的最大字节数
    pub const MAX_SKIPPED_CHUNK: u32 = 1 << 20;
}
