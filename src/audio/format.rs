//! PCM参数模块
//!
//! 定义位深度与不可变的PCM参数三元组 {采样率, 声道数, 位深度}。
//! 所有参数在构造时完成校验，之后在整个库中都可视为合法。

use crate::error::{self, AudioError, AudioResult};
use serde::Serialize;
use std::time::Duration;

/// 支持的PCM位深度
///
/// 8位为无符号存储（偏移128），16/24/32位为小端序有符号补码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "u16")]
pub enum BitDepth {
    /// 8位无符号 [0, 255]，128为零点
    U8,
    /// 16位有符号 [-32768, 32767]
    S16,
    /// 24位有符号 [-8388608, 8388607]，3字节打包
    S24,
    /// 32位有符号 [-2147483648, 2147483647]
    S32,
}

impl BitDepth {
    /// 所有支持的位深度
    pub const ALL: [BitDepth; 4] = [BitDepth::U8, BitDepth::S16, BitDepth::S24, BitDepth::S32];

    /// 位数
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::U8 => 8,
            BitDepth::S16 => 16,
            BitDepth::S24 => 24,
            BitDepth::S32 => 32,
        }
    }

    /// 每样本字节数
    pub fn bytes_per_sample(self) -> usize {
        (self.bits() / 8) as usize
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = AudioError;

    fn try_from(bits: u16) -> AudioResult<Self> {
        match bits {
            8 => Ok(BitDepth::U8),
            16 => Ok(BitDepth::S16),
            24 => Ok(BitDepth::S24),
            32 => Ok(BitDepth::S32),
            other => Err(AudioError::UnsupportedFormat(format!(
                "unsupported bit depth / 不支持的位深度: {other}（仅支持 8/16/24/32）"
            ))),
        }
    }
}

impl From<BitDepth> for u16 {
    fn from(depth: BitDepth) -> u16 {
        depth.bits()
    }
}

/// PCM参数
///
/// 构造后不可变；字段私有以保证 `sample_rate > 0`、`channels > 0`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PcmParams {
    sample_rate: u32,
    channels: u16,
    bit_depth: BitDepth,
}

impl PcmParams {
    /// 创建并校验PCM参数
    ///
    /// # 错误
    ///
    /// * `AudioError::InvalidConfig` - 采样率或声道数为0
    /// * `AudioError::UnsupportedFormat` - 位深度不在 {8,16,24,32} 中
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16) -> AudioResult<Self> {
        if sample_rate == 0 {
            return Err(error::config_error("sample rate / 采样率", "must be positive"));
        }
        if channels == 0 {
            return Err(error::config_error("channels / 声道数", "must be positive"));
        }
        let bit_depth = BitDepth::try_from(bits_per_sample)?;

        Ok(Self {
            sample_rate,
            channels,
            bit_depth,
        })
    }

    /// 使用已校验的位深度创建
    pub fn with_depth(sample_rate: u32, channels: u16, bit_depth: BitDepth) -> AudioResult<Self> {
        Self::new(sample_rate, channels, bit_depth.bits())
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.bit_depth
    }

    /// 获取每样本的字节数
    pub fn bytes_per_sample(&self) -> usize {
        self.bit_depth.bytes_per_sample()
    }

    /// 一个完整音频帧（所有声道各一个样本）的字节数，即WAV的block align
    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * self.bytes_per_sample()
    }

    /// 每秒字节数：采样率 × 声道数 × 位深/8
    pub fn byte_rate(&self) -> u64 {
        self.sample_rate as u64 * self.bytes_per_frame() as u64
    }

    /// 交错样本数对应的时长
    pub fn duration_of_samples(&self, sample_count: usize) -> Duration {
        let per_second = self.sample_rate as f64 * self.channels as f64;
        Duration::from_secs_f64(sample_count as f64 / per_second)
    }

    /// 时长对应的交错样本数（向下取整到完整帧）
    pub fn samples_in(&self, duration: Duration) -> usize {
        let frames = (duration.as_secs_f64() * self.sample_rate as f64) as usize;
        frames * self.channels as usize
    }
}
