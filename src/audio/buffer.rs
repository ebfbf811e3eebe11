//! 样本缓冲区
//!
//! 已物化的交错f64样本序列及其PCM参数。长度可以为0，从不隐式填充。

use super::format::PcmParams;
use crate::error::{AudioError, AudioResult};
use std::time::Duration;

/// 交错样本缓冲区
///
/// 对于N声道，样本索引 `i` 属于声道 `i % N`。
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    params: PcmParams,
    samples: Vec<f64>,
}

impl SampleBuffer {
    pub fn new(samples: Vec<f64>, params: PcmParams) -> Self {
        Self { params, samples }
    }

    /// 创建空缓冲区
    pub fn empty(params: PcmParams) -> Self {
        Self::new(Vec::new(), params)
    }

    pub fn params(&self) -> PcmParams {
        self.params
    }

    /// 获取交错排列的样本数据
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f64] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 完整帧数（尾部不完整的帧不计入）
    pub fn frame_count(&self) -> usize {
        self.samples.len() / self.params.channels() as usize
    }

    pub fn duration(&self) -> Duration {
        self.params.duration_of_samples(self.samples.len())
    }

    /// 指定声道的样本迭代器
    ///
    /// 声道号越界时返回空迭代器。
    pub fn channel(&self, channel: u16) -> impl Iterator<Item = f64> + '_ {
        let stride = self.params.channels() as usize;
        let start = if channel < self.params.channels() {
            channel as usize
        } else {
            self.samples.len()
        };
        self.samples.iter().skip(start).step_by(stride).copied()
    }

    /// 按时间区间切片
    ///
    /// 边界按帧对齐向下取整；要求 `start < end <= duration()`。
    pub fn slice(&self, start: Duration, end: Duration) -> AudioResult<SampleBuffer> {
        if start >= end || end > self.duration() {
            return Err(AudioError::InvalidConfig(format!(
                "invalid slice range / 无效的切片区间: {start:?}..{end:?} (duration {:?})",
                self.duration()
            )));
        }

        let first = self.params.samples_in(start);
        let last = self.params.samples_in(end).min(self.samples.len());
        Ok(Self::new(self.samples[first..last].to_vec(), self.params))
    }
}
