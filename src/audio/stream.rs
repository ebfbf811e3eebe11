//! 音频流
//!
//! 字节级读写源之上的样本级读写与逐块推送式处理管道。
//! 流在构造时校验参数与读写端，之后每次调用都检查对应能力。

use super::buffer::SampleBuffer;
use super::codec;
use super::format::PcmParams;
use crate::error::{self, AudioError, AudioResult};
use crate::tools::constants::defaults;
use std::io::{self, Read, Write};

/// 音频流配置（原始数值，构造时校验）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    /// 内部缓冲区容量（样本数）
    pub buffer_size: usize,
}

impl StreamConfig {
    pub fn new(sample_rate: u32, channels: u16, bits_per_sample: u16, buffer_size: usize) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
            buffer_size,
        }
    }

    /// 由已校验的PCM参数创建
    pub fn from_params(params: PcmParams, buffer_size: usize) -> Self {
        Self::new(
            params.sample_rate(),
            params.channels(),
            params.bit_depth().bits(),
            buffer_size,
        )
    }

    /// 校验全部参数，返回PCM参数
    pub fn validate(&self) -> AudioResult<PcmParams> {
        if self.buffer_size == 0 {
            return Err(error::config_error("buffer size / 缓冲区大小", "must be positive"));
        }
        PcmParams::new(self.sample_rate, self.channels, self.bits_per_sample)
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self::new(
            defaults::SAMPLE_RATE,
            defaults::CHANNELS,
            defaults::BITS_PER_SAMPLE,
            defaults::STREAM_BUFFER_SAMPLES,
        )
    }
}

/// 音频流
///
/// 只读、只写或双工，取决于构造时提供的端点。
pub struct AudioStream<'a> {
    params: PcmParams,
    reader: Option<Box<dyn Read + 'a>>,
    writer: Option<Box<dyn Write + 'a>>,
    /// 逐块处理用的样本缓冲区（容量即buffer_size）
    buffer: Vec<f64>,
    /// 上次读取遗留的不完整样本字节（少于一个样本）
    pending: Vec<u8>,
    read_buf: Vec<u8>,
    write_buf: Vec<u8>,
}

impl<'a> AudioStream<'a> {
    /// 创建音频流
    ///
    /// # 错误
    ///
    /// * `AudioError::InvalidConfig` - 读写端都缺失，或任一参数非正
    /// * `AudioError::UnsupportedFormat` - 位深度不受支持
    pub fn new(
        reader: Option<Box<dyn Read + 'a>>,
        writer: Option<Box<dyn Write + 'a>>,
        config: StreamConfig,
    ) -> AudioResult<Self> {
        if reader.is_none() && writer.is_none() {
            return Err(error::config_error(
                "stream endpoints / 流端点",
                "at least one of reader or writer must be provided",
            ));
        }
        let params = config.validate()?;

        Ok(Self {
            params,
            reader,
            writer,
            buffer: vec![0.0; config.buffer_size],
            pending: Vec::new(),
            read_buf: Vec::new(),
            write_buf: Vec::new(),
        })
    }

    /// 只读流
    pub fn reader<R: Read + 'a>(reader: R, config: StreamConfig) -> AudioResult<Self> {
        Self::new(Some(Box::new(reader)), None, config)
    }

    /// 只写流
    pub fn writer<W: Write + 'a>(writer: W, config: StreamConfig) -> AudioResult<Self> {
        Self::new(None, Some(Box::new(writer)), config)
    }

    /// 双工流
    pub fn duplex<R: Read + 'a, W: Write + 'a>(
        reader: R,
        writer: W,
        config: StreamConfig,
    ) -> AudioResult<Self> {
        Self::new(Some(Box::new(reader)), Some(Box::new(writer)), config)
    }

    /// 创建只写流并立即写出整个样本缓冲区
    pub fn from_sample_buffer<W: Write + 'a>(
        buffer: &SampleBuffer,
        writer: W,
        buffer_size: usize,
    ) -> AudioResult<Self> {
        let config = StreamConfig::from_params(buffer.params(), buffer_size);
        let mut stream = Self::writer(writer, config)?;
        stream.write(buffer.samples())?;
        stream.flush()?;
        Ok(stream)
    }

    pub fn params(&self) -> PcmParams {
        self.params
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_readable(&self) -> bool {
        self.reader.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.writer.is_some()
    }

    /// 读取样本到 `out`
    ///
    /// 单次读取可能少于请求量；返回实际解码的样本数。
    /// `out` 非空时返回 `Ok(0)` 表示输入已结束。
    /// 跨读取边界的半个样本会保留到下一次读取；
    /// 输入结束时仍有不完整样本字节则为分帧错误。
    pub fn read(&mut self, out: &mut [f64]) -> AudioResult<usize> {
        let Self {
            params,
            reader,
            pending,
            read_buf,
            ..
        } = self;
        let reader = reader.as_mut().ok_or_else(|| {
            AudioError::Capability("stream is not readable / 流不可读".to_string())
        })?;
        if out.is_empty() {
            return Ok(0);
        }

        let bytes_per_sample = params.bytes_per_sample();
        let wanted = out.len() * bytes_per_sample;

        read_buf.clear();
        read_buf.extend_from_slice(pending);
        pending.clear();
        let mut filled = read_buf.len();
        read_buf.resize(wanted.max(filled), 0);

        while filled < bytes_per_sample {
            match reader.read(&mut read_buf[filled..]) {
                Ok(0) => {
                    if filled > 0 {
                        return Err(error::framing_error(
                            "trailing partial sample / 输入末尾存在不完整样本",
                            format!("{filled} of {bytes_per_sample} bytes"),
                        ));
                    }
                    return Ok(0);
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        let aligned = filled - filled % bytes_per_sample;
        let decoded = codec::decode_into(&read_buf[..aligned], params.bit_depth(), out);
        pending.extend_from_slice(&read_buf[aligned..filled]);
        Ok(decoded)
    }

    /// 写入样本：钳位、编码后一次性写入底层写入器
    ///
    /// 返回写入的样本数（字节数 / 每样本字节数）。
    pub fn write(&mut self, samples: &[f64]) -> AudioResult<usize> {
        let Self {
            params,
            writer,
            write_buf,
            ..
        } = self;
        let writer = writer.as_mut().ok_or_else(|| {
            AudioError::Capability("stream is not writable / 流不可写".to_string())
        })?;

        write_buf.clear();
        codec::encode_into(samples, params.bit_depth(), write_buf);
        writer.write_all(write_buf)?;
        Ok(write_buf.len() / params.bytes_per_sample())
    }

    /// 刷新写入端
    pub fn flush(&mut self) -> AudioResult<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            AudioError::Capability("stream is not writable / 流不可写".to_string())
        })?;
        writer.flush()?;
        Ok(())
    }

    /// 逐块处理整个输入
    ///
    /// 每次读取至多 `buffer_size` 个样本，原地调用 `transform`；
    /// 若配置了写入端，则在请求下一块之前立即编码写出该块。
    /// `transform` 出错会中止循环并原样返回。返回处理的样本总数。
    pub fn process<F>(&mut self, mut transform: F) -> AudioResult<u64>
    where
        F: FnMut(&mut [f64]) -> AudioResult<()>,
    {
        if self.reader.is_none() {
            return Err(AudioError::Capability(
                "stream is not readable / 流不可读".to_string(),
            ));
        }

        let mut chunk = std::mem::take(&mut self.buffer);
        let result = self.process_chunks(&mut chunk, &mut transform);
        self.buffer = chunk;
        result
    }

    fn process_chunks<F>(&mut self, chunk: &mut [f64], transform: &mut F) -> AudioResult<u64>
    where
        F: FnMut(&mut [f64]) -> AudioResult<()>,
    {
        let mut total = 0u64;
        loop {
            let n = self.read(chunk)?;
            if n == 0 {
                break;
            }
            transform(&mut chunk[..n])?;
            if self.writer.is_some() {
                self.write(&chunk[..n])?;
            }
            total += n as u64;
        }

        if self.writer.is_some() {
            self.flush()?;
        }
        tracing::debug!(samples = total, "stream processing finished");
        Ok(total)
    }

    /// 读取全部剩余输入到一个样本缓冲区（按到达顺序拼接）
    pub fn to_sample_buffer(&mut self) -> AudioResult<SampleBuffer> {
        let mut chunk = vec![0.0; self.buffer.len()];
        let mut samples = Vec::new();
        loop {
            let n = self.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            samples.extend_from_slice(&chunk[..n]);
        }
        Ok(SampleBuffer::new(samples, self.params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::format::BitDepth;

    /// 每次最多返回一个字节的读取器，用于模拟短读
    struct TrickleReader<'a> {
        data: &'a [u8],
    }

    impl Read for TrickleReader<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.data.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[0];
            self.data = &self.data[1..];
            Ok(1)
        }
    }

    fn config(bits: u16, buffer_size: usize) -> StreamConfig {
        StreamConfig::new(16000, 1, bits, buffer_size)
    }

    #[test]
    fn test_construction_validation() {
        let data: &[u8] = &[];
        assert!(matches!(
            AudioStream::new(None, None, config(16, 64)),
            Err(AudioError::InvalidConfig(_))
        ));
        assert!(matches!(
            AudioStream::reader(data, StreamConfig::new(0, 1, 16, 64)),
            Err(AudioError::InvalidConfig(_))
        ));
        assert!(matches!(
            AudioStream::reader(data, StreamConfig::new(16000, 0, 16, 64)),
            Err(AudioError::InvalidConfig(_))
        ));
        assert!(matches!(
            AudioStream::reader(data, config(16, 0)),
            Err(AudioError::InvalidConfig(_))
        ));
        assert!(matches!(
            AudioStream::reader(data, config(0, 64)),
            Err(AudioError::UnsupportedFormat(_))
        ));
        assert!(AudioStream::reader(data, config(16, 64)).is_ok());
    }

    #[test]
    fn test_capability_checks() {
        let data: &[u8] = &[0, 0];
        let mut read_only = AudioStream::reader(data, config(16, 8)).unwrap();
        assert!(matches!(
            read_only.write(&[0.0]),
            Err(AudioError::Capability(_))
        ));
        assert!(matches!(read_only.flush(), Err(AudioError::Capability(_))));

        let mut sink = Vec::new();
        let mut write_only = AudioStream::writer(&mut sink, config(16, 8)).unwrap();
        let mut out = [0.0; 4];
        assert!(matches!(
            write_only.read(&mut out),
            Err(AudioError::Capability(_))
        ));
        assert!(matches!(
            write_only.process(|_| Ok(())),
            Err(AudioError::Capability(_))
        ));
        assert!(matches!(
            write_only.to_sample_buffer(),
            Err(AudioError::Capability(_))
        ));
    }

    #[test]
    fn test_write_clamps_and_counts() {
        let mut sink = Vec::new();
        {
            let mut stream = AudioStream::writer(&mut sink, config(16, 8)).unwrap();
            assert_eq!(stream.write(&[0.0, 2.0, -2.0]).unwrap(), 3);
        }
        assert_eq!(sink, vec![0x00, 0x00, 0xFF, 0x7F, 0x01, 0x80]);
    }

    #[test]
    fn test_short_reads_keep_partial_samples() {
        let bytes = codec::encode_samples(&[0.25, -0.5, 0.75], BitDepth::S24);
        let mut stream = AudioStream::reader(TrickleReader { data: &bytes }, config(24, 8)).unwrap();

        let buffer = stream.to_sample_buffer().unwrap();
        assert_eq!(buffer.len(), 3);
        assert!((buffer.samples()[1] + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_trailing_partial_sample_is_framing_error() {
        let data: &[u8] = &[0x00, 0x40, 0x12];
        let mut stream = AudioStream::reader(data, config(16, 8)).unwrap();
        let mut out = [0.0; 8];
        assert_eq!(stream.read(&mut out).unwrap(), 1);
        assert!(matches!(stream.read(&mut out), Err(AudioError::Framing(_))));
    }

    #[test]
    fn test_process_transforms_and_forwards_each_chunk() {
        let input = codec::encode_samples(&[0.1, 0.2, 0.3, 0.4, 0.5], BitDepth::S16);
        let mut sink = Vec::new();
        let mut chunk_sizes = Vec::new();
        {
            let mut stream =
                AudioStream::duplex(input.as_slice(), &mut sink, config(16, 2)).unwrap();
            let total = stream
                .process(|chunk| {
                    chunk_sizes.push(chunk.len());
                    chunk.iter_mut().for_each(|s| *s = -*s);
                    Ok(())
                })
                .unwrap();
            assert_eq!(total, 5);
        }
        assert_eq!(chunk_sizes, vec![2, 2, 1]);

        let out = codec::decode_samples(&sink, BitDepth::S16);
        assert_eq!(out.len(), 5);
        assert!((out[4] + 0.5).abs() < 1.0 / 32767.0);
    }

    #[test]
    fn test_process_surfaces_transform_error() {
        let input = vec![0u8; 32];
        let mut calls = 0;
        let mut stream = AudioStream::reader(input.as_slice(), config(16, 4)).unwrap();
        let result = stream.process(|_| {
            calls += 1;
            Err(AudioError::InvalidConfig("stop".to_string()))
        });
        assert!(matches!(result, Err(AudioError::InvalidConfig(_))));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_from_sample_buffer_writes_everything() {
        let params = PcmParams::new(8000, 2, 8).unwrap();
        let buffer = SampleBuffer::new(vec![0.0, 1.0, -1.0, 0.0], params);
        let mut sink = Vec::new();
        {
            let stream = AudioStream::from_sample_buffer(&buffer, &mut sink, 16).unwrap();
            assert!(!stream.is_readable());
            assert!(stream.is_writable());
        }
        assert_eq!(sink, vec![128, 255, 1, 128]);
    }
}
