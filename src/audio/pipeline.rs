//! 解码帧管道
//!
//! 驱动外部解码进程，把它的WAV输出切分为帧对齐的字节组。
//!
//! ## 并发模型
//!
//! - **喂入线程**：独立线程把输入分块写入解码器stdin，写完即关闭
//! - **排空循环**：调用方线程在 `FrameStream::next()` 中阻塞读取stdout
//! - 两者只在进程退出时汇合，因此解码器输出缓冲再小也不会互相等待而死锁
//!
//! ## 帧对齐
//!
//! 每次读取的预算为 `frames_per_chunk × bytes_per_frame`；只有帧对齐的前缀成为帧，
//! 不足一帧的余量结转到下一次读取。输出结束时仍有余量即为分帧错误。
//!
//! 任何致命错误都会先终止解码进程再返回。

use super::buffer::SampleBuffer;
use super::codec;
use super::decoder::{DecodeProcess, ExitReport, ProcessHandle};
use super::format::PcmParams;
use super::wav::{self, StreamHeader};
use crate::error::{self, AudioError, AudioResult};
use crate::tools::constants::{defaults, pipeline_limits};
use std::io::{self, Cursor, Read, Write};
use std::path::Path;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// 不可变的帧对齐PCM字节组
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Box<[u8]>,
}

impl Frame {
    fn new(bytes: &[u8]) -> Self {
        Self {
            data: bytes.into(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 交错样本数
    pub fn sample_count(&self, params: PcmParams) -> usize {
        self.data.len() / params.bytes_per_sample()
    }

    /// 音频帧数（每帧含所有声道）
    pub fn frame_count(&self, params: PcmParams) -> usize {
        self.data.len() / params.bytes_per_frame()
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

/// 按产生顺序排列的帧序列
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSequence {
    params: PcmParams,
    frames: Vec<Frame>,
}

impl FrameSequence {
    pub fn new(params: PcmParams, frames: Vec<Frame>) -> Self {
        Self { params, frames }
    }

    pub fn params(&self) -> PcmParams {
        self.params
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    /// 所有帧的字节总数
    pub fn total_bytes(&self) -> usize {
        self.frames.iter().map(Frame::len).sum()
    }

    /// 交错样本总数
    pub fn sample_count(&self) -> usize {
        self.total_bytes() / self.params.bytes_per_sample()
    }

    /// 拼接全部帧的原始字节
    pub fn concat(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.total_bytes());
        for frame in &self.frames {
            bytes.extend_from_slice(frame.as_bytes());
        }
        bytes
    }

    /// 解码全部帧为样本缓冲区
    pub fn to_sample_buffer(&self) -> SampleBuffer {
        let mut samples = Vec::with_capacity(self.sample_count());
        for frame in &self.frames {
            samples.extend(codec::decode_samples(
                frame.as_bytes(),
                self.params.bit_depth(),
            ));
        }
        SampleBuffer::new(samples, self.params)
    }

    /// 写出为WAV：头部data大小等于所有帧长度之和
    pub fn write_wav<W: Write>(&self, writer: &mut W) -> AudioResult<()> {
        wav::write_wav(writer, self.params, &self.frames)
    }

    /// 写出为WAV文件，返回文件字节数
    pub fn write_wav_file<P: AsRef<Path>>(&self, path: P) -> AudioResult<u64> {
        wav::write_wav_file(path, self.params, &self.frames)
    }
}

impl IntoIterator for FrameSequence {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

impl<'a> IntoIterator for &'a FrameSequence {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

/// 管道配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// 每次读取的音频帧预算
    pub frames_per_chunk: usize,
    /// 喂入线程每次写入stdin的字节数
    pub write_chunk_size: usize,
    /// 整体时限；读取前与等待退出时检查，头部读取失败后也检查。
    /// 无法打断正在阻塞的读取
    pub timeout: Option<Duration>,
}

impl PipelineConfig {
    pub fn validate(&self) -> AudioResult<()> {
        if self.frames_per_chunk == 0 {
            return Err(error::config_error(
                "frames per chunk / 每块帧数",
                "must be positive",
            ));
        }
        if self.write_chunk_size == 0 {
            return Err(error::config_error(
                "write chunk size / 写入块大小",
                "must be positive",
            ));
        }
        Ok(())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            frames_per_chunk: defaults::FRAMES_PER_CHUNK,
            write_chunk_size: defaults::FEED_CHUNK_BYTES,
            timeout: None,
        }
    }
}

/// 解码帧管道
pub struct FramePipeline<D: DecodeProcess> {
    decoder: D,
    config: PipelineConfig,
}

impl<D: DecodeProcess> FramePipeline<D> {
    pub fn new(decoder: D) -> Self {
        Self::with_config(decoder, PipelineConfig::default())
    }

    pub fn with_config(decoder: D, config: PipelineConfig) -> Self {
        Self { decoder, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// 解码整个输入，收集全部帧
    pub fn process(&self, input: &[u8], params: PcmParams) -> AudioResult<FrameSequence> {
        let stream = self.stream(Cursor::new(input.to_vec()), params)?;
        let frames = stream.collect::<AudioResult<Vec<Frame>>>()?;
        Ok(FrameSequence::new(params, frames))
    }

    /// 启动解码进程并返回增量帧迭代器
    ///
    /// 返回前已读取并校验解码器输出的WAV头。
    pub fn stream<R>(&self, input: R, params: PcmParams) -> AudioResult<FrameStream>
    where
        R: Read + Send + 'static,
    {
        self.config.validate()?;
        let started = Instant::now();
        let deadline = self.config.timeout.map(|timeout| started + timeout);

        let io = self.decoder.spawn(params)?;
        let mut guard = ProcessGuard::new(io.process, self.decoder.name());
        let mut output = io.output;

        let write_chunk = self.config.write_chunk_size;
        let input_sink = io.input;
        let feeder = thread::Builder::new()
            .name("pcmkit-feeder".into())
            .spawn(move || feed_input(input, input_sink, write_chunk))
            .map_err(|e| error::external_error("failed to start input feeder / 无法启动输入线程", e))?;

        let header = match wav::read_stream_header(&mut output) {
            Ok(header) => header,
            Err(err) => return Err(guard.explain_header_failure(err, output, deadline)),
        };

        if header.params != params {
            drop(output);
            guard.kill();
            return Err(error::framing_error(
                "decoder output parameters differ / 解码器输出参数与请求不一致",
                format!("requested {params:?}, got {:?}", header.params),
            ));
        }

        tracing::debug!(
            decoder = self.decoder.name(),
            header_len = header.header_len,
            sample_rate = params.sample_rate(),
            channels = params.channels(),
            bits = params.bit_depth().bits(),
            "decoder header consumed"
        );

        let chunk_bytes = self.config.frames_per_chunk * params.bytes_per_frame();
        Ok(FrameStream {
            params,
            header,
            output,
            guard,
            feeder: Some(feeder),
            chunk: vec![0u8; chunk_bytes],
            carry: Vec::with_capacity(params.bytes_per_frame()),
            deadline,
            frames_emitted: 0,
            bytes_emitted: 0,
            finished: false,
        })
    }
}

/// 增量帧迭代器
///
/// 每次 `next()` 读取一块解码器输出并产出一个帧；输出结束时等待进程退出并
/// 检查退出状态。出错后迭代结束。提前丢弃会终止解码进程。
pub struct FrameStream {
    params: PcmParams,
    header: StreamHeader,
    output: Box<dyn Read + Send>,
    guard: ProcessGuard,
    feeder: Option<JoinHandle<io::Result<u64>>>,
    chunk: Vec<u8>,
    /// 上次读取遗留的不足一帧的字节
    carry: Vec<u8>,
    deadline: Option<Instant>,
    frames_emitted: usize,
    bytes_emitted: u64,
    finished: bool,
}

impl FrameStream {
    pub fn params(&self) -> PcmParams {
        self.params
    }

    /// 解码器输出的WAV头信息
    pub fn header(&self) -> &StreamHeader {
        &self.header
    }

    pub fn frames_emitted(&self) -> usize {
        self.frames_emitted
    }

    pub fn bytes_emitted(&self) -> u64 {
        self.bytes_emitted
    }

    fn next_frame(&mut self) -> AudioResult<Option<Frame>> {
        let bytes_per_frame = self.params.bytes_per_frame();

        loop {
            check_deadline(self.deadline)?;

            let carried = self.carry.len();
            self.chunk[..carried].copy_from_slice(&self.carry);

            let read = match self.output.read(&mut self.chunk[carried..]) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(error::external_error(
                        "failed to read decoder output / 读取解码器输出失败",
                        e,
                    ));
                }
            };

            if read == 0 {
                self.finish()?;
                return Ok(None);
            }

            let filled = carried + read;
            let aligned = filled - filled % bytes_per_frame;
            self.carry.clear();
            self.carry.extend_from_slice(&self.chunk[aligned..filled]);

            if aligned > 0 {
                self.frames_emitted += 1;
                self.bytes_emitted += aligned as u64;
                return Ok(Some(Frame::new(&self.chunk[..aligned])));
            }
        }
    }

    /// 输出结束：等待进程、回收喂入线程、检查结尾对齐
    fn finish(&mut self) -> AudioResult<()> {
        let report = self.guard.wait(self.deadline)?;
        let fed = self.feeder.take().map(|handle| handle.join());

        if !report.success {
            tracing::warn!(decoder = %self.guard.name, %report, "decoder failed");
            return Err(error::external_error(
                "decoder exited unsuccessfully / 解码进程异常退出",
                format!("{} ({report})", self.guard.name),
            ));
        }

        match fed {
            Some(Ok(Ok(bytes))) => {
                tracing::debug!(input_bytes = bytes, "input fully fed to decoder");
            }
            Some(Ok(Err(e))) if e.kind() == io::ErrorKind::BrokenPipe => {
                tracing::warn!(decoder = %self.guard.name, "decoder exited before consuming all input");
            }
            Some(Ok(Err(e))) => {
                return Err(error::external_error(
                    "failed to feed decoder input / 写入解码器输入失败",
                    e,
                ));
            }
            Some(Err(_)) => {
                return Err(AudioError::ExternalProcess(
                    "input feeder panicked / 输入线程崩溃".to_string(),
                ));
            }
            None => {}
        }

        if !self.carry.is_empty() {
            return Err(error::framing_error(
                "trailing bytes not frame-aligned / 输出末尾存在不完整帧",
                format!(
                    "{} of {} bytes",
                    self.carry.len(),
                    self.params.bytes_per_frame()
                ),
            ));
        }

        tracing::debug!(
            frames = self.frames_emitted,
            bytes = self.bytes_emitted,
            "decoder output drained"
        );
        Ok(())
    }
}

impl Iterator for FrameStream {
    type Item = AudioResult<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(err) => {
                self.finished = true;
                self.abort();
                Some(Err(err))
            }
        }
    }
}

impl FrameStream {
    /// 先关闭输出端，使仍在写输出的解码器立即失败退出，再终止并回收进程
    fn abort(&mut self) {
        self.output = Box::new(io::empty());
        self.guard.kill();
    }
}

impl Drop for FrameStream {
    fn drop(&mut self) {
        self.abort();
    }
}

/// 进程守卫：除非已正常回收，否则在丢弃时终止并回收进程
struct ProcessGuard {
    handle: Box<dyn ProcessHandle>,
    name: String,
    reaped: bool,
}

impl ProcessGuard {
    fn new(handle: Box<dyn ProcessHandle>, name: &str) -> Self {
        Self {
            handle,
            name: name.to_string(),
            reaped: false,
        }
    }

    /// 等待进程退出；超过时限则终止进程并报告超时
    fn wait(&mut self, deadline: Option<Instant>) -> AudioResult<ExitReport> {
        let report = match deadline {
            None => self.handle.wait(),
            Some(deadline) => loop {
                match self.handle.try_wait() {
                    Ok(Some(report)) => break Ok(report),
                    Ok(None) if Instant::now() >= deadline => {
                        self.kill();
                        return Err(timeout_error(deadline));
                    }
                    Ok(None) => thread::sleep(pipeline_limits::EXIT_POLL_INTERVAL),
                    Err(e) => break Err(e),
                }
            },
        }
        .map_err(|e| error::external_error("failed to wait for decoder / 等待解码进程失败", e))?;

        self.reaped = true;
        Ok(report)
    }

    /// 头部读取失败时判断根因：超时优先，其次是进程的失败退出
    ///
    /// 等待退出的宽限期不会越过时限。
    fn explain_header_failure(
        &mut self,
        err: AudioError,
        output: Box<dyn Read + Send>,
        deadline: Option<Instant>,
    ) -> AudioError {
        if let Err(timeout) = check_deadline(deadline) {
            drop(output);
            self.kill();
            tracing::warn!(decoder = %self.name, "decoder timed out before header");
            return timeout;
        }

        let grace_end = Instant::now() + pipeline_limits::HEADER_EXIT_GRACE;
        let poll_end = deadline.map_or(grace_end, |deadline| deadline.min(grace_end));
        loop {
            match self.handle.try_wait() {
                Ok(Some(report)) => {
                    self.reaped = true;
                    if report.success {
                        return err;
                    }
                    tracing::warn!(decoder = %self.name, %report, "decoder failed before header");
                    return error::external_error(
                        "decoder exited before producing a WAV header / 解码进程未输出WAV头即退出",
                        format!("{} ({report})", self.name),
                    );
                }
                Ok(None) if Instant::now() < poll_end => {
                    thread::sleep(pipeline_limits::EXIT_POLL_INTERVAL);
                }
                _ => {
                    drop(output);
                    self.kill();
                    return match check_deadline(deadline) {
                        Err(timeout) => timeout,
                        Ok(()) => err,
                    };
                }
            }
        }
    }

    fn kill(&mut self) {
        if self.reaped {
            return;
        }
        if let Err(e) = self.handle.kill() {
            tracing::warn!(decoder = %self.name, error = %e, "failed to kill decoder");
        }
        let _ = self.handle.wait();
        self.reaped = true;
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

/// 喂入线程：分块写入解码器输入，结束时关闭输入端
fn feed_input<R: Read, W: Write>(mut input: R, mut sink: W, chunk_size: usize) -> io::Result<u64> {
    let mut buf = vec![0u8; chunk_size];
    let mut total = 0u64;
    loop {
        let n = match input.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        sink.write_all(&buf[..n])?;
        total += n as u64;
    }
    sink.flush()?;
    Ok(total)
}

fn check_deadline(deadline: Option<Instant>) -> AudioResult<()> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => Err(timeout_error(deadline)),
        _ => Ok(()),
    }
}

fn timeout_error(deadline: Instant) -> AudioError {
    error::external_error(
        "decoder timed out / 解码超时",
        format!("deadline passed {:?} ago", deadline.elapsed()),
    )
}
