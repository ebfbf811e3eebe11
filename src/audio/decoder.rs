//! 外部解码进程抽象
//!
//! 帧管道只依赖"输入端写入压缩字节、输出端读出WAV字节、报告退出状态"这一契约。
//! 默认实现通过FFmpeg子进程管道完成解码；测试可以提供不启动真实进程的替身。

use super::format::{BitDepth, PcmParams};
use crate::error::{self, AudioError, AudioResult};
use crate::tools::constants::defaults;
use std::fmt;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;

/// FFmpeg安装指南（跨平台）
pub const FFMPEG_INSTALL_GUIDE: &str = r#"
FFmpeg is required for decoding compressed audio / 需要安装FFmpeg以解码压缩音频

Installation / 安装方法:
  macOS:   brew install ffmpeg
  Windows: https://www.gyan.dev/ffmpeg/builds/ (推荐Full版本)
           或使用: winget install Gyan.FFmpeg
  Linux:
    - Ubuntu/Debian: sudo apt install ffmpeg
    - Fedora/RHEL:   sudo dnf install ffmpeg
    - Arch:          sudo pacman -S ffmpeg

Official site / 官方网站: https://ffmpeg.org/download.html
"#;

/// 进程退出报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitReport {
    pub success: bool,
    /// 退出码（被信号终止时为None）
    pub code: Option<i32>,
    /// 进程的诊断输出（可能为空）
    pub stderr: String,
}

impl ExitReport {
    pub fn success() -> Self {
        Self {
            success: true,
            code: Some(0),
            stderr: String::new(),
        }
    }

    pub fn failure(code: Option<i32>, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            code,
            stderr: stderr.into(),
        }
    }
}

impl fmt::Display for ExitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}")?,
            None => write!(f, "terminated by signal")?,
        }
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            write!(f, ": {stderr}")?;
        }
        Ok(())
    }
}

/// 运行中进程的控制句柄
pub trait ProcessHandle: Send {
    /// 阻塞等待进程退出
    fn wait(&mut self) -> io::Result<ExitReport>;

    /// 非阻塞查询；进程仍在运行时返回 `Ok(None)`
    fn try_wait(&mut self) -> io::Result<Option<ExitReport>>;

    /// 强制终止进程（已退出时不报错）
    fn kill(&mut self) -> io::Result<()>;
}

/// 已启动解码进程的三个端点
pub struct DecoderIo {
    /// 压缩字节输入端；关闭即表示输入结束
    pub input: Box<dyn Write + Send>,
    /// WAV字节输出端
    pub output: Box<dyn Read + Send>,
    pub process: Box<dyn ProcessHandle>,
}

/// 外部解码协作者
///
/// 每次 `spawn` 启动一个独立实例，输出为指定PCM参数的WAV字节流，
/// 解码失败通过非零退出状态报告。
pub trait DecodeProcess {
    /// 用于日志和错误信息的名称
    fn name(&self) -> &str;

    fn spawn(&self, params: PcmParams) -> AudioResult<DecoderIo>;
}

/// 输入容器格式提示
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFormat {
    /// 由FFmpeg自行探测
    Auto,
    Ogg,
    Mp3,
    Wav,
    Flac,
    /// 任意FFmpeg demuxer名称
    Other(String),
}

impl InputFormat {
    /// FFmpeg demuxer名称（Auto时为None）
    pub fn demuxer(&self) -> Option<&str> {
        match self {
            InputFormat::Auto => None,
            InputFormat::Ogg => Some("ogg"),
            InputFormat::Mp3 => Some("mp3"),
            InputFormat::Wav => Some("wav"),
            InputFormat::Flac => Some("flac"),
            InputFormat::Other(name) => Some(name.as_str()),
        }
    }
}

impl From<&str> for InputFormat {
    fn from(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "" | "auto" => InputFormat::Auto,
            "ogg" | "oga" | "opus" => InputFormat::Ogg,
            "mp3" => InputFormat::Mp3,
            "wav" => InputFormat::Wav,
            "flac" => InputFormat::Flac,
            other => InputFormat::Other(other.to_string()),
        }
    }
}

/// FFmpeg管道解码器
///
/// 从stdin读取压缩音频，以 `-f wav` 写出到stdout。
/// 使用bitexact标志避免FFmpeg在头部插入LIST/INFO块。
#[derive(Debug, Clone)]
pub struct FfmpegDecoder {
    program: PathBuf,
    input_format: InputFormat,
}

impl FfmpegDecoder {
    pub fn new(input_format: InputFormat) -> Self {
        Self {
            program: PathBuf::from(defaults::FFMPEG_PROGRAM),
            input_format,
        }
    }

    /// 指定FFmpeg可执行文件路径
    pub fn with_program<P: AsRef<Path>>(mut self, program: P) -> Self {
        self.program = program.as_ref().to_path_buf();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// 检测FFmpeg是否可用
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// 构建FFmpeg命令参数
    pub fn command_args(&self, params: PcmParams) -> Vec<String> {
        let mut args: Vec<String> = vec!["-v".into(), "error".into()];

        if let Some(demuxer) = self.input_format.demuxer() {
            args.extend(["-f".into(), demuxer.to_string()]);
        }

        args.extend([
            "-i".into(),
            "pipe:0".into(),
            "-ar".into(),
            params.sample_rate().to_string(),
            "-ac".into(),
            params.channels().to_string(),
            "-acodec".into(),
            pcm_codec_name(params.bit_depth()).into(),
            "-flags".into(),
            "+bitexact".into(),
            "-fflags".into(),
            "+bitexact".into(),
            "-f".into(),
            "wav".into(),
            "pipe:1".into(),
        ]);
        args
    }
}

impl Default for FfmpegDecoder {
    fn default() -> Self {
        Self::new(InputFormat::Auto)
    }
}

impl DecodeProcess for FfmpegDecoder {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    fn spawn(&self, params: PcmParams) -> AudioResult<DecoderIo> {
        let args = self.command_args(params);
        tracing::debug!(program = %self.program.display(), ?args, "spawning decoder");

        let mut child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                AudioError::ExternalProcess(format!(
                    "Failed to spawn FFmpeg / 无法启动FFmpeg: {e}\n{FFMPEG_INSTALL_GUIDE}"
                ))
            })?;

        let pipes = (child.stdin.take(), child.stdout.take(), child.stderr.take());
        let (Some(stdin), Some(stdout), Some(stderr)) = pipes else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(error::external_error(
                "FFmpeg pipes not available / FFmpeg管道不可用",
                self.program.display(),
            ));
        };

        // stderr必须并行排空，否则进程在诊断输出较多时会阻塞
        let stderr_reader = std::thread::Builder::new()
            .name("pcmkit-ffmpeg-stderr".into())
            .spawn(move || {
                let mut text = String::new();
                let _ = io::BufReader::new(stderr).read_to_string(&mut text);
                text
            });
        let stderr_reader = match stderr_reader {
            Ok(handle) => handle,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AudioError::Io(e));
            }
        };

        Ok(DecoderIo {
            input: Box::new(stdin),
            output: Box::new(stdout),
            process: Box::new(ChildProcess {
                child,
                stderr: Some(stderr_reader),
            }),
        })
    }
}

/// 8位WAV为无符号，其余为小端有符号
fn pcm_codec_name(depth: BitDepth) -> &'static str {
    match depth {
        BitDepth::U8 => "pcm_u8",
        BitDepth::S16 => "pcm_s16le",
        BitDepth::S24 => "pcm_s24le",
        BitDepth::S32 => "pcm_s32le",
    }
}

/// 子进程句柄
struct ChildProcess {
    child: Child,
    stderr: Option<JoinHandle<String>>,
}

impl ChildProcess {
    fn report(&mut self, status: std::process::ExitStatus) -> ExitReport {
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();
        ExitReport {
            success: status.success(),
            code: status.code(),
            stderr,
        }
    }
}

impl ProcessHandle for ChildProcess {
    fn wait(&mut self) -> io::Result<ExitReport> {
        let status = self.child.wait()?;
        Ok(self.report(status))
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitReport>> {
        match self.child.try_wait()? {
            Some(status) => Ok(Some(self.report(status))),
            None => Ok(None),
        }
    }

    fn kill(&mut self) -> io::Result<()> {
        match self.child.kill() {
            // 进程已退出
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => Ok(()),
            other => other,
        }
    }
}
