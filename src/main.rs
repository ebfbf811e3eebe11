//! pcmkit - 主程序入口
//!
//! 纯流程控制器，负责把子命令分派到库中的解码、检查与转换流程。

use anyhow::Context;
use pcmkit::{
    audio::{
        FfmpegDecoder, FramePipeline, InputFormat, PcmParams, PipelineConfig, WavStreamWriter,
        stream::{AudioStream, StreamConfig},
        wav::{self, StreamHeader},
    },
    error::{AudioError, ErrorCategory},
    tools::{self, AppConfig, CliCommand, DecodeArgs, PendingOutput, constants::defaults},
};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::Path;
use std::process;
use std::time::Instant;

/// 错误退出码定义
mod exit_codes {
    /// 通用错误
    pub const GENERAL_ERROR: i32 = 1;
    /// 参数/格式错误
    pub const CONFIG_ERROR: i32 = 2;
    /// 分帧/容器错误
    pub const FRAMING_ERROR: i32 = 3;
    /// 外部解码进程错误
    pub const EXTERNAL_ERROR: i32 = 4;
    /// 文件读写错误
    pub const IO_ERROR: i32 = 5;
}

/// 获取错误建议文本
fn get_error_suggestion(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::Config => {
            "检查采样率、声道数与位深（8/16/24/32），使用 --help 查看完整用法 / Check sample rate, channels and bit depth (8/16/24/32), use --help to see full usage"
        }
        ErrorCategory::Capability => {
            "该流缺少所需的读写端 / The stream lacks the required reader or writer"
        }
        ErrorCategory::Framing => {
            "文件可能损坏、被截断或不是规范PCM WAV / File may be corrupted, truncated, or not a canonical PCM WAV"
        }
        ErrorCategory::External => {
            "检查解码程序是否已安装且能处理该输入，可用 --ffmpeg 指定路径 / Check that the decoder is installed and accepts this input; use --ffmpeg to choose a path"
        }
        ErrorCategory::Io => {
            "检查文件路径是否正确，文件是否存在且可读写 / Check if file path is correct, file exists and is readable/writable"
        }
    }
}

/// 错误处理和建议
fn handle_error(error: anyhow::Error) -> ! {
    eprintln!("[ERROR] 错误 / Error: {error:#}");

    let exit_code = match error.downcast_ref::<AudioError>() {
        Some(audio_error) => {
            let category = ErrorCategory::from_audio_error(audio_error);
            eprintln!("[INFO] 类别 / Category: {}", category.display_name());
            eprintln!("[INFO] 建议 / Suggestion: {}", get_error_suggestion(category));
            match category {
                ErrorCategory::Config | ErrorCategory::Capability => exit_codes::CONFIG_ERROR,
                ErrorCategory::Framing => exit_codes::FRAMING_ERROR,
                ErrorCategory::External => exit_codes::EXTERNAL_ERROR,
                ErrorCategory::Io => exit_codes::IO_ERROR,
            }
        }
        None => exit_codes::GENERAL_ERROR,
    };

    process::exit(exit_code);
}

/// 解码模式：外部解码器输出逐帧写入WAV文件
fn run_decode(args: &DecodeArgs) -> anyhow::Result<()> {
    let params = PcmParams::new(args.sample_rate, args.channels, args.bits)?;
    let decoder = FfmpegDecoder::new(InputFormat::from(args.format.as_str()))
        .with_program(&args.program);
    let config = PipelineConfig {
        timeout: args.timeout,
        ..PipelineConfig::default()
    };
    let pipeline = FramePipeline::with_config(decoder, config);

    let input = File::open(&args.input)
        .map_err(AudioError::from)
        .with_context(|| format!("无法打开输入 / cannot open input: {}", args.input.display()))?;
    let started = Instant::now();

    let data_size = decode_to_file(&pipeline, input, params, &args.output)?;

    tracing::info!(
        input = %args.input.display(),
        output = %args.output.display(),
        bytes = data_size,
        duration = ?params.duration_of_samples(data_size as usize / params.bytes_per_sample()),
        elapsed = ?started.elapsed(),
        "decode finished"
    );
    Ok(())
}

fn decode_to_file(
    pipeline: &FramePipeline<FfmpegDecoder>,
    input: File,
    params: PcmParams,
    output: &Path,
) -> anyhow::Result<u64> {
    let frames = pipeline.stream(input, params)?;
    let mut pending = PendingOutput::new(output);
    let file = pending
        .create()
        .with_context(|| format!("无法创建输出 / cannot create output: {}", output.display()))?;
    let mut writer = WavStreamWriter::new(BufWriter::new(file), params)?;

    for frame in frames {
        writer.write_frame(frame?.as_bytes())?;
    }

    let data_size = writer.data_size();
    drop(writer.finish()?);
    pending.commit()?;
    Ok(data_size)
}

/// 检查报告
#[derive(Debug, Serialize)]
struct InspectReport<'a> {
    path: &'a Path,
    file_size: u64,
    header_len: usize,
    #[serde(flatten)]
    params: PcmParams,
    data_size: u32,
    frames: u64,
    duration_secs: f64,
}

/// 检查模式：读取WAV头并输出摘要
fn run_inspect(path: &Path, json: bool) -> anyhow::Result<()> {
    let file = File::open(path)
        .map_err(AudioError::from)
        .with_context(|| format!("无法打开文件 / cannot open file: {}", path.display()))?;
    let file_size = file.metadata().map_err(AudioError::from)?.len();
    let header = wav::read_stream_header(&mut BufReader::new(file))?;

    let StreamHeader {
        params,
        declared_data_size,
        header_len,
    } = header;
    let samples = declared_data_size as usize / params.bytes_per_sample();
    let report = InspectReport {
        path,
        file_size,
        header_len,
        params,
        data_size: declared_data_size,
        frames: (declared_data_size as usize / params.bytes_per_frame()) as u64,
        duration_secs: params.duration_of_samples(samples).as_secs_f64(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("文件 / File:        {}", report.path.display());
        println!("大小 / Size:        {} bytes", report.file_size);
        println!("头长度 / Header:    {} bytes", report.header_len);
        println!("采样率 / Rate:      {} Hz", params.sample_rate());
        println!("声道 / Channels:    {}", params.channels());
        println!("位深 / Bits:        {}", params.bit_depth().bits());
        println!("数据 / Data:        {} bytes", report.data_size);
        println!("帧数 / Frames:      {}", report.frames);
        println!("时长 / Duration:    {:.3} s", report.duration_secs);
    }

    let expected = report.header_len as u64 + declared_data_size as u64;
    if file_size < expected {
        tracing::warn!(
            file_size,
            expected,
            "file is shorter than its header declares"
        );
    }
    Ok(())
}

/// 转换模式：以新位深重新量化，可选增益
fn run_convert(input: &Path, output: &Path, bits: u16, gain_db: f64) -> anyhow::Result<()> {
    let file = File::open(input)
        .map_err(AudioError::from)
        .with_context(|| format!("无法打开输入 / cannot open input: {}", input.display()))?;
    let mut reader = BufReader::new(file);
    let header = wav::read_stream_header(&mut reader)?;
    let source = header.params;
    let target = PcmParams::new(source.sample_rate(), source.channels(), bits)?;

    // 占位大小（管道写出的文件）读到EOF为止
    let payload: Box<dyn Read> = match header.known_data_size() {
        Some(size) => Box::new(reader.take(u64::from(size))),
        None => {
            tracing::debug!(
                declared = header.declared_data_size,
                "placeholder data size, reading to end of file"
            );
            Box::new(reader)
        }
    };
    let mut stream = AudioStream::reader(
        payload,
        StreamConfig::from_params(source, defaults::STREAM_BUFFER_SAMPLES),
    )?;

    let mut pending = PendingOutput::new(output);
    let out = pending
        .create()
        .with_context(|| format!("无法创建输出 / cannot create output: {}", output.display()))?;
    let mut writer = WavStreamWriter::new(BufWriter::new(out), target)?;

    let gain = 10f64.powf(gain_db / 20.0);
    let mut buf = vec![0.0; stream.buffer_size()];
    let mut total = 0usize;
    loop {
        let n = stream.read(&mut buf)?;
        if n == 0 {
            break;
        }
        if gain != 1.0 {
            buf[..n].iter_mut().for_each(|s| *s *= gain);
        }
        writer.write_samples(&buf[..n])?;
        total += n;
    }
    drop(writer.finish()?);
    pending.commit()?;

    tracing::info!(
        from_bits = source.bit_depth().bits(),
        to_bits = bits,
        gain_db,
        samples = total,
        "convert finished"
    );
    Ok(())
}

/// 应用程序主逻辑（便于测试和复用）
fn run(config: &AppConfig) -> anyhow::Result<()> {
    tools::show_startup_info(config);

    match &config.command {
        CliCommand::Decode(args) => run_decode(args),
        CliCommand::Inspect { input, json } => run_inspect(input, *json),
        CliCommand::Convert {
            input,
            output,
            bits,
            gain_db,
        } => run_convert(input, output, *bits, *gain_db),
    }
}

fn init_logging(verbose: bool) {
    let fallback = if verbose { "pcmkit=debug" } else { "pcmkit=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let config = tools::parse_args();
    init_logging(config.verbose);

    if let Err(error) = run(&config) {
        handle_error(error);
    }
}
