//! 命令行接口模块
//!
//! 负责命令行参数解析、配置管理和程序信息展示。

use super::constants::defaults;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

/// 应用程序版本信息
const VERSION: &str = env!("CARGO_PKG_VERSION");
const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// 应用程序配置
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// 是否显示详细信息
    pub verbose: bool,

    /// 要执行的子命令
    pub command: CliCommand,
}

/// 子命令及其参数
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// 通过外部解码器把任意音频解码为WAV
    Decode(DecodeArgs),
    /// 显示WAV头信息
    Inspect { input: PathBuf, json: bool },
    /// 重新量化WAV（改变位深，可选增益）
    Convert {
        input: PathBuf,
        output: PathBuf,
        bits: u16,
        gain_db: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecodeArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    /// 输入容器格式（auto表示由解码器探测）
    pub format: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub bits: u16,
    pub program: PathBuf,
    pub timeout: Option<Duration>,
}

fn build_command() -> Command {
    let input = |help: &'static str| Arg::new("INPUT").help(help).required(true).index(1);
    let output = Arg::new("output")
        .long("output")
        .short('o')
        .help("输出WAV文件路径")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .required(true);

    Command::new("pcmkit")
        .version(VERSION)
        .about(DESCRIPTION)
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("显示详细处理信息")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .subcommand(
            Command::new("decode")
                .about("通过外部解码器（默认ffmpeg）把音频解码为PCM WAV")
                .arg(input("输入音频文件").value_parser(value_parser!(PathBuf)))
                .arg(output.clone())
                .arg(
                    Arg::new("format")
                        .long("format")
                        .short('f')
                        .help("输入容器格式 (auto, ogg, mp3, wav, flac, ...)")
                        .default_value("auto"),
                )
                .arg(
                    Arg::new("rate")
                        .long("rate")
                        .short('r')
                        .help("输出采样率 (Hz)，默认44100")
                        .value_parser(value_parser!(u32).range(1..)),
                )
                .arg(
                    Arg::new("channels")
                        .long("channels")
                        .short('c')
                        .help("输出声道数，默认2")
                        .value_parser(value_parser!(u16)),
                )
                .arg(
                    Arg::new("bits")
                        .long("bits")
                        .short('b')
                        .help("输出位深 (8, 16, 24, 32)，默认16")
                        .value_parser(value_parser!(u16)),
                )
                .arg(
                    Arg::new("ffmpeg")
                        .long("ffmpeg")
                        .help("解码程序路径")
                        .value_name("PATH")
                        .value_parser(value_parser!(PathBuf))
                        .default_value(defaults::FFMPEG_PROGRAM),
                )
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .help("解码时限（秒）")
                        .value_name("SECS")
                        .value_parser(value_parser!(u64).range(1..)),
                ),
        )
        .subcommand(
            Command::new("inspect")
                .about("显示WAV文件的头信息")
                .arg(input("WAV文件").value_parser(value_parser!(PathBuf)))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("以JSON格式输出")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("convert")
                .about("以新的位深重新量化WAV文件")
                .arg(input("输入WAV文件").value_parser(value_parser!(PathBuf)))
                .arg(output)
                .arg(
                    Arg::new("bits")
                        .long("bits")
                        .short('b')
                        .help("目标位深 (8, 16, 24, 32)")
                        .value_parser(value_parser!(u16))
                        .required(true),
                )
                .arg(
                    Arg::new("gain-db")
                        .long("gain-db")
                        .help("转换时施加的增益 (dB)")
                        .value_parser(value_parser!(f64))
                        .allow_negative_numbers(true)
                        .default_value("0"),
                ),
        )
}

/// 解析命令行参数并创建配置
pub fn parse_args() -> AppConfig {
    config_from_matches(&build_command().get_matches())
}

/// 从给定参数列表解析（首项为程序名）
pub fn parse_args_from<I, T>(args: I) -> Result<AppConfig, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().try_get_matches_from(args)?;
    Ok(config_from_matches(&matches))
}

fn path_arg(matches: &ArgMatches, id: &str) -> PathBuf {
    matches.get_one::<PathBuf>(id).cloned().unwrap_or_default()
}

fn config_from_matches(matches: &ArgMatches) -> AppConfig {
    let command = match matches.subcommand() {
        Some(("decode", sub)) => CliCommand::Decode(DecodeArgs {
            input: path_arg(sub, "INPUT"),
            output: path_arg(sub, "output"),
            format: sub
                .get_one::<String>("format")
                .cloned()
                .unwrap_or_else(|| "auto".to_string()),
            sample_rate: sub
                .get_one::<u32>("rate")
                .copied()
                .unwrap_or(defaults::SAMPLE_RATE),
            channels: sub
                .get_one::<u16>("channels")
                .copied()
                .unwrap_or(defaults::CHANNELS),
            bits: sub
                .get_one::<u16>("bits")
                .copied()
                .unwrap_or(defaults::BITS_PER_SAMPLE),
            program: path_arg(sub, "ffmpeg"),
            timeout: sub.get_one::<u64>("timeout").map(|s| Duration::from_secs(*s)),
        }),
        Some(("convert", sub)) => CliCommand::Convert {
            input: path_arg(sub, "INPUT"),
            output: path_arg(sub, "output"),
            bits: sub
                .get_one::<u16>("bits")
                .copied()
                .unwrap_or(defaults::BITS_PER_SAMPLE),
            gain_db: sub.get_one::<f64>("gain-db").copied().unwrap_or(0.0),
        },
        // subcommand_required 保证只剩 inspect
        Some((_, sub)) => CliCommand::Inspect {
            input: path_arg(sub, "INPUT"),
            json: sub.get_flag("json"),
        },
        None => unreachable!("clap enforces subcommand_required"),
    };

    AppConfig {
        verbose: matches.get_flag("verbose"),
        command,
    }
}

/// 显示程序启动信息
pub fn show_startup_info(config: &AppConfig) {
    if config.verbose {
        eprintln!("🚀 pcmkit v{VERSION}");
        eprintln!("📝 {DESCRIPTION}");
    }
}
