//! 工具模块集合
//!
//! 包含CLI、常量定义与输出文件落盘，支持main.rs的流程控制。

pub mod cli;
pub mod constants;
pub mod output;

// 重新导出主要的公共接口
pub use cli::{AppConfig, CliCommand, DecodeArgs, parse_args, parse_args_from, show_startup_info};
pub use output::PendingOutput;
