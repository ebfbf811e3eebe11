//! 统一错误处理框架
//!
//! 按故障来源划分的错误类型：配置、能力、分帧、外部进程、I/O。
//! 所有错误都直接传播给调用方，本库内部不做任何重试或吞掉错误。

use std::fmt;
use std::io;
use thiserror::Error;

/// 音频处理相关的统一错误类型
#[derive(Debug, Error)]
pub enum AudioError {
    /// 配置错误：构造时参数非法（采样率/声道/缓冲区为0、缺少读写端等），在任何I/O之前检测
    #[error("Invalid configuration / 配置无效: {0}")]
    InvalidConfig(String),

    /// 不支持的位深度（仅支持 8/16/24/32）
    #[error("Unsupported format / 不支持的格式: {0}")]
    UnsupportedFormat(String),

    /// 能力错误：在只写流上读，或在只读流上写
    #[error("Capability error / 流能力不足: {0}")]
    Capability(String),

    /// 分帧错误：头部截断、尾部字节未对齐、头部与数据长度不一致
    #[error("Framing error / 分帧错误: {0}")]
    Framing(String),

    /// 外部进程错误：非零退出、管道断开、超时
    #[error("External process error / 外部进程错误: {0}")]
    ExternalProcess(String),

    /// 底层I/O错误
    #[error("I/O error / I/O错误: {0}")]
    Io(#[from] io::Error),
}

/// 音频处理操作的标准Result类型
pub type AudioResult<T> = Result<T, AudioError>;

// ==================== 错误转换Helper函数 ====================
// 消除重复的 .map_err(|e| AudioError::XXX(format!(...))) 模式

/// 创建配置错误的helper函数
#[inline]
pub fn config_error<E: fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::InvalidConfig(format!("{context}: {err}"))
}

/// 创建分帧错误的helper函数
#[inline]
pub fn framing_error<E: fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::Framing(format!("{context}: {err}"))
}

/// 创建外部进程错误的helper函数
#[inline]
pub fn external_error<E: fmt::Display>(context: &str, err: E) -> AudioError {
    AudioError::ExternalProcess(format!("{context}: {err}"))
}

// ==================== 错误分类系统 ====================

/// 错误类别枚举（用于CLI退出码与日志）
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum ErrorCategory {
    /// 参数/格式配置错误
    Config,
    /// 读写能力错误
    Capability,
    /// 分帧/容器结构错误
    Framing,
    /// 外部解码进程错误
    External,
    /// I/O相关错误（文件不存在、权限不足等）
    Io,
}

impl ErrorCategory {
    /// 从AudioError提取错误类别
    pub fn from_audio_error(e: &AudioError) -> Self {
        match e {
            AudioError::InvalidConfig(_) | AudioError::UnsupportedFormat(_) => Self::Config,
            AudioError::Capability(_) => Self::Capability,
            AudioError::Framing(_) => Self::Framing,
            AudioError::ExternalProcess(_) => Self::External,
            AudioError::Io(_) => Self::Io,
        }
    }

    /// 获取错误类别的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Config => "配置错误",
            Self::Capability => "能力错误",
            Self::Framing => "分帧错误",
            Self::External => "外部进程错误",
            Self::Io => "I/O错误",
        }
    }
}
