//! 输出文件落盘
//!
//! 先写入目标旁边的 `.tmp` 文件，成功后再重命名为目标路径。
//! 失败时只删除本次创建的临时文件，已存在的同名目标保持原样。

use crate::error::AudioResult;
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// 尚未提交的输出文件
#[derive(Debug)]
pub struct PendingOutput {
    target: PathBuf,
    temp: PathBuf,
    created: bool,
    committed: bool,
}

impl PendingOutput {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        let target = target.into();
        let mut name = target
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("output"));
        name.push(".tmp");
        let temp = target.with_file_name(name);
        Self {
            target,
            temp,
            created: false,
            committed: false,
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp
    }

    /// 创建（截断）临时文件
    pub fn create(&mut self) -> AudioResult<File> {
        let file = File::create(&self.temp)?;
        self.created = true;
        Ok(file)
    }

    /// 把临时文件重命名为目标路径
    pub fn commit(mut self) -> AudioResult<()> {
        if !self.created {
            self.create()?;
        }
        fs::rename(&self.temp, &self.target)?;
        self.committed = true;
        Ok(())
    }
}

impl Drop for PendingOutput {
    fn drop(&mut self) {
        if self.created && !self.committed {
            if let Err(e) = fs::remove_file(&self.temp) {
                tracing::warn!(path = %self.temp.display(), error = %e, "failed to remove partial output");
            }
        }
    }
}
