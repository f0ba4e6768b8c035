//! # 求解器输入文件写出器
//!
//! 每个物相合并完成后，把晶胞、组成和衍射数据交给写出器生成求解程序的输入文件。
//!
//! ## 子模块
//! - `shelx`: SHELX 指令文件 `<phase>.ins`（必需）
//! - `focus`: FOCUS 输入 `<phase>.inp`（可选）
//! - `superflip`: Superflip 输入 `<phase>.inflip`（可选）
//!
//! 所有文件都经原子写入。
//!
//! ## 依赖关系
//! - 被 `pipeline/phase.rs` 使用
//! - 使用 `models/`, `utils/fs.rs`

pub mod focus;
pub mod shelx;
pub mod superflip;

pub use focus::FocusWriter;
pub use shelx::ShelxWriter;
pub use superflip::SuperflipWriter;

use crate::error::Result;
use crate::models::PhaseDescriptor;
use crate::utils::fs::write_atomic;

use std::path::{Path, PathBuf};

/// 写出器所需的单个物相数据
#[derive(Debug, Clone, Copy)]
pub struct WriterInput<'a> {
    pub phase: &'a PhaseDescriptor,
    /// 元数据中的实验波长 (Å)
    pub wavelength: f64,
    /// 已写出的合并 .hkl 文件
    pub hkl_path: &'a Path,
}

/// 求解器输入格式
pub trait SolverWriter: Send + Sync {
    /// 格式名（用于报告）
    fn name(&self) -> &'static str;

    /// 输出文件扩展名
    fn extension(&self) -> &'static str;

    /// 生成文件内容
    fn render(&self, input: &WriterInput) -> Result<String>;

    /// 写入 `<dir>/<phase>.<ext>` 并返回路径
    fn write(&self, input: &WriterInput, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(format!("{}.{}", input.phase.name, self.extension()));
        write_atomic(&path, &self.render(input)?)?;
        Ok(path)
    }
}
