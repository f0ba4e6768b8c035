//! # 帧选择
//!
//! 按评分筛选一个物相的帧并换算为单帧 .hkl 路径；未设置评分阈值时
//! 改为扫描输出目录中的全部 `.hkl` 文件（与物相无关）。
//!
//! 帧路径换算：名为 `processed` 的路径分量替换为输出目录，扩展名改为 `.hkl`；
//! 相对路径以结果表所在目录为基准。
//!
//! ## 依赖关系
//! - 被 `pipeline/phase.rs` 调用
//! - 使用 `glob` crate

use crate::error::{MergePrepError, Result};
use crate::models::FrameResult;

use std::path::{Component, Path, PathBuf};

/// 单帧结果文件对应的 .hkl 路径
pub fn frame_to_hkl(frame: &str, base_dir: &Path, drc_out: &Path) -> PathBuf {
    let mut path = PathBuf::new();
    for component in Path::new(frame).components() {
        match component {
            Component::Normal(name) if name == "processed" => path.push(drc_out),
            other => path.push(other.as_os_str()),
        }
    }
    path.set_extension("hkl");

    if path.is_relative() {
        base_dir.join(path)
    } else {
        path
    }
}

/// 评分严格大于阈值的帧
pub fn select_scored(rows: &[&FrameResult], threshold: f64, base_dir: &Path, drc_out: &Path) -> Vec<PathBuf> {
    rows.iter()
        .filter(|row| row.score > threshold)
        .map(|row| frame_to_hkl(&row.frame, base_dir, drc_out))
        .collect()
}

/// 输出目录中的全部 .hkl（排序）
pub fn scan_directory(drc_out: &Path) -> Result<Vec<PathBuf>> {
    if !drc_out.is_dir() {
        return Err(MergePrepError::DirectoryNotFound {
            path: drc_out.display().to_string(),
        });
    }

    let pattern = Path::new(&glob::Pattern::escape(&drc_out.to_string_lossy())).join("*.hkl");
    let pattern = pattern.to_string_lossy();

    let mut files: Vec<PathBuf> = glob::glob(&pattern)
        .map_err(|e| MergePrepError::InvalidArgument(format!("invalid pattern '{}': {}", pattern, e)))?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// 选择一个物相要合并的帧
pub fn select_frames(
    rows: &[&FrameResult],
    threshold: Option<f64>,
    base_dir: &Path,
    drc_out: &Path,
) -> Result<Vec<PathBuf>> {
    match threshold {
        Some(t) => Ok(select_scored(rows, t, base_dir, drc_out)),
        None => scan_directory(drc_out),
    }
}
