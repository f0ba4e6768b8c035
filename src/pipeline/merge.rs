//! # 串行合并
//!
//! 把一个物相选中的单帧 .hkl 文件合并为一个数据集：
//! 按 (h, k, l) 分组，强度取平均，误差取 sqrt(Σσ²)/n，输出按指数排序。
//!
//! 任何一帧读取失败都使该物相失败（由调用方报告），不影响其他物相。
//!
//! ## 依赖关系
//! - 被 `pipeline/phase.rs` 调用
//! - 使用 `parsers/hkl.rs`, `utils/progress.rs`, `utils/output.rs`

use crate::error::Result;
use crate::models::{ReflectionList, ReflectionRecord};
use crate::parsers::hkl::{parse_hkl_file, write_hkl_file};
use crate::utils::{output, progress};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// 合并统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeStats {
    pub frames: usize,
    /// 读入的观测总数
    pub observations: usize,
    /// 合并后独立衍射点数
    pub unique: usize,
}

#[derive(Debug, Default)]
struct Accumulator {
    intensity: f64,
    variance: f64,
    n: usize,
}

/// 串行合并器
#[derive(Debug, Clone)]
pub struct SerialMerge {
    /// 用于输出前缀的物相标签
    label: String,
    verbose: bool,
    show_progress: bool,
}

impl SerialMerge {
    pub fn new(label: impl Into<String>) -> Self {
        SerialMerge {
            label: label.into(),
            verbose: false,
            show_progress: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn show_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// 合并为内存中的数据集
    pub fn merge(&self, files: &[PathBuf]) -> Result<(ReflectionList, MergeStats)> {
        let pb = progress::frame_bar(self.show_progress, &self.label, files.len() as u64);

        let mut groups: BTreeMap<(i32, i32, i32), Accumulator> = BTreeMap::new();
        let mut stats = MergeStats {
            frames: files.len(),
            ..Default::default()
        };

        for file in files {
            let frame = match parse_hkl_file(file) {
                Ok(frame) => frame,
                Err(e) => {
                    pb.finish_and_clear();
                    return Err(e);
                }
            };
            stats.observations += frame.len();

            for r in &frame.records {
                let acc = groups.entry(r.hkl()).or_default();
                acc.intensity += r.intensity;
                acc.variance += r.sigma * r.sigma;
                acc.n += 1;
            }

            if self.verbose {
                pb.suspend(|| {
                    output::print_phase(
                        &self.label,
                        &format!("{:>6} reflections  {}", frame.len(), display_name(file)),
                    )
                });
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        let records: Vec<ReflectionRecord> = groups
            .into_iter()
            .map(|((h, k, l), acc)| {
                let n = acc.n as f64;
                ReflectionRecord::new(h, k, l, acc.intensity / n, acc.variance.sqrt() / n)
            })
            .collect();
        stats.unique = records.len();

        if self.verbose {
            output::print_phase(
                &self.label,
                &format!(
                    "{} frames, {} observations -> {} unique reflections",
                    stats.frames, stats.observations, stats.unique
                ),
            );
        }

        Ok((ReflectionList::new(records), stats))
    }

    /// 合并并原子写入输出文件
    pub fn merge_to_file(&self, files: &[PathBuf], out: &Path) -> Result<(ReflectionList, MergeStats)> {
        let (merged, stats) = self.merge(files)?;
        write_hkl_file(out, &merged)?;
        Ok((merged, stats))
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
