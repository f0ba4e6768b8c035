//! # 结果表数据模型
//!
//! 每帧一行的处理结果（帧文件、物相标签、评分），以及整次运行共享的元数据。
//!
//! ## 依赖关系
//! - 由 `parsers/results.rs` 构造
//! - 被 `pipeline/` 只读使用

use crate::models::phase::PhaseDescriptor;

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// 单帧处理结果
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FrameResult {
    /// 原始帧文件标识
    pub frame: String,
    /// 物相标签
    pub phase: String,
    /// 指标化质量评分
    pub score: f64,
}

/// 结果表
#[derive(Debug, Clone, Default)]
pub struct ResultsTable {
    pub rows: Vec<FrameResult>,
}

impl ResultsTable {
    pub fn new(rows: Vec<FrameResult>) -> Self {
        ResultsTable { rows }
    }

    /// 按物相标签分组（标签排序，组内保持原始行序）
    pub fn group_by_phase(&self) -> BTreeMap<&str, Vec<&FrameResult>> {
        let mut groups: BTreeMap<&str, Vec<&FrameResult>> = BTreeMap::new();
        for row in &self.rows {
            groups.entry(row.phase.as_str()).or_default().push(row);
        }
        groups
    }
}

/// 整次运行的元数据
#[derive(Debug, Clone)]
pub struct RunMetadata {
    /// 单帧 .hkl 文件所在目录
    pub drc_out: PathBuf,
    /// 波长 (Å)
    pub wavelength: f64,
    /// 按标签索引的物相描述
    pub phases: BTreeMap<String, PhaseDescriptor>,
}

impl RunMetadata {
    pub fn phase(&self, name: &str) -> Option<&PhaseDescriptor> {
        self.phases.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(frame: &str, phase: &str, score: f64) -> FrameResult {
        FrameResult {
            frame: frame.to_string(),
            phase: phase.to_string(),
            score,
        }
    }

    #[test]
    fn test_group_by_phase() {
        let table = ResultsTable::new(vec![
            row("b1.h5", "B", 1.0),
            row("a1.h5", "A", 2.0),
            row("b2.h5", "B", 3.0),
        ]);
        let groups = table.group_by_phase();

        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(groups["B"].len(), 2);
        assert_eq!(groups["B"][1].frame, "b2.h5");
    }
}
