//! # 流水线配置
//!
//! 命令行参数在运行开始时转换为不可变的 `PipelineConfig`，之后各物相只读共享。
//! 直方图参考在这里已经解析为秩轮廓，解析失败会在处理任何物相之前终止运行。
//!
//! ## 依赖关系
//! - 由 `commands/merge.rs` 构造
//! - 被 `pipeline/phase.rs` 只读使用

use crate::error::{MergePrepError, Result};
use crate::intensity::{RankProfile, Thresholds};
use crate::writers::{FocusWriter, ShelxWriter, SolverWriter, SuperflipWriter};

use std::path::PathBuf;

/// 单个物相合并所需的最少帧数
pub const MIN_FRAMES: usize = 10;

/// 默认评分阈值
pub const DEFAULT_SCORE_THRESHOLD: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 评分阈值；None 时改为扫描输出目录中的全部 .hkl
    pub score_threshold: Option<f64>,
    pub min_frames: usize,
    /// 强/中/弱分级阈值，None 表示不分级
    pub kleinify: Option<Thresholds>,
    /// 直方图匹配参考，None 表示不匹配
    pub histogram: Option<RankProfile>,
    /// 输出目录
    pub destination: PathBuf,
    /// SHELX 文件写电子散射因子
    pub electron: bool,
    pub focus: bool,
    pub superflip: bool,
    /// 并行物相数（1 为顺序执行，0 为每个 CPU 一个）
    pub jobs: usize,
    /// 合并时逐帧输出诊断
    pub verbose: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            score_threshold: Some(DEFAULT_SCORE_THRESHOLD),
            min_frames: MIN_FRAMES,
            kleinify: None,
            histogram: None,
            destination: PathBuf::from("."),
            electron: false,
            focus: false,
            superflip: false,
            jobs: 1,
            verbose: true,
        }
    }
}

impl PipelineConfig {
    /// 命令行阈值：0 表示不按评分筛选
    pub fn score_threshold_from(value: f64) -> Option<f64> {
        if value == 0.0 {
            None
        } else {
            Some(value)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_frames == 0 {
            return Err(MergePrepError::InvalidArgument(
                "minimum frame count must be at least 1".to_string(),
            ));
        }
        if let Some(t) = self.score_threshold {
            if !t.is_finite() {
                return Err(MergePrepError::InvalidArgument(format!(
                    "score threshold must be finite, got {}",
                    t
                )));
            }
        }
        Ok(())
    }

    /// 本次运行启用的写出器，SHELX 总在第一位
    pub fn writers(&self) -> Vec<Box<dyn SolverWriter>> {
        let mut writers: Vec<Box<dyn SolverWriter>> = vec![Box::new(ShelxWriter::new(self.electron))];
        if self.focus {
            writers.push(Box::new(FocusWriter));
        }
        if self.superflip {
            writers.push(Box::new(SuperflipWriter));
        }
        writers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_threshold_disables_selection() {
        assert_eq!(PipelineConfig::score_threshold_from(0.0), None);
        assert_eq!(PipelineConfig::score_threshold_from(50.0), Some(50.0));
    }

    #[test]
    fn test_writers() {
        let config = PipelineConfig {
            superflip: true,
            ..Default::default()
        };
        let names: Vec<&str> = config.writers().iter().map(|w| w.name()).collect();
        assert_eq!(names, vec!["shelx", "superflip"]);
    }

    #[test]
    fn test_validate() {
        assert!(PipelineConfig::default().validate().is_ok());
        let config = PipelineConfig {
            min_frames: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
