//! # 物相执行器
//!
//! 在 rayon 线程池上执行各物相任务，并按物相顺序汇总结果。
//! jobs = 1 时顺序执行，jobs = 0 时每个 CPU 一个线程。
//!
//! ## 依赖关系
//! - 被 `pipeline/mod.rs` 调用
//! - 使用 `rayon`, `num_cpus`

use crate::error::{MergePrepError, Result};
use crate::intensity::ClassificationSummary;

use rayon::prelude::*;
use std::path::PathBuf;

/// 成功物相的摘要
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSummary {
    pub phase: String,
    pub frames: usize,
    /// 合并后独立衍射点数
    pub reflections: usize,
    pub classification: Option<ClassificationSummary>,
    /// 写出的文件（合并 .hkl 在前）
    pub outputs: Vec<PathBuf>,
}

/// 单个物相的处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum PhaseOutcome {
    Success(PhaseSummary),
    /// 帧数不足 (物相, 帧数)
    Skipped(String, usize),
    /// 处理失败 (物相, 错误信息)
    Failed(String, String),
}

impl PhaseOutcome {
    pub fn phase(&self) -> &str {
        match self {
            PhaseOutcome::Success(s) => &s.phase,
            PhaseOutcome::Skipped(phase, _) | PhaseOutcome::Failed(phase, _) => phase,
        }
    }
}

/// 整次运行的结果，按物相标签排序
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub outcomes: Vec<PhaseOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> Vec<&PhaseSummary> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                PhaseOutcome::Success(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                PhaseOutcome::Skipped(phase, _) => Some(phase.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn failed(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                PhaseOutcome::Failed(phase, err) => Some((phase.as_str(), err.as_str())),
                _ => None,
            })
            .collect()
    }
}

/// 物相执行器
pub struct PhaseRunner {
    jobs: usize,
}

impl PhaseRunner {
    pub fn new(jobs: usize) -> Self {
        let jobs = if jobs == 0 { num_cpus::get() } else { jobs };
        Self { jobs }
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// 执行全部任务，结果顺序与任务顺序一致
    pub fn run<T, F>(&self, tasks: &[T], processor: F) -> Result<RunReport>
    where
        T: Sync,
        F: Fn(&T) -> PhaseOutcome + Sync + Send,
    {
        if self.jobs == 1 {
            return Ok(RunReport {
                outcomes: tasks.iter().map(&processor).collect(),
            });
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .build()
            .map_err(|e| MergePrepError::Other(format!("failed to start worker pool: {}", e)))?;

        let outcomes: Vec<PhaseOutcome> = pool.install(|| tasks.par_iter().map(&processor).collect());
        Ok(RunReport { outcomes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(task: &u32) -> PhaseOutcome {
        let phase = format!("P{}", task);
        match task % 3 {
            0 => PhaseOutcome::Success(PhaseSummary {
                phase,
                frames: 10,
                reflections: 100,
                classification: None,
                outputs: vec![],
            }),
            1 => PhaseOutcome::Skipped(phase, 3),
            _ => PhaseOutcome::Failed(phase, "boom".to_string()),
        }
    }

    #[test]
    fn test_sequential_and_parallel_agree() {
        let tasks: Vec<u32> = (0..9).collect();
        let seq = PhaseRunner::new(1).run(&tasks, outcome).unwrap();
        let par = PhaseRunner::new(4).run(&tasks, outcome).unwrap();

        assert_eq!(seq.outcomes, par.outcomes);
        assert_eq!(seq.succeeded().len(), 3);
        assert_eq!(seq.skipped(), vec!["P1", "P4", "P7"]);
        assert_eq!(seq.failed()[0], ("P2", "boom"));
    }

    #[test]
    fn test_zero_jobs_uses_cpus() {
        assert!(PhaseRunner::new(0).jobs() >= 1);
    }
}
