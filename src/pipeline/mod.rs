//! # 合并流水线
//!
//! 按物相分组结果表，对每个物相独立执行选帧、合并、强度变换和写出。
//!
//! ## 失败语义
//! - 帧数不足：跳过该物相并报告
//! - 单个物相的数据错误：该物相失败并报告，其他物相继续
//! - 配置错误（包括直方图参考）：在构造 `PipelineConfig` 时已终止
//!
//! ## 子模块
//! - `config`: 不可变运行配置
//! - `selection`: 帧选择
//! - `merge`: 串行合并
//! - `phase`: 单个物相的处理步骤
//! - `runner`: 线程池执行与结果汇总
//!
//! ## 依赖关系
//! - 被 `commands/merge.rs` 调用

pub mod config;
pub mod merge;
pub mod phase;
pub mod runner;
pub mod selection;

pub use config::PipelineConfig;
pub use runner::{PhaseOutcome, PhaseRunner, PhaseSummary, RunReport};

use crate::error::Result;
use crate::models::{ResultsTable, RunMetadata};
use crate::utils::fs::ensure_dir;
use crate::utils::output;
use phase::{process_phase, PhaseContext, PhaseTask};

use std::path::PathBuf;

/// 合并流水线
#[derive(Debug)]
pub struct MergePipeline {
    config: PipelineConfig,
    metadata: RunMetadata,
    table: ResultsTable,
    /// 结果表所在目录，相对帧路径的基准
    base_dir: PathBuf,
}

impl MergePipeline {
    pub fn new(
        config: PipelineConfig,
        metadata: RunMetadata,
        table: ResultsTable,
        base_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(MergePipeline {
            config,
            metadata,
            table,
            base_dir: base_dir.into(),
        })
    }

    /// 物相任务，按标签排序
    fn tasks(&self) -> Vec<PhaseTask> {
        self.table
            .group_by_phase()
            .into_iter()
            .map(|(phase, rows)| PhaseTask {
                phase: phase.to_string(),
                rows: rows.into_iter().cloned().collect(),
            })
            .collect()
    }

    /// 处理全部物相
    pub fn run(&self) -> Result<RunReport> {
        ensure_dir(&self.config.destination)?;

        let ctx = PhaseContext {
            config: &self.config,
            metadata: &self.metadata,
            base_dir: &self.base_dir,
        };
        let tasks = self.tasks();
        let runner = PhaseRunner::new(self.config.jobs);
        if runner.jobs() > 1 && tasks.len() > 1 {
            output::print_info(&format!(
                "Processing {} phases on {} workers",
                tasks.len(),
                runner.jobs()
            ));
        }

        runner.run(&tasks, |task| process_phase(&ctx, task))
    }
}
