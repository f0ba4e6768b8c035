//! # 单个物相的处理
//!
//! 选帧 → 帧数检查 → 合并 → (分级) → (直方图匹配) → 写出 .hkl → 求解器输入文件。
//!
//! 两种强度变换同时启用时先分级、后直方图匹配。
//! 该物相内的任何错误都转换为 `PhaseOutcome::Failed`，不影响其他物相。
//!
//! ## 依赖关系
//! - 被 `pipeline/mod.rs` 调用
//! - 使用 `pipeline/selection.rs`, `pipeline/merge.rs`, `intensity/`, `writers/`

use crate::error::{MergePrepError, Result};
use crate::intensity::kleinify;
use crate::models::{FrameResult, RunMetadata};
use crate::parsers::hkl::write_hkl_file;
use crate::pipeline::config::PipelineConfig;
use crate::pipeline::merge::SerialMerge;
use crate::pipeline::runner::{PhaseOutcome, PhaseSummary};
use crate::pipeline::selection::select_frames;
use crate::utils::output;
use crate::writers::WriterInput;

use std::path::Path;

/// 一个物相的待处理任务
#[derive(Debug, Clone)]
pub struct PhaseTask {
    pub phase: String,
    pub rows: Vec<FrameResult>,
}

/// 各物相共享的只读上下文
#[derive(Debug, Clone, Copy)]
pub struct PhaseContext<'a> {
    pub config: &'a PipelineConfig,
    pub metadata: &'a RunMetadata,
    /// 结果表所在目录
    pub base_dir: &'a Path,
}

/// 处理一个物相，错误不向外传播
pub fn process_phase(ctx: &PhaseContext, task: &PhaseTask) -> PhaseOutcome {
    match try_process_phase(ctx, task) {
        Ok(outcome) => outcome,
        Err(e) => PhaseOutcome::Failed(task.phase.clone(), e.to_string()),
    }
}

fn try_process_phase(ctx: &PhaseContext, task: &PhaseTask) -> Result<PhaseOutcome> {
    let config = ctx.config;
    let phase = &task.phase;
    let descriptor = ctx
        .metadata
        .phase(phase)
        .ok_or_else(|| MergePrepError::UnknownPhase(phase.clone()))?;

    let rows: Vec<&FrameResult> = task.rows.iter().collect();
    let files = select_frames(
        &rows,
        config.score_threshold,
        ctx.base_dir,
        &ctx.metadata.drc_out,
    )?;

    if files.len() < config.min_frames {
        output::print_skip(&format!(
            "Not enough frames to merge for phase '{}' ({} < {})",
            phase,
            files.len(),
            config.min_frames
        ));
        return Ok(PhaseOutcome::Skipped(phase.clone(), files.len()));
    }
    output::print_info(&format!("Now merging phase '{}' ({} frames)", phase, files.len()));

    let hkl_path = config.destination.join(format!("{}.hkl", phase));
    let (mut merged, stats) = SerialMerge::new(phase.as_str())
        .verbose(config.verbose)
        .show_progress(config.jobs == 1)
        .merge_to_file(&files, &hkl_path)?;

    let mut classification = None;
    if let Some(thresholds) = &config.kleinify {
        let mut intensities = merged.intensities();
        let summary = kleinify(&mut intensities, thresholds)?;
        merged.set_intensities(&intensities)?;
        output::print_phase(phase, &summary.to_string());
        classification = Some(summary);
    }

    if let Some(profile) = &config.histogram {
        let matched = profile.apply(&merged.intensities());
        merged.set_intensities(&matched)?;
        output::print_phase(
            phase,
            &format!("Intensities matched to reference ({} values)", profile.len()),
        );
    }

    if config.kleinify.is_some() || config.histogram.is_some() {
        write_hkl_file(&hkl_path, &merged)?;
    }

    let input = WriterInput {
        phase: descriptor,
        wavelength: ctx.metadata.wavelength,
        hkl_path: &hkl_path,
    };
    let mut outputs = vec![hkl_path.clone()];
    for writer in config.writers() {
        let path = writer.write(&input, &config.destination)?;
        output::print_written(writer.name(), &path.display().to_string());
        outputs.push(path);
    }

    Ok(PhaseOutcome::Success(PhaseSummary {
        phase: phase.clone(),
        frames: stats.frames,
        reflections: stats.unique,
        classification,
        outputs,
    }))
}
