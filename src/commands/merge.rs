//! # merge 命令实现
//!
//! 读取结果表，构造流水线配置，按物相合并并打印汇总表。
//!
//! ## 依赖关系
//! - 使用 `cli/merge.rs` 定义的参数
//! - 使用 `parsers/results.rs`, `reference/`, `pipeline/`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::cli::merge::MergeArgs;
use crate::error::{MergePrepError, Result};
use crate::intensity::{RankProfile, Thresholds};
use crate::parsers::results::parse_results_file;
use crate::pipeline::{MergePipeline, PhaseOutcome, PhaseSummary, PipelineConfig, RunReport};
use crate::reference::HistogramReference;
use crate::utils::{output, progress};

use std::path::Path;
use tabled::{Table, Tabled};

/// 汇总表的一行
#[derive(Debug, Clone, Tabled)]
struct ReportRow {
    #[tabled(rename = "Phase")]
    phase: String,
    #[tabled(rename = "Frames")]
    frames: String,
    #[tabled(rename = "Reflections")]
    reflections: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Outputs")]
    outputs: String,
}

/// 执行 merge 命令
pub fn execute(args: MergeArgs) -> Result<()> {
    output::print_header("Merging Serial Diffraction Data");

    if !args.results.is_file() {
        return Err(MergePrepError::FileNotFound {
            path: args.results.display().to_string(),
        });
    }

    let kleinify = if args.kleinify {
        Some(Thresholds::new(args.strong, args.weak)?)
    } else {
        None
    };

    // 参考直方图在处理任何物相之前解析
    let histogram = match &args.histogram {
        Some(arg) => Some(resolve_reference(arg, args.dmin, args.preset_dir.as_deref())?),
        None => None,
    };

    let (metadata, table) = parse_results_file(&args.results)?;
    let base_dir = args
        .results
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    for descriptor in metadata.phases.values() {
        output::print_info(&format!(
            "Phase {}: {}, {}, V = {:.1} Å³",
            descriptor.name,
            descriptor.space_group,
            descriptor.formula(),
            descriptor.cell.volume()
        ));
    }

    let score_threshold = PipelineConfig::score_threshold_from(args.threshold);
    output::print_info(&format!(
        "{} frames, {} phases, wavelength {} Å",
        table.rows.len(),
        metadata.phases.len(),
        metadata.wavelength
    ));
    match score_threshold {
        Some(t) => output::print_info(&format!("Selecting frames with score > {}", t)),
        None => output::print_info(&format!(
            "No score threshold, merging every .hkl in '{}'",
            metadata.drc_out.display()
        )),
    }
    if let Some(t) = &kleinify {
        output::print_info(&format!("Kleinify: strong {}, weak {}", t.strong, t.weak));
    }

    let config = PipelineConfig {
        score_threshold,
        min_frames: args.min_frames,
        kleinify,
        histogram,
        destination: args.destination.clone(),
        electron: args.electron,
        focus: args.focus,
        superflip: args.superflip,
        jobs: args.jobs,
        verbose: !args.quiet,
    };

    let pipeline = MergePipeline::new(config, metadata, table, base_dir)?;
    let report = pipeline.run()?;

    output::print_separator();
    print_report(&report);
    summarize(&report, &args.destination);

    Ok(())
}

/// 解析参考直方图，显示 spinner
fn resolve_reference(arg: &str, dmin: f64, preset_dir: Option<&Path>) -> Result<RankProfile> {
    let reference = HistogramReference::from_arg(arg);
    let spinner = progress::create_spinner(&format!("Resolving histogram reference {}", reference));
    let profile = reference.resolve(dmin, preset_dir);
    spinner.finish_and_clear();

    let profile = profile?;
    output::print_info(&format!(
        "Histogram reference {}: {} intensities, max {:.1}",
        reference,
        profile.len(),
        profile.max()
    ));
    Ok(profile)
}

fn report_rows(report: &RunReport) -> Vec<ReportRow> {
    report
        .outcomes
        .iter()
        .map(|outcome| {
            let phase = outcome.phase().to_string();
            match outcome {
                PhaseOutcome::Success(s) => ReportRow {
                    phase,
                    frames: s.frames.to_string(),
                    reflections: s.reflections.to_string(),
                    status: success_status(s),
                    outputs: output_names(s),
                },
                PhaseOutcome::Skipped(_, frames) => ReportRow {
                    phase,
                    frames: frames.to_string(),
                    reflections: "-".to_string(),
                    status: "skipped".to_string(),
                    outputs: "-".to_string(),
                },
                PhaseOutcome::Failed(..) => ReportRow {
                    phase,
                    frames: "-".to_string(),
                    reflections: "-".to_string(),
                    status: "failed".to_string(),
                    outputs: "-".to_string(),
                },
            }
        })
        .collect()
}

fn success_status(summary: &PhaseSummary) -> String {
    match &summary.classification {
        Some(c) => format!("merged (S/M/W {}/{}/{})", c.n_strong, c.n_medium, c.n_weak),
        None => "merged".to_string(),
    }
}

/// 输出文件名，逗号分隔
fn output_names(summary: &PhaseSummary) -> String {
    summary
        .outputs
        .iter()
        .filter_map(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_report(report: &RunReport) {
    if report.outcomes.is_empty() {
        output::print_warning("Results table contains no phases.");
        return;
    }
    let table = Table::new(report_rows(report));
    println!("{}", table);
}

fn summarize(report: &RunReport, destination: &Path) {
    let skipped = report.skipped();
    if !skipped.is_empty() {
        output::print_warning(&format!(
            "Not enough frames to merge: {}",
            skipped.join(", ")
        ));
    }
    for (phase, err) in report.failed() {
        output::print_warning(&format!("Phase {} failed: {}", phase, err));
    }

    output::print_done(&format!(
        "Merged {} of {} phases into '{}'",
        report.succeeded().len(),
        report.outcomes.len(),
        destination.display()
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intensity::ClassificationSummary;
    use std::path::PathBuf;

    #[test]
    fn test_report_rows() {
        let report = RunReport {
            outcomes: vec![
                PhaseOutcome::Success(PhaseSummary {
                    phase: "A".to_string(),
                    frames: 12,
                    reflections: 340,
                    classification: Some(ClassificationSummary {
                        strong_cutoff: 80.0,
                        weak_cutoff: 20.0,
                        n_strong: 30,
                        n_medium: 200,
                        n_weak: 110,
                    }),
                    outputs: vec![PathBuf::from("out/A.hkl"), PathBuf::from("out/A.ins")],
                }),
                PhaseOutcome::Skipped("B".to_string(), 4),
                PhaseOutcome::Failed("C".to_string(), "boom".to_string()),
            ],
        };
        let rows = report_rows(&report);

        assert_eq!(rows[0].outputs, "A.hkl, A.ins");
        assert_eq!(rows[0].reflections, "340");
        assert_eq!(rows[0].status, "merged (S/M/W 30/200/110)");
        assert_eq!(rows[1].status, "skipped");
        assert_eq!(rows[1].frames, "4");
        assert_eq!(rows[2].status, "failed");

        let rendered = Table::new(rows).to_string();
        assert!(rendered.contains("Reflections"));
    }

    #[test]
    fn test_missing_results_file() {
        let args = MergeArgs {
            results: PathBuf::from("/nonexistent/results.csv"),
            threshold: 100.0,
            electron: false,
            kleinify: false,
            strong: 90.0,
            weak: 60.0,
            destination: PathBuf::from("."),
            histogram: None,
            focus: false,
            superflip: false,
            min_frames: 10,
            dmin: 1.0,
            preset_dir: None,
            jobs: 1,
            quiet: true,
        };
        assert!(matches!(
            execute(args),
            Err(MergePrepError::FileNotFound { .. })
        ));
    }
}
