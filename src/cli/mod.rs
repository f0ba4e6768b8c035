//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `merge`: 按物相合并单帧数据并生成求解器输入
//! - `kleinify`: 对单个 .hkl 文件做强/中/弱分级
//! - `histogram`: 对单个 .hkl 文件做直方图匹配
//! - `presets`: 列出直方图预设
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: merge, transform

pub mod merge;
pub mod transform;

use clap::{Parser, Subcommand};

/// mergeprep - 串行衍射数据合并与结构解析输入准备
#[derive(Parser)]
#[command(name = "mergeprep")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "Merge serial diffraction data per phase and prepare structure-solution input files",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Merge per-frame reflection files for every phase in a results table
    Merge(merge::MergeArgs),

    /// Rank intensities of one reflection file as strong/medium/weak
    Kleinify(transform::KleinifyArgs),

    /// Match intensities of one reflection file to a reference histogram
    Histogram(transform::HistogramArgs),

    /// List available histogram presets
    Presets(transform::PresetsArgs),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_merge_defaults() {
        let cli = Cli::try_parse_from(["mergeprep", "merge", "results.csv"]).unwrap();
        let Commands::Merge(args) = cli.command else {
            panic!("expected merge");
        };
        assert_eq!(args.threshold, 100.0);
        assert_eq!(args.strong, 90.0);
        assert_eq!(args.weak, 60.0);
        assert_eq!(args.min_frames, 10);
        assert_eq!(args.jobs, 1);
        assert!(!args.kleinify && !args.electron && !args.focus && !args.superflip);
    }

    #[test]
    fn test_merge_flags() {
        let cli = Cli::try_parse_from([
            "mergeprep", "merge", "r.csv", "-t", "0", "-e", "-k", "-d", "out", "-m", "NaCl", "-f", "-s", "-q",
        ])
        .unwrap();
        let Commands::Merge(args) = cli.command else {
            panic!("expected merge");
        };
        assert_eq!(args.threshold, 0.0);
        assert_eq!(args.histogram.as_deref(), Some("NaCl"));
        assert!(args.kleinify && args.electron && args.focus && args.superflip && args.quiet);
        assert_eq!(args.destination.to_str(), Some("out"));
    }

    #[test]
    fn test_histogram_requires_reference() {
        assert!(Cli::try_parse_from(["mergeprep", "histogram", "A.hkl"]).is_err());
    }
}
