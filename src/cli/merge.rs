//! # merge 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/merge.rs`

use clap::Args;
use std::path::PathBuf;

/// merge 子命令参数
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Path to the results table (ycsv: CSV with a YAML metadata header)
    pub results: PathBuf,

    /// Minimum score for a frame to be merged (0 = merge every .hkl in the output directory)
    #[arg(short = 't', long, default_value_t = 100.0)]
    pub threshold: f64,

    /// Write electron scattering factors into the SHELX instruction file
    #[arg(short, long, default_value_t = false)]
    pub electron: bool,

    /// Rank reflection intensities as strong/medium/weak
    #[arg(short, long, default_value_t = false)]
    pub kleinify: bool,

    /// Strong threshold (<= 1: fraction of max, > 1: percentile)
    #[arg(long, default_value_t = 90.0)]
    pub strong: f64,

    /// Weak threshold (<= 1: fraction of max, > 1: percentile)
    #[arg(long, default_value_t = 60.0)]
    pub weak: f64,

    /// Directory to save output to
    #[arg(short, long, default_value = ".")]
    pub destination: PathBuf,

    /// Match intensities to a histogram: reference file (.cif, .res, .ins, .hkl, .data), preset name or comma-separated intensities
    #[arg(short = 'm', long)]
    pub histogram: Option<String>,

    /// Also write a FOCUS input file
    #[arg(short, long, default_value_t = false)]
    pub focus: bool,

    /// Also write a Superflip input file
    #[arg(short, long, default_value_t = false)]
    pub superflip: bool,

    /// Minimum number of frames required to merge a phase
    #[arg(long, default_value_t = 10)]
    pub min_frames: usize,

    /// Resolution limit (Å) for structure-model histogram references
    #[arg(long, default_value_t = 1.0)]
    pub dmin: f64,

    /// Directory with stored histogram presets (<NAME>.data)
    #[arg(long, env = "MERGEPREP_PRESET_DIR")]
    pub preset_dir: Option<PathBuf>,

    /// Number of phases processed in parallel (1 = sequential, 0 = one per CPU)
    #[arg(short, long, default_value_t = 1)]
    pub jobs: usize,

    /// Do not print per-frame merge diagnostics
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,
}
