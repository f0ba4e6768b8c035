//! # 单文件变换与预设子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/transform.rs`, `commands/presets.rs`

use clap::Args;
use std::path::PathBuf;

/// kleinify 子命令参数
#[derive(Args, Debug)]
pub struct KleinifyArgs {
    /// Reflection file (.hkl)
    pub input: PathBuf,

    /// Output file (default: overwrite the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Strong threshold (<= 1: fraction of max, > 1: percentile)
    #[arg(long, default_value_t = 90.0)]
    pub strong: f64,

    /// Weak threshold (<= 1: fraction of max, > 1: percentile)
    #[arg(long, default_value_t = 60.0)]
    pub weak: f64,
}

/// histogram 子命令参数
#[derive(Args, Debug)]
pub struct HistogramArgs {
    /// Reflection file (.hkl)
    pub input: PathBuf,

    /// Reference file (.cif, .res, .ins, .hkl, .data), preset name or comma-separated intensities
    #[arg(short = 'm', long = "histogram")]
    pub reference: String,

    /// Output file (default: overwrite the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Resolution limit (Å) for structure-model references
    #[arg(long, default_value_t = 1.0)]
    pub dmin: f64,

    /// Directory with stored histogram presets (<NAME>.data)
    #[arg(long, env = "MERGEPREP_PRESET_DIR")]
    pub preset_dir: Option<PathBuf>,
}

/// presets 子命令参数
#[derive(Args, Debug)]
pub struct PresetsArgs {
    /// Directory with stored histogram presets (<NAME>.data)
    #[arg(long, env = "MERGEPREP_PRESET_DIR")]
    pub preset_dir: Option<PathBuf>,
}
