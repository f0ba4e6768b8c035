//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `pipeline/`, `intensity/`, `reference/`, `utils/`
//! - 子模块: merge, transform, presets

pub mod merge;
pub mod presets;
pub mod transform;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Merge(args) => merge::execute(args),
        Commands::Kleinify(args) => transform::execute_kleinify(args),
        Commands::Histogram(args) => transform::execute_histogram(args),
        Commands::Presets(args) => presets::execute(args),
    }
}
