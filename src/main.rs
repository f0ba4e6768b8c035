//! # mergeprep - 串行衍射数据合并工具
//!
//! 按物相合并串行（电子）衍射的单帧衍射点数据，可选地做强度变换，
//! 并生成结构解析程序的输入文件。
//!
//! ## 子命令
//! - `merge` - 按物相选帧、合并并写出 SHELX/FOCUS/Superflip 输入
//! - `kleinify` - 单个 .hkl 文件的强/中/弱分级
//! - `histogram` - 单个 .hkl 文件的直方图匹配
//! - `presets` - 列出直方图预设
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── pipeline/   (按物相合并流水线)
//!   │     ├── intensity/  (强度变换)
//!   │     ├── reference/  (参考直方图与预设)
//!   │     ├── parsers/    (格式解析器)
//!   │     └── writers/    (求解器输入写出)
//!   ├── diffraction/ (散射因子与结构因子)
//!   ├── models/     (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod diffraction;
mod error;
mod intensity;
mod models;
mod parsers;
mod pipeline;
mod reference;
mod utils;
mod writers;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
