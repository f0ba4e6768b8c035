//! # 美化输出工具
//!
//! 统一的带标签终端输出：`[OK]`, `[ERR]`, `[WARN]`, `[*]`, `[SKIP]`, `[DONE]`。
//! 错误写到 stderr，其余写到 stdout。
//!
//! ## 依赖关系
//! - 被 `commands/`, `pipeline/` 使用
//! - 使用 `colored` crate

use colored::{ColoredString, Colorize};

/// 消息标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Ok,
    Err,
    Warn,
    Info,
    Skip,
    Done,
}

impl Tag {
    fn label(self) -> ColoredString {
        match self {
            Tag::Ok => "[OK]".green().bold(),
            Tag::Err => "[ERR]".red().bold(),
            Tag::Warn => "[WARN]".yellow().bold(),
            Tag::Info => "[*]".blue().bold(),
            Tag::Skip => "[SKIP]".dimmed(),
            Tag::Done => "[DONE]".green().bold(),
        }
    }
}

/// 打印带标签的消息
pub fn print_tagged(tag: Tag, msg: &str) {
    if tag == Tag::Err {
        eprintln!("{} {}", tag.label(), msg);
    } else {
        println!("{} {}", tag.label(), msg);
    }
}

pub fn print_success(msg: &str) {
    print_tagged(Tag::Ok, msg);
}

pub fn print_error(msg: &str) {
    print_tagged(Tag::Err, msg);
}

pub fn print_warning(msg: &str) {
    print_tagged(Tag::Warn, msg);
}

pub fn print_info(msg: &str) {
    print_tagged(Tag::Info, msg);
}

pub fn print_skip(msg: &str) {
    print_tagged(Tag::Skip, msg);
}

pub fn print_done(msg: &str) {
    print_tagged(Tag::Done, msg);
}

/// 单个物相的诊断输出，带物相标签前缀
pub fn print_phase(phase: &str, msg: &str) {
    println!("{} {}", format!("[{}]", phase).cyan().bold(), msg);
}

/// 打印写出的文件：`[OK] shelx -> out/A.ins`
pub fn print_written(kind: &str, path: &str) {
    print_success(&format!("{} {} {}", kind.dimmed(), "->".cyan(), path));
}

/// 打印标题栏
pub fn print_header(title: &str) {
    let line = "─".repeat(60);
    println!("\n{}", line.dimmed());
    println!("  {}", title.bold());
    println!("{}\n", line.dimmed());
}

/// 打印分隔线
pub fn print_separator() {
    println!("{}", "─".repeat(60).dimmed());
}
