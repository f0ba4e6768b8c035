//! # 进度条工具
//!
//! 封装 `indicatif`：合并时的逐帧进度条，以及解析参考直方图时的 spinner。
//!
//! ## 依赖关系
//! - 被 `pipeline/merge.rs`, `commands/merge.rs`, `commands/transform.rs` 使用
//! - 使用 `indicatif` crate

use indicatif::{ProgressBar, ProgressStyle};

/// 逐帧读取进度条，前缀为物相标签；`show` 为 false 时返回隐藏的进度条
pub fn frame_bar(show: bool, phase: &str, frames: u64) -> ProgressBar {
    if !show {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(frames);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} {prefix:.cyan.bold} [{bar:40.cyan/blue}] {pos}/{len} frames ({eta})",
        )
        .unwrap()
        .progress_chars("#>-"),
    );
    pb.set_prefix(format!("[{}]", phase));
    pb
}

/// 创建 spinner（用于不确定进度的任务）
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {elapsed_precise} {msg}")
            .unwrap()
            .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_frame_bar() {
        let pb = frame_bar(false, "A", 12);
        assert!(pb.is_hidden());
        pb.inc(1);
        pb.finish_and_clear();
    }

    #[test]
    fn test_frame_bar_length() {
        let pb = frame_bar(true, "A", 12);
        assert_eq!(pb.length(), Some(12));
        pb.finish_and_clear();
    }
}
