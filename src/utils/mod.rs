//! # 工具函数模块
//!
//! 提供美化输出、进度条与原子文件写入。
//!
//! ## 依赖关系
//! - 被 `commands/`, `pipeline/`, `writers/` 使用
//! - 子模块: output, progress, fs

pub mod fs;
pub mod output;
pub mod progress;
