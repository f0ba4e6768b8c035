//! # 强度变换模块
//!
//! 合并后强度列上的两种变换。
//!
//! ## 子模块
//! - `classify`: 强/中/弱分级 (kleinify)
//! - `histogram`: 直方图（秩轮廓）匹配
//! - `stats`: 百分位数、插值等数值工具
//!
//! ## 依赖关系
//! - 被 `pipeline/` 和 `commands/transform.rs` 使用
//! - 纯计算，无 I/O

pub mod classify;
pub mod histogram;
pub mod stats;

pub use classify::{kleinify, ClassificationSummary, Thresholds};
pub use histogram::RankProfile;
