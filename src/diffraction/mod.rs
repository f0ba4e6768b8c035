//! # 衍射计算模块
//!
//! 提供散射因子查询服务和结构因子计算。
//!
//! ## 子模块
//! - `scattering`: X 射线 / 电子原子散射因子表
//! - `structure_factors`: 结构因子振幅计算
//!
//! ## 依赖关系
//! - 被 `reference.rs` 和 `writers/shelx.rs` 使用
//! - 使用 `models/structure.rs`

pub mod scattering;
pub mod structure_factors;

pub use scattering::XrayTable;
pub use structure_factors::StructureFactorCalculator;
