//! # 数据模型模块
//!
//! 定义衍射点、结果表、物相描述和结构模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `pipeline/`, `writers/` 使用
//! - 子模块: reflection, results, phase, structure, symmetry

pub mod phase;
pub mod reflection;
pub mod results;
pub mod structure;
pub mod symmetry;

pub use phase::PhaseDescriptor;
pub use reflection::{ReflectionList, ReflectionRecord};
pub use results::{FrameResult, ResultsTable, RunMetadata};
pub use structure::{Atom, StructureModel, UnitCell};
pub use symmetry::{Centering, SymOp, Symmetry};
