//! # 直方图参考
//!
//! 直方图匹配的参考分布在运行开始时解析一次，之后所有物相共用。
//!
//! ## 参考来源
//! - `RawSeries`: 直接给出的强度序列（命令行中以逗号分隔）
//! - `FilePath`: 按扩展名读取 (.hkl / .data / .cif / .res / .ins)
//! - `PresetName`: 预设名（见 `presets.rs`）
//!
//! 结构模型的参考强度为 |F|²，缩放到最大值 9999。
//!
//! ## 依赖关系
//! - 被 `commands/merge.rs`, `commands/transform.rs` 使用
//! - 使用 `parsers/`, `diffraction/`, `intensity/histogram.rs`

pub mod presets;

use crate::diffraction::{StructureFactorCalculator, XrayTable};
use crate::error::Result;
use crate::intensity::RankProfile;
use crate::models::StructureModel;
use crate::parsers::{self, ReferenceData};

use std::fmt;
use std::path::{Path, PathBuf};

/// 结构模型参考强度的最大值
pub const REFERENCE_MAX: f64 = 9999.0;

/// 直方图参考
#[derive(Debug, Clone, PartialEq)]
pub enum HistogramReference {
    RawSeries(Vec<f64>),
    FilePath(PathBuf),
    PresetName(String),
}

impl HistogramReference {
    /// 命令行参数：逗号分隔的数值为强度序列，存在的路径或带扩展名的参数视为文件，其余视为预设名
    pub fn from_arg(arg: &str) -> Self {
        if arg.contains(',') {
            let values: std::result::Result<Vec<f64>, _> =
                arg.split(',').map(|v| v.trim().parse::<f64>()).collect();
            if let Ok(values) = values {
                return HistogramReference::RawSeries(values);
            }
        }

        let path = Path::new(arg);
        if path.exists() || path.extension().is_some() {
            HistogramReference::FilePath(path.to_path_buf())
        } else {
            HistogramReference::PresetName(arg.to_string())
        }
    }

    /// 解析为强度序列
    pub fn intensities(&self, dmin: f64, preset_dir: Option<&Path>) -> Result<Vec<f64>> {
        match self {
            HistogramReference::RawSeries(values) => Ok(values.clone()),
            HistogramReference::FilePath(path) => match parsers::parse_reference_file(path)? {
                ReferenceData::Intensities(values) => Ok(values),
                ReferenceData::Structure(model) => structure_intensities(&model, dmin),
            },
            HistogramReference::PresetName(name) => presets::resolve(name, dmin, preset_dir),
        }
    }

    /// 解析为秩轮廓
    pub fn resolve(&self, dmin: f64, preset_dir: Option<&Path>) -> Result<RankProfile> {
        RankProfile::new(&self.intensities(dmin, preset_dir)?)
    }
}

impl fmt::Display for HistogramReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistogramReference::RawSeries(values) => write!(f, "{} raw values", values.len()),
            HistogramReference::FilePath(path) => write!(f, "{}", path.display()),
            HistogramReference::PresetName(name) => write!(f, "preset '{}'", name),
        }
    }
}

/// 由结构模型计算参考强度
pub fn structure_intensities(model: &StructureModel, dmin: f64) -> Result<Vec<f64>> {
    let factors = StructureFactorCalculator::new(&XrayTable, dmin).calculate(model)?;
    let intensities: Vec<f64> = factors.iter().map(|f| f.amplitude * f.amplitude).collect();
    Ok(scale_to_max(intensities, REFERENCE_MAX))
}

fn scale_to_max(mut values: Vec<f64>, target: f64) -> Vec<f64> {
    let max = values.iter().copied().fold(0.0_f64, f64::max);
    if max > 0.0 {
        for v in &mut values {
            *v *= target / max;
        }
    }
    values
}
