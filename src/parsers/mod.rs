//! # 解析器模块
//!
//! 结果表、衍射数据和结构模型文件的读写。
//!
//! ## 依赖关系
//! - 被 `commands/`, `pipeline/`, `reference.rs` 使用
//! - 使用 `models/` 数据模型
//! - 子模块: results, hkl, cif, res

pub mod cif;
pub mod hkl;
pub mod res;
pub mod results;

use crate::error::{MergePrepError, Result};
use crate::models::StructureModel;

use std::fs;
use std::path::Path;

/// 参考文件内容：直接给出的强度，或需要计算强度的结构模型
#[derive(Debug, Clone)]
pub enum ReferenceData {
    Intensities(Vec<f64>),
    Structure(StructureModel),
}

/// 从扩展名推断格式并读取参考文件
pub fn parse_reference_file(path: &Path) -> Result<ReferenceData> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "hkl" => Ok(ReferenceData::Intensities(
            hkl::parse_hkl_file(path)?.intensities(),
        )),
        "data" => Ok(ReferenceData::Intensities(parse_data_file(path)?)),
        "cif" => Ok(ReferenceData::Structure(cif::parse_cif_file(path)?)),
        "res" | "ins" => Ok(ReferenceData::Structure(res::parse_res_file(path)?)),
        _ => Err(MergePrepError::UnsupportedFormat(format!(
            "Cannot determine histogram reference format for: {}",
            path.display()
        ))),
    }
}

/// 空白分隔的表格，取第 6 列为强度；注释行与列数不足的行跳过
pub fn parse_data_file(path: &Path) -> Result<Vec<f64>> {
    let content = fs::read_to_string(path).map_err(|e| MergePrepError::read(path, e))?;
    Ok(parse_data_content(&content))
}

pub fn parse_data_content(content: &str) -> Vec<f64> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().nth(5)?.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_data_content() {
        let content = "# h k l d F I\n1 0 0 5.0 10.0 100.0\n1 1 0 3.5 5.0 25.0\nshort line\n";
        assert_eq!(parse_data_content(content), vec![100.0, 25.0]);
    }

    #[test]
    fn test_dispatch_by_extension() {
        let dir = tempdir().unwrap();

        let hkl = dir.path().join("ref.hkl");
        fs::write(&hkl, "   1   0   0    50.0    1.00\n").unwrap();
        assert!(matches!(
            parse_reference_file(&hkl).unwrap(),
            ReferenceData::Intensities(v) if v == vec![50.0]
        ));

        let res = dir.path().join("ref.ins");
        fs::write(&res, "CELL 0.02 4 4 4 90 90 90\nSFAC Cu\nCu1 1 0 0 0\nEND\n").unwrap();
        assert!(matches!(
            parse_reference_file(&res).unwrap(),
            ReferenceData::Structure(_)
        ));

        let other = dir.path().join("ref.xyz");
        fs::write(&other, "").unwrap();
        assert!(matches!(
            parse_reference_file(&other),
            Err(MergePrepError::UnsupportedFormat(_))
        ));
    }
}
