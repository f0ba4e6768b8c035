//! # 物相描述
//!
//! 每个物相标签对应一个不可变的 `PhaseDescriptor`，提供输出文件所需的
//! 晶胞、空间群、对称操作和晶胞内化学组成。
//!
//! ## 依赖关系
//! - 由 `parsers/results.rs` 从结果表元数据构造
//! - 被 `pipeline/`, `writers/` 只读使用

use crate::models::structure::UnitCell;
use crate::models::symmetry::Symmetry;

use std::collections::BTreeMap;

/// 单个物相的晶体学与组成信息
#[derive(Debug, Clone)]
pub struct PhaseDescriptor {
    /// 物相标签（与结果表 `phase` 列一致）
    pub name: String,
    pub cell: UnitCell,
    /// 空间群符号，如 "P n m a"
    pub space_group: String,
    pub symmetry: Symmetry,
    /// 晶胞内各元素原子数
    pub composition: BTreeMap<String, f64>,
}

impl PhaseDescriptor {
    /// 元素列表（按组成表顺序）
    pub fn elements(&self) -> Vec<&str> {
        self.composition.keys().map(|s| s.as_str()).collect()
    }

    /// 化学式字符串，如 "O192 Si96"
    pub fn formula(&self) -> String {
        self.composition
            .iter()
            .map(|(el, n)| format!("{}{}", el, format_count(*n)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// 晶胞内原子数，按元素顺序
    pub fn unit_counts(&self) -> Vec<f64> {
        self.composition.values().copied().collect()
    }
}

/// 整数组成不带小数点
pub fn format_count(n: f64) -> String {
    if (n - n.round()).abs() < 1e-9 {
        format!("{}", n.round() as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula() {
        let mut composition = BTreeMap::new();
        composition.insert("Si".to_string(), 96.0);
        composition.insert("O".to_string(), 192.0);
        let phase = PhaseDescriptor {
            name: "MFI".to_string(),
            cell: UnitCell::new(20.1, 19.7, 13.1, 90.0, 90.0, 90.0),
            space_group: "P n m a".to_string(),
            symmetry: Symmetry::default(),
            composition,
        };

        assert_eq!(phase.formula(), "O192 Si96");
        assert_eq!(phase.elements(), vec!["O", "Si"]);
        assert_eq!(phase.unit_counts(), vec![192.0, 96.0]);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(4.0), "4");
        assert_eq!(format_count(2.5), "2.5");
    }
}
