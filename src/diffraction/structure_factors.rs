//! # 结构因子计算器
//!
//! 从结构模型计算结构因子振幅，用作直方图匹配的参考分布。
//!
//! ## 算法概述
//! 1. 将不对称单元展开为 P1 原子列表
//! 2. 遍历分辨率球 (d ≥ dmin) 内的 (hkl)，每个等效类只取一个代表
//! 3. F(hkl) = Σⱼ occⱼ fⱼ(s) exp(-8π² Uⱼ s²) exp(2πi(hxⱼ + kyⱼ + lzⱼ))，s = 1/(2d)
//! 4. 丢弃系统消光（|F| ≈ 0）
//!
//! ## 依赖关系
//! - 被 `reference.rs` 调用
//! - 使用 `models/structure.rs`, `models/symmetry.rs`
//! - 使用注入的 `diffraction/scattering.rs` 散射因子表

use crate::diffraction::scattering::{element_symbol, GaussianParams, ScatteringTable};
use crate::error::{MergePrepError, Result};
use crate::models::symmetry::hkl_representative;
use crate::models::StructureModel;

use std::collections::HashMap;
use std::f64::consts::PI;

/// 单个衍射点的结构因子
#[derive(Debug, Clone, PartialEq)]
pub struct StructureFactor {
    pub h: i32,
    pub k: i32,
    pub l: i32,
    /// d 间距（Å）
    pub d_spacing: f64,
    /// |F|
    pub amplitude: f64,
}

/// 结构因子计算器
pub struct StructureFactorCalculator<'a> {
    table: &'a dyn ScatteringTable,
    /// 分辨率极限（Å）
    dmin: f64,
}

impl<'a> StructureFactorCalculator<'a> {
    pub fn new(table: &'a dyn ScatteringTable, dmin: f64) -> Self {
        Self { table, dmin }
    }

    /// 计算分辨率极限内所有独立衍射点的结构因子
    pub fn calculate(&self, model: &StructureModel) -> Result<Vec<StructureFactor>> {
        if !(self.dmin > 0.0) {
            return Err(MergePrepError::InvalidArgument(format!(
                "resolution limit must be positive, got {}",
                self.dmin
            )));
        }

        let atoms = model.expand_to_p1();
        if atoms.is_empty() {
            return Err(MergePrepError::InvalidArgument(format!(
                "structure model '{}' contains no atoms",
                model.name
            )));
        }

        // 每种元素只查一次表
        let mut params: HashMap<String, GaussianParams> = HashMap::new();
        for atom in &atoms {
            let symbol = element_symbol(&atom.element).unwrap_or_default();
            if params.contains_key(&symbol) {
                continue;
            }
            let p = self
                .table
                .params(&symbol)
                .ok_or_else(|| MergePrepError::UnknownElement {
                    element: atom.element.clone(),
                    table: self.table.name().to_string(),
                })?;
            params.insert(symbol, p);
        }
        let sites: Vec<(&GaussianParams, f64, f64, [f64; 3])> = atoms
            .iter()
            .map(|atom| {
                let symbol = element_symbol(&atom.element).unwrap_or_default();
                (&params[&symbol], atom.occupancy, atom.uiso, atom.position)
            })
            .collect();

        let cell = &model.cell;
        let recip = cell.reciprocal_metric();
        let ops = model.symmetry.expanded();
        let q_max = 1.0 / (self.dmin * self.dmin);

        let h_max = (cell.a / self.dmin).floor() as i32;
        let k_max = (cell.b / self.dmin).floor() as i32;
        let l_max = (cell.c / self.dmin).floor() as i32;

        let mut factors = Vec::new();

        for h in -h_max..=h_max {
            for k in -k_max..=k_max {
                for l in -l_max..=l_max {
                    if h == 0 && k == 0 && l == 0 {
                        continue;
                    }

                    let hkl = [h, k, l];
                    let q = cell.inv_d_squared(hkl, &recip);
                    if q > q_max || q <= 0.0 {
                        continue;
                    }

                    // 只保留等效类代表
                    if hkl_representative(&ops, hkl) != hkl {
                        continue;
                    }

                    let s = q.sqrt() / 2.0;
                    let amplitude = structure_factor(&sites, hkl, s);

                    // 跳过系统消光
                    if amplitude < 1e-6 {
                        continue;
                    }

                    factors.push(StructureFactor {
                        h,
                        k,
                        l,
                        d_spacing: cell.d_spacing(hkl),
                        amplitude,
                    });
                }
            }
        }

        Ok(factors)
    }
}

/// |F(hkl)|
fn structure_factor(sites: &[(&GaussianParams, f64, f64, [f64; 3])], hkl: [i32; 3], s: f64) -> f64 {
    let mut f_real = 0.0;
    let mut f_imag = 0.0;

    for (params, occupancy, uiso, position) in sites {
        let debye_waller = (-8.0 * PI * PI * uiso * s * s).exp();
        let f_atom = occupancy * params.calculate(s) * debye_waller;

        let phase = 2.0
            * PI
            * (hkl[0] as f64 * position[0] + hkl[1] as f64 * position[1] + hkl[2] as f64 * position[2]);

        f_real += f_atom * phase.cos();
        f_imag += f_atom * phase.sin();
    }

    (f_real * f_real + f_imag * f_imag).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diffraction::scattering::XrayTable;
    use crate::models::{Atom, Centering, Symmetry, UnitCell};

    fn nacl() -> StructureModel {
        StructureModel::new(
            "NaCl",
            UnitCell::new(5.64, 5.64, 5.64, 90.0, 90.0, 90.0),
            Symmetry::new(vec![], Centering::F, true),
            vec![
                Atom::new("Na", [0.0, 0.0, 0.0]),
                Atom::new("Cl", [0.5, 0.5, 0.5]),
            ],
        )
    }

    #[test]
    fn test_nacl_extinctions() {
        let calc = StructureFactorCalculator::new(&XrayTable, 1.0);
        let factors = calc.calculate(&nacl()).unwrap();

        assert!(!factors.is_empty());
        // F 心点阵：h, k, l 必须全奇或全偶
        for f in &factors {
            let parity = [f.h, f.k, f.l].map(|v| v.rem_euclid(2));
            assert!(parity.iter().all(|p| *p == parity[0]), "({} {} {})", f.h, f.k, f.l);
            assert!(f.d_spacing >= 1.0 - 1e-9);
        }
    }

    #[test]
    fn test_nacl_200_stronger_than_111() {
        let calc = StructureFactorCalculator::new(&XrayTable, 1.0);
        let factors = calc.calculate(&nacl()).unwrap();

        let find = |d: f64| {
            factors
                .iter()
                .find(|f| (f.d_spacing - d).abs() < 1e-6)
                .map(|f| f.amplitude)
                .unwrap()
        };
        let f111 = find(5.64 / 3f64.sqrt());
        let f200 = find(5.64 / 2.0);
        assert!(f200 > f111);
    }

    #[test]
    fn test_friedel_pairs_merged() {
        let model = StructureModel::new(
            "P1",
            UnitCell::new(3.0, 3.0, 3.0, 90.0, 90.0, 90.0),
            Symmetry::default(),
            vec![Atom::new("Si", [0.1, 0.2, 0.3])],
        );
        let calc = StructureFactorCalculator::new(&XrayTable, 1.5);
        let factors = calc.calculate(&model).unwrap();

        let has = |h: i32, k: i32, l: i32| factors.iter().any(|f| (f.h, f.k, f.l) == (h, k, l));
        assert!(has(1, 0, 0));
        assert!(!has(-1, 0, 0));
    }

    #[test]
    fn test_unknown_element() {
        let model = StructureModel::new(
            "X",
            UnitCell::new(3.0, 3.0, 3.0, 90.0, 90.0, 90.0),
            Symmetry::default(),
            vec![Atom::new("Xx", [0.0, 0.0, 0.0])],
        );
        let calc = StructureFactorCalculator::new(&XrayTable, 1.0);
        assert!(matches!(
            calc.calculate(&model),
            Err(MergePrepError::UnknownElement { .. })
        ));
    }
}
