//! # 晶胞与结构模型
//!
//! 定义晶胞参数、原子和结构模型。结构模型只用于计算直方图匹配的参考强度。
//!
//! ## 依赖关系
//! - 被 `parsers/cif.rs`, `parsers/res.rs`, `diffraction/` 使用
//! - 使用 `models/symmetry.rs` 展开等效位置

use crate::models::symmetry::Symmetry;

use serde::{Deserialize, Serialize};

/// 晶胞参数 (a, b, c, α, β, γ)，长度单位 Å，角度单位度
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitCell {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl UnitCell {
    pub fn new(a: f64, b: f64, c: f64, alpha: f64, beta: f64, gamma: f64) -> Self {
        UnitCell {
            a,
            b,
            c,
            alpha,
            beta,
            gamma,
        }
    }

    pub fn from_slice(params: &[f64]) -> Option<Self> {
        match params {
            [a, b, c, alpha, beta, gamma] => Some(UnitCell::new(*a, *b, *c, *alpha, *beta, *gamma)),
            _ => None,
        }
    }

    pub fn parameters(&self) -> [f64; 6] {
        [self.a, self.b, self.c, self.alpha, self.beta, self.gamma]
    }

    /// 度规张量 G
    pub fn metric(&self) -> [[f64; 3]; 3] {
        let (ca, cb, cg) = (
            self.alpha.to_radians().cos(),
            self.beta.to_radians().cos(),
            self.gamma.to_radians().cos(),
        );
        [
            [self.a * self.a, self.a * self.b * cg, self.a * self.c * cb],
            [self.a * self.b * cg, self.b * self.b, self.b * self.c * ca],
            [self.a * self.c * cb, self.b * self.c * ca, self.c * self.c],
        ]
    }

    /// 晶胞体积
    pub fn volume(&self) -> f64 {
        let g = self.metric();
        determinant(&g).max(0.0).sqrt()
    }

    /// 倒易度规张量 G*
    pub fn reciprocal_metric(&self) -> [[f64; 3]; 3] {
        let g = self.metric();
        let det = determinant(&g);
        if det.abs() < 1e-12 {
            return [[0.0; 3]; 3];
        }
        let mut inv = [[0.0; 3]; 3];
        for i in 0..3 {
            for j in 0..3 {
                let (i1, i2) = ((j + 1) % 3, (j + 2) % 3);
                let (j1, j2) = ((i + 1) % 3, (i + 2) % 3);
                inv[i][j] = (g[i1][j1] * g[i2][j2] - g[i1][j2] * g[i2][j1]) / det;
            }
        }
        inv
    }

    /// 1/d² = h·G*·h
    pub fn inv_d_squared(&self, hkl: [i32; 3], reciprocal: &[[f64; 3]; 3]) -> f64 {
        let h = [hkl[0] as f64, hkl[1] as f64, hkl[2] as f64];
        let mut sum = 0.0;
        for i in 0..3 {
            for j in 0..3 {
                sum += h[i] * reciprocal[i][j] * h[j];
            }
        }
        sum
    }

    /// d 间距（Å）
    pub fn d_spacing(&self, hkl: [i32; 3]) -> f64 {
        let q = self.inv_d_squared(hkl, &self.reciprocal_metric());
        if q <= 0.0 {
            f64::INFINITY
        } else {
            1.0 / q.sqrt()
        }
    }
}

fn determinant(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1]) - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// 原子位置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    /// 元素符号
    pub element: String,

    /// 分数坐标 [x, y, z]
    pub position: [f64; 3],

    /// 各向同性位移参数 Uiso (Å²)
    pub uiso: f64,

    /// 占有率
    pub occupancy: f64,

    /// 可选：原子标签
    pub label: Option<String>,
}

impl Atom {
    pub fn new(element: impl Into<String>, position: [f64; 3]) -> Self {
        Atom {
            element: element.into(),
            position,
            uiso: 0.0,
            occupancy: 1.0,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_uiso(mut self, uiso: f64) -> Self {
        self.uiso = uiso;
        self
    }

    pub fn with_occupancy(mut self, occupancy: f64) -> Self {
        self.occupancy = occupancy;
        self
    }
}

/// 结构模型：晶胞 + 对称性 + 不对称单元中的原子
#[derive(Debug, Clone)]
pub struct StructureModel {
    pub name: String,
    pub cell: UnitCell,
    pub symmetry: Symmetry,
    pub atoms: Vec<Atom>,
}

impl StructureModel {
    pub fn new(name: impl Into<String>, cell: UnitCell, symmetry: Symmetry, atoms: Vec<Atom>) -> Self {
        StructureModel {
            name: name.into(),
            cell,
            symmetry,
            atoms,
        }
    }

    /// 展开为 P1 下的全部原子（特殊位置上重合的原子只保留一个）
    pub fn expand_to_p1(&self) -> Vec<Atom> {
        let ops = self.symmetry.expanded();
        let mut expanded: Vec<Atom> = Vec::with_capacity(self.atoms.len() * ops.len());

        for atom in &self.atoms {
            let start = expanded.len();
            for op in &ops {
                let position = op.apply(&atom.position);
                let duplicate = expanded[start..]
                    .iter()
                    .any(|other| same_site(&other.position, &position));
                if !duplicate {
                    let mut copy = atom.clone();
                    copy.position = position;
                    expanded.push(copy);
                }
            }
        }
        expanded
    }
}

/// 比较分数坐标（考虑周期性）
fn same_site(a: &[f64; 3], b: &[f64; 3]) -> bool {
    a.iter().zip(b).all(|(x, y)| {
        let d = (x - y).rem_euclid(1.0);
        d.min(1.0 - d) < 1e-4
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::symmetry::Centering;

    #[test]
    fn test_cubic_cell() {
        let cell = UnitCell::new(5.0, 5.0, 5.0, 90.0, 90.0, 90.0);
        assert!((cell.volume() - 125.0).abs() < 1e-6);
        assert!((cell.d_spacing([1, 0, 0]) - 5.0).abs() < 1e-9);
        assert!((cell.d_spacing([1, 1, 0]) - 5.0 / 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_hexagonal_d_spacing() {
        let cell = UnitCell::new(3.0, 3.0, 5.0, 90.0, 90.0, 120.0);
        // d(100) = a·√3/2
        assert!((cell.d_spacing([1, 0, 0]) - 3.0 * 3f64.sqrt() / 2.0).abs() < 1e-6);
        assert!((cell.d_spacing([0, 0, 1]) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_slice() {
        assert!(UnitCell::from_slice(&[1.0, 2.0, 3.0, 90.0, 90.0, 90.0]).is_some());
        assert!(UnitCell::from_slice(&[1.0, 2.0]).is_none());
    }

    #[test]
    fn test_expand_fcc() {
        let cell = UnitCell::new(4.0, 4.0, 4.0, 90.0, 90.0, 90.0);
        let symmetry = Symmetry::new(vec![], Centering::F, true);
        let model = StructureModel::new(
            "Cu",
            cell,
            symmetry,
            vec![Atom::new("Cu", [0.0, 0.0, 0.0])],
        );
        assert_eq!(model.expand_to_p1().len(), 4);
    }

    #[test]
    fn test_atom_builders() {
        let atom = Atom::new("Si", [0.1, 0.2, 0.3])
            .with_label("Si1")
            .with_uiso(0.01)
            .with_occupancy(0.5);
        assert_eq!(atom.label, Some("Si1".to_string()));
        assert_eq!(atom.occupancy, 0.5);
    }
}
