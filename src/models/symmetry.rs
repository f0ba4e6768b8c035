//! # 对称操作
//!
//! 解析 `x,y,z` 形式的对称操作，描述点阵中心化与对称中心，
//! 并生成全部等效位置（用于结构因子计算和 SHELX `SYMM` 卡片）。
//!
//! ## 约定
//! - 坐标变换：x' = R·x + t
//! - 衍射指数变换：h' = h·R（行向量）
//!
//! ## 依赖关系
//! - 被 `models/structure.rs`, `models/phase.rs`, `parsers/cif.rs`, `parsers/res.rs` 使用
//! - 使用 `regex` 解析表达式

use crate::error::{MergePrepError, Result};

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([+-]?)(\d+(?:\.\d*)?(?:/\d+)?)?\*?([xyz])?").unwrap()
});

/// 单个对称操作 (R, t)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SymOp {
    pub rotation: [[i32; 3]; 3],
    pub translation: [f64; 3],
}

impl SymOp {
    pub fn identity() -> Self {
        SymOp {
            rotation: [[1, 0, 0], [0, 1, 0], [0, 0, 1]],
            translation: [0.0; 3],
        }
    }

    pub fn inversion() -> Self {
        SymOp {
            rotation: [[-1, 0, 0], [0, -1, 0], [0, 0, -1]],
            translation: [0.0; 3],
        }
    }

    /// 解析 "x,y,z" / "-x+1/2, y, 1/2-z" 形式的表达式
    pub fn parse(expr: &str) -> Result<Self> {
        let cleaned: String = expr
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '\'' && *c != '"')
            .collect::<String>()
            .to_lowercase();

        let parts: Vec<&str> = cleaned.split(',').collect();
        if parts.len() != 3 {
            return Err(invalid_op(expr, "expected three comma-separated components"));
        }

        let mut op = SymOp {
            rotation: [[0; 3]; 3],
            translation: [0.0; 3],
        };
        for (row, part) in parts.iter().enumerate() {
            let (coefficients, shift) = parse_component(part).map_err(|r| invalid_op(expr, &r))?;
            op.rotation[row] = coefficients;
            op.translation[row] = shift;
        }
        Ok(op)
    }

    /// 作用于分数坐标，结果约化到 [0, 1)
    pub fn apply(&self, position: &[f64; 3]) -> [f64; 3] {
        let mut out = [0.0; 3];
        for (i, value) in out.iter_mut().enumerate() {
            let r = self.rotation[i];
            let x = r[0] as f64 * position[0]
                + r[1] as f64 * position[1]
                + r[2] as f64 * position[2]
                + self.translation[i];
            *value = x.rem_euclid(1.0);
        }
        out
    }

    /// 作用于衍射指数：h' = h·R
    pub fn apply_hkl(&self, hkl: [i32; 3]) -> [i32; 3] {
        let r = self.rotation;
        [
            hkl[0] * r[0][0] + hkl[1] * r[1][0] + hkl[2] * r[2][0],
            hkl[0] * r[0][1] + hkl[1] * r[1][1] + hkl[2] * r[2][1],
            hkl[0] * r[0][2] + hkl[1] * r[1][2] + hkl[2] * r[2][2],
        ]
    }

    /// 复合操作 self ∘ other（先 other 后 self）
    pub fn compose(&self, other: &SymOp) -> SymOp {
        let mut rotation = [[0; 3]; 3];
        let mut translation = [0.0; 3];
        for i in 0..3 {
            for j in 0..3 {
                rotation[i][j] = (0..3)
                    .map(|k| self.rotation[i][k] * other.rotation[k][j])
                    .sum();
            }
            translation[i] = (0..3)
                .map(|k| self.rotation[i][k] as f64 * other.translation[k])
                .sum::<f64>()
                + self.translation[i];
        }
        SymOp {
            rotation,
            translation,
        }
    }

    /// 附加平移（中心化矢量）
    pub fn shifted(&self, shift: &[f64; 3]) -> SymOp {
        let mut op = *self;
        for (t, s) in op.translation.iter_mut().zip(shift) {
            *t += s;
        }
        op
    }

    pub fn is_identity(&self) -> bool {
        self.rotation == SymOp::identity().rotation
            && self
                .translation
                .iter()
                .all(|t| t.rem_euclid(1.0).abs() < 1e-8)
    }
}

impl fmt::Display for SymOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axes = ['x', 'y', 'z'];
        let mut components = Vec::with_capacity(3);
        for i in 0..3 {
            let mut s = String::new();
            for (j, axis) in axes.iter().enumerate() {
                match self.rotation[i][j] {
                    0 => {}
                    1 => {
                        if !s.is_empty() {
                            s.push('+');
                        }
                        s.push(*axis);
                    }
                    -1 => {
                        s.push('-');
                        s.push(*axis);
                    }
                    n => {
                        if n > 0 && !s.is_empty() {
                            s.push('+');
                        }
                        s.push_str(&format!("{}{}", n, axis));
                    }
                }
            }
            let t = self.translation[i].rem_euclid(1.0);
            if t > 1e-6 {
                s.push('+');
                s.push_str(&format_fraction(t));
            }
            if s.is_empty() {
                s.push('0');
            }
            components.push(s);
        }
        write!(f, "{}", components.join(","))
    }
}

/// 点阵中心化类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Centering {
    #[default]
    P,
    I,
    R,
    F,
    A,
    B,
    C,
}

impl Centering {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'P' => Some(Centering::P),
            'I' => Some(Centering::I),
            'R' => Some(Centering::R),
            'F' => Some(Centering::F),
            'A' => Some(Centering::A),
            'B' => Some(Centering::B),
            'C' => Some(Centering::C),
            _ => None,
        }
    }

    /// SHELX LATT 编号（绝对值）
    pub fn latt_number(&self) -> i32 {
        match self {
            Centering::P => 1,
            Centering::I => 2,
            Centering::R => 3,
            Centering::F => 4,
            Centering::A => 5,
            Centering::B => 6,
            Centering::C => 7,
        }
    }

    pub fn from_latt_number(n: i32) -> Option<Self> {
        match n.abs() {
            1 => Some(Centering::P),
            2 => Some(Centering::I),
            3 => Some(Centering::R),
            4 => Some(Centering::F),
            5 => Some(Centering::A),
            6 => Some(Centering::B),
            7 => Some(Centering::C),
            _ => None,
        }
    }

    /// 中心化平移矢量（包含原点）
    pub fn vectors(&self) -> Vec<[f64; 3]> {
        let third = 1.0 / 3.0;
        let mut v = vec![[0.0; 3]];
        match self {
            Centering::P => {}
            Centering::I => v.push([0.5, 0.5, 0.5]),
            Centering::R => {
                v.push([2.0 * third, third, third]);
                v.push([third, 2.0 * third, 2.0 * third]);
            }
            Centering::F => {
                v.push([0.0, 0.5, 0.5]);
                v.push([0.5, 0.0, 0.5]);
                v.push([0.5, 0.5, 0.0]);
            }
            Centering::A => v.push([0.0, 0.5, 0.5]),
            Centering::B => v.push([0.5, 0.0, 0.5]),
            Centering::C => v.push([0.5, 0.5, 0.0]),
        }
        v
    }
}

/// 空间群对称信息：对称操作 + 中心化 + 对称中心
#[derive(Debug, Clone, PartialEq)]
pub struct Symmetry {
    /// 不含中心化与反演的操作（SHELX SYMM 卡片语义，可不含恒等操作）
    pub operators: Vec<SymOp>,
    pub centering: Centering,
    pub centrosymmetric: bool,
}

impl Default for Symmetry {
    fn default() -> Self {
        Symmetry {
            operators: vec![SymOp::identity()],
            centering: Centering::P,
            centrosymmetric: false,
        }
    }
}

impl Symmetry {
    pub fn new(operators: Vec<SymOp>, centering: Centering, centrosymmetric: bool) -> Self {
        Symmetry {
            operators,
            centering,
            centrosymmetric,
        }
    }

    /// 从表达式列表解析
    pub fn from_strings<S: AsRef<str>>(
        exprs: &[S],
        centering: Centering,
        centrosymmetric: bool,
    ) -> Result<Self> {
        let operators = exprs
            .iter()
            .map(|e| SymOp::parse(e.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Symmetry::new(operators, centering, centrosymmetric))
    }

    /// SHELX LATT 值（正数表示有对称中心）
    pub fn latt(&self) -> i32 {
        let n = self.centering.latt_number();
        if self.centrosymmetric {
            n
        } else {
            -n
        }
    }

    /// 不含恒等操作的 SYMM 列表
    pub fn symm_cards(&self) -> Vec<SymOp> {
        self.operators
            .iter()
            .filter(|op| !op.is_identity())
            .copied()
            .collect()
    }

    /// 全部等效操作：操作 × (反演) × 中心化
    pub fn expanded(&self) -> Vec<SymOp> {
        let mut base: Vec<SymOp> = vec![SymOp::identity()];
        for op in &self.operators {
            if !op.is_identity() {
                base.push(*op);
            }
        }
        if self.centrosymmetric {
            let inverted: Vec<SymOp> = base
                .iter()
                .map(|op| SymOp::inversion().compose(op))
                .collect();
            base.extend(inverted);
        }

        let mut all = Vec::with_capacity(base.len() * 4);
        for shift in self.centering.vectors() {
            for op in &base {
                all.push(op.shifted(&shift));
            }
        }
        all
    }
}

/// 在给定操作集下取等效类中字典序最大的指数
pub fn hkl_representative(ops: &[SymOp], hkl: [i32; 3]) -> [i32; 3] {
    let mut best = hkl.max([-hkl[0], -hkl[1], -hkl[2]]);
    for op in ops {
        let h = op.apply_hkl(hkl);
        let friedel = [-h[0], -h[1], -h[2]];
        best = best.max(h).max(friedel);
    }
    best
}

/// 解析单个分量，返回 (系数行, 平移)
fn parse_component(part: &str) -> std::result::Result<([i32; 3], f64), String> {
    if part.is_empty() {
        return Err("empty component".to_string());
    }

    let mut coefficients = [0i32; 3];
    let mut shift = 0.0;
    let mut consumed = 0;

    for caps in TERM.captures_iter(part) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.as_str().is_empty() {
            continue;
        }
        if whole.start() != consumed {
            break;
        }
        consumed = whole.end();

        let sign = if caps.get(1).map(|m| m.as_str()) == Some("-") {
            -1.0
        } else {
            1.0
        };
        let number = match caps.get(2) {
            Some(m) => Some(parse_fraction(m.as_str())?),
            None => None,
        };

        match caps.get(3).map(|m| m.as_str()) {
            Some(axis) => {
                let idx = match axis {
                    "x" => 0,
                    "y" => 1,
                    _ => 2,
                };
                coefficients[idx] += (sign * number.unwrap_or(1.0)).round() as i32;
            }
            None => match number {
                Some(n) => shift += sign * n,
                None => return Err(format!("dangling sign in '{}'", part)),
            },
        }
    }

    if consumed != part.len() {
        return Err(format!("cannot parse '{}'", part));
    }
    Ok((coefficients, shift))
}

fn parse_fraction(s: &str) -> std::result::Result<f64, String> {
    let value = match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().map_err(|_| format!("bad number '{}'", s))?;
            let den: f64 = den.parse().map_err(|_| format!("bad number '{}'", s))?;
            if den == 0.0 {
                return Err(format!("zero denominator in '{}'", s));
            }
            num / den
        }
        None => s.parse().map_err(|_| format!("bad number '{}'", s))?,
    };
    Ok(value)
}

fn format_fraction(t: f64) -> String {
    for den in [2, 3, 4, 6, 8, 12] {
        let num = t * den as f64;
        if (num - num.round()).abs() < 1e-4 {
            return format!("{}/{}", num.round() as i32, den);
        }
    }
    format!("{:.4}", t)
}

fn invalid_op(expr: &str, reason: &str) -> MergePrepError {
    MergePrepError::ParseError {
        format: "symmetry operator".to_string(),
        path: expr.to_string(),
        reason: reason.to_string(),
    }
}
