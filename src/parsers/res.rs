//! # SHELX .res/.ins 结构解析器
//!
//! 读取 SHELX 指令文件中的结构模型，用作直方图匹配的参考。
//!
//! ## 支持的指令
//! ```text
//! TITL name ...
//! CELL λ a b c α β γ
//! LATT n          正数有对称中心，|n| 为中心化编号，缺省为 1
//! SYMM x,y,z      每行一个（不含恒等操作）
//! SFAC El1 El2 ...
//! Label sfac x y z [sof [Uiso | U11 U22 = U33 U23 U13 U12]]
//! END / HKLF      结束
//! ```
//!
//! 坐标与占有率上的固定偏移 (+10) 会被去掉；各向异性原子取 (U11+U22+U33)/3。
//! AIRSS 风格的 .res 文件（`LATT -1`，标签即元素名）同样适用。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`, `models/symmetry.rs`

use crate::error::{MergePrepError, Result};
use crate::models::{Atom, Centering, StructureModel, SymOp, Symmetry, UnitCell};

use std::fs;
use std::path::Path;

/// 不描述原子的指令关键字
const INSTRUCTIONS: &[&str] = &[
    "ZERR", "UNIT", "REM", "FVAR", "WGHT", "L.S.", "CGLS", "BOND", "FMAP", "PLAN", "LIST", "ACTA",
    "TREF", "TEMP", "SIZE", "OMIT", "SHEL", "DISP", "AFIX", "PART", "RESI", "EQIV", "CONF",
    "HTAB", "DFIX", "DANG", "SADI", "SAME", "FLAT", "DELU", "SIMU", "ISOR", "EXYZ", "EADP",
    "FRAG", "FEND", "MOVE", "ANIS", "HFIX", "MERG", "SPEC", "LAUE", "SUMP", "BUMP", "EXTI",
    "SWAT", "STIR", "MORE", "BLOC", "DAMP", "FREE", "CHIV", "RIGU", "NEUT", "MPLA", "RTAB",
    "ABIN", "ANSC", "ANSR", "BASF", "BIND", "CONN", "DEFS", "ELEM", "GRID", "HOPE", "LONE",
    "NCSY", "PSEE", "SLIM", "TWIN", "TWST", "WIGL", "WPDB", "XNPD",
];

/// 解析 .res/.ins 文件
pub fn parse_res_file(path: &Path) -> Result<StructureModel> {
    let content = fs::read_to_string(path).map_err(|e| MergePrepError::read(path, e))?;
    let default_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");

    parse_res_content(&content, default_name).map_err(|reason| MergePrepError::ParseError {
        format: "res".to_string(),
        path: path.display().to_string(),
        reason,
    })
}

/// 从字符串内容解析
pub fn parse_res_content(content: &str, default_name: &str) -> std::result::Result<StructureModel, String> {
    let mut name = default_name.to_string();
    let mut cell: Option<UnitCell> = None;
    let mut latt = 1;
    let mut operators: Vec<SymOp> = Vec::new();
    let mut sfac: Vec<String> = Vec::new();
    let mut atoms: Vec<Atom> = Vec::new();

    for line in joined_lines(content) {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(keyword) = parts.first() else {
            continue;
        };

        match keyword.to_uppercase().as_str() {
            "TITL" => {
                if let Some(title) = parts.get(1) {
                    name = title.to_string();
                }
            }
            "CELL" => {
                // 第一个数是波长
                let values = parse_numbers(&parts[1..]);
                cell = values
                    .get(1..7)
                    .and_then(UnitCell::from_slice)
                    .or_else(|| UnitCell::from_slice(&values));
                if cell.is_none() {
                    return Err(format!("malformed CELL line: '{}'", line));
                }
            }
            "LATT" => {
                latt = parts
                    .get(1)
                    .and_then(|s| s.parse().ok())
                    .ok_or_else(|| format!("malformed LATT line: '{}'", line))?;
            }
            "SYMM" => {
                let expr = line.trim()[4..].trim();
                operators.push(SymOp::parse(expr).map_err(|e| e.to_string())?);
            }
            "SFAC" => {
                // 长格式 SFAC（显式系数）只取元素名
                let element = parts.get(1).copied().unwrap_or_default();
                if parts.len() > 2 && parts[2].parse::<f64>().is_ok() {
                    sfac.push(element.to_string());
                } else {
                    sfac.extend(parts[1..].iter().map(|s| s.to_string()));
                }
            }
            "END" | "HKLF" => break,
            kw if INSTRUCTIONS.contains(&kw) => {}
            _ => {
                if let Some(atom) = parse_atom(&parts, &sfac) {
                    atoms.push(atom);
                }
            }
        }
    }

    let cell = cell.ok_or_else(|| "missing CELL line".to_string())?;
    let centering =
        Centering::from_latt_number(latt).ok_or_else(|| format!("invalid LATT value {}", latt))?;
    if atoms.is_empty() {
        return Err("no atoms found".to_string());
    }

    Ok(StructureModel::new(
        name,
        cell,
        Symmetry::new(operators, centering, latt > 0),
        atoms,
    ))
}

/// 合并以 `=` 结尾的续行
fn joined_lines(content: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() && current.is_empty() {
            continue;
        }
        if let Some(head) = line.strip_suffix('=') {
            current.push_str(head);
            current.push(' ');
            continue;
        }
        current.push_str(line);
        lines.push(std::mem::take(&mut current));
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn parse_numbers(parts: &[&str]) -> Vec<f64> {
    parts.iter().filter_map(|s| s.parse().ok()).collect()
}

/// Label sfac x y z [sof [U ...]]
fn parse_atom(parts: &[&str], sfac: &[String]) -> Option<Atom> {
    if parts.len() < 5 || sfac.is_empty() {
        return None;
    }

    let index: usize = parts[1].parse().ok()?;
    let element = sfac.get(index.checked_sub(1)?)?;
    let numbers: Vec<f64> = parts[2..]
        .iter()
        .map(|s| s.parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .ok()?;

    let position = [
        strip_fixed(numbers[0]),
        strip_fixed(numbers[1]),
        strip_fixed(numbers[2]),
    ];
    let mut atom = Atom::new(element.clone(), position).with_label(parts[0]);

    if let Some(&sof) = numbers.get(3) {
        let sof = strip_fixed(sof);
        if sof > 0.0 && sof <= 1.0 {
            atom = atom.with_occupancy(sof);
        }
    }

    let uiso = match numbers.get(4..).unwrap_or(&[]) {
        [u] => *u,
        [u11, u22, u33, ..] => (u11 + u22 + u33) / 3.0,
        _ => 0.0,
    };
    if uiso > 0.0 {
        atom = atom.with_uiso(uiso);
    }

    Some(atom)
}

/// 去掉 SHELX 固定参数偏移 (10.5 → 0.5)
fn strip_fixed(v: f64) -> f64 {
    if v.abs() >= 5.0 && v.abs() < 15.0 {
        v - 10.0 * v.signum()
    } else {
        v
    }
}
