//! # CIF 结构解析器
//!
//! 只读取计算参考强度所需的最小子集：
//! - `data_` 块名
//! - `_cell_length_*`, `_cell_angle_*`
//! - 对称操作循环 (`_symmetry_equiv_pos_as_xyz` 或 `_space_group_symop_operation_xyz`)
//! - `_atom_site_` 循环：标签、元素、分数坐标、Uiso/Biso、占有率
//!
//! CIF 中的操作列表已包含中心化平移与反演，因此按 P、无对称中心处理。
//! 数值后的标准不确定度 `0.1234(5)` 被去掉，`?` 与 `.` 视为缺失。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/structure.rs`, `models/symmetry.rs`

use crate::error::{MergePrepError, Result};
use crate::models::{Atom, Centering, StructureModel, SymOp, Symmetry, UnitCell};

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fs;
use std::path::Path;

const SYMOP_TAGS: [&str; 2] = ["_symmetry_equiv_pos_as_xyz", "_space_group_symop_operation_xyz"];

/// 一个 loop_ 块
#[derive(Debug, Default)]
struct Loop {
    tags: Vec<String>,
    values: Vec<String>,
}

impl Loop {
    fn column(&self, tag: &str) -> Option<usize> {
        self.tags.iter().position(|t| t.eq_ignore_ascii_case(tag))
    }

    fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.values.chunks(self.tags.len().max(1))
    }
}

/// 解析后的 CIF 数据块
#[derive(Debug, Default)]
struct Block {
    name: Option<String>,
    items: HashMap<String, String>,
    loops: Vec<Loop>,
}

impl Block {
    fn number(&self, tag: &str) -> Option<f64> {
        self.items.get(tag).and_then(|v| parse_number(v))
    }

    fn find_loop(&self, tag: &str) -> Option<&Loop> {
        self.loops.iter().find(|l| l.column(tag).is_some())
    }
}

/// 解析 CIF 文件
pub fn parse_cif_file(path: &Path) -> Result<StructureModel> {
    let content = fs::read_to_string(path).map_err(|e| MergePrepError::read(path, e))?;
    let default_name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");

    parse_cif_content(&content, default_name).map_err(|reason| MergePrepError::ParseError {
        format: "cif".to_string(),
        path: path.display().to_string(),
        reason,
    })
}

/// 从字符串解析第一个数据块
pub fn parse_cif_content(content: &str, default_name: &str) -> std::result::Result<StructureModel, String> {
    let block = read_block(content);

    let params: Vec<f64> = [
        "_cell_length_a",
        "_cell_length_b",
        "_cell_length_c",
        "_cell_angle_alpha",
        "_cell_angle_beta",
        "_cell_angle_gamma",
    ]
    .iter()
    .map(|tag| block.number(tag).ok_or_else(|| format!("missing {}", tag)))
    .collect::<std::result::Result<_, _>>()?;
    let cell = UnitCell::from_slice(&params).ok_or_else(|| "invalid cell".to_string())?;

    let mut operators = Vec::new();
    if let Some((lp, col)) = SYMOP_TAGS
        .iter()
        .find_map(|tag| block.find_loop(tag).and_then(|l| l.column(tag).map(|c| (l, c))))
    {
        for row in lp.rows() {
            if let Some(expr) = row.get(col) {
                operators.push(SymOp::parse(expr).map_err(|e| e.to_string())?);
            }
        }
    }

    let atoms = read_atoms(&block)?;
    let name = block.name.unwrap_or_else(|| default_name.to_string());

    Ok(StructureModel::new(
        name,
        cell,
        Symmetry::new(operators, Centering::P, false),
        atoms,
    ))
}

fn read_atoms(block: &Block) -> std::result::Result<Vec<Atom>, String> {
    let lp = block
        .find_loop("_atom_site_fract_x")
        .ok_or_else(|| "no _atom_site_ loop".to_string())?;

    let col = |tag: &str| lp.column(tag);
    let (Some(cx), Some(cy), Some(cz)) = (
        col("_atom_site_fract_x"),
        col("_atom_site_fract_y"),
        col("_atom_site_fract_z"),
    ) else {
        return Err("incomplete fractional coordinates".to_string());
    };
    let c_label = col("_atom_site_label");
    let c_type = col("_atom_site_type_symbol");
    let c_uiso = col("_atom_site_u_iso_or_equiv");
    let c_biso = col("_atom_site_b_iso_or_equiv");
    let c_occ = col("_atom_site_occupancy");

    let mut atoms = Vec::new();
    for row in lp.rows() {
        let get = |c: Option<usize>| c.and_then(|i| row.get(i)).map(|s| s.as_str());
        let num = |c: Option<usize>| get(c).and_then(parse_number);

        let label = get(c_label);
        let element = get(c_type)
            .filter(|s| !is_missing(s))
            .or(label)
            .ok_or_else(|| "atom without label or type symbol".to_string())?;

        let position = match (num(Some(cx)), num(Some(cy)), num(Some(cz))) {
            (Some(x), Some(y), Some(z)) => [x, y, z],
            _ => return Err(format!("invalid coordinates for atom '{}'", element)),
        };

        let mut atom = Atom::new(element, position);
        if let Some(label) = label {
            atom = atom.with_label(label);
        }
        if let Some(u) = num(c_uiso).or_else(|| num(c_biso).map(|b| b / (8.0 * PI * PI))) {
            atom = atom.with_uiso(u);
        }
        if let Some(occ) = num(c_occ) {
            atom = atom.with_occupancy(occ);
        }
        atoms.push(atom);
    }

    if atoms.is_empty() {
        return Err("no atoms found".to_string());
    }
    Ok(atoms)
}

/// 读取第一个数据块（遇到第二个 `data_` 停止）
fn read_block(content: &str) -> Block {
    let mut block = Block::default();
    let mut current: Option<Loop> = None;
    let mut pending_tag: Option<String> = None;
    let mut lines = content.lines();

    while let Some(raw) = lines.next() {
        // 分号文本块
        if raw.starts_with(';') {
            let mut text = raw[1..].to_string();
            for inner in lines.by_ref() {
                if inner.starts_with(';') {
                    break;
                }
                text.push('\n');
                text.push_str(inner);
            }
            push_value(&mut block, &mut current, &mut pending_tag, text.trim().to_string());
            continue;
        }

        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix("data_") {
            if block.name.is_some() {
                break;
            }
            block.name = Some(name.trim().to_string());
            continue;
        }

        if line.eq_ignore_ascii_case("loop_") {
            if let Some(done) = current.take() {
                block.loops.push(done);
            }
            current = Some(Loop::default());
            continue;
        }

        let tokens = tokenize(line);
        let mut iter = tokens.into_iter();
        while let Some(token) = iter.next() {
            if token.starts_with('_') {
                let tag = token.to_lowercase();
                match current.as_mut() {
                    Some(lp) if lp.values.is_empty() => lp.tags.push(tag),
                    _ => {
                        if let Some(done) = current.take() {
                            block.loops.push(done);
                        }
                        pending_tag = Some(tag);
                    }
                }
            } else {
                push_value(&mut block, &mut current, &mut pending_tag, token);
            }
        }
    }

    if let Some(done) = current.take() {
        block.loops.push(done);
    }
    block
}

fn push_value(block: &mut Block, current: &mut Option<Loop>, pending: &mut Option<String>, value: String) {
    if let Some(tag) = pending.take() {
        block.items.insert(tag, value);
    } else if let Some(lp) = current.as_mut() {
        lp.values.push(value);
    }
}

/// 按空白切分，保留引号内的空格
fn tokenize(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        if c == '#' {
            break;
        }

        let mut token = String::new();
        if c == '\'' || c == '"' {
            chars.next();
            while let Some(ch) = chars.next() {
                let closing = ch == c && chars.peek().map_or(true, |n| n.is_whitespace());
                if closing {
                    break;
                }
                token.push(ch);
            }
        } else {
            while let Some(&ch) = chars.peek() {
                if ch.is_whitespace() {
                    break;
                }
                token.push(ch);
                chars.next();
            }
        }
        tokens.push(token);
    }
    tokens
}

fn is_missing(value: &str) -> bool {
    value == "?" || value == "."
}

/// 去掉标准不确定度后解析数值
fn parse_number(value: &str) -> Option<f64> {
    if is_missing(value) {
        return None;
    }
    let trimmed = value.split('(').next().unwrap_or(value);
    trimmed.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const NACL: &str = r#"
data_NaCl
_cell_length_a    5.6402(3)
_cell_length_b    5.6402(3)
_cell_length_c    5.6402(3)
_cell_angle_alpha 90
_cell_angle_beta  90
_cell_angle_gamma 90
_symmetry_space_group_name_H-M 'F m -3 m'

loop_
_symmetry_equiv_pos_as_xyz
'x, y, z'
'x, y+1/2, z+1/2'
'x+1/2, y, z+1/2'
'x+1/2, y+1/2, z'

loop_
_atom_site_label
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
_atom_site_U_iso_or_equiv
Na1 Na 0 0 0 0.01
Cl1 Cl 0.5 0.5 0.5 ?
"#;

    #[test]
    fn test_parse_nacl() {
        let model = parse_cif_content(NACL, "fallback").unwrap();

        assert_eq!(model.name, "NaCl");
        assert!((model.cell.a - 5.6402).abs() < 1e-9);
        assert_eq!(model.symmetry.operators.len(), 4);
        assert_eq!(model.atoms.len(), 2);
        assert_eq!(model.atoms[0].uiso, 0.01);
        assert_eq!(model.atoms[1].uiso, 0.0);
        assert_eq!(model.atoms[1].label.as_deref(), Some("Cl1"));
        assert_eq!(model.expand_to_p1().len(), 8);
    }

    #[test]
    fn test_label_only_and_biso() {
        let content = r#"
_cell_length_a 4
_cell_length_b 4
_cell_length_c 4
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 90
loop_
_atom_site_label _atom_site_fract_x _atom_site_fract_y _atom_site_fract_z
_atom_site_B_iso_or_equiv _atom_site_occupancy
Si1 0.1 0.2 0.3 0.7896 0.5
"#;
        let model = parse_cif_content(content, "fallback").unwrap();
        assert_eq!(model.name, "fallback");

        let atom = &model.atoms[0];
        assert_eq!(atom.element, "Si1");
        assert!((atom.uiso - 0.7896 / (8.0 * PI * PI)).abs() < 1e-12);
        assert_eq!(atom.occupancy, 0.5);
        // 无操作列表时只有恒等操作
        assert_eq!(model.expand_to_p1().len(), 1);
    }

    #[test]
    fn test_semicolon_text_and_modern_symop_tag() {
        let content = r#"data_x
_publ_section_title
;
 A title; with a loop_ inside
;
_cell_length_a 3
_cell_length_b 3
_cell_length_c 3
_cell_angle_alpha 90
_cell_angle_beta 90
_cell_angle_gamma 90
loop_
_space_group_symop_id
_space_group_symop_operation_xyz
1 'x,y,z'
2 '-x,-y,-z'
loop_
_atom_site_type_symbol
_atom_site_fract_x
_atom_site_fract_y
_atom_site_fract_z
O 0.1 0.1 0.1
"#;
        let model = parse_cif_content(content, "x").unwrap();
        assert_eq!(model.symmetry.operators.len(), 2);
        assert_eq!(model.expand_to_p1().len(), 2);
    }

    #[test]
    fn test_missing_cell() {
        let err = parse_cif_content("data_x\n_cell_length_a 3\n", "x").unwrap_err();
        assert!(err.contains("_cell_length_b"));
    }

    #[test]
    fn test_tokenize_quotes() {
        assert_eq!(
            tokenize("'x, y+1/2, z' \"a b\" plain # comment"),
            vec!["x, y+1/2, z", "a b", "plain"]
        );
    }

    #[test]
    fn test_parse_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nacl.cif");
        fs::write(&path, NACL).unwrap();
        assert_eq!(parse_cif_file(&path).unwrap().atoms.len(), 2);
    }
}
