//! # 直方图预设
//!
//! 预设名不区分大小写，依次查找：
//! 1. `<preset-dir>/<NAME>.data`（第 6 列为强度）
//! 2. 内置结构模型（现场计算 |F|²）
//!
//! ## 依赖关系
//! - 被 `reference/mod.rs`, `commands/presets.rs` 使用

use crate::error::{MergePrepError, Result};
use crate::models::{Atom, Centering, StructureModel, Symmetry, UnitCell};
use crate::parsers;
use crate::reference::structure_intensities;

use std::fs;
use std::path::{Path, PathBuf};

/// 预设来源
#[derive(Debug, Clone, PartialEq)]
pub enum PresetSource {
    File(PathBuf),
    BuiltIn,
}

/// 可用预设条目
#[derive(Debug, Clone, PartialEq)]
pub struct PresetInfo {
    pub name: String,
    pub description: String,
    pub source: PresetSource,
}

/// 内置预设：名称、说明、模型构造函数
const BUILT_IN: &[(&str, &str, fn() -> StructureModel)] = &[
    ("NaCl", "rock salt, Fm-3m, a = 5.6402", nacl),
    ("Si", "diamond, Fd-3m, a = 5.4309", silicon),
    ("CsCl", "caesium chloride, Pm-3m, a = 4.123", cscl),
    ("Cu", "fcc copper, Fm-3m, a = 3.6149", copper),
];

fn cubic(a: f64) -> UnitCell {
    UnitCell::new(a, a, a, 90.0, 90.0, 90.0)
}

fn nacl() -> StructureModel {
    StructureModel::new(
        "NaCl",
        cubic(5.6402),
        Symmetry::new(vec![], Centering::F, true),
        vec![
            Atom::new("Na", [0.0, 0.0, 0.0]).with_uiso(0.0127),
            Atom::new("Cl", [0.5, 0.5, 0.5]).with_uiso(0.0127),
        ],
    )
}

fn silicon() -> StructureModel {
    // 原点选择 1：两个原子加 F 心平移得到 8 个原子
    StructureModel::new(
        "Si",
        cubic(5.4309),
        Symmetry::new(vec![], Centering::F, false),
        vec![
            Atom::new("Si", [0.0, 0.0, 0.0]).with_uiso(0.0059),
            Atom::new("Si", [0.25, 0.25, 0.25]).with_uiso(0.0059),
        ],
    )
}

fn cscl() -> StructureModel {
    StructureModel::new(
        "CsCl",
        cubic(4.123),
        Symmetry::new(vec![], Centering::P, true),
        vec![
            Atom::new("Cs", [0.0, 0.0, 0.0]).with_uiso(0.02),
            Atom::new("Cl", [0.5, 0.5, 0.5]).with_uiso(0.02),
        ],
    )
}

fn copper() -> StructureModel {
    StructureModel::new(
        "Cu",
        cubic(3.6149),
        Symmetry::new(vec![], Centering::F, true),
        vec![Atom::new("Cu", [0.0, 0.0, 0.0]).with_uiso(0.0071)],
    )
}

/// 内置结构模型（不区分大小写）
pub fn built_in_model(name: &str) -> Option<StructureModel> {
    BUILT_IN
        .iter()
        .find(|(n, _, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, _, build)| build())
}

/// 在预设目录中查找 `<NAME>.data`
fn find_preset_file(dir: &Path, name: &str) -> Option<PathBuf> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .find(|path| {
            let ext_ok = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("data"));
            let stem_ok = path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.eq_ignore_ascii_case(name));
            ext_ok && stem_ok
        })
}

/// 解析预设为参考强度
pub fn resolve(name: &str, dmin: f64, preset_dir: Option<&Path>) -> Result<Vec<f64>> {
    if let Some(path) = preset_dir.and_then(|dir| find_preset_file(dir, name)) {
        return parsers::parse_data_file(&path);
    }

    match built_in_model(name) {
        Some(model) => structure_intensities(&model, dmin),
        None => Err(MergePrepError::PresetNotFound {
            name: name.to_string(),
            available: list_presets(preset_dir)
                .into_iter()
                .map(|p| p.name)
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// 列出全部可用预设：目录中的文件在前，同名时覆盖内置
pub fn list_presets(preset_dir: Option<&Path>) -> Vec<PresetInfo> {
    let mut presets: Vec<PresetInfo> = Vec::new();

    if let Some(dir) = preset_dir {
        let pattern = Path::new(&glob::Pattern::escape(&dir.to_string_lossy())).join("*.data");
        if let Ok(paths) = glob::glob(&pattern.to_string_lossy()) {
            for path in paths.flatten() {
                let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                    continue;
                };
                presets.push(PresetInfo {
                    name: stem.to_string(),
                    description: "stored intensity list".to_string(),
                    source: PresetSource::File(path.clone()),
                });
            }
        }
    }

    for (name, description, _) in BUILT_IN {
        if presets.iter().any(|p| p.name.eq_ignore_ascii_case(name)) {
            continue;
        }
        presets.push(PresetInfo {
            name: name.to_string(),
            description: description.to_string(),
            source: PresetSource::BuiltIn,
        });
    }

    presets
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_built_in_case_insensitive() {
        for name in ["nacl", "SI", "CsCl", "cu"] {
            let values = resolve(name, 1.0, None).unwrap();
            assert!(!values.is_empty(), "{}", name);
        }
    }

    #[test]
    fn test_silicon_has_eight_atoms() {
        assert_eq!(silicon().expand_to_p1().len(), 8);
    }

    #[test]
    fn test_preset_dir_overrides_built_in() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("NACL.data"),
            "1 0 0 5.0 1.0 42.0\n1 1 0 3.0 1.0 7.0\n",
        )
        .unwrap();

        assert_eq!(resolve("NaCl", 1.0, Some(dir.path())).unwrap(), vec![42.0, 7.0]);

        let listed = list_presets(Some(dir.path()));
        assert_eq!(listed.len(), BUILT_IN.len());
        assert!(matches!(listed[0].source, PresetSource::File(_)));
    }

    #[test]
    fn test_list_presets_in_bracketed_dir() {
        let dir = tempdir().unwrap();
        let presets = dir.path().join("presets[v2]");
        fs::create_dir(&presets).unwrap();
        fs::write(presets.join("MFI.data"), "1 0 0 0 0 10.0\n").unwrap();

        let listed = list_presets(Some(&presets));
        assert_eq!(listed.len(), BUILT_IN.len() + 1);
        assert_eq!(listed[0].name, "MFI");
    }

    #[test]
    fn test_unknown_preset_lists_available() {
        match resolve("MFI", 1.0, None) {
            Err(MergePrepError::PresetNotFound { available, .. }) => {
                assert!(available.contains("NaCl"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
