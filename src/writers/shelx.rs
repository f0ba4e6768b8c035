//! # SHELX 指令文件 (.ins)
//!
//! ```text
//! TITL A
//! CELL 0.0251 a b c α β γ
//! ZERR Z 0 0 0 0 0 0
//! LATT n
//! SYMM ...
//! SFAC O Si
//! UNIT 16 8
//! TREF 5000
//! HKLF 4
//! END
//! ```
//!
//! 电子模式下 SFAC 写成长格式：Doyle-Turner 系数、共价半径和原子量。
//!
//! ## 依赖关系
//! - 使用 `diffraction/scattering.rs` 电子散射因子与原子数据

use crate::diffraction::scattering::{atomic_data, element_symbol, ElectronTable, ScatteringTable};
use crate::error::{MergePrepError, Result};
use crate::models::phase::format_count;
use crate::writers::{SolverWriter, WriterInput};

use std::fmt::Write as _;

/// SHELX 文件中的电子波长 (Å)
pub const ELECTRON_WAVELENGTH: f64 = 0.0251;

#[derive(Debug, Clone, Copy, Default)]
pub struct ShelxWriter {
    /// 写出电子散射因子
    pub electron: bool,
}

impl ShelxWriter {
    pub fn new(electron: bool) -> Self {
        ShelxWriter { electron }
    }
}

impl SolverWriter for ShelxWriter {
    fn name(&self) -> &'static str {
        "shelx"
    }

    fn extension(&self) -> &'static str {
        "ins"
    }

    fn render(&self, input: &WriterInput) -> Result<String> {
        let phase = input.phase;
        let [a, b, c, alpha, beta, gamma] = phase.cell.parameters();
        let mut out = String::new();

        let _ = writeln!(out, "TITL {}", phase.name);
        let _ = writeln!(
            out,
            "CELL {:.4} {:.4} {:.4} {:.4} {:.3} {:.3} {:.3}",
            ELECTRON_WAVELENGTH, a, b, c, alpha, beta, gamma
        );
        // 组成按整个晶胞给出，Z = 1
        out.push_str("ZERR 1 0.000 0.000 0.000 0.000 0.000 0.000\n");
        let _ = writeln!(out, "LATT {}", phase.symmetry.latt());
        for op in phase.symmetry.symm_cards() {
            let _ = writeln!(out, "SYMM {}", op);
        }

        if self.electron {
            for element in phase.elements() {
                out.push_str(&electron_sfac(element)?);
            }
        } else {
            let _ = writeln!(out, "SFAC {}", phase.elements().join(" "));
        }

        let units: Vec<String> = phase.unit_counts().into_iter().map(format_count).collect();
        let _ = writeln!(out, "UNIT {}", units.join(" "));
        out.push_str("TREF 5000\nHKLF 4\nEND\n");

        Ok(out)
    }
}

/// 长格式 SFAC 卡片（三行，以 `=` 续行）
fn electron_sfac(element: &str) -> Result<String> {
    let symbol = element_symbol(element).unwrap_or_else(|| element.to_string());
    let unknown = || MergePrepError::UnknownElement {
        element: element.to_string(),
        table: ElectronTable.name().to_string(),
    };

    let p = ElectronTable.params(&symbol).ok_or_else(unknown)?;
    let (radius, weight) = atomic_data(&symbol).ok_or_else(unknown)?;

    Ok(format!(
        "SFAC {:2} {:7.4} {:7.4} {:7.4} {:7.4}         =\n        {:7.4} {:7.4} {:7.4} {:7.4} {:7.4} =\n         0.0000  0.0000  0.0000 {:7.4} {:7.4}\n",
        symbol, p.a[0], p.b[0], p.a[1], p.b[1], p.a[2], p.b[2], p.a[3], p.b[3], p.c, radius, weight
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::fixtures;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn render(electron: bool) -> String {
        let phase = fixtures::phase();
        let input = WriterInput {
            phase: &phase,
            wavelength: 0.0197,
            hkl_path: Path::new("A.hkl"),
        };
        ShelxWriter::new(electron).render(&input).unwrap()
    }

    #[test]
    fn test_render_short_sfac() {
        let text = render(false);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "TITL A");
        assert_eq!(lines[1], "CELL 0.0251 10.0000 11.0000 12.5000 90.000 95.500 90.000");
        assert_eq!(lines[3], "LATT 7");
        assert_eq!(lines[4], "SYMM -x,y,-z");
        assert_eq!(lines[5], "SFAC O Si");
        assert_eq!(lines[6], "UNIT 16 8");
        assert!(text.ends_with("HKLF 4\nEND\n"));
    }

    #[test]
    fn test_render_electron_sfac() {
        let text = render(true);
        assert!(text.contains("SFAC O   0.4548 23.7803  0.9173  7.6220         =\n"));
        assert!(text.contains(" 0.0000  0.0000  0.0000  1.1700 28.0860\n"));
        assert!(!text.contains("SFAC O Si"));
    }

    #[test]
    fn test_electron_sfac_unknown_element() {
        assert!(matches!(
            electron_sfac("Xe"),
            Err(MergePrepError::UnknownElement { .. })
        ));
    }

    #[test]
    fn test_write_file() {
        let dir = tempdir().unwrap();
        let phase = fixtures::phase();
        let input = WriterInput {
            phase: &phase,
            wavelength: 0.0197,
            hkl_path: &dir.path().join("A.hkl"),
        };

        let path = ShelxWriter::default().write(&input, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("A.ins"));
        assert!(fs::read_to_string(path).unwrap().starts_with("TITL A\n"));
    }
}
