//! # Superflip 输入文件 (.inflip)
//!
//! 对称操作写成 `x1 x2 x3` 形式（含反演），中心化平移写在 `centers` 块。
//! 衍射数据按文件名引用同目录的 .hkl，格式为 `intensity dummy`。
//!
//! ## 依赖关系
//! - 使用 `models/symmetry.rs`

use crate::error::Result;
use crate::models::phase::format_count;
use crate::models::SymOp;
use crate::writers::{SolverWriter, WriterInput};

use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, Default)]
pub struct SuperflipWriter;

impl SolverWriter for SuperflipWriter {
    fn name(&self) -> &'static str {
        "superflip"
    }

    fn extension(&self) -> &'static str {
        "inflip"
    }

    fn render(&self, input: &WriterInput) -> Result<String> {
        let phase = input.phase;
        let symmetry = &phase.symmetry;
        let [a, b, c, alpha, beta, gamma] = phase.cell.parameters();
        let datafile = input
            .hkl_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.hkl", phase.name));

        let mut out = String::new();
        let _ = writeln!(out, "title {}", phase.name);
        out.push_str("dimension 3\nvoxel AUTO\n");
        let _ = writeln!(
            out,
            "cell {:.4} {:.4} {:.4} {:.3} {:.3} {:.3}",
            a, b, c, alpha, beta, gamma
        );
        let _ = writeln!(out, "lambda {}", input.wavelength);

        out.push_str("centers\n");
        for v in symmetry.centering.vectors() {
            let _ = writeln!(out, "  {:.6} {:.6} {:.6}", v[0], v[1], v[2]);
        }
        out.push_str("endcenters\n");

        out.push_str("symmetry\n");
        let mut ops = vec![SymOp::identity()];
        ops.extend(symmetry.symm_cards());
        if symmetry.centrosymmetric {
            let inverted: Vec<SymOp> = ops.iter().map(|op| SymOp::inversion().compose(op)).collect();
            ops.extend(inverted);
        }
        for op in &ops {
            let _ = writeln!(out, "  {}", superflip_op(op));
        }
        out.push_str("endsymmetry\n");

        let composition: Vec<String> = phase
            .composition
            .iter()
            .map(|(el, n)| format!("{}{}", el, format_count(*n)))
            .collect();
        let _ = writeln!(out, "composition {}", composition.join(" "));

        out.push_str(
            "derivesymmetry yes\n\
             searchsymmetry average\n\
             delta AUTO\n\
             weakratio 0.00\n\
             biso 2.0\n\
             randomseed AUTO\n\
             normalize yes\n\
             maxcycles 10000\n\
             repeatmode 1\n\
             polish yes\n\
             convergencemode normal\n\
             expandedlog yes\n",
        );
        let _ = writeln!(out, "outputfile {}.xplor", phase.name);
        out.push_str("outputformat xplor\n");
        out.push_str("dataformat intensity dummy\n");
        let _ = writeln!(out, "fbegin {}", datafile);

        Ok(out)
    }
}

/// "-x,y+1/2,-z" → "-x1 x2+1/2 -x3"
fn superflip_op(op: &SymOp) -> String {
    op.to_string()
        .replace('x', "x1")
        .replace('y', "x2")
        .replace('z', "x3")
        .replace(',', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writers::fixtures;
    use std::path::Path;

    #[test]
    fn test_render() {
        let phase = fixtures::phase();
        let input = WriterInput {
            phase: &phase,
            wavelength: 0.0197,
            hkl_path: Path::new("/data/out/A.hkl"),
        };
        let text = SuperflipWriter.render(&input).unwrap();

        assert!(text.contains("lambda 0.0197\n"));
        assert!(text.contains("centers\n  0.000000 0.000000 0.000000\n  0.500000 0.500000 0.000000\nendcenters\n"));
        // 恒等 + 二次轴，再加反演
        let symmetry_block = text.split("\nsymmetry\n").nth(1).unwrap();
        let ops: Vec<&str> = symmetry_block.split("endsymmetry").next().unwrap().lines().collect();
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[1].trim(), "-x1 x2 -x3");
        assert!(text.contains("composition O16 Si8\n"));
        assert!(text.contains("dataformat intensity dummy\n"));
        assert!(text.ends_with("fbegin A.hkl\n"));
    }
}
