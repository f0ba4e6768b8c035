//! # FOCUS 输入文件 (.inp)
//!
//! 骨架原子（Si, Al, Ge, P, B, Ga 等）标记为 `+`，氧标记为 `-`，其余元素照写。
//! 合并后的衍射点写在 `End` 之后。
//!
//! ## 依赖关系
//! - 读取已写出的 .hkl 文件（经 `parsers/hkl.rs`），保证与最终数据一致

use crate::error::Result;
use crate::models::phase::format_count;
use crate::parsers::hkl::parse_hkl_file;
use crate::writers::{SolverWriter, WriterInput};

use std::fmt::Write as _;

/// 四面体骨架原子
const FRAMEWORK: &[&str] = &["Si", "Al", "Ge", "P", "B", "Ga", "Be", "Zn", "Ti"];

#[derive(Debug, Clone, Copy, Default)]
pub struct FocusWriter;

impl SolverWriter for FocusWriter {
    fn name(&self) -> &'static str {
        "focus"
    }

    fn extension(&self) -> &'static str {
        "inp"
    }

    fn render(&self, input: &WriterInput) -> Result<String> {
        let phase = input.phase;
        let [a, b, c, alpha, beta, gamma] = phase.cell.parameters();
        let reflections = parse_hkl_file(input.hkl_path)?;
        let mut out = String::new();

        let _ = writeln!(out, "Title       {}", phase.name);
        let _ = writeln!(out, "SpaceGroup  {}", phase.space_group);
        let _ = writeln!(
            out,
            "UnitCell    {:.4} {:.4} {:.4} {:.3} {:.3} {:.3}",
            a, b, c, alpha, beta, gamma
        );
        let _ = writeln!(out, "Lambda      {}", input.wavelength);
        out.push('\n');

        for (element, count) in &phase.composition {
            let tag = if FRAMEWORK.contains(&element.as_str()) {
                "+"
            } else if element == "O" {
                "-"
            } else {
                ""
            };
            let _ = writeln!(out, "AtomType  {}{:<3} {}", tag, element, element);
            let _ = writeln!(out, "#         {} per cell: {}", element, format_count(*count));
        }
        out.push('\n');

        out.push_str(
            "Chemistry   MinDistance +* +* 2.9\n\
             Chemistry   MaxDistance +* +* 3.5\n\
             FwSearchMethod FeedBack\n\
             FeedBackCycles 5\n\
             RandomInitialization Time\n\
             End\n",
        );

        for r in &reflections.records {
            let _ = writeln!(out, "{:4}{:4}{:4}{:10.2}{:10.2}", r.h, r.k, r.l, r.intensity, r.sigma);
        }

        Ok(out)
    }
}
