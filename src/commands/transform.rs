//! # kleinify / histogram 命令实现
//!
//! 对单个 .hkl 文件做强度变换，与 merge 中的对应步骤语义相同。
//! 未给出 `--output` 时原位改写输入文件。
//!
//! ## 依赖关系
//! - 使用 `cli/transform.rs` 定义的参数
//! - 使用 `parsers/hkl.rs`, `intensity/`, `reference/`

use crate::cli::transform::{HistogramArgs, KleinifyArgs};
use crate::error::{MergePrepError, Result};
use crate::intensity::{kleinify, Thresholds};
use crate::models::ReflectionList;
use crate::parsers::hkl::{parse_hkl_file, write_hkl_file};
use crate::reference::HistogramReference;
use crate::utils::{output, progress};

use std::path::{Path, PathBuf};

fn read_input(input: &Path) -> Result<ReflectionList> {
    if !input.is_file() {
        return Err(MergePrepError::FileNotFound {
            path: input.display().to_string(),
        });
    }
    let reflections = parse_hkl_file(input)?;
    if reflections.is_empty() {
        output::print_warning(&format!("No reflections in '{}'", input.display()));
    }
    Ok(reflections)
}

fn output_path(input: &Path, output: Option<PathBuf>) -> PathBuf {
    output.unwrap_or_else(|| input.to_path_buf())
}

/// 执行 kleinify 命令
pub fn execute_kleinify(args: KleinifyArgs) -> Result<()> {
    let thresholds = Thresholds::new(args.strong, args.weak)?;
    let mut reflections = read_input(&args.input)?;

    let mut intensities = reflections.intensities();
    let summary = kleinify(&mut intensities, &thresholds)?;
    reflections.set_intensities(&intensities)?;

    let out = output_path(&args.input, args.output);
    write_hkl_file(&out, &reflections)?;

    output::print_info(&summary.to_string());
    output::print_written("hkl", &out.display().to_string());
    Ok(())
}

/// 执行 histogram 命令
pub fn execute_histogram(args: HistogramArgs) -> Result<()> {
    let mut reflections = read_input(&args.input)?;

    let reference = HistogramReference::from_arg(&args.reference);
    let spinner = progress::create_spinner(&format!("Resolving histogram reference {}", reference));
    let profile = reference.resolve(args.dmin, args.preset_dir.as_deref());
    spinner.finish_and_clear();
    let profile = profile?;

    let matched = profile.apply(&reflections.intensities());
    reflections.set_intensities(&matched)?;

    let out = output_path(&args.input, args.output);
    write_hkl_file(&out, &reflections)?;

    output::print_info(&format!(
        "Matched {} reflections to {} ({} reference intensities)",
        reflections.len(),
        reference,
        profile.len()
    ));
    output::print_written("hkl", &out.display().to_string());
    Ok(())
}
