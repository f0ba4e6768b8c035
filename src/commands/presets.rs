//! # presets 命令实现
//!
//! ## 依赖关系
//! - 使用 `cli/transform.rs` 定义的参数
//! - 使用 `reference/presets.rs`

use crate::cli::transform::PresetsArgs;
use crate::error::Result;
use crate::reference::presets::{list_presets, PresetInfo, PresetSource};
use crate::utils::output;

use tabled::{Table, Tabled};

#[derive(Debug, Clone, Tabled)]
struct PresetRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<PresetInfo> for PresetRow {
    fn from(info: PresetInfo) -> Self {
        let source = match &info.source {
            PresetSource::File(path) => path.display().to_string(),
            PresetSource::BuiltIn => "built-in".to_string(),
        };
        PresetRow {
            name: info.name,
            source,
            description: info.description,
        }
    }
}

/// 执行 presets 命令
pub fn execute(args: PresetsArgs) -> Result<()> {
    output::print_header("Histogram Presets");

    let rows: Vec<PresetRow> = list_presets(args.preset_dir.as_deref())
        .into_iter()
        .map(PresetRow::from)
        .collect();
    println!("{}", Table::new(&rows));

    if args.preset_dir.is_none() {
        output::print_info("Set MERGEPREP_PRESET_DIR or --preset-dir to add <NAME>.data presets.");
    }
    Ok(())
}
