//! # 结果表解析器
//!
//! 结果表是带 YAML 元数据头的 CSV 文件 (ycsv)。元数据头有两种写法：
//! - 开头以 `#` 起始的行（去掉 `#` 和其后一个空格）
//! - 以 `---` 行包围的前置块
//!
//! JSON 也是合法的 YAML，两种写法都可以用 JSON 书写。
//!
//! ```text
//! ---
//! data:
//!   drc_out: drc_out
//! projections:
//!   wavelength: 0.0251
//! cell:
//!   name: A
//!   params: [5, 5, 5, 90, 90, 90]
//!   composition: {Si: 4, O: 8}
//! ---
//! frame,phase,score
//! processed/image_0001.h5,A,312.5
//! ```
//!
//! 必需列 `frame`, `phase`, `score`；没有 `frame` 列时取第一列。其余列忽略。
//! 相对路径 (`drc_out`) 以结果表所在目录为基准。
//!
//! ## 依赖关系
//! - 被 `commands/merge.rs` 使用
//! - 使用 `models/results.rs`, `models/phase.rs`
//! - 使用 `serde_yaml`, `csv`

use crate::error::{MergePrepError, Result};
use crate::models::{
    Centering, FrameResult, PhaseDescriptor, ResultsTable, RunMetadata, Symmetry, UnitCell,
};

use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct RawMetadata {
    data: RawData,
    projections: RawProjections,
    cell: OneOrMany<RawPhase>,
}

#[derive(Debug, Deserialize)]
struct RawData {
    drc_out: String,
}

#[derive(Debug, Deserialize)]
struct RawProjections {
    wavelength: f64,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item],
            OneOrMany::Many(items) => items,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPhase {
    name: String,
    params: Vec<f64>,
    #[serde(default = "default_spgr")]
    spgr: String,
    #[serde(default)]
    composition: BTreeMap<String, f64>,
    #[serde(default)]
    symmetry: Vec<String>,
    #[serde(default)]
    centering: Option<String>,
    #[serde(default)]
    centrosymmetric: bool,
}

fn default_spgr() -> String {
    "P1".to_string()
}

impl RawPhase {
    fn into_descriptor(self) -> std::result::Result<PhaseDescriptor, String> {
        let cell = UnitCell::from_slice(&self.params).ok_or_else(|| {
            format!(
                "phase '{}': expected 6 cell parameters, got {}",
                self.name,
                self.params.len()
            )
        })?;

        let centering = match self.centering.as_deref().map(str::trim) {
            None | Some("") => Centering::P,
            Some(s) => s
                .chars()
                .next()
                .and_then(Centering::from_letter)
                .ok_or_else(|| format!("phase '{}': unknown centering '{}'", self.name, s))?,
        };

        let symmetry = Symmetry::from_strings(&self.symmetry, centering, self.centrosymmetric)
            .map_err(|e| format!("phase '{}': {}", self.name, e))?;

        Ok(PhaseDescriptor {
            name: self.name,
            cell,
            space_group: self.spgr,
            symmetry,
            composition: self.composition,
        })
    }
}

/// 解析结果表文件
pub fn parse_results_file(path: &Path) -> Result<(RunMetadata, ResultsTable)> {
    let content = fs::read_to_string(path).map_err(|e| MergePrepError::read(path, e))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    let (mut metadata, table) = parse_results_content(&content).map_err(|e| match e {
        MergePrepError::Other(reason) => MergePrepError::ParseError {
            format: "results".to_string(),
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })?;

    if metadata.drc_out.is_relative() {
        metadata.drc_out = base.join(&metadata.drc_out);
    }

    Ok((metadata, table))
}

/// 从字符串解析（路径不做解析）
pub fn parse_results_content(content: &str) -> Result<(RunMetadata, ResultsTable)> {
    let (header, body) = split_header(content);

    if header.trim().is_empty() {
        return Err(MergePrepError::Other(
            "missing metadata header ('#' lines or '---' block)".to_string(),
        ));
    }

    let raw: RawMetadata = serde_yaml::from_str(&header)?;
    let metadata = build_metadata(raw).map_err(MergePrepError::Other)?;
    let table = parse_table(&body)?;

    Ok((metadata, table))
}

/// 拆分元数据头与 CSV 正文
fn split_header(content: &str) -> (String, String) {
    let mut lines = content.lines().peekable();
    let mut header = String::new();

    // 跳过前导空行
    while lines.peek().is_some_and(|l| l.trim().is_empty()) {
        lines.next();
    }

    if lines.peek().is_some_and(|l| l.trim() == "---") {
        lines.next();
        for line in lines.by_ref() {
            if line.trim() == "---" {
                break;
            }
            header.push_str(line);
            header.push('\n');
        }
    } else {
        while let Some(rest) = lines.peek().copied().and_then(|l| l.strip_prefix('#')) {
            header.push_str(rest.strip_prefix(' ').unwrap_or(rest));
            header.push('\n');
            lines.next();
        }
    }

    let mut body = String::new();
    for line in lines {
        body.push_str(line);
        body.push('\n');
    }
    (header, body)
}

fn build_metadata(raw: RawMetadata) -> std::result::Result<RunMetadata, String> {
    let mut phases = BTreeMap::new();
    for phase in raw.cell.into_vec() {
        let descriptor = phase.into_descriptor()?;
        phases.insert(descriptor.name.clone(), descriptor);
    }

    Ok(RunMetadata {
        drc_out: raw.data.drc_out.into(),
        wavelength: raw.projections.wavelength,
        phases,
    })
}

fn parse_table(body: &str) -> Result<ResultsTable> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let frame_col = column("frame").unwrap_or(0);
    let phase_col = column("phase")
        .ok_or_else(|| MergePrepError::Other("results table has no 'phase' column".to_string()))?;
    let score_col = column("score")
        .ok_or_else(|| MergePrepError::Other("results table has no 'score' column".to_string()))?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        let field = |col: usize| record.get(col).unwrap_or("");

        let score = field(score_col).parse::<f64>().map_err(|_| {
            MergePrepError::Other(format!(
                "row {}: invalid score '{}'",
                i + 1,
                field(score_col)
            ))
        })?;

        rows.push(FrameResult {
            frame: field(frame_col).to_string(),
            phase: field(phase_col).to_string(),
            score,
        });
    }

    Ok(ResultsTable::new(rows))
}
