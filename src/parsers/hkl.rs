//! # SHELX HKLF 4 衍射数据格式
//!
//! 每行一个衍射点，固定列宽 `%4d%4d%4d%8.1f%8.2f`：
//! ```text
//!    1   0   0  1234.5   12.34
//!   -2   1   3    87.0    3.10
//!    0   0   0     0.0    0.00
//! ```
//!
//! 读取时先按固定列宽解析，失败时退回空白分隔（手写或其他程序导出的文件）。
//! 空行忽略，`0 0 0` 行视为列表结束。多余的列（批次号等）忽略。
//!
//! ## 依赖关系
//! - 被 `pipeline/`, `reference.rs`, `commands/transform.rs` 使用
//! - 使用 `models/reflection.rs`
//! - 使用 `utils/fs.rs` 原子写入

use crate::error::{MergePrepError, Result};
use crate::models::{ReflectionList, ReflectionRecord};
use crate::utils::fs::write_atomic;

use std::fs;
use std::path::Path;

/// 固定列边界 (起, 止)
const COLUMNS: [(usize, usize); 5] = [(0, 4), (4, 8), (8, 12), (12, 20), (20, 28)];

/// 读取 .hkl 文件
pub fn parse_hkl_file(path: &Path) -> Result<ReflectionList> {
    let content = fs::read_to_string(path).map_err(|e| MergePrepError::read(path, e))?;

    parse_hkl_content(&content).map_err(|reason| MergePrepError::ParseError {
        format: "hkl".to_string(),
        path: path.display().to_string(),
        reason,
    })
}

/// 从字符串解析，错误信息带行号
pub fn parse_hkl_content(content: &str) -> std::result::Result<ReflectionList, String> {
    let mut records = Vec::new();

    for (lineno, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let record = parse_line(line)
            .ok_or_else(|| format!("line {}: cannot read reflection from '{}'", lineno + 1, line.trim_end()))?;

        if record.h == 0 && record.k == 0 && record.l == 0 {
            break;
        }
        if !record.intensity.is_finite() || !record.sigma.is_finite() {
            return Err(format!(
                "line {}: non-finite intensity or sigma in '{}'",
                lineno + 1,
                line.trim_end()
            ));
        }
        records.push(record);
    }

    Ok(ReflectionList::new(records))
}

fn parse_line(line: &str) -> Option<ReflectionRecord> {
    parse_fixed(line).or_else(|| parse_whitespace(line))
}

fn parse_whitespace(line: &str) -> Option<ReflectionRecord> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < 5 {
        return None;
    }

    Some(ReflectionRecord::new(
        parts[0].parse().ok()?,
        parts[1].parse().ok()?,
        parts[2].parse().ok()?,
        parts[3].parse().ok()?,
        parts[4].parse().ok()?,
    ))
}

fn parse_fixed(line: &str) -> Option<ReflectionRecord> {
    let field = |i: usize| {
        let (start, end) = COLUMNS[i];
        line.get(start..end.min(line.len())).map(str::trim)
    };

    Some(ReflectionRecord::new(
        field(0)?.parse().ok()?,
        field(1)?.parse().ok()?,
        field(2)?.parse().ok()?,
        field(3)?.parse().ok()?,
        field(4)?.parse().ok()?,
    ))
}

/// 格式化为 HKLF 4 文本（不含结束行）
///
/// 每个字段必须放进固定列宽，否则相邻字段会连在一起无法读回。
pub fn to_hkl_string(reflections: &ReflectionList) -> std::result::Result<String, String> {
    let mut out = String::with_capacity(reflections.len() * 29);
    for r in &reflections.records {
        let fields = [
            format!("{:4}", r.h),
            format!("{:4}", r.k),
            format!("{:4}", r.l),
            format!("{:8.1}", r.intensity),
            format!("{:8.2}", r.sigma),
        ];
        let fits = fields
            .iter()
            .zip(COLUMNS)
            .all(|(field, (start, end))| field.len() <= end - start);
        if !fits || !r.intensity.is_finite() || !r.sigma.is_finite() {
            return Err(format!(
                "reflection ({} {} {}) with I = {}, sigma = {} does not fit the HKLF 4 columns",
                r.h, r.k, r.l, r.intensity, r.sigma
            ));
        }
        out.push_str(&fields.concat());
        out.push('\n');
    }
    Ok(out)
}

/// 原子写入 .hkl 文件
pub fn write_hkl_file(path: &Path, reflections: &ReflectionList) -> Result<()> {
    let content = to_hkl_string(reflections).map_err(|reason| MergePrepError::FormatOverflow {
        path: path.display().to_string(),
        reason,
    })?;
    write_atomic(path, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_parse_basic() {
        let content = "   1   0   0  1234.5   12.34\n  -2   1   3    87.0    3.10\n";
        let list = parse_hkl_content(content).unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list.records[0].hkl(), (1, 0, 0));
        assert_eq!(list.records[1].intensity, 87.0);
        assert_eq!(list.records[1].sigma, 3.1);
    }

    #[test]
    fn test_parse_fused_columns() {
        let content = " -10 -12 -11    55.0    2.00\n -10-112-110    55.0    2.00\n";
        let list = parse_hkl_content(content).unwrap();

        assert_eq!(list.records[0].hkl(), (-10, -12, -11));
        assert_eq!(list.records[1].hkl(), (-10, -112, -110));
    }

    #[test]
    fn test_terminator_and_blank_lines() {
        let content = "\n   1   1   1   100.0    1.00\n\n   0   0   0     0.0    0.00\n   2   2   2   50.0    1.00\n";
        let list = parse_hkl_content(content).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_extra_batch_column_ignored() {
        let list = parse_hkl_content("   1   2   3    10.0    1.00   1\n").unwrap();
        assert_eq!(list.records[0].hkl(), (1, 2, 3));
    }

    #[test]
    fn test_whitespace_fallback() {
        let list = parse_hkl_content("1 2 3 10.0 1.0\n-4 5 -6 2.5 0.5\n").unwrap();
        assert_eq!(list.records[1].hkl(), (-4, 5, -6));
        assert_eq!(list.records[1].intensity, 2.5);
    }

    #[test]
    fn test_garbage_line() {
        let err = parse_hkl_content("   1   0   0  12.0   1.0\nnot a reflection\n").unwrap_err();
        assert!(err.contains("line 2"));
    }

    #[test]
    fn test_write_format() {
        let list = ReflectionList::new(vec![ReflectionRecord::new(1, -2, 3, 1234.56, 7.891)]);
        assert_eq!(to_hkl_string(&list).unwrap(), "   1  -2   3  1234.6    7.89\n");
    }

    #[test]
    fn test_non_finite_rejected() {
        let err = parse_hkl_content("   1   0   0    12.0    1.00\n   2   0   0     nan    1.00\n").unwrap_err();
        assert!(err.contains("line 2"));
        assert!(parse_hkl_content("1 0 0 inf 1.0\n").is_err());
    }

    #[test]
    fn test_overflowing_intensity_not_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big.hkl");
        let list = ReflectionList::new(vec![
            ReflectionRecord::new(1, 0, 0, 999_999.9, 1.0),
            ReflectionRecord::new(2, 0, 0, 12_345_678.0, 1.0),
        ]);

        assert!(matches!(
            write_hkl_file(&path, &list),
            Err(MergePrepError::FormatOverflow { .. })
        ));
        assert!(!path.exists());

        let fits = ReflectionList::new(vec![ReflectionRecord::new(1, 0, 0, 999_999.9, 1.0)]);
        write_hkl_file(&path, &fits).unwrap();
        assert_eq!(parse_hkl_file(&path).unwrap().records[0].intensity, 999_999.9);
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("phase.hkl");
        let list = ReflectionList::new(vec![
            ReflectionRecord::new(1, 0, 0, 10.5, 1.25),
            ReflectionRecord::new(-3, 2, 1, 200.0, 4.5),
        ]);

        write_hkl_file(&path, &list).unwrap();
        let read = parse_hkl_file(&path).unwrap();
        assert_eq!(read, list);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            parse_hkl_file(&dir.path().join("nope.hkl")),
            Err(MergePrepError::FileReadError { .. })
        ));
    }
}
