//! # 文件写入工具
//!
//! 原子写入：先写同目录临时文件，再重命名到目标路径，
//! 避免失败时留下不完整的求解器输入文件。
//!
//! ## 依赖关系
//! - 被 `parsers/hkl.rs`, `writers/` 使用
//! - 使用 `tempfile` crate

use crate::error::{MergePrepError, Result};

use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// 原子写入文本文件
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| MergePrepError::write(path, e))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| MergePrepError::write(path, e))?;
    tmp.flush().map_err(|e| MergePrepError::write(path, e))?;
    tmp.persist(path)
        .map_err(|e| MergePrepError::write(path, e.error))?;

    Ok(())
}

/// 确保目录存在
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).map_err(|e| MergePrepError::write(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");

        write_atomic(&path, "first").unwrap();
        write_atomic(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        // 没有残留临时文件
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_atomic_missing_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.txt");
        assert!(write_atomic(&path, "x").is_err());
    }

    #[test]
    fn test_ensure_dir_nested() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }
}
