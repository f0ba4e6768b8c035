//! # 统一错误处理模块
//!
//! 定义 mergeprep 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分类
//! - 配置错误（参考直方图、阈值、预设）：在处理任何物相之前终止运行
//! - 单个物相的数据错误：仅跳过该物相，由 `pipeline` 汇总报告
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// mergeprep 统一错误类型
#[derive(Error, Debug)]
pub enum MergePrepError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Value does not fit the fixed-width format of {path}: {reason}")]
    FormatOverflow { path: String, reason: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // ─────────────────────────────────────────────────────────────
    // 配置错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Inconsistent thresholds: weak cutoff {weak} exceeds strong cutoff {strong}")]
    InvalidThresholds { strong: f64, weak: f64 },

    #[error("Unknown histogram preset '{name}' (available: {available})")]
    PresetNotFound { name: String, available: String },

    #[error("Histogram reference contains no usable intensities")]
    EmptyReference,

    #[error("No cell parameters given for phase '{0}'")]
    UnknownPhase(String),

    #[error("No scattering factors for element '{element}' in {table} table")]
    UnknownElement { element: String, table: String },

    // ─────────────────────────────────────────────────────────────
    // CSV / YAML 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Metadata error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

impl MergePrepError {
    /// 构造读文件错误
    pub fn read(path: &std::path::Path, source: std::io::Error) -> Self {
        MergePrepError::FileReadError {
            path: path.display().to_string(),
            source,
        }
    }

    /// 构造写文件错误
    pub fn write(path: &std::path::Path, source: std::io::Error) -> Self {
        MergePrepError::FileWriteError {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, MergePrepError>;
