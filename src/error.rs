use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for the exif-scrub crate.
///
/// Per-file variants are caught by the pipeline and turned into per-file
/// report entries so a batch continues past them; only configuration-level
/// errors ([`ScrubError::InvalidCameraSpec`], [`ScrubError::InvalidConfig`])
/// abort a run before any file is touched.
#[derive(Error, Debug)]
pub enum ScrubError {
    /// The file's format has no EXIF field taxonomy (e.g. GIF, BMP, PDF).
    #[error("unsupported format for {path}: {detail}")]
    UnsupportedFormat { path: PathBuf, detail: String },

    /// A metadata container is present but cannot be parsed or re-serialized.
    #[error("corrupt metadata container in {path}: {detail}")]
    CorruptMetadata { path: PathBuf, detail: String },

    /// A custom camera spec is not of the form `Brand|Model`.
    #[error("invalid camera spec {0:?}: expected a preset name (canon, iphone) or \"Brand|Model\"")]
    InvalidCameraSpec(String),

    /// The backup copy could not be created or verified. The original file
    /// has not been modified.
    #[error("backup failed for {path}: {detail}")]
    Backup { path: PathBuf, detail: String },

    /// An I/O error during the write sequence. The original file is either
    /// untouched or accompanied by a verified backup.
    #[error("write failed for {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The computed output path would resolve outside the output root.
    #[error("output path for {path} escapes the output root {out_root}")]
    PathEscape { path: PathBuf, out_root: PathBuf },

    /// A contradictory run configuration (rejected before any file I/O).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ScrubError {
    /// Short machine-readable kind, used in report lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "unsupported-format",
            Self::CorruptMetadata { .. } => "corrupt-metadata",
            Self::InvalidCameraSpec(_) => "invalid-camera-spec",
            Self::Backup { .. } => "backup-failure",
            Self::Write { .. } => "write-failure",
            Self::PathEscape { .. } => "path-escape",
            Self::InvalidConfig(_) => "invalid-config",
            Self::Io(_) => "io",
        }
    }
}
