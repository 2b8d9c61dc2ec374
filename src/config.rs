//! Run configuration.
//!
//! A [`RunConfig`] is the already-validated description of one batch run:
//! which transform operations to apply, whether to run the provenance
//! heuristic, where the output goes. The CLI builds it from arguments;
//! library callers construct it directly. `validate()` rejects contradictory
//! combinations before any file is touched.

use serde::Serialize;
use std::path::Path;

use crate::error::ScrubError;
use crate::transform::TransformRequest;
use crate::write::WriteMode;

/// Extensions scanned when the caller does not narrow the allow-list.
pub const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "tif", "tiff", "webp", "png"];

#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    /// The transform operations for this run.
    pub request: TransformRequest,
    /// Run the shallow provenance heuristic on each image.
    pub detect: bool,
    /// Also run the raw-byte deep scan (requires `detect`).
    pub deep_scan: bool,
    /// Extra keywords appended to the default detection corpus.
    pub extra_keywords: Vec<String>,
    /// Destination of rewritten images.
    pub mode: WriteMode,
    /// Lowercased extension allow-list, without leading dots.
    pub extensions: Vec<String>,
    /// Recurse into subdirectories of directory inputs.
    pub recursive: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            request: TransformRequest::default(),
            detect: false,
            deep_scan: false,
            extra_keywords: Vec::new(),
            mode: WriteMode::DryRun,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            recursive: false,
        }
    }
}

impl RunConfig {
    /// Reject contradictory combinations. Called once, before the first file
    /// is opened.
    pub fn validate(&self) -> Result<(), ScrubError> {
        if self.deep_scan && !self.detect {
            return Err(ScrubError::InvalidConfig(
                "deep scan requires detection to be enabled".into(),
            ));
        }
        if self.request.extended && self.request.camera.is_none() {
            return Err(ScrubError::InvalidConfig(
                "extended camera profile requires a camera replacement".into(),
            ));
        }
        if let WriteMode::OutDir { root } = &self.mode {
            if root.as_os_str().is_empty() {
                return Err(ScrubError::InvalidConfig("output directory is empty".into()));
            }
        }
        if self.extensions.is_empty() {
            return Err(ScrubError::InvalidConfig("extension allow-list is empty".into()));
        }
        Ok(())
    }

    /// Whether `path`'s extension is on the allow-list.
    pub fn extension_allowed(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| self.extensions.iter().any(|allowed| allowed == &e.to_lowercase()))
            .unwrap_or(false)
    }

    /// Normalize a user-supplied extension list: lowercase, strip leading
    /// dots, drop empties.
    pub fn normalize_extensions(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect()
    }

    /// Key/value pairs describing the run, for the report header.
    pub fn parameters(&self) -> Vec<(&'static str, String)> {
        let mode = match &self.mode {
            WriteMode::DryRun => "dry-run".to_string(),
            WriteMode::InPlace { backup_ext } => match backup_ext {
                Some(ext) => format!("in-place (backup .{ext})"),
                None => "in-place (no backup)".to_string(),
            },
            WriteMode::OutDir { root } => format!("out-dir {}", root.display()),
        };
        vec![
            ("mode", mode),
            ("strip_identifying", self.request.strip_identifying.to_string()),
            ("date_policy", format!("{:?}", self.request.date_policy).to_lowercase()),
            ("remove_orientation", self.request.remove_orientation.to_string()),
            (
                "replace_camera",
                self.request
                    .camera
                    .as_ref()
                    .map(|c| format!("{} {}", c.make, c.model))
                    .unwrap_or_else(|| "none".into()),
            ),
            ("extended_profile", self.request.extended.to_string()),
            ("detect", self.detect.to_string()),
            ("deep_scan", self.deep_scan.to_string()),
            ("extra_keywords", self.extra_keywords.len().to_string()),
            ("recursive", self.recursive.to_string()),
            ("extensions", self.extensions.join(",")),
        ]
    }
}
