//! Per-file orchestration: enumerate inputs, run the
//! load → detect → plan → apply → commit flow for each image, and fold every
//! per-file failure into its report so a batch run keeps going.

use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::RunConfig;
use crate::detect::{self, DetectionResult, KeywordCorpus};
use crate::exif::{render_json, render_text_block, MetadataModel};
use crate::transform;
use crate::write::{self, WriteOutcome};

/// Everything the run learned about one file. Errors are content, not
/// control flow: a report with a non-empty `errors` list still renders.
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub path: PathBuf,
    pub format: Option<String>,
    pub dimensions: Option<(u32, u32)>,
    /// Text rendering of the metadata as read (pre-transform).
    pub exif_text: String,
    /// JSON rendering of the metadata as read.
    pub metadata: Option<serde_json::Value>,
    pub detection: Option<DetectionResult>,
    /// Human-readable plan lines, empty when no transform was requested.
    pub plan: Vec<String>,
    pub outcome: Option<WriteOutcome>,
    pub errors: Vec<String>,
}

impl FileReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            format: None,
            dimensions: None,
            exif_text: String::new(),
            metadata: None,
            detection: None,
            plan: Vec::new(),
            outcome: None,
            errors: Vec::new(),
        }
    }
}

/// Collect image files from a mix of file and directory paths.
///
/// Directories are walked (one level deep unless `recursive`), filtered by
/// the lowercased extension allow-list, and the result is sorted and deduped
/// so runs are deterministic regardless of filesystem order.
pub fn collect_images(paths: &[PathBuf], extensions: &[String], recursive: bool) -> Vec<PathBuf> {
    let allowed = |p: &Path| {
        p.extension()
            .and_then(|e| e.to_str())
            .map(|e| extensions.iter().any(|a| a == &e.to_lowercase()))
            .unwrap_or(false)
    };

    let mut images = Vec::new();
    for path in paths {
        if path.is_file() {
            if allowed(path) {
                images.push(path.clone());
            } else {
                log::warn!("skipping file with disallowed extension: {}", path.display());
            }
        } else if path.is_dir() {
            let max_depth = if recursive { usize::MAX } else { 1 };
            for entry in WalkDir::new(path)
                .follow_links(true)
                .max_depth(max_depth)
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let p = entry.path();
                if p.is_file() && allowed(p) {
                    images.push(p.to_path_buf());
                }
            }
        } else {
            log::warn!("path does not exist: {}", path.display());
        }
    }

    images.sort();
    images.dedup();
    images
}

/// Run the full per-file flow. `base` is the scan root the file came from;
/// out-dir writes mirror the path relative to it.
///
/// Stateless: every run-wide input arrives through `config`, so callers may
/// process files in parallel with no coordination.
pub fn process_file(path: &Path, base: &Path, config: &RunConfig) -> FileReport {
    let mut report = FileReport::new(path);

    let model = match MetadataModel::load(path) {
        Ok(model) => model,
        Err(e) => {
            log::error!("{}: {e}", path.display());
            report.errors.push(format!("[{}] {e}", e.kind()));
            return report;
        }
    };

    report.format = Some(model.format.to_string());
    report.dimensions = model.dimensions;
    report.exif_text = render_text_block(&model);
    report.metadata = Some(render_json(&model));

    if config.detect {
        let corpus = KeywordCorpus::with_extra(config.extra_keywords.iter().map(|k| k.as_str()));
        report.detection = Some(detect::detect(path, &model, &corpus, config.deep_scan));
    }

    if config.request.has_mutations() {
        let plan = transform::build_plan(&model, &config.request);
        report.plan = plan.describe();
        let transformed = transform::apply(&plan, &model);
        report.outcome = Some(write::commit(&transformed, base, &config.mode));
    }

    report
}

/// Process every image under the given inputs, one report per file.
///
/// Each input keeps its own scan base (the directory itself, or a file's
/// parent) so out-dir mirroring stays rooted per input.
pub fn run(inputs: &[PathBuf], config: &RunConfig) -> Vec<FileReport> {
    let mut reports = Vec::new();
    for input in inputs {
        let base = if input.is_dir() {
            input.clone()
        } else {
            input.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
        };
        for file in collect_images(std::slice::from_ref(input), &config.extensions, config.recursive)
        {
            reports.push(process_file(&file, &base, config));
        }
    }
    reports
}
