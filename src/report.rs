//! Batch reporting: the TXT report written at the end of a run and the JSON
//! rendering of a single file report.

use chrono::Local;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::error::ScrubError;
use crate::pipeline::FileReport;
use crate::write::WriteStatus;

/// Batch counters for the end-of-run summary.
#[derive(Debug, Default, Clone, Copy, serde::Serialize)]
pub struct Totals {
    pub processed: usize,
    pub ai_flagged: usize,
    pub committed: usize,
    pub simulated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: usize,
}

pub fn totals(reports: &[FileReport]) -> Totals {
    let mut t = Totals { processed: reports.len(), ..Default::default() };
    for report in reports {
        if report.detection.as_ref().is_some_and(|d| d.heuristic_match) {
            t.ai_flagged += 1;
        }
        if !report.errors.is_empty() {
            t.errors += 1;
        }
        match report.outcome.as_ref().map(|o| o.status) {
            Some(WriteStatus::Committed) => t.committed += 1,
            Some(WriteStatus::Simulated) => t.simulated += 1,
            Some(WriteStatus::Skipped) => t.skipped += 1,
            Some(WriteStatus::Failed) => t.failed += 1,
            None => {}
        }
    }
    t
}

/// Assemble the full TXT report: generated-at header, run parameters, one
/// section per file, totals summary.
pub fn build_report_text(reports: &[FileReport], config: &RunConfig) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "exif-scrub report");
    let _ = writeln!(out, "Generated at: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(out, "Parameters:");
    for (key, value) in config.parameters() {
        let _ = writeln!(out, "  - {key}: {value}");
    }
    out.push('\n');

    for report in reports {
        out.push_str(&item_section(report));
    }

    let t = totals(reports);
    let _ = writeln!(out, "Summary:");
    let _ = writeln!(out, "  - processed: {}", t.processed);
    if config.detect {
        let _ = writeln!(out, "  - ai flagged: {}", t.ai_flagged);
    }
    let _ = writeln!(out, "  - committed: {}", t.committed);
    let _ = writeln!(out, "  - simulated: {}", t.simulated);
    let _ = writeln!(out, "  - skipped: {}", t.skipped);
    let _ = writeln!(out, "  - failed: {}", t.failed);
    let _ = writeln!(out, "  - errors: {}", t.errors);

    out
}

fn item_section(report: &FileReport) -> String {
    let mut out = String::new();

    let name = report
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| report.path.display().to_string());
    let _ = writeln!(out, "File: {name}");
    let _ = writeln!(out, "Path: {}", report.path.display());
    if let Some(format) = &report.format {
        match report.dimensions {
            Some((w, h)) => {
                let _ = writeln!(out, "Format: {format} ({w}x{h})");
            }
            None => {
                let _ = writeln!(out, "Format: {format}");
            }
        }
    }

    if let Some(detection) = &report.detection {
        let verdict = if detection.heuristic_match { "YES" } else { "NO" };
        let _ = writeln!(out, "AI suspected: {verdict}");
        for kw in &detection.matched_keywords {
            let _ = writeln!(out, "  * keyword \"{kw}\"");
        }
        if !detection.matched_fields.is_empty() {
            let fields: Vec<_> = detection.matched_fields.iter().map(String::as_str).collect();
            let _ = writeln!(out, "  * in fields: {}", fields.join(", "));
        }
        if detection.deep_scan_performed && !detection.deep_scan_matches.is_empty() {
            let hits: Vec<_> = detection.deep_scan_matches.iter().map(String::as_str).collect();
            let _ = writeln!(out, "  * deep scan: {}", hits.join(", "));
        }
    }

    if !report.errors.is_empty() {
        let _ = writeln!(out, "Errors:");
        for e in &report.errors {
            let _ = writeln!(out, "  ! {e}");
        }
    }

    if !report.plan.is_empty() {
        let _ = writeln!(out, "Plan:");
        for line in &report.plan {
            let _ = writeln!(out, "  - {line}");
        }
    }

    if let Some(outcome) = &report.outcome {
        let status = match outcome.status {
            WriteStatus::Committed => "committed",
            WriteStatus::Simulated => "simulated (dry run)",
            WriteStatus::Skipped => "skipped",
            WriteStatus::Failed => "FAILED",
        };
        let _ = writeln!(out, "Write: {status} -> {}", outcome.target_path.display());
        if let Some(backup) = &outcome.backup_path {
            let _ = writeln!(out, "Backup: {}", backup.display());
        }
        if let Some(reason) = &outcome.failure_reason {
            let _ = writeln!(out, "  ! {reason}");
        }
    }

    let _ = writeln!(out, "EXIF:");
    if report.exif_text.is_empty() {
        let _ = writeln!(out, "(no EXIF or not supported)");
    } else {
        let _ = writeln!(out, "{}", report.exif_text.trim_end());
    }
    let _ = writeln!(out, "{}", "-".repeat(60));
    out.push('\n');
    out
}

/// JSON document for one file report, for `--json` console output.
pub fn report_json(report: &FileReport) -> serde_json::Value {
    serde_json::to_value(report).unwrap_or_else(|e| {
        serde_json::json!({
            "path": report.path.display().to_string(),
            "error": format!("report serialization failed: {e}"),
        })
    })
}

/// The default timestamped report location under `base_dir`.
pub fn default_report_path(base_dir: &Path) -> PathBuf {
    let ts = Local::now().format("%Y%m%d_%H%M%S");
    base_dir.join(format!("exif_report_{ts}.txt"))
}

/// Write the report, creating parent directories as needed.
pub fn write_report(path: &Path, content: &str) -> Result<(), ScrubError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content).map_err(|e| ScrubError::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    log::info!("report written to {}", path.display());
    Ok(())
}
