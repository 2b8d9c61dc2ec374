use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use exif_scrub::config::RunConfig;
use exif_scrub::pipeline::{self, FileReport};
use exif_scrub::report;
use exif_scrub::transform::{CameraSpec, DatePolicy, TransformRequest};
use exif_scrub::write::{WriteMode, WriteStatus};

#[derive(Parser, Debug)]
#[command(
    name = "exif-scrub",
    version,
    about = "Inspect, scrub, and rewrite EXIF metadata — with an AI-provenance keyword heuristic"
)]
struct Cli {
    /// Image files or directories to process
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Comma-separated extension allow-list
    #[arg(long, value_name = "EXTS", default_value = "jpg,jpeg,tif,tiff,webp,png")]
    extensions: String,

    /// Check metadata fields for AI-generator keywords
    #[arg(long = "detect-ai")]
    detect_ai: bool,

    /// Also scan the raw file bytes for keywords (implies slower runs)
    #[arg(long = "deep-scan", requires = "detect_ai")]
    deep_scan: bool,

    /// Extra detection keyword (repeatable)
    #[arg(long = "keyword", value_name = "WORD")]
    keywords: Vec<String>,

    /// Remove identifying metadata (camera identity, serials, GPS, thumbnail)
    #[arg(long = "strip-identifying")]
    strip_identifying: bool,

    /// Replace the camera identity: "canon", "iphone", or "Brand|Model"
    #[arg(long = "replace-camera", value_name = "SPEC")]
    replace_camera: Option<String>,

    /// With --replace-camera, also write a plausible capture-parameter set
    #[arg(long = "replace-extended", requires = "replace_camera")]
    replace_extended: bool,

    /// Delete all timestamp fields
    #[arg(long = "strip-dates", conflicts_with = "anonymize_dates")]
    strip_dates: bool,

    /// Overwrite timestamps with a fixed sentinel instead of deleting them
    #[arg(long = "anonymize-dates")]
    anonymize_dates: bool,

    /// Remove the Orientation tag
    #[arg(long = "remove-orientation")]
    remove_orientation: bool,

    /// Overwrite source files
    #[arg(long = "in-place", conflicts_with = "out_dir")]
    in_place: bool,

    /// With --in-place, back each file up to <name>.<EXT> first
    #[arg(long = "backup-ext", value_name = "EXT", default_value = "bak", requires = "in_place")]
    backup_ext: String,

    /// With --in-place, skip the backup and overwrite sources directly
    #[arg(long = "no-backup", requires = "in_place", conflicts_with = "backup_ext")]
    no_backup: bool,

    /// Write results into this directory, mirroring the source tree
    #[arg(long = "out-dir", value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Plan and report only; write nothing
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Write a TXT batch report (to FILE, or a timestamped default)
    #[arg(long, value_name = "FILE", num_args = 0..=1)]
    report: Option<Option<PathBuf>>,

    /// Output per-file results as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn build_config(cli: &Cli) -> Result<RunConfig> {
    let camera = cli
        .replace_camera
        .as_deref()
        .map(CameraSpec::parse)
        .transpose()
        .context("invalid --replace-camera value")?;

    let date_policy = if cli.strip_dates {
        DatePolicy::Strip
    } else if cli.anonymize_dates {
        DatePolicy::Anonymize
    } else {
        DatePolicy::Preserve
    };

    let request = TransformRequest {
        strip_identifying: cli.strip_identifying,
        date_policy,
        remove_orientation: cli.remove_orientation,
        camera,
        extended: cli.replace_extended,
    };

    let mode = if cli.dry_run {
        WriteMode::DryRun
    } else if let Some(root) = &cli.out_dir {
        WriteMode::OutDir { root: root.clone() }
    } else if cli.in_place {
        // Backup is the default; --no-backup is the explicit opt-out.
        let backup_ext = (!cli.no_backup).then(|| cli.backup_ext.clone());
        WriteMode::InPlace { backup_ext }
    } else {
        if request.has_mutations() {
            anyhow::bail!(
                "metadata changes requested without a destination: \
                 pass --in-place, --out-dir, or --dry-run"
            );
        }
        WriteMode::DryRun
    };

    let config = RunConfig {
        request,
        detect: cli.detect_ai,
        deep_scan: cli.deep_scan,
        extra_keywords: cli.keywords.clone(),
        mode,
        extensions: RunConfig::normalize_extensions(&cli.extensions),
        recursive: cli.recursive,
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

fn print_report(report: &FileReport) {
    println!();
    println!("File: {}", report.path.display());
    if let Some(format) = &report.format {
        match report.dimensions {
            Some((w, h)) => println!("Format: {format} ({w}x{h})"),
            None => println!("Format: {format}"),
        }
    }

    for e in &report.errors {
        log::error!("  {e}");
    }

    if let Some(detection) = &report.detection {
        let verdict = if detection.heuristic_match { "YES" } else { "no" };
        println!("AI suspected: {verdict}");
        for kw in &detection.matched_keywords {
            println!("  * keyword \"{kw}\"");
        }
    }

    if !report.plan.is_empty() {
        println!("Plan:");
        for line in &report.plan {
            println!("  - {line}");
        }
    }

    if let Some(outcome) = &report.outcome {
        match outcome.status {
            WriteStatus::Committed => {
                log::info!("  wrote {}", outcome.target_path.display());
                if let Some(backup) = &outcome.backup_path {
                    log::info!("  backup at {}", backup.display());
                }
            }
            WriteStatus::Simulated => log::info!("  dry run, nothing written"),
            WriteStatus::Skipped => log::info!("  skipped (format takes no metadata writes)"),
            WriteStatus::Failed => {
                log::error!(
                    "  write failed: {}",
                    outcome.failure_reason.as_deref().unwrap_or("unknown")
                );
            }
        }
    }

    if !report.exif_text.is_empty() {
        println!("{}", report.exif_text.trim_end());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = build_config(&cli)?;

    if matches!(config.mode, WriteMode::DryRun) && config.request.has_mutations() {
        log::info!("DRY RUN — no files will be modified");
    }

    let reports = pipeline::run(&cli.paths, &config);
    if reports.is_empty() {
        anyhow::bail!("no supported image files found in the specified paths");
    }
    log::info!("processing {} image(s)", reports.len());

    if cli.json {
        let docs: Vec<serde_json::Value> = reports.iter().map(report::report_json).collect();
        println!("{}", serde_json::to_string_pretty(&docs)?);
    } else {
        for file_report in &reports {
            print_report(file_report);
        }
    }

    let totals = report::totals(&reports);
    log::info!(
        "done: {} processed, {} committed, {} simulated, {} skipped, {} failed, {} with errors",
        totals.processed,
        totals.committed,
        totals.simulated,
        totals.skipped,
        totals.failed,
        totals.errors
    );
    if config.detect {
        log::info!("AI suspected: {} of {}", totals.ai_flagged, totals.processed);
    }

    if let Some(target) = &cli.report {
        let path = match target {
            Some(path) => path.clone(),
            None => {
                let base = cli
                    .paths
                    .first()
                    .filter(|p| p.is_dir())
                    .cloned()
                    .unwrap_or_else(|| PathBuf::from("."));
                report::default_report_path(&base)
            }
        };
        let content = report::build_report_text(&reports, &config);
        report::write_report(&path, &content).context("failed to write report")?;
        println!("Report: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_place_backs_up_by_default() {
        let cli = Cli::try_parse_from(["exif-scrub", "--strip-identifying", "--in-place", "a.jpg"])
            .unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.mode, WriteMode::InPlace { backup_ext: Some("bak".into()) });
    }

    #[test]
    fn no_backup_opts_out() {
        let cli = Cli::try_parse_from([
            "exif-scrub",
            "--strip-identifying",
            "--in-place",
            "--no-backup",
            "a.jpg",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.mode, WriteMode::InPlace { backup_ext: None });
    }

    #[test]
    fn custom_backup_extension_is_honored() {
        let cli = Cli::try_parse_from([
            "exif-scrub",
            "--strip-identifying",
            "--in-place",
            "--backup-ext",
            "orig",
            "a.jpg",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.mode, WriteMode::InPlace { backup_ext: Some("orig".into()) });
    }

    #[test]
    fn mutations_without_destination_are_rejected() {
        let cli =
            Cli::try_parse_from(["exif-scrub", "--strip-identifying", "a.jpg"]).unwrap();
        assert!(build_config(&cli).is_err());
    }
}
