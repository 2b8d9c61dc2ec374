//! # exif-scrub
//!
//! Read, inspect, and scrub EXIF metadata in JPEG, TIFF, and WebP images,
//! with a keyword heuristic for spotting AI-generated provenance strings.
//!
//! The flow is load → detect → plan → apply → commit:
//!
//! ```rust,no_run
//! use exif_scrub::config::RunConfig;
//! use exif_scrub::pipeline;
//! use exif_scrub::transform::TransformRequest;
//! use exif_scrub::write::WriteMode;
//! use std::path::PathBuf;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = RunConfig {
//!         request: TransformRequest { strip_identifying: true, ..Default::default() },
//!         detect: true,
//!         mode: WriteMode::OutDir { root: PathBuf::from("./clean") },
//!         ..Default::default()
//!     };
//!     config.validate()?;
//!
//!     for report in pipeline::run(&[PathBuf::from("./photos")], &config) {
//!         println!("{}: {} error(s)", report.path.display(), report.errors.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Lower-level pieces are usable on their own: [`exif::MetadataModel::load`]
//! reads a file into the flat field model, [`transform`] builds and applies
//! pure plans over it, [`detect`] runs the provenance heuristic, and
//! [`write`] commits a model back to disk without touching any non-EXIF
//! bytes of the container.
//!
//! ## Modules
//!
//! - [`exif`] — metadata model, tag taxonomy, text/JSON rendering
//! - [`detect`] — two-tier AI-provenance keyword heuristic
//! - [`transform`] — pure transform planning and application
//! - [`write`] — dry-run / in-place / out-dir commit with verified backups
//! - [`pipeline`] — per-file orchestration and input collection
//! - [`report`] — TXT batch report and JSON rendering
//! - [`config`] — validated run configuration
//! - [`error`] — the crate error type

pub mod config;
pub mod detect;
pub mod error;
pub mod exif;
pub mod pipeline;
pub mod report;
pub mod transform;
pub mod write;

pub use error::ScrubError;
