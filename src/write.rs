//! The safe-write pipeline: serialize a transformed [`MetadataModel`] back
//! into its container and commit it to disk.
//!
//! JPEG and WebP go through img-parts so every non-EXIF segment (ICC, XMP,
//! quant tables, pixel data) is carried over byte-for-byte and only the EXIF
//! payload is swapped. TIFF keeps its EXIF inline in the main IFD chain, so
//! the file is copied first and little_exif rewrites the tags in place. PNG
//! carries no EXIF block and is never rewritten.
//!
//! Commit is fail-closed: in in-place mode the original is backed up and
//! size-verified before the first byte of it is overwritten, and an existing
//! backup target aborts the write rather than being clobbered.

use img_parts::jpeg::{Jpeg, JpegSegment};
use img_parts::webp::WebP;
use img_parts::{Bytes, ImageEXIF};
use little_exif::endian::Endian;
use little_exif::exif_tag::ExifTag;
use little_exif::exif_tag_format::ExifTagFormat;
use little_exif::filetype::FileExtension;
use little_exif::ifd::ExifTagGroup;
use little_exif::metadata::Metadata;
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::ScrubError;
use crate::exif::model::{FieldValue, ImageFormat, MetadataModel};
use crate::exif::taxonomy::Ifd;

// little_exif as_u8_vec(JPEG) returns: [APP1 marker 2B][length 2B][Exif\0\0 6B][TIFF data].
// img-parts set_exif() expects just the TIFF data.
const JPEG_EXIF_OVERHEAD: usize = 10;

// APP1 marker and the EXIF identifier that precedes the TIFF payload.
const MARKER_APP1: u8 = 0xE1;
const EXIF_SEGMENT_PREFIX: &[u8] = b"Exif\0\0";

/// Where the rewritten image goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum WriteMode {
    /// Plan and report only; no filesystem mutation of any kind.
    DryRun,
    /// Overwrite the source file, optionally after a verified backup copy.
    InPlace { backup_ext: Option<String> },
    /// Write into `root`, mirroring the source path relative to the scan base.
    OutDir { root: PathBuf },
}

/// Terminal state of one write attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WriteStatus {
    /// Bytes are on disk at the target path.
    Committed,
    /// Dry run; nothing was written.
    Simulated,
    /// The format does not support metadata writes (PNG).
    Skipped,
    Failed,
}

/// The record of one write attempt, failure included.
#[derive(Debug, Clone, Serialize)]
pub struct WriteOutcome {
    pub target_path: PathBuf,
    pub backup_path: Option<PathBuf>,
    pub bytes_written: u64,
    pub status: WriteStatus,
    pub failure_reason: Option<String>,
}

impl WriteOutcome {
    fn simulated(target: PathBuf) -> Self {
        Self {
            target_path: target,
            backup_path: None,
            bytes_written: 0,
            status: WriteStatus::Simulated,
            failure_reason: None,
        }
    }

    fn skipped(target: PathBuf, bytes: u64) -> Self {
        Self {
            target_path: target,
            backup_path: None,
            bytes_written: bytes,
            status: WriteStatus::Skipped,
            failure_reason: None,
        }
    }

    fn failed(target: PathBuf, err: &ScrubError) -> Self {
        Self {
            target_path: target,
            backup_path: None,
            bytes_written: 0,
            status: WriteStatus::Failed,
            failure_reason: Some(err.to_string()),
        }
    }
}

/// Commit `model` according to `mode`. `base` is the scan root used to mirror
/// relative paths in out-dir mode (for a single file, its parent directory).
///
/// Never panics and never returns `Err`: every failure is folded into a
/// [`WriteStatus::Failed`] outcome so a batch run can keep going.
pub fn commit(model: &MetadataModel, base: &Path, mode: &WriteMode) -> WriteOutcome {
    let result = match mode {
        WriteMode::DryRun => Ok(dry_run(model)),
        WriteMode::InPlace { backup_ext } => in_place(model, backup_ext.as_deref()),
        WriteMode::OutDir { root } => out_dir(model, base, root),
    };
    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("write failed for {}: {e}", model.path.display());
            WriteOutcome::failed(model.path.clone(), &e)
        }
    }
}

fn dry_run(model: &MetadataModel) -> WriteOutcome {
    if !model.format.is_writable() {
        return WriteOutcome::skipped(model.path.clone(), 0);
    }
    WriteOutcome::simulated(model.path.clone())
}

fn in_place(model: &MetadataModel, backup_ext: Option<&str>) -> Result<WriteOutcome, ScrubError> {
    if !model.format.is_writable() {
        log::debug!("{}: {} takes no metadata writes", model.path.display(), model.format);
        return Ok(WriteOutcome::skipped(model.path.clone(), 0));
    }

    // The backup must be in place and verified before anything else runs.
    let backup_path = match backup_ext {
        Some(ext) => Some(make_backup(&model.path, ext)?),
        None => None,
    };

    let bytes = write_to(model, &model.path)?;
    log::info!("rewrote {} in place ({bytes} bytes)", model.path.display());
    Ok(WriteOutcome {
        target_path: model.path.clone(),
        backup_path,
        bytes_written: bytes,
        status: WriteStatus::Committed,
        failure_reason: None,
    })
}

fn out_dir(model: &MetadataModel, base: &Path, root: &Path) -> Result<WriteOutcome, ScrubError> {
    let rel: PathBuf = match model.path.strip_prefix(base) {
        Ok(rel) => rel.to_path_buf(),
        // Not under the scan base (e.g. a single file by absolute path):
        // fall back to a flat layout.
        Err(_) => match model.path.file_name() {
            Some(name) => PathBuf::from(name),
            None => {
                return Err(ScrubError::PathEscape {
                    path: model.path.clone(),
                    out_root: root.to_path_buf(),
                });
            }
        },
    };
    if rel.is_absolute() || rel.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(ScrubError::PathEscape {
            path: model.path.clone(),
            out_root: root.to_path_buf(),
        });
    }

    let target = root.join(&rel);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    if !model.format.is_writable() {
        // Mirror the file untouched so the output tree stays complete.
        let bytes = fs::copy(&model.path, &target).map_err(|e| ScrubError::Write {
            path: target.clone(),
            source: e,
        })?;
        log::debug!("copied {} unmodified ({})", target.display(), model.format);
        return Ok(WriteOutcome::skipped(target, bytes));
    }

    let bytes = write_to(model, &target)?;
    log::info!("wrote {} ({bytes} bytes)", target.display());
    Ok(WriteOutcome {
        target_path: target,
        backup_path: None,
        bytes_written: bytes,
        status: WriteStatus::Committed,
        failure_reason: None,
    })
}

/// Copy `path` to `path.<ext>`, refusing to clobber an existing backup and
/// verifying the copied size before returning.
fn make_backup(path: &Path, ext: &str) -> Result<PathBuf, ScrubError> {
    let backup = backup_target(path, ext);
    if backup.exists() {
        return Err(ScrubError::Backup {
            path: backup,
            detail: "backup target already exists; refusing to overwrite it".into(),
        });
    }

    let src_len = fs::metadata(path)?.len();
    let copied = fs::copy(path, &backup).map_err(|e| ScrubError::Backup {
        path: backup.clone(),
        detail: e.to_string(),
    })?;
    if copied != src_len {
        return Err(ScrubError::Backup {
            path: backup,
            detail: format!("backup is {copied} bytes, source is {src_len}"),
        });
    }

    log::debug!("backed up {} -> {}", path.display(), backup.display());
    Ok(backup)
}

fn backup_target(path: &Path, ext: &str) -> PathBuf {
    let ext = ext.trim_start_matches('.');
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(ext);
    path.with_file_name(name)
}

/// Serialize the model and write the full container to `target`.
fn write_to(model: &MetadataModel, target: &Path) -> Result<u64, ScrubError> {
    match model.format {
        ImageFormat::Jpeg | ImageFormat::WebP => {
            let bytes = container_bytes(model)?;
            fs::write(target, &bytes).map_err(|e| ScrubError::Write {
                path: target.to_path_buf(),
                source: e,
            })?;
            Ok(bytes.len() as u64)
        }
        ImageFormat::Tiff => {
            if target != model.path {
                fs::copy(&model.path, target).map_err(|e| ScrubError::Write {
                    path: target.to_path_buf(),
                    source: e,
                })?;
            }
            let metadata = build_metadata(model);
            metadata.write_to_file(target).map_err(|e| ScrubError::Write {
                path: target.to_path_buf(),
                source: std::io::Error::other(e.to_string()),
            })?;
            Ok(fs::metadata(target)?.len())
        }
        // Callers skip PNG before reaching here.
        ImageFormat::Png => Ok(0),
    }
}

/// Rebuild the JPEG/WebP container with the model's EXIF payload swapped in.
/// All other segments pass through img-parts untouched.
fn container_bytes(model: &MetadataModel) -> Result<Vec<u8>, ScrubError> {
    let file_bytes = fs::read(&model.path)?;
    let payload = exif_payload(model);

    let corrupt = |detail: String| ScrubError::CorruptMetadata {
        path: model.path.clone(),
        detail,
    };

    match model.format {
        ImageFormat::Jpeg => {
            let mut jpeg = Jpeg::from_bytes(Bytes::from(file_bytes))
                .map_err(|e| corrupt(format!("unparsable JPEG container: {e}")))?;
            set_jpeg_exif(&mut jpeg, payload);
            Ok(jpeg.encoder().bytes().to_vec())
        }
        ImageFormat::WebP => {
            let mut webp = WebP::from_bytes(Bytes::from(file_bytes))
                .map_err(|e| corrupt(format!("unparsable WebP container: {e}")))?;
            webp.set_exif(payload.map(Bytes::from));
            Ok(webp.encoder().bytes().to_vec())
        }
        ImageFormat::Tiff | ImageFormat::Png => {
            unreachable!("container_bytes only handles segment-based formats")
        }
    }
}

/// Swap the EXIF APP1 segment of a parsed JPEG.
///
/// `Jpeg::set_exif(Some(..))` inserts the new segment at a fixed index and
/// panics on JPEGs with fewer segments, so insertion is done by hand: the
/// new segment goes back where the old EXIF sat (or right after APP0),
/// clamped to the segment count.
fn set_jpeg_exif(jpeg: &mut Jpeg, payload: Option<Vec<u8>>) {
    let orig_pos = jpeg.segments().iter().position(|s| {
        s.marker() == MARKER_APP1 && s.contents().starts_with(EXIF_SEGMENT_PREFIX)
    });
    jpeg.set_exif(None);
    let Some(data) = payload else {
        return;
    };
    let mut contents = Vec::with_capacity(EXIF_SEGMENT_PREFIX.len() + data.len());
    contents.extend_from_slice(EXIF_SEGMENT_PREFIX);
    contents.extend_from_slice(&data);
    let segment = JpegSegment::new_with_contents(MARKER_APP1, Bytes::from(contents));
    let segments = jpeg.segments_mut();
    let pos = orig_pos.unwrap_or(1).min(segments.len());
    segments.insert(pos, segment);
}

/// The raw TIFF payload for the model's fields, or `None` when the model is
/// empty (which drops the EXIF segment entirely).
fn exif_payload(model: &MetadataModel) -> Option<Vec<u8>> {
    if model.fields.is_empty() {
        return None;
    }
    let raw = build_metadata(model).as_u8_vec(FileExtension::JPEG).ok()?;
    (raw.len() > JPEG_EXIF_OVERHEAD).then(|| raw[JPEG_EXIF_OVERHEAD..].to_vec())
}

/// Encode every model field into a fresh little_exif metadata set.
fn build_metadata(model: &MetadataModel) -> Metadata {
    let mut metadata = Metadata::new();
    for field in &model.fields {
        let (format, data) = encode_value(&field.value);
        match ExifTag::from_u16_with_data(
            field.code,
            &format,
            &data,
            &Endian::Little,
            &group_for(field.ifd),
        ) {
            Ok(tag) => metadata.set_tag(tag),
            Err(_) => {
                log::warn!("skipping unencodable tag {} ({:#06x})", field.name, field.code);
            }
        }
    }
    metadata
}

fn group_for(ifd: Ifd) -> ExifTagGroup {
    match ifd {
        Ifd::Primary => ExifTagGroup::GENERIC,
        Ifd::Exif => ExifTagGroup::EXIF,
        Ifd::Gps => ExifTagGroup::GPS,
        Ifd::Thumbnail => ExifTagGroup::GENERIC,
    }
}

/// Map a model value onto a little_exif tag format plus its little-endian
/// raw data.
fn encode_value(value: &FieldValue) -> (ExifTagFormat, Vec<u8>) {
    match value {
        FieldValue::Text(s) => {
            let mut bytes = s.as_bytes().to_vec();
            bytes.push(0);
            (ExifTagFormat::STRING, bytes)
        }
        FieldValue::UShort(v) => (ExifTagFormat::INT16U, v.to_le_bytes().to_vec()),
        FieldValue::ULong(v) => (ExifTagFormat::INT32U, v.to_le_bytes().to_vec()),
        FieldValue::URational(rs) => {
            let mut bytes = Vec::with_capacity(rs.len() * 8);
            for (num, den) in rs {
                bytes.extend_from_slice(&num.to_le_bytes());
                bytes.extend_from_slice(&den.to_le_bytes());
            }
            (ExifTagFormat::RATIONAL64U, bytes)
        }
        FieldValue::Bytes(b) => (ExifTagFormat::INT8U, b.clone()),
    }
}
