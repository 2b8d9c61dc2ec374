use nom_exif::{EntryValue, ExifIter, MediaParser, MediaSource};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::ScrubError;
use super::taxonomy::{self, Category, Ifd, POINTER_TAGS};

/// EXIF datetime format ("YYYY:MM:DD HH:MM:SS").
pub const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

const XP_TAGS: &[u16] = &[
    taxonomy::TAG_XP_TITLE,
    taxonomy::TAG_XP_COMMENT,
    taxonomy::TAG_XP_AUTHOR,
    taxonomy::TAG_XP_KEYWORDS,
    taxonomy::TAG_XP_SUBJECT,
];

/// Blob values longer than this render as a placeholder instead of raw bytes.
pub const BINARY_RENDER_THRESHOLD: usize = 64;

/// The closed set of container formats the engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageFormat {
    Jpeg,
    Tiff,
    WebP,
    /// Carries no EXIF block; metadata operations are reported no-ops.
    Png,
}

impl ImageFormat {
    /// Whether the format supports EXIF write operations.
    pub fn is_writable(&self) -> bool {
        !matches!(self, Self::Png)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Jpeg => "JPEG",
            Self::Tiff => "TIFF",
            Self::WebP => "WebP",
            Self::Png => "PNG",
        };
        f.write_str(s)
    }
}

/// A single decoded metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    UShort(u16),
    ULong(u32),
    /// One or more unsigned rationals as `(numerator, denominator)` pairs.
    URational(Vec<(u32, u32)>),
    Bytes(Vec<u8>),
}

impl FieldValue {
    /// Human-readable rendering. Large byte blobs become a bounded
    /// placeholder so output stays terminal-safe.
    pub fn display(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::UShort(v) => v.to_string(),
            Self::ULong(v) => v.to_string(),
            Self::URational(rs) => rs
                .iter()
                .map(|(num, den)| {
                    if *den == 0 { num.to_string() } else { format!("{num}/{den}") }
                })
                .collect::<Vec<_>>()
                .join(", "),
            Self::Bytes(b) => {
                if b.len() <= BINARY_RENDER_THRESHOLD && b.iter().all(|c| c.is_ascii_graphic() || *c == b' ') {
                    String::from_utf8_lossy(b).into_owned()
                } else {
                    format!("<binary, {} bytes>", b.len())
                }
            }
        }
    }

    /// Rendering used for keyword scanning. Byte payloads are decoded
    /// lossily (with interleaved nuls dropped, so UTF-16LE text is caught
    /// too) instead of collapsing to the bounded display placeholder.
    pub fn scan_text(&self) -> String {
        match self {
            Self::Bytes(b) => String::from_utf8_lossy(b).replace('\0', ""),
            other => other.display(),
        }
    }
}

/// One key/value entry in an image's metadata container.
#[derive(Debug, Clone)]
pub struct MetadataField {
    pub ifd: Ifd,
    pub code: u16,
    pub name: String,
    pub category: Category,
    pub value: FieldValue,
}

/// The full metadata field set for one image.
///
/// Constructed by [`MetadataModel::load`]; mutated only through the transform
/// engine (which produces a new model); consumed by the safe-write pipeline.
#[derive(Debug, Clone)]
pub struct MetadataModel {
    pub path: PathBuf,
    pub format: ImageFormat,
    pub dimensions: Option<(u32, u32)>,
    pub fields: Vec<MetadataField>,
}

impl MetadataModel {
    /// Load the metadata model for an image file.
    ///
    /// The format is detected from a header sniff; a file that is none of
    /// JPEG/TIFF/WebP/PNG fails with [`ScrubError::UnsupportedFormat`] without
    /// reading further. PNG yields an empty field set (dimensions come from
    /// the pixel header, not from metadata fields). A supported container
    /// whose EXIF block is absent also yields an empty field set.
    pub fn load(path: &Path) -> Result<Self, ScrubError> {
        let format = sniff_format(path)?;

        let dimensions = match image::image_dimensions(path) {
            Ok(dims) => Some(dims),
            Err(e) => {
                log::debug!("could not probe dimensions of {}: {e}", path.display());
                None
            }
        };

        let mut model = Self {
            path: path.to_path_buf(),
            format,
            dimensions,
            fields: Vec::new(),
        };

        if format == ImageFormat::Png {
            return Ok(model);
        }

        let mut parser = MediaParser::new();
        let ms = MediaSource::file_path(path).map_err(|e| ScrubError::CorruptMetadata {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

        let iter: ExifIter = match parser.parse(ms) {
            Ok(iter) => iter,
            Err(e) => {
                // A missing EXIF block and a mangled one are indistinguishable
                // here; both read as an empty field set. Container-level
                // corruption still surfaces on the write path.
                log::debug!("no parsable EXIF in {}: {e}", path.display());
                return Ok(model);
            }
        };

        for mut entry in iter {
            let code = entry.tag_code();
            if POINTER_TAGS.contains(&code) {
                continue;
            }
            let ifd_index = entry.ifd_index();
            let Some(value) = entry.take_value() else {
                continue;
            };
            let (ifd, name, category) = taxonomy::classify(ifd_index, code);
            model.fields.push(MetadataField {
                ifd,
                code,
                name,
                category,
                value: convert_value(code, value),
            });
        }

        model.fields.sort_by_key(|f| (f.ifd, f.code));
        log::debug!(
            "loaded {} metadata fields from {} ({format})",
            model.fields.len(),
            path.display()
        );
        Ok(model)
    }

    /// Look up a field by sub-block and tag code.
    pub fn field(&self, ifd: Ifd, code: u16) -> Option<&MetadataField> {
        self.fields.iter().find(|f| f.ifd == ifd && f.code == code)
    }

    pub fn has_tag(&self, ifd: Ifd, code: u16) -> bool {
        self.field(ifd, code).is_some()
    }
}

/// Detect the container format from the file's magic bytes.
pub fn sniff_format(path: &Path) -> Result<ImageFormat, ScrubError> {
    let mut file = File::open(path)?;
    let mut header = [0u8; 16];
    let mut filled = 0;
    while filled < header.len() {
        let n = file.read(&mut header[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    let header = &header[..filled];

    if header.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Ok(ImageFormat::Jpeg)
    } else if header.starts_with(b"II*\0") || header.starts_with(b"MM\0*") {
        Ok(ImageFormat::Tiff)
    } else if header.len() >= 12 && &header[..4] == b"RIFF" && &header[8..12] == b"WEBP" {
        Ok(ImageFormat::WebP)
    } else if header.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        Ok(ImageFormat::Png)
    } else {
        Err(ScrubError::UnsupportedFormat {
            path: path.to_path_buf(),
            detail: "no known image signature".into(),
        })
    }
}

/// Convert a decoded nom-exif entry value into the model representation.
fn convert_value(code: u16, value: EntryValue) -> FieldValue {
    match value {
        EntryValue::Text(s) => FieldValue::Text(s.trim_end_matches('\0').to_string()),
        EntryValue::U8(v) => FieldValue::UShort(v as u16),
        EntryValue::U16(v) => FieldValue::UShort(v),
        EntryValue::U32(v) => FieldValue::ULong(v),
        EntryValue::URational(r) => FieldValue::URational(vec![(r.0, r.1)]),
        EntryValue::URationalArray(rs) => {
            FieldValue::URational(rs.iter().map(|r| (r.0, r.1)).collect())
        }
        EntryValue::Undefined(bytes) => {
            if XP_TAGS.contains(&code) {
                FieldValue::Text(decode_utf16le(&bytes))
            } else {
                FieldValue::Bytes(bytes)
            }
        }
        EntryValue::Time(t) => FieldValue::Text(t.format(EXIF_DATETIME_FORMAT).to_string()),
        other => FieldValue::Text(other.to_string()),
    }
}

/// Decode a UTF-16LE payload (XP* tags), dropping the nul terminator.
fn decode_utf16le(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16_lossy(&units)
        .trim_end_matches('\0')
        .to_string()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // A valid 1x1 RGBA PNG.
    pub(crate) const TINY_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
        0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
        0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00,
        0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn sniff_jpeg_magic() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]).unwrap();
        assert_eq!(sniff_format(&path).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn sniff_tiff_both_byte_orders() {
        let dir = TempDir::new().unwrap();
        let le = dir.path().join("a.tif");
        fs::write(&le, b"II*\0datadata").unwrap();
        assert_eq!(sniff_format(&le).unwrap(), ImageFormat::Tiff);

        let be = dir.path().join("b.tif");
        fs::write(&be, b"MM\0*datadata").unwrap();
        assert_eq!(sniff_format(&be).unwrap(), ImageFormat::Tiff);
    }

    #[test]
    fn sniff_webp_riff_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.webp");
        fs::write(&path, b"RIFF\x10\x00\x00\x00WEBPVP8 ").unwrap();
        assert_eq!(sniff_format(&path).unwrap(), ImageFormat::WebP);
    }

    #[test]
    fn sniff_rejects_unknown_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.gif");
        fs::write(&path, b"GIF89a...").unwrap();
        let err = sniff_format(&path).unwrap_err();
        assert!(matches!(err, ScrubError::UnsupportedFormat { .. }));
    }

    #[test]
    fn png_model_has_empty_field_set_and_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.png");
        fs::write(&path, TINY_PNG).unwrap();

        let model = MetadataModel::load(&path).unwrap();
        assert_eq!(model.format, ImageFormat::Png);
        assert!(model.fields.is_empty());
        assert_eq!(model.dimensions, Some((1, 1)));
    }

    #[test]
    fn jpeg_without_exif_loads_as_empty_model() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bare.jpg");
        fs::write(&path, crate::write::tests::minimal_jpeg()).unwrap();

        let model = MetadataModel::load(&path).unwrap();
        assert_eq!(model.format, ImageFormat::Jpeg);
        assert!(model.fields.is_empty());
    }

    #[test]
    fn binary_blob_displays_as_placeholder() {
        let value = FieldValue::Bytes(vec![0u8; 4096]);
        assert_eq!(value.display(), "<binary, 4096 bytes>");
    }

    #[test]
    fn short_printable_bytes_display_inline() {
        let value = FieldValue::Bytes(b"ASCII text".to_vec());
        assert_eq!(value.display(), "ASCII text");
    }

    #[test]
    fn rational_display() {
        let value = FieldValue::URational(vec![(1, 125)]);
        assert_eq!(value.display(), "1/125");
        let multi = FieldValue::URational(vec![(40, 1), (42, 1), (0, 0)]);
        assert_eq!(multi.display(), "40/1, 42/1, 0");
    }

    #[test]
    fn utf16le_decode_drops_terminator() {
        let mut bytes: Vec<u8> = "hola".encode_utf16().flat_map(|c| c.to_le_bytes()).collect();
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(decode_utf16le(&bytes), "hola");
    }
}
