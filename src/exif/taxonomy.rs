//! Static field taxonomy: every supported EXIF tag mapped to exactly one
//! category and home IFD.
//!
//! The table is the single source of truth for the strip/preserve policy.
//! Unknown tag codes classify as [`Category::Unclassified`] and are never
//! auto-stripped.

use serde::Serialize;
use std::fmt;

/// Policy category of a metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    /// Reveals the originating device, owner, or software. Stripped.
    Identifying,
    /// Dimensions, color, compression, exposure parameters. Never stripped.
    Technical,
    /// Capture/modification timestamps. Policy-controlled.
    DateTime,
    /// The Orientation tag. Removed only on explicit request.
    Orientation,
    /// Embedded thumbnail fields (IFD1). Stripped.
    Thumbnail,
    /// Not in the taxonomy. Preserved as-is.
    Unclassified,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Identifying => "identifying",
            Self::Technical => "technical",
            Self::DateTime => "datetime",
            Self::Orientation => "orientation",
            Self::Thumbnail => "thumbnail",
            Self::Unclassified => "unclassified",
        };
        f.write_str(s)
    }
}

/// The EXIF sub-block a field lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Ifd {
    /// IFD0 — the primary image directory.
    Primary,
    /// The Exif sub-IFD.
    Exif,
    /// The GPS sub-IFD.
    Gps,
    /// IFD1 — the thumbnail directory.
    Thumbnail,
}

impl fmt::Display for Ifd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Primary => "IFD0",
            Self::Exif => "ExifIFD",
            Self::Gps => "GPS",
            Self::Thumbnail => "IFD1",
        };
        f.write_str(s)
    }
}

/// One row of the static taxonomy.
pub struct TagSpec {
    pub code: u16,
    pub name: &'static str,
    pub ifd: Ifd,
    pub category: Category,
}

// Windows XP tags (UTF-16LE payloads).
pub const TAG_XP_TITLE: u16 = 0x9C9B;
pub const TAG_XP_COMMENT: u16 = 0x9C9C;
pub const TAG_XP_AUTHOR: u16 = 0x9C9D;
pub const TAG_XP_KEYWORDS: u16 = 0x9C9E;
pub const TAG_XP_SUBJECT: u16 = 0x9C9F;

pub const TAG_MAKE: u16 = 0x010F;
pub const TAG_MODEL: u16 = 0x0110;
pub const TAG_ORIENTATION: u16 = 0x0112;
pub const TAG_SOFTWARE: u16 = 0x0131;
pub const TAG_DATETIME: u16 = 0x0132;
pub const TAG_DATETIME_ORIGINAL: u16 = 0x9003;
pub const TAG_DATETIME_DIGITIZED: u16 = 0x9004;
pub const TAG_EXPOSURE_TIME: u16 = 0x829A;
pub const TAG_F_NUMBER: u16 = 0x829D;
pub const TAG_ISO: u16 = 0x8827;
pub const TAG_FOCAL_LENGTH: u16 = 0x920A;
pub const TAG_LENS_MAKE: u16 = 0xA433;
pub const TAG_LENS_MODEL: u16 = 0xA434;

// Sub-IFD pointer tags. Structural, regenerated on write, never modeled
// as fields.
pub const POINTER_TAGS: &[u16] = &[0x8769, 0x8825, 0xA005];

/// The exhaustive tag table. Codes are unique across the table; GPS codes
/// (0x0000–0x001F) do not overlap the IFD0/ExifIFD ranges.
pub const TAXONOMY: &[TagSpec] = &[
    // --- IFD0: identifying ---
    TagSpec { code: 0x010E, name: "ImageDescription", ifd: Ifd::Primary, category: Category::Identifying },
    TagSpec { code: TAG_MAKE, name: "Make", ifd: Ifd::Primary, category: Category::Identifying },
    TagSpec { code: TAG_MODEL, name: "Model", ifd: Ifd::Primary, category: Category::Identifying },
    TagSpec { code: TAG_SOFTWARE, name: "Software", ifd: Ifd::Primary, category: Category::Identifying },
    TagSpec { code: 0x013B, name: "Artist", ifd: Ifd::Primary, category: Category::Identifying },
    TagSpec { code: 0x013C, name: "HostComputer", ifd: Ifd::Primary, category: Category::Identifying },
    TagSpec { code: 0x8298, name: "Copyright", ifd: Ifd::Primary, category: Category::Identifying },
    TagSpec { code: TAG_XP_TITLE, name: "XPTitle", ifd: Ifd::Primary, category: Category::Identifying },
    TagSpec { code: TAG_XP_COMMENT, name: "XPComment", ifd: Ifd::Primary, category: Category::Identifying },
    TagSpec { code: TAG_XP_AUTHOR, name: "XPAuthor", ifd: Ifd::Primary, category: Category::Identifying },
    TagSpec { code: TAG_XP_KEYWORDS, name: "XPKeywords", ifd: Ifd::Primary, category: Category::Identifying },
    TagSpec { code: TAG_XP_SUBJECT, name: "XPSubject", ifd: Ifd::Primary, category: Category::Identifying },
    // --- IFD0: orientation / dates ---
    TagSpec { code: TAG_ORIENTATION, name: "Orientation", ifd: Ifd::Primary, category: Category::Orientation },
    TagSpec { code: TAG_DATETIME, name: "DateTime", ifd: Ifd::Primary, category: Category::DateTime },
    // --- IFD0: technical ---
    TagSpec { code: 0x0100, name: "ImageWidth", ifd: Ifd::Primary, category: Category::Technical },
    TagSpec { code: 0x0101, name: "ImageLength", ifd: Ifd::Primary, category: Category::Technical },
    TagSpec { code: 0x0102, name: "BitsPerSample", ifd: Ifd::Primary, category: Category::Technical },
    TagSpec { code: 0x0103, name: "Compression", ifd: Ifd::Primary, category: Category::Technical },
    TagSpec { code: 0x0106, name: "PhotometricInterpretation", ifd: Ifd::Primary, category: Category::Technical },
    TagSpec { code: 0x0115, name: "SamplesPerPixel", ifd: Ifd::Primary, category: Category::Technical },
    TagSpec { code: 0x011A, name: "XResolution", ifd: Ifd::Primary, category: Category::Technical },
    TagSpec { code: 0x011B, name: "YResolution", ifd: Ifd::Primary, category: Category::Technical },
    TagSpec { code: 0x011C, name: "PlanarConfiguration", ifd: Ifd::Primary, category: Category::Technical },
    TagSpec { code: 0x0128, name: "ResolutionUnit", ifd: Ifd::Primary, category: Category::Technical },
    TagSpec { code: 0x0211, name: "YCbCrCoefficients", ifd: Ifd::Primary, category: Category::Technical },
    TagSpec { code: 0x0212, name: "YCbCrSubSampling", ifd: Ifd::Primary, category: Category::Technical },
    TagSpec { code: 0x0213, name: "YCbCrPositioning", ifd: Ifd::Primary, category: Category::Technical },
    TagSpec { code: 0x013E, name: "WhitePoint", ifd: Ifd::Primary, category: Category::Technical },
    TagSpec { code: 0x013F, name: "PrimaryChromaticities", ifd: Ifd::Primary, category: Category::Technical },
    // --- ExifIFD: capture parameters (technical) ---
    TagSpec { code: TAG_EXPOSURE_TIME, name: "ExposureTime", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: TAG_F_NUMBER, name: "FNumber", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0x8822, name: "ExposureProgram", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: TAG_ISO, name: "ISOSpeedRatings", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0x9000, name: "ExifVersion", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0x9101, name: "ComponentsConfiguration", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0x9102, name: "CompressedBitsPerPixel", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0x9201, name: "ShutterSpeedValue", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0x9202, name: "ApertureValue", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0x9203, name: "BrightnessValue", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0x9204, name: "ExposureBiasValue", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0x9205, name: "MaxApertureValue", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0x9206, name: "SubjectDistance", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0x9207, name: "MeteringMode", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0x9208, name: "LightSource", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0x9209, name: "Flash", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: TAG_FOCAL_LENGTH, name: "FocalLength", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA000, name: "FlashpixVersion", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA001, name: "ColorSpace", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA002, name: "PixelXDimension", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA003, name: "PixelYDimension", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA20E, name: "FocalPlaneXResolution", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA20F, name: "FocalPlaneYResolution", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA210, name: "FocalPlaneResolutionUnit", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA217, name: "SensingMethod", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA300, name: "FileSource", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA301, name: "SceneType", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA401, name: "CustomRendered", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA402, name: "ExposureMode", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA403, name: "WhiteBalance", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA404, name: "DigitalZoomRatio", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA405, name: "FocalLengthIn35mmFilm", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA406, name: "SceneCaptureType", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA407, name: "GainControl", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA408, name: "Contrast", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA409, name: "Saturation", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA40A, name: "Sharpness", ifd: Ifd::Exif, category: Category::Technical },
    TagSpec { code: 0xA432, name: "LensSpecification", ifd: Ifd::Exif, category: Category::Technical },
    // --- ExifIFD: dates ---
    TagSpec { code: TAG_DATETIME_ORIGINAL, name: "DateTimeOriginal", ifd: Ifd::Exif, category: Category::DateTime },
    TagSpec { code: TAG_DATETIME_DIGITIZED, name: "DateTimeDigitized", ifd: Ifd::Exif, category: Category::DateTime },
    TagSpec { code: 0x9010, name: "OffsetTime", ifd: Ifd::Exif, category: Category::DateTime },
    TagSpec { code: 0x9011, name: "OffsetTimeOriginal", ifd: Ifd::Exif, category: Category::DateTime },
    TagSpec { code: 0x9012, name: "OffsetTimeDigitized", ifd: Ifd::Exif, category: Category::DateTime },
    TagSpec { code: 0x9290, name: "SubSecTime", ifd: Ifd::Exif, category: Category::DateTime },
    TagSpec { code: 0x9291, name: "SubSecTimeOriginal", ifd: Ifd::Exif, category: Category::DateTime },
    TagSpec { code: 0x9292, name: "SubSecTimeDigitized", ifd: Ifd::Exif, category: Category::DateTime },
    // --- ExifIFD: identifying ---
    TagSpec { code: 0x927C, name: "MakerNote", ifd: Ifd::Exif, category: Category::Identifying },
    TagSpec { code: 0x9286, name: "UserComment", ifd: Ifd::Exif, category: Category::Identifying },
    TagSpec { code: 0xA420, name: "ImageUniqueID", ifd: Ifd::Exif, category: Category::Identifying },
    TagSpec { code: 0xA430, name: "CameraOwnerName", ifd: Ifd::Exif, category: Category::Identifying },
    TagSpec { code: 0xA431, name: "BodySerialNumber", ifd: Ifd::Exif, category: Category::Identifying },
    TagSpec { code: TAG_LENS_MAKE, name: "LensMake", ifd: Ifd::Exif, category: Category::Identifying },
    TagSpec { code: TAG_LENS_MODEL, name: "LensModel", ifd: Ifd::Exif, category: Category::Identifying },
    TagSpec { code: 0xA435, name: "LensSerialNumber", ifd: Ifd::Exif, category: Category::Identifying },
    // --- GPS IFD: all identifying, covering the whole 0x0000-0x001F space ---
    TagSpec { code: 0x0000, name: "GPSVersionID", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0001, name: "GPSLatitudeRef", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0002, name: "GPSLatitude", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0003, name: "GPSLongitudeRef", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0004, name: "GPSLongitude", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0005, name: "GPSAltitudeRef", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0006, name: "GPSAltitude", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0007, name: "GPSTimeStamp", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0008, name: "GPSSatellites", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0009, name: "GPSStatus", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x000A, name: "GPSMeasureMode", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x000B, name: "GPSDOP", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x000C, name: "GPSSpeedRef", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x000D, name: "GPSSpeed", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x000E, name: "GPSTrackRef", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x000F, name: "GPSTrack", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0010, name: "GPSImgDirectionRef", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0011, name: "GPSImgDirection", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0012, name: "GPSMapDatum", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0013, name: "GPSDestLatitudeRef", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0014, name: "GPSDestLatitude", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0015, name: "GPSDestLongitudeRef", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0016, name: "GPSDestLongitude", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0017, name: "GPSDestBearingRef", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0018, name: "GPSDestBearing", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x0019, name: "GPSDestDistanceRef", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x001A, name: "GPSDestDistance", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x001B, name: "GPSProcessingMethod", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x001C, name: "GPSAreaInformation", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x001D, name: "GPSDateStamp", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x001E, name: "GPSDifferential", ifd: Ifd::Gps, category: Category::Identifying },
    TagSpec { code: 0x001F, name: "GPSHPositioningError", ifd: Ifd::Gps, category: Category::Identifying },
    // --- IFD1: thumbnail ---
    TagSpec { code: 0x0201, name: "JPEGInterchangeFormat", ifd: Ifd::Thumbnail, category: Category::Thumbnail },
    TagSpec { code: 0x0202, name: "JPEGInterchangeFormatLength", ifd: Ifd::Thumbnail, category: Category::Thumbnail },
];

/// Look up a tag code in the static table.
pub fn lookup(code: u16) -> Option<&'static TagSpec> {
    TAXONOMY.iter().find(|spec| spec.code == code)
}

/// Resolve `(ifd, name, category)` for a tag code.
///
/// `ifd_index` comes from the reader: entries read out of the thumbnail
/// directory (index 1) are always thumbnail fields, whatever their code.
/// Unknown codes default to `(Primary, Unclassified)`.
pub fn classify(ifd_index: usize, code: u16) -> (Ifd, String, Category) {
    if ifd_index == 1 {
        let name = lookup(code)
            .map(|spec| spec.name.to_string())
            .unwrap_or_else(|| fallback_name(code));
        return (Ifd::Thumbnail, name, Category::Thumbnail);
    }
    match lookup(code) {
        Some(spec) => (spec.ifd, spec.name.to_string(), spec.category),
        None => (Ifd::Primary, fallback_name(code), Category::Unclassified),
    }
}

fn fallback_name(code: u16) -> String {
    format!("Tag{code:#06x}")
}
