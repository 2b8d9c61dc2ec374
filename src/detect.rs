//! Two-tier AI-provenance heuristic.
//!
//! Tier 1 ([`shallow_scan`]) checks the rendered values of a fixed set of
//! metadata fields against a keyword corpus. Tier 2 ([`deep_scan`], opt-in)
//! searches the raw file bytes in bounded chunks, which also catches
//! generator strings inside embedded XMP/text blocks that never surface as
//! structured fields.
//!
//! This is a heuristic, not a proof. A legitimate software string can
//! coincide with a corpus keyword (false positive), and stripped or absent
//! provenance yields no match (false negative). Both are expected.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::ScrubError;
use crate::exif::MetadataModel;

/// Default keyword corpus: generator names typically left in EXIF or
/// embedded XMP by image-synthesis tools.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "stable diffusion",
    "sdxl",
    "comfyui",
    "invokeai",
    "automatic1111",
    "novelai",
    "midjourney",
    "dall-e",
    "dalle",
    "firefly",
    "adobe firefly",
    "generative fill",
    "leonardo",
    "ideogram",
    "runway",
    "mage.space",
    "controlnet",
];

/// Metadata tags examined by the shallow scan.
const CANDIDATE_TAGS: &[&str] = &[
    "Software",
    "ImageDescription",
    "Artist",
    "Make",
    "Model",
    "UserComment",
    "MakerNote",
    "LensModel",
    "HostComputer",
];

/// Chunk size for the deep byte scan. Reads are overlapped by the longest
/// keyword length minus one so a keyword straddling a boundary is still
/// found.
const DEEP_SCAN_CHUNK_SIZE: usize = 1024 * 1024;

/// An immutable, lower-cased keyword corpus.
///
/// Built once per run from the default list plus any caller extensions;
/// passed explicitly into the scans rather than living in shared state.
#[derive(Debug, Clone)]
pub struct KeywordCorpus {
    keywords: Vec<String>,
}

impl Default for KeywordCorpus {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().map(|k| k.to_string()))
    }
}

impl KeywordCorpus {
    fn new(keywords: impl IntoIterator<Item = String>) -> Self {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for kw in keywords {
            let kw = kw.trim().to_lowercase();
            if !kw.is_empty() && seen.insert(kw.clone()) {
                out.push(kw);
            }
        }
        Self { keywords: out }
    }

    /// The default corpus extended with caller-supplied keywords.
    pub fn with_extra<'a>(extra: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(
            DEFAULT_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .chain(extra.into_iter().map(|k| k.to_string())),
        )
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    fn longest_len(&self) -> usize {
        self.keywords.iter().map(|k| k.len()).max().unwrap_or(0)
    }

    /// Keywords contained (case-insensitively) in `text`.
    fn matches_in(&self, text: &str) -> Vec<&str> {
        let lower = text.to_lowercase();
        self.keywords
            .iter()
            .filter(|kw| lower.contains(kw.as_str()))
            .map(|kw| kw.as_str())
            .collect()
    }
}

/// Per-image provenance verdict. Immutable once produced.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectionResult {
    pub heuristic_match: bool,
    pub matched_keywords: BTreeSet<String>,
    pub matched_fields: BTreeSet<String>,
    pub deep_scan_performed: bool,
    pub deep_scan_matches: BTreeSet<String>,
}

/// Tier 1: scan the decoded metadata field values of `model`.
///
/// Absence of every candidate field is not an error; it simply yields no
/// match.
pub fn shallow_scan(model: &MetadataModel, corpus: &KeywordCorpus) -> DetectionResult {
    let mut result = DetectionResult::default();

    for field in &model.fields {
        if !CANDIDATE_TAGS.contains(&field.name.as_str()) {
            continue;
        }
        let hits = corpus.matches_in(&field.value.scan_text());
        if !hits.is_empty() {
            result.heuristic_match = true;
            result.matched_fields.insert(field.name.clone());
            for hit in hits {
                result.matched_keywords.insert(hit.to_string());
            }
        }
    }

    result
}

/// Tier 2: case-insensitive keyword search over the raw file bytes.
///
/// Reads the file in bounded sequential chunks with a sliding overlap, so
/// peak memory stays capped for arbitrarily large images.
pub fn deep_scan(path: &Path, corpus: &KeywordCorpus) -> Result<BTreeSet<String>, ScrubError> {
    deep_scan_chunked(path, corpus, DEEP_SCAN_CHUNK_SIZE)
}

fn deep_scan_chunked(
    path: &Path,
    corpus: &KeywordCorpus,
    chunk_size: usize,
) -> Result<BTreeSet<String>, ScrubError> {
    let mut file = File::open(path)?;
    let overlap = corpus.longest_len().saturating_sub(1);
    let mut matched = BTreeSet::new();
    let mut window: Vec<u8> = Vec::with_capacity(overlap + chunk_size);
    let mut chunk = vec![0u8; chunk_size];

    loop {
        let n = file.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        window.extend_from_slice(&chunk[..n]);
        window.make_ascii_lowercase();

        for kw in corpus.keywords() {
            if !matched.contains(kw) && contains_subslice(&window, kw.as_bytes()) {
                matched.insert(kw.clone());
            }
        }

        // Keep the tail as overlap for the next read.
        if window.len() > overlap {
            window.drain(..window.len() - overlap);
        }
    }

    Ok(matched)
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

/// Combine both tiers into the final verdict.
///
/// The deep scan is strictly additive: it can only add matches on top of the
/// shallow result, never retract one. A deep-scan read failure is reported
/// and the shallow verdict stands.
pub fn detect(
    path: &Path,
    model: &MetadataModel,
    corpus: &KeywordCorpus,
    deep: bool,
) -> DetectionResult {
    let mut result = shallow_scan(model, corpus);

    if deep {
        result.deep_scan_performed = true;
        match deep_scan(path, corpus) {
            Ok(matches) => {
                if !matches.is_empty() {
                    result.heuristic_match = true;
                    for kw in &matches {
                        result.matched_keywords.insert(kw.clone());
                    }
                    result.deep_scan_matches = matches;
                }
            }
            Err(e) => {
                log::warn!("deep scan failed for {}: {e}", path.display());
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::model::{FieldValue, ImageFormat, MetadataField};
    use crate::exif::taxonomy::{Category, Ifd, TAG_MAKE, TAG_SOFTWARE};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn model_with_fields(fields: Vec<(&str, u16, &str)>) -> MetadataModel {
        MetadataModel {
            path: PathBuf::from("test.jpg"),
            format: ImageFormat::Jpeg,
            dimensions: None,
            fields: fields
                .into_iter()
                .map(|(name, code, value)| MetadataField {
                    ifd: Ifd::Primary,
                    code,
                    name: name.to_string(),
                    category: Category::Identifying,
                    value: FieldValue::Text(value.to_string()),
                })
                .collect(),
        }
    }

    #[test]
    fn shallow_scan_matches_software_field() {
        let model = model_with_fields(vec![
            ("Software", TAG_SOFTWARE, "Stable Diffusion 1.5"),
            ("Make", TAG_MAKE, "Canon"),
        ]);
        let result = shallow_scan(&model, &KeywordCorpus::default());

        assert!(result.heuristic_match);
        assert!(result.matched_fields.contains("Software"));
        assert!(!result.matched_fields.contains("Make"));
        assert!(result.matched_keywords.contains("stable diffusion"));
        assert!(!result.deep_scan_performed);
        assert!(result.deep_scan_matches.is_empty());
    }

    #[test]
    fn shallow_scan_without_candidate_fields_is_no_match() {
        let model = model_with_fields(vec![]);
        let result = shallow_scan(&model, &KeywordCorpus::default());
        assert!(!result.heuristic_match);
        assert!(result.matched_keywords.is_empty());
    }

    #[test]
    fn shallow_scan_ignores_non_candidate_tags() {
        let model = model_with_fields(vec![("Copyright", 0x8298, "midjourney fan club")]);
        let result = shallow_scan(&model, &KeywordCorpus::default());
        assert!(!result.heuristic_match);
    }

    #[test]
    fn shallow_scan_decodes_binary_maker_note() {
        // A generator string buried in a payload well past the display
        // placeholder threshold must still be found.
        let mut payload = b"generated with midjourney v6 ".to_vec();
        payload.extend_from_slice(&[0xFFu8; 100]);

        let mut model = model_with_fields(vec![]);
        model.fields.push(MetadataField {
            ifd: Ifd::Exif,
            code: 0x927C,
            name: "MakerNote".to_string(),
            category: Category::Identifying,
            value: FieldValue::Bytes(payload),
        });

        let result = shallow_scan(&model, &KeywordCorpus::default());
        assert!(result.heuristic_match);
        assert!(result.matched_fields.contains("MakerNote"));
        assert!(result.matched_keywords.contains("midjourney"));
    }

    #[test]
    fn shallow_scan_catches_utf16_byte_payloads() {
        let bytes: Vec<u8> = "made with DALL-E"
            .encode_utf16()
            .flat_map(|c| c.to_le_bytes())
            .collect();

        let mut model = model_with_fields(vec![]);
        model.fields.push(MetadataField {
            ifd: Ifd::Exif,
            code: 0x9286,
            name: "UserComment".to_string(),
            category: Category::Identifying,
            value: FieldValue::Bytes(bytes),
        });

        let result = shallow_scan(&model, &KeywordCorpus::default());
        assert!(result.heuristic_match);
        assert!(result.matched_keywords.contains("dall-e"));
    }

    #[test]
    fn corpus_is_case_insensitive_and_deduplicated() {
        let corpus = KeywordCorpus::with_extra(["MidJourney", "  custom-model  "]);
        let count = corpus
            .keywords()
            .iter()
            .filter(|k| k.as_str() == "midjourney")
            .count();
        assert_eq!(count, 1);
        assert!(corpus.keywords().contains(&"custom-model".to_string()));
    }

    #[test]
    fn deep_scan_finds_keyword_in_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("img.jpg");
        fs::write(&path, b"\xFF\xD8\xFFjunk<xmp>made with ComfyUI</xmp>junk").unwrap();

        let matched = deep_scan(&path, &KeywordCorpus::default()).unwrap();
        assert!(matched.contains("comfyui"));
    }

    #[test]
    fn deep_scan_finds_keyword_straddling_chunk_boundary() {
        // Keyword longer than the chunk size, starting one byte before the
        // first boundary.
        let corpus = KeywordCorpus::default();
        let keyword = b"stable diffusion";
        let chunk_size = 8;

        let mut data = vec![b'x'; chunk_size - 1];
        data.extend_from_slice(keyword);
        data.extend_from_slice(b"trailer");

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("split.bin");
        fs::write(&path, &data).unwrap();

        let matched = deep_scan_chunked(&path, &corpus, chunk_size).unwrap();
        assert!(matched.contains("stable diffusion"));
    }

    #[test]
    fn deep_scan_is_strictly_additive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("img.jpg");
        fs::write(&path, b"rendered by invokeai pipeline").unwrap();

        let model = model_with_fields(vec![("Software", TAG_SOFTWARE, "Stable Diffusion")]);
        let corpus = KeywordCorpus::default();

        let shallow = detect(&path, &model, &corpus, false);
        let deep = detect(&path, &model, &corpus, true);

        assert!(shallow.matched_keywords.is_subset(&deep.matched_keywords));
        assert!(deep.deep_scan_performed);
        assert!(deep.matched_keywords.contains("invokeai"));
        assert!(deep.matched_keywords.contains("stable diffusion"));
    }

    #[test]
    fn deep_matches_empty_when_not_performed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("img.jpg");
        fs::write(&path, b"plain bytes").unwrap();

        let model = model_with_fields(vec![]);
        let result = detect(&path, &model, &KeywordCorpus::default(), false);
        assert!(!result.deep_scan_performed);
        assert!(result.deep_scan_matches.is_empty());
    }

    #[test]
    fn deep_match_alone_sets_heuristic_match() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("img.jpg");
        fs::write(&path, b"metadata-free but tagged dall-e inside").unwrap();

        let model = model_with_fields(vec![]);
        let result = detect(&path, &model, &KeywordCorpus::default(), true);
        assert!(result.heuristic_match);
        assert!(result.deep_scan_matches.contains("dall-e"));
    }
}
