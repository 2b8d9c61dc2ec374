//! Text and JSON renderings of a [`MetadataModel`].
//!
//! Both renderings carry the same field set; only the value encoding differs.
//! Blob values are bounded: text output gets a `<binary, N bytes>`
//! placeholder, JSON gets an `{"omitted": true, "size": N}` marker.

use serde::Serialize;
use serde_json::json;

use super::model::{FieldValue, MetadataModel, BINARY_RENDER_THRESHOLD};
use super::taxonomy::Category;

/// One row of the text rendering.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedField {
    pub ifd: String,
    pub name: String,
    pub category: Category,
    pub value: String,
}

/// Render the model as an ordered sequence of `(tag, category, value)` rows,
/// ordered by IFD then tag code.
pub fn render_text(model: &MetadataModel) -> Vec<RenderedField> {
    model
        .fields
        .iter()
        .map(|f| RenderedField {
            ifd: f.ifd.to_string(),
            name: f.name.clone(),
            category: f.category,
            value: f.value.display(),
        })
        .collect()
}

/// Multi-line text block of the rendering, one field per line.
pub fn render_text_block(model: &MetadataModel) -> String {
    let rows = render_text(model);
    if rows.is_empty() {
        return "(no metadata fields)".to_string();
    }
    let mut out = String::new();
    let mut current_ifd: Option<&str> = None;
    for row in &rows {
        if current_ifd != Some(row.ifd.as_str()) {
            out.push_str(&format!("[{}]\n", row.ifd));
            current_ifd = Some(row.ifd.as_str());
        }
        out.push_str(&format!("  {:<26} ({}) : {}\n", row.name, row.category, row.value));
    }
    out
}

/// Render the model as a JSON document with the same field set as the text
/// rendering.
pub fn render_json(model: &MetadataModel) -> serde_json::Value {
    let fields: Vec<serde_json::Value> = model
        .fields
        .iter()
        .map(|f| {
            let value = match &f.value {
                FieldValue::Text(s) => json!(s),
                FieldValue::UShort(v) => json!(v),
                FieldValue::ULong(v) => json!(v),
                FieldValue::URational(rs) => {
                    if rs.len() == 1 {
                        json!(format!("{}/{}", rs[0].0, rs[0].1))
                    } else {
                        json!(rs.iter().map(|(n, d)| format!("{n}/{d}")).collect::<Vec<_>>())
                    }
                }
                FieldValue::Bytes(b) => {
                    if b.len() > BINARY_RENDER_THRESHOLD {
                        json!({ "omitted": true, "size": b.len() })
                    } else {
                        json!(String::from_utf8_lossy(b))
                    }
                }
            };
            json!({
                "ifd": f.ifd.to_string(),
                "tag": f.name,
                "category": f.category,
                "value": value,
            })
        })
        .collect();

    json!({
        "path": model.path.display().to_string(),
        "format": model.format.to_string(),
        "dimensions": model.dimensions.map(|(w, h)| json!({ "width": w, "height": h })),
        "fields": fields,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::model::{ImageFormat, MetadataField};
    use crate::exif::taxonomy::{Ifd, TAG_MAKE};
    use std::path::PathBuf;

    fn model_with(fields: Vec<MetadataField>) -> MetadataModel {
        MetadataModel {
            path: PathBuf::from("test.jpg"),
            format: ImageFormat::Jpeg,
            dimensions: Some((640, 480)),
            fields,
        }
    }

    fn text_field(ifd: Ifd, code: u16, name: &str, category: Category, value: &str) -> MetadataField {
        MetadataField {
            ifd,
            code,
            name: name.to_string(),
            category,
            value: FieldValue::Text(value.to_string()),
        }
    }

    #[test]
    fn text_and_json_carry_the_same_field_set() {
        let model = model_with(vec![
            text_field(Ifd::Primary, TAG_MAKE, "Make", Category::Identifying, "Canon"),
            MetadataField {
                ifd: Ifd::Exif,
                code: 0x927C,
                name: "MakerNote".to_string(),
                category: Category::Identifying,
                value: FieldValue::Bytes(vec![0u8; 2000]),
            },
        ]);

        let text = render_text(&model);
        let j = render_json(&model);
        let json_fields = j["fields"].as_array().unwrap();

        assert_eq!(text.len(), json_fields.len());
        let text_names: Vec<_> = text.iter().map(|r| r.name.as_str()).collect();
        let json_names: Vec<_> = json_fields.iter().map(|f| f["tag"].as_str().unwrap()).collect();
        assert_eq!(text_names, json_names);
    }

    #[test]
    fn long_blob_is_placeholder_in_text_and_marker_in_json() {
        let model = model_with(vec![MetadataField {
            ifd: Ifd::Exif,
            code: 0x927C,
            name: "MakerNote".to_string(),
            category: Category::Identifying,
            value: FieldValue::Bytes(vec![1u8; 500]),
        }]);

        let text = render_text(&model);
        assert_eq!(text[0].value, "<binary, 500 bytes>");

        let j = render_json(&model);
        let value = &j["fields"][0]["value"];
        assert_eq!(value["omitted"], true);
        assert_eq!(value["size"], 500);
    }

    #[test]
    fn text_block_groups_by_ifd() {
        let model = model_with(vec![
            text_field(Ifd::Primary, TAG_MAKE, "Make", Category::Identifying, "Canon"),
            text_field(Ifd::Exif, 0x9286, "UserComment", Category::Identifying, "hi"),
        ]);
        let block = render_text_block(&model);
        assert!(block.contains("[IFD0]"));
        assert!(block.contains("[ExifIFD]"));
        assert!(block.contains("Make"));
    }

    #[test]
    fn empty_model_renders_placeholder_line() {
        let model = model_with(vec![]);
        assert_eq!(render_text_block(&model), "(no metadata fields)");
    }
}
