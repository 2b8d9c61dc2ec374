//! The transform engine: turns a requested operation plus a loaded
//! [`MetadataModel`] into a pure [`TransformPlan`], and applies plans to
//! models.
//!
//! Planning never touches the filesystem. Plans from multiple requested
//! operations merge in a fixed order — strip, then date policy, then
//! orientation policy, then camera replacement — and a tag touched by more
//! than one op takes the last-applied op's effect.

use serde::Serialize;

use crate::error::ScrubError;
use crate::exif::model::{FieldValue, MetadataField, MetadataModel};
use crate::exif::taxonomy::{self, Category, Ifd};

/// The sentinel written over timestamps by date anonymization.
pub const ANONYMIZED_DATETIME: &str = "2000:01:01 00:00:00";

/// What to do with DateTime-category fields during a transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum DatePolicy {
    /// Keep timestamps as they are (the default).
    #[default]
    Preserve,
    /// Delete every timestamp field.
    Strip,
    /// Replace the main timestamps with [`ANONYMIZED_DATETIME`]; subsecond
    /// and timezone-offset remnants are removed since the sentinel makes
    /// them meaningless (and offsets still leak a locale).
    Anonymize,
}

/// A replacement camera identity.
///
/// Presets carry an internally consistent make/model/lens/software set;
/// a custom `Brand|Model` spec gets generic lens and software strings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraSpec {
    pub make: String,
    pub model: String,
    pub lens_make: String,
    pub lens_model: String,
    pub software: String,
}

impl CameraSpec {
    /// Resolve a camera spec string: a preset name (`canon`, `iphone`) or a
    /// custom `Brand|Model` pair. Anything else fails with
    /// [`ScrubError::InvalidCameraSpec`].
    pub fn parse(spec: &str) -> Result<Self, ScrubError> {
        match spec.trim().to_lowercase().as_str() {
            "canon" => Ok(Self {
                make: "Canon".into(),
                model: "Canon EOS 5D Mark IV".into(),
                lens_make: "Canon".into(),
                lens_model: "EF 50mm f/1.8".into(),
                software: "Canon Firmware".into(),
            }),
            "iphone" => Ok(Self {
                make: "Apple".into(),
                model: "iPhone 14 Pro".into(),
                lens_make: "Apple".into(),
                lens_model: "iPhone 14 Pro back camera 24mm f/1.78".into(),
                software: "Apple iOS".into(),
            }),
            _ => {
                let Some((make, model)) = spec.split_once('|') else {
                    return Err(ScrubError::InvalidCameraSpec(spec.to_string()));
                };
                let (make, model) = (make.trim(), model.trim());
                if make.is_empty() || model.is_empty() {
                    return Err(ScrubError::InvalidCameraSpec(spec.to_string()));
                }
                Ok(Self {
                    make: make.to_string(),
                    model: model.to_string(),
                    lens_make: make.to_string(),
                    lens_model: "50mm f/1.8".into(),
                    software: "Camera System".into(),
                })
            }
        }
    }
}

/// The full set of requested operations for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransformRequest {
    pub strip_identifying: bool,
    pub date_policy: DatePolicy,
    pub remove_orientation: bool,
    pub camera: Option<CameraSpec>,
    /// With a camera replacement, also set plausible capture parameters.
    pub extended: bool,
}

impl TransformRequest {
    /// Whether any operation would mutate metadata.
    pub fn has_mutations(&self) -> bool {
        self.strip_identifying
            || self.camera.is_some()
            || self.remove_orientation
            || self.date_policy != DatePolicy::Preserve
    }
}

/// A single field-level operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanAction {
    Remove,
    Set(FieldValue),
}

#[derive(Debug, Clone)]
pub struct PlanOp {
    pub ifd: Ifd,
    pub code: u16,
    pub name: String,
    pub action: PlanAction,
}

/// An ordered list of field-level operations. Purely a description of
/// intended change; applying it produces a new model.
#[derive(Debug, Clone, Default)]
pub struct TransformPlan {
    ops: Vec<PlanOp>,
}

impl TransformPlan {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[PlanOp] {
        &self.ops
    }

    /// Append `other`'s ops after this plan's. On apply, the later op wins
    /// for any tag touched twice.
    pub fn merge(mut self, other: TransformPlan) -> Self {
        self.ops.extend(other.ops);
        self
    }

    /// Human-readable plan lines, e.g. for dry-run display.
    pub fn describe(&self) -> Vec<String> {
        self.ops
            .iter()
            .map(|op| match &op.action {
                PlanAction::Remove => format!("remove {} ({})", op.name, op.ifd),
                PlanAction::Set(value) => {
                    format!("set {} ({}) = {}", op.name, op.ifd, value.display())
                }
            })
            .collect()
    }

    fn remove(&mut self, field: &MetadataField) {
        self.ops.push(PlanOp {
            ifd: field.ifd,
            code: field.code,
            name: field.name.clone(),
            action: PlanAction::Remove,
        });
    }

    fn set(&mut self, ifd: Ifd, code: u16, name: &str, value: FieldValue) {
        self.ops.push(PlanOp {
            ifd,
            code,
            name: name.to_string(),
            action: PlanAction::Set(value),
        });
    }
}

/// Options for the strip-identifying pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct StripOptions {
    /// Also delete DateTime-category fields (`DatePolicy::Strip`).
    pub strip_dates: bool,
    /// Also delete the Orientation tag.
    pub remove_orientation: bool,
}

/// Plan removal of every identifying field: the Identifying and Thumbnail
/// categories, the whole GPS sub-block, and optionally dates and
/// orientation. Technical fields are never removed, and unknown
/// (Unclassified) tags are left alone.
pub fn plan_strip(model: &MetadataModel, opts: StripOptions) -> TransformPlan {
    let mut plan = TransformPlan::default();
    for field in &model.fields {
        let remove = match field.category {
            Category::Identifying | Category::Thumbnail => true,
            Category::DateTime => opts.strip_dates,
            Category::Orientation => opts.remove_orientation,
            Category::Technical | Category::Unclassified => field.ifd == Ifd::Gps,
        };
        if remove {
            plan.remove(field);
        }
    }
    plan
}

/// Plan deletion of DateTime fields only.
pub fn plan_strip_dates(model: &MetadataModel) -> TransformPlan {
    let mut plan = TransformPlan::default();
    for field in &model.fields {
        if field.category == Category::DateTime {
            plan.remove(field);
        }
    }
    plan
}

/// Plan replacement of the main timestamps with the fixed sentinel.
/// Distinguished from stripping: the fields stay present.
pub fn plan_anonymize_dates(model: &MetadataModel) -> TransformPlan {
    const MAIN_DATES: &[(Ifd, u16, &str)] = &[
        (Ifd::Primary, taxonomy::TAG_DATETIME, "DateTime"),
        (Ifd::Exif, taxonomy::TAG_DATETIME_ORIGINAL, "DateTimeOriginal"),
        (Ifd::Exif, taxonomy::TAG_DATETIME_DIGITIZED, "DateTimeDigitized"),
    ];

    let mut plan = TransformPlan::default();
    for field in &model.fields {
        if field.category != Category::DateTime {
            continue;
        }
        let is_main = MAIN_DATES.iter().any(|(ifd, code, _)| field.ifd == *ifd && field.code == *code);
        if is_main {
            plan.set(
                field.ifd,
                field.code,
                &field.name,
                FieldValue::Text(ANONYMIZED_DATETIME.to_string()),
            );
        } else {
            plan.remove(field);
        }
    }
    plan
}

/// Plan removal of the Orientation tag, if present.
pub fn plan_remove_orientation(model: &MetadataModel) -> TransformPlan {
    let mut plan = TransformPlan::default();
    for field in &model.fields {
        if field.category == Category::Orientation {
            plan.remove(field);
        }
    }
    plan
}

/// Plan the camera-identity replacement.
///
/// Every value comes from the [`CameraSpec`], never from the original
/// image. In extended mode, plausible capture parameters (f/2.8, 1/125 s,
/// 50 mm, ISO 100) and lens/software strings are set too.
pub fn plan_replace_camera(
    _model: &MetadataModel,
    spec: &CameraSpec,
    extended: bool,
) -> TransformPlan {
    let mut plan = TransformPlan::default();
    plan.set(Ifd::Primary, taxonomy::TAG_MAKE, "Make", FieldValue::Text(spec.make.clone()));
    plan.set(Ifd::Primary, taxonomy::TAG_MODEL, "Model", FieldValue::Text(spec.model.clone()));

    if extended {
        plan.set(
            Ifd::Exif,
            taxonomy::TAG_F_NUMBER,
            "FNumber",
            FieldValue::URational(vec![(28, 10)]),
        );
        plan.set(
            Ifd::Exif,
            taxonomy::TAG_EXPOSURE_TIME,
            "ExposureTime",
            FieldValue::URational(vec![(1, 125)]),
        );
        plan.set(
            Ifd::Exif,
            taxonomy::TAG_FOCAL_LENGTH,
            "FocalLength",
            FieldValue::URational(vec![(50, 1)]),
        );
        plan.set(Ifd::Exif, taxonomy::TAG_ISO, "ISOSpeedRatings", FieldValue::UShort(100));
        plan.set(
            Ifd::Exif,
            taxonomy::TAG_LENS_MAKE,
            "LensMake",
            FieldValue::Text(spec.lens_make.clone()),
        );
        plan.set(
            Ifd::Exif,
            taxonomy::TAG_LENS_MODEL,
            "LensModel",
            FieldValue::Text(spec.lens_model.clone()),
        );
        plan.set(
            Ifd::Primary,
            taxonomy::TAG_SOFTWARE,
            "Software",
            FieldValue::Text(spec.software.clone()),
        );
    }

    plan
}

/// Build the merged plan for a full request, in the documented order:
/// strip → date policy → orientation policy → camera replacement.
///
/// A camera replacement always implies a prior strip pass, so stale identity
/// never survives underneath the replacement; the replacement only restores
/// the tags it explicitly sets.
pub fn build_plan(model: &MetadataModel, request: &TransformRequest) -> TransformPlan {
    let mut plan = TransformPlan::default();

    let strip = request.strip_identifying || request.camera.is_some();
    if strip {
        plan = plan.merge(plan_strip(
            model,
            StripOptions {
                strip_dates: request.date_policy == DatePolicy::Strip,
                remove_orientation: request.remove_orientation,
            },
        ));
    } else {
        if request.date_policy == DatePolicy::Strip {
            plan = plan.merge(plan_strip_dates(model));
        }
        if request.remove_orientation {
            plan = plan.merge(plan_remove_orientation(model));
        }
    }

    if request.date_policy == DatePolicy::Anonymize {
        plan = plan.merge(plan_anonymize_dates(model));
    }

    if let Some(spec) = &request.camera {
        plan = plan.merge(plan_replace_camera(model, spec, request.extended));
    }

    plan
}

/// Apply a plan to a model, producing a new model. The input is never
/// mutated; ops apply in order, so a later op on the same tag wins.
pub fn apply(plan: &TransformPlan, model: &MetadataModel) -> MetadataModel {
    let mut out = model.clone();

    for op in plan.ops() {
        match &op.action {
            PlanAction::Remove => {
                out.fields.retain(|f| !(f.ifd == op.ifd && f.code == op.code));
            }
            PlanAction::Set(value) => {
                if let Some(field) = out
                    .fields
                    .iter_mut()
                    .find(|f| f.ifd == op.ifd && f.code == op.code)
                {
                    field.value = value.clone();
                } else {
                    let category = taxonomy::lookup(op.code)
                        .map(|spec| spec.category)
                        .unwrap_or(Category::Unclassified);
                    out.fields.push(MetadataField {
                        ifd: op.ifd,
                        code: op.code,
                        name: op.name.clone(),
                        category,
                        value: value.clone(),
                    });
                }
            }
        }
    }

    out.fields.sort_by_key(|f| (f.ifd, f.code));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exif::model::ImageFormat;
    use std::path::PathBuf;

    fn field(ifd: Ifd, code: u16, value: FieldValue) -> MetadataField {
        let (_, name, category) = taxonomy::classify(if ifd == Ifd::Thumbnail { 1 } else { 0 }, code);
        MetadataField { ifd, code, name, category, value }
    }

    fn sample_model() -> MetadataModel {
        MetadataModel {
            path: PathBuf::from("sample.jpg"),
            format: ImageFormat::Jpeg,
            dimensions: Some((4000, 3000)),
            fields: vec![
                field(Ifd::Primary, taxonomy::TAG_MAKE, FieldValue::Text("Nikon".into())),
                field(Ifd::Primary, taxonomy::TAG_MODEL, FieldValue::Text("D850".into())),
                field(Ifd::Primary, taxonomy::TAG_SOFTWARE, FieldValue::Text("Lightroom".into())),
                field(Ifd::Primary, taxonomy::TAG_ORIENTATION, FieldValue::UShort(6)),
                field(Ifd::Primary, taxonomy::TAG_DATETIME, FieldValue::Text("2023:05:01 10:00:00".into())),
                field(Ifd::Primary, 0x0100, FieldValue::ULong(4000)), // ImageWidth
                field(Ifd::Primary, 0x011A, FieldValue::URational(vec![(72, 1)])), // XResolution
                field(Ifd::Exif, taxonomy::TAG_DATETIME_ORIGINAL, FieldValue::Text("2023:05:01 10:00:00".into())),
                field(Ifd::Exif, 0x9290, FieldValue::Text("123".into())), // SubSecTime
                field(Ifd::Exif, 0x9286, FieldValue::Bytes(b"comment".to_vec())), // UserComment
                field(Ifd::Gps, 0x0002, FieldValue::URational(vec![(40, 1), (42, 1), (0, 1)])), // GPSLatitude
                field(Ifd::Gps, 0x0001, FieldValue::Text("N".into())), // GPSLatitudeRef
                field(Ifd::Thumbnail, 0x0201, FieldValue::ULong(1024)),
            ],
        }
    }

    #[test]
    fn strip_removes_identifying_thumbnail_and_gps_keeps_technical() {
        let model = sample_model();
        let plan = plan_strip(&model, StripOptions::default());
        let stripped = apply(&plan, &model);

        for f in &stripped.fields {
            assert_ne!(f.category, Category::Identifying, "{} survived", f.name);
            assert_ne!(f.category, Category::Thumbnail, "{} survived", f.name);
            assert_ne!(f.ifd, Ifd::Gps, "{} survived", f.name);
        }
        // Every technical field of the input survives.
        for f in model.fields.iter().filter(|f| f.category == Category::Technical) {
            assert!(stripped.has_tag(f.ifd, f.code), "{} was removed", f.name);
        }
    }

    #[test]
    fn strip_preserves_orientation_and_dates_by_default() {
        let model = sample_model();
        let stripped = apply(&plan_strip(&model, StripOptions::default()), &model);

        let orientation = stripped.field(Ifd::Primary, taxonomy::TAG_ORIENTATION).unwrap();
        assert_eq!(orientation.value, FieldValue::UShort(6));
        assert!(stripped.has_tag(Ifd::Primary, taxonomy::TAG_DATETIME));
        assert!(stripped.has_tag(Ifd::Exif, taxonomy::TAG_DATETIME_ORIGINAL));
    }

    #[test]
    fn strip_removes_dates_and_orientation_when_asked() {
        let model = sample_model();
        let opts = StripOptions { strip_dates: true, remove_orientation: true };
        let stripped = apply(&plan_strip(&model, opts), &model);

        assert!(!stripped.has_tag(Ifd::Primary, taxonomy::TAG_ORIENTATION));
        assert!(!stripped.has_tag(Ifd::Primary, taxonomy::TAG_DATETIME));
        assert!(!stripped.has_tag(Ifd::Exif, taxonomy::TAG_DATETIME_ORIGINAL));
        assert!(!stripped.has_tag(Ifd::Exif, 0x9290));
    }

    #[test]
    fn strip_is_idempotent() {
        let model = sample_model();
        let once = apply(&plan_strip(&model, StripOptions::default()), &model);
        let twice = apply(&plan_strip(&once, StripOptions::default()), &once);

        let names = |m: &MetadataModel| m.fields.iter().map(|f| (f.ifd, f.code)).collect::<Vec<_>>();
        assert_eq!(names(&once), names(&twice));
    }

    #[test]
    fn anonymize_sets_sentinel_and_drops_subseconds() {
        let model = sample_model();
        let out = apply(&plan_anonymize_dates(&model), &model);

        let dt = out.field(Ifd::Primary, taxonomy::TAG_DATETIME).unwrap();
        assert_eq!(dt.value, FieldValue::Text(ANONYMIZED_DATETIME.into()));
        let dto = out.field(Ifd::Exif, taxonomy::TAG_DATETIME_ORIGINAL).unwrap();
        assert_eq!(dto.value, FieldValue::Text(ANONYMIZED_DATETIME.into()));
        assert!(!out.has_tag(Ifd::Exif, 0x9290));
    }

    #[test]
    fn camera_preset_canon_sets_fixed_pair() {
        let spec = CameraSpec::parse("canon").unwrap();
        let model = sample_model();
        let request = TransformRequest {
            camera: Some(spec),
            ..Default::default()
        };
        let out = apply(&build_plan(&model, &request), &model);

        assert_eq!(
            out.field(Ifd::Primary, taxonomy::TAG_MAKE).unwrap().value,
            FieldValue::Text("Canon".into())
        );
        assert_eq!(
            out.field(Ifd::Primary, taxonomy::TAG_MODEL).unwrap().value,
            FieldValue::Text("Canon EOS 5D Mark IV".into())
        );
    }

    #[test]
    fn extended_mode_sets_capture_parameters() {
        let model = sample_model();
        let request = TransformRequest {
            camera: Some(CameraSpec::parse("canon").unwrap()),
            extended: true,
            ..Default::default()
        };
        let out = apply(&build_plan(&model, &request), &model);

        for (ifd, code) in [
            (Ifd::Exif, taxonomy::TAG_F_NUMBER),
            (Ifd::Exif, taxonomy::TAG_EXPOSURE_TIME),
            (Ifd::Exif, taxonomy::TAG_ISO),
            (Ifd::Exif, taxonomy::TAG_LENS_MODEL),
            (Ifd::Primary, taxonomy::TAG_SOFTWARE),
        ] {
            assert!(out.has_tag(ifd, code), "missing {code:#06x}");
        }
        assert_eq!(
            out.field(Ifd::Exif, taxonomy::TAG_F_NUMBER).unwrap().value,
            FieldValue::URational(vec![(28, 10)])
        );
    }

    #[test]
    fn replacement_implies_strip_but_restores_only_set_tags() {
        let model = sample_model();
        let request = TransformRequest {
            camera: Some(CameraSpec::parse("iphone").unwrap()),
            ..Default::default()
        };
        let out = apply(&build_plan(&model, &request), &model);

        // Make/Model replaced, other identifying fields gone.
        assert_eq!(
            out.field(Ifd::Primary, taxonomy::TAG_MAKE).unwrap().value,
            FieldValue::Text("Apple".into())
        );
        assert!(!out.has_tag(Ifd::Primary, taxonomy::TAG_SOFTWARE));
        assert!(!out.has_tag(Ifd::Exif, 0x9286));
        assert!(!out.has_tag(Ifd::Gps, 0x0002));
    }

    #[test]
    fn custom_camera_spec_parses_brand_model() {
        let spec = CameraSpec::parse("Sony | A7 III").unwrap();
        assert_eq!(spec.make, "Sony");
        assert_eq!(spec.model, "A7 III");
    }

    #[test]
    fn camera_spec_without_separator_is_rejected() {
        let err = CameraSpec::parse("polaroid").unwrap_err();
        assert!(matches!(err, ScrubError::InvalidCameraSpec(_)));
        assert!(CameraSpec::parse("OnlyBrand|").is_err());
    }

    #[test]
    fn planning_never_mutates_the_input_model() {
        let model = sample_model();
        let before = model.fields.len();
        let _ = build_plan(
            &model,
            &TransformRequest {
                strip_identifying: true,
                date_policy: DatePolicy::Anonymize,
                remove_orientation: true,
                camera: Some(CameraSpec::parse("canon").unwrap()),
                extended: true,
            },
        );
        assert_eq!(model.fields.len(), before);
    }

    #[test]
    fn plans_are_deterministic() {
        let model = sample_model();
        let request = TransformRequest { strip_identifying: true, ..Default::default() };
        let a = build_plan(&model, &request).describe();
        let b = build_plan(&model, &request).describe();
        assert_eq!(a, b);
    }

    #[test]
    fn flagged_generator_metadata_strips_clean() {
        use crate::detect::{shallow_scan, KeywordCorpus};

        let mut model = sample_model();
        model
            .fields
            .iter_mut()
            .find(|f| f.code == taxonomy::TAG_SOFTWARE)
            .unwrap()
            .value = FieldValue::Text("Stable Diffusion 1.5".into());

        let corpus = KeywordCorpus::default();
        let before = shallow_scan(&model, &corpus);
        assert!(before.heuristic_match);
        assert!(before.matched_fields.contains("Software"));

        let stripped = apply(&plan_strip(&model, StripOptions::default()), &model);
        let after = shallow_scan(&stripped, &corpus);
        assert!(!after.heuristic_match);
        assert!(!stripped.has_tag(Ifd::Gps, 0x0002));
        assert!(stripped.has_tag(Ifd::Primary, 0x011A));
    }

    #[test]
    fn standalone_orientation_removal() {
        let model = sample_model();
        let request = TransformRequest { remove_orientation: true, ..Default::default() };
        let out = apply(&build_plan(&model, &request), &model);
        assert!(!out.has_tag(Ifd::Primary, taxonomy::TAG_ORIENTATION));
        // Nothing else is touched.
        assert!(out.has_tag(Ifd::Primary, taxonomy::TAG_MAKE));
        assert_eq!(out.fields.len(), model.fields.len() - 1);
    }
}
