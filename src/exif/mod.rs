//! The canonical in-memory metadata model and its taxonomy.
//!
//! - [`model`] — loading a [`MetadataModel`](model::MetadataModel) from a file
//! - [`taxonomy`] — the static tag → category table driving the strip policy
//! - [`render`] — text and JSON renderings of a model

pub mod model;
pub mod render;
pub mod taxonomy;

pub use model::{FieldValue, ImageFormat, MetadataField, MetadataModel};
pub use render::{render_json, render_text, render_text_block};
pub use taxonomy::{Category, Ifd};
