//! View rendering: template resolution, asset fingerprinting and helpers.
//!
//! - `resolver`: Finds templates by name, suffix variant and partial convention
//! - `manifest`: Lazily loaded asset manifest behind `assetPath`
//! - `renderer`: Expands `<%= %>` tags, wiring `partial`, `assetPath` and `t`

mod manifest;
mod renderer;
mod resolver;

pub use manifest::{AssetManifest, DEFAULT_ASSET_PREFIX, DEFAULT_MANIFEST_FILE};
pub use renderer::{
    lookup, template_suffixes, DataEngine, Renderer, TemplateEngine, MAX_PARTIAL_DEPTH,
    SUFFIXES_KEY,
};
pub use resolver::{with_suffix, Template, TemplateResolver};
