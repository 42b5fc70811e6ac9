//! favicons-renderer: favicon and web-app icon generation
//!
//! This crate renders every icon a website needs (favicons, android chrome
//! icons, apple touch icons and apple startup images) from a set of PNG or
//! SVG sources, and emits the matching web-app manifest and HTML headers.
//!
//! # Example
//!
//! ```no_run
//! use favicons_renderer::{
//!     FaviconsConfig, HeadersConfig, IconFamily, IconPipeline, IconsConfig, SourceAsset,
//!     html_markup,
//! };
//!
//! let config = FaviconsConfig::new()
//!     .with_path("/static")
//!     .with_icons(
//!         IconsConfig::default()
//!             .with(IconFamily::Favicon, true)
//!             .with(IconFamily::Apple, true),
//!     );
//! let pipeline = IconPipeline::new(config);
//!
//! let sources = vec![SourceAsset::from_path("logo.svg")?];
//! for icon in pipeline.generate(sources)? {
//!     let icon = icon?;
//!     std::fs::write(&icon.filename, &icon.contents)?;
//! }
//!
//! println!("{}", html_markup(&pipeline.html_headers(&HeadersConfig::default())));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # JSON configuration
//!
//! [`FaviconsConfig`] reads the same JSON shape web build tools use, where
//! every family is either a flag or an options object:
//!
//! ```
//! use favicons_renderer::{FaviconsConfig, IconFamily};
//!
//! let config = FaviconsConfig::from_json(
//!     r#"{ "icons": { "favicon": true, "apple": { "offset": 10, "background": true } } }"#,
//! )
//! .unwrap();
//!
//! let families: Vec<_> = config.resolved_families().into_iter().map(|(f, _)| f).collect();
//! assert_eq!(families, vec![IconFamily::Favicon, IconFamily::Apple]);
//! ```

mod catalog;
mod config;
mod error;
mod html;
mod icon;
mod manifest;
mod pipeline;
mod render;
mod source;

pub use catalog::{IconFamily, TargetSpec, find_target};
pub use config::{
    Background, BackgroundOption, DEFAULT_BACKGROUND_COLOR, FaviconsConfig, IconConfig,
    IconEntry, IconOptions, IconsConfig, resolve,
};
pub use error::{FaviconError, Result};
pub use html::{HeadersConfig, HtmlHeader, HtmlTag, MANIFEST_FILENAME, html_headers, html_markup};
pub use icon::{GeneratedIcon, RectPx, SizePx};
pub use manifest::{ManifestConfig, ManifestIcon, RelatedApplication, apply_path, build_manifest};
pub use pipeline::{IconPipeline, IconStream};
pub use render::{IconRenderer, RasterRenderer, RenderRequest, encode_png, pack_ico};
pub use source::{Metadata, SourceAsset, SourceKind, probe_metadata, select_source};
