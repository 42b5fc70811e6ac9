//! Icon rendering: the renderer strategy and the default compositor.
//!
//! The pipeline talks to rendering through the [`IconRenderer`] trait, which
//! bundles the two capabilities it needs:
//! - probing a source for its intrinsic size and format
//! - rendering one target of exact size from a set of sources
//!
//! [`RasterRenderer`] is the default implementation. Rendering one target
//! proceeds as follows:
//!
//! ```text
//! offset % ──► inset box ──► select source ──► contain-fit (+ rotate)
//!                                                     │
//! background ──► canvas (width × height) ◄── composite centered
//! ```

pub mod ico;
pub mod svg;

pub use ico::pack_ico;

use std::io::Cursor;

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};

use crate::error::{FaviconError, Result};
use crate::icon::{RectPx, SizePx};
use crate::source::{self, Metadata, SourceAsset, SourceKind};

// ============================================================================
// RenderRequest
// ============================================================================

/// Everything needed to render one target image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    /// Exact output width.
    pub width: u32,
    /// Exact output height.
    pub height: u32,
    /// Canvas color; alpha 0 for a transparent canvas.
    pub background: Rgba<u8>,
    /// Inset in percent of the longest side.
    pub offset: f32,
    /// Rotate the sprite by 90° clockwise.
    pub rotate: bool,
}

impl RenderRequest {
    pub fn size(&self) -> SizePx {
        SizePx::new(self.width, self.height)
    }

    /// Returns the inset margin in pixels.
    ///
    /// `round(longest * offset / 100)`, with non-finite or negative offsets
    /// treated as 0 and large ones clamped so the inset keeps at least one
    /// pixel on its shortest side.
    pub fn offset_px(&self) -> u32 {
        let longest = self.size().longest_side();
        let requested = longest as f32 * self.offset / 100.0;
        let requested = if requested.is_finite() && requested > 0.0 {
            requested.round() as u32
        } else {
            0
        };

        let max = self.size().shortest_side().saturating_sub(1) / 2;
        if requested > max {
            log::warn!(
                "offset {}% leaves no room in {}; clamping to {max}px",
                self.offset,
                self.size()
            );
            return max;
        }
        requested
    }

    /// Returns the box the sprite is fitted into.
    pub fn inset(&self) -> RectPx {
        let offset = self.offset_px();
        RectPx::new(
            offset,
            offset,
            self.width.saturating_sub(offset * 2),
            self.height.saturating_sub(offset * 2),
        )
    }
}

// ============================================================================
// IconRenderer
// ============================================================================

/// Rendering capabilities the pipeline depends on.
///
/// Implementations must be deterministic: identical inputs produce
/// identical pixels.
pub trait IconRenderer: Send + Sync {
    /// Reads intrinsic metadata of a source.
    fn probe(&self, source: &SourceAsset) -> Result<Metadata>;

    /// Renders one target of exactly `request.width × request.height` pixels.
    fn render(&self, sources: &[SourceAsset], request: &RenderRequest) -> Result<RgbaImage>;
}

/// Default renderer: `image` for PNG sources, `resvg` for SVG sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterRenderer {
    filter: Option<FilterType>,
}

impl RasterRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the resampling filter used for raster sources.
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter: Some(filter) }
    }

    fn filter(&self) -> FilterType {
        self.filter.unwrap_or(FilterType::Lanczos3)
    }

    /// Produces the sprite: the source contain-fitted into `bounds`, rotated if asked.
    fn sprite(&self, source: &SourceAsset, bounds: SizePx, rotate: bool) -> Result<RgbaImage> {
        // Fit into the transposed box so the rotated sprite fits the real one
        let fit_bounds = if rotate { bounds.transposed() } else { bounds };
        let metadata = source.metadata_with(|s| self.probe(s))?;
        let fitted = metadata.size().contain_within(fit_bounds);

        let sprite = match metadata.kind {
            SourceKind::Svg => {
                let tree = source.svg_tree()?;
                svg::render_tree(tree, fitted).ok_or_else(|| {
                    FaviconError::decode(source.name(), format!("cannot rasterize at {fitted}"))
                })?
            }
            SourceKind::Png => {
                let decoded = image::load_from_memory_with_format(source.contents(), ImageFormat::Png)
                    .map_err(|e| FaviconError::decode(source.name(), e))?
                    .to_rgba8();
                if decoded.dimensions() == (fitted.width, fitted.height) {
                    decoded
                } else {
                    imageops::resize(&decoded, fitted.width, fitted.height, self.filter())
                }
            }
        };

        Ok(if rotate {
            imageops::rotate90(&sprite)
        } else {
            sprite
        })
    }
}

impl IconRenderer for RasterRenderer {
    fn probe(&self, source: &SourceAsset) -> Result<Metadata> {
        source::probe_metadata(source)
    }

    fn render(&self, sources: &[SourceAsset], request: &RenderRequest) -> Result<RgbaImage> {
        let mut canvas = RgbaImage::from_pixel(request.width, request.height, request.background);

        let inset = request.inset();
        if inset.width == 0 || inset.height == 0 {
            return Ok(canvas);
        }

        let source = source::select_source(sources, inset.size())?;
        log::debug!(
            "rendering {} from `{}` into {} at ({}, {})",
            request.size(),
            source.name(),
            inset.size(),
            inset.x,
            inset.y
        );

        let sprite = self.sprite(source, inset.size(), request.rotate)?;

        // Center the sprite inside the inset box
        let x = inset.x + inset.width.saturating_sub(sprite.width()) / 2;
        let y = inset.y + inset.height.saturating_sub(sprite.height()) / 2;
        svg::composite_over(&mut canvas, &sprite, x as i32, y as i32);

        Ok(canvas)
    }
}

/// Encodes an RGBA image as PNG.
pub fn encode_png(filename: &str, image: &RgbaImage) -> Result<Vec<u8>> {
    let mut contents = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut contents), ImageFormat::Png)
        .map_err(|source| FaviconError::Encode {
            filename: filename.to_string(),
            source,
        })?;
    Ok(contents)
}
