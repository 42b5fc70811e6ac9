//! Icon geometry and generated icon artifacts.
//!
//! This module provides the pixel-space types shared by the catalog, the
//! compositor and the pipeline, plus [`GeneratedIcon`], the unit the
//! pipeline hands back to its consumer.

use crate::catalog::IconFamily;

/// A rectangle defined in pixel coordinates.
///
/// Used by the compositor to describe the inset box a sprite is placed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RectPx {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl RectPx {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Returns the dimensions of the rectangle.
    pub fn size(&self) -> SizePx {
        SizePx::new(self.width, self.height)
    }
}

/// A 2D size in pixel units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SizePx {
    pub width: u32,
    pub height: u32,
}

impl SizePx {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn longest_side(&self) -> u32 {
        self.width.max(self.height)
    }

    pub fn shortest_side(&self) -> u32 {
        self.width.min(self.height)
    }

    /// Returns the size with width and height exchanged.
    pub fn transposed(&self) -> Self {
        Self::new(self.height, self.width)
    }

    /// Scales `self` to fit inside `bounds` preserving aspect ratio.
    ///
    /// No cropping and no stretching: at least one side matches `bounds`
    /// exactly and neither side exceeds it. Degenerate sizes collapse to
    /// one pixel.
    pub fn contain_within(&self, bounds: SizePx) -> SizePx {
        if self.width == 0 || self.height == 0 {
            return SizePx::new(bounds.width.max(1), bounds.height.max(1));
        }

        let scale_x = bounds.width as f64 / self.width as f64;
        let scale_y = bounds.height as f64 / self.height as f64;

        if scale_x <= scale_y {
            let height = (self.height as f64 * scale_x).round() as u32;
            SizePx::new(bounds.width.max(1), height.clamp(1, bounds.height.max(1)))
        } else {
            let width = (self.width as f64 * scale_y).round() as u32;
            SizePx::new(width.clamp(1, bounds.width.max(1)), bounds.height.max(1))
        }
    }
}

impl std::fmt::Display for SizePx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One generated output file.
///
/// Created by the pipeline and handed to the consumer immediately; it has
/// no identity beyond the generation call that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedIcon {
    /// The family this icon belongs to.
    pub family: IconFamily,

    /// Catalog-defined output filename, e.g. `favicon-32x32.png`.
    pub filename: String,

    /// Pixel width. For containers, the largest embedded width.
    pub width: u32,

    /// Pixel height. For containers, the largest embedded height.
    pub height: u32,

    /// Encoded bytes: PNG, or ICO for container targets.
    pub contents: Vec<u8>,
}

impl GeneratedIcon {
    /// Returns the pixel dimensions of the icon.
    pub fn dimensions(&self) -> SizePx {
        SizePx::new(self.width, self.height)
    }

    /// Returns true if this icon is a multi-resolution container.
    pub fn is_container(&self) -> bool {
        self.filename.ends_with(".ico")
    }
}
