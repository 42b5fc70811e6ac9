//! Source assets, metadata probing and source selection.

use std::io::Cursor;
use std::path::Path;
use std::sync::OnceLock;

use image::{ImageFormat, ImageReader};
use resvg::usvg;

use crate::error::{FaviconError, Result};
use crate::icon::SizePx;

// ============================================================================
// SourceKind / Metadata
// ============================================================================

/// Source formats accepted by the pipeline, keyed by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// PNG raster image.
    Png,
    /// SVG document, rendered at exact target resolution.
    Svg,
}

impl SourceKind {
    /// Maps a file extension (without dot, case-insensitive) to a kind.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    pub fn is_vector(self) -> bool {
        self == Self::Svg
    }
}

/// Intrinsic properties of a source asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub kind: SourceKind,
    pub width: u32,
    pub height: u32,
}

impl Metadata {
    pub fn size(&self) -> SizePx {
        SizePx::new(self.width, self.height)
    }
}

// ============================================================================
// SourceAsset
// ============================================================================

/// Raw source bytes with a lazily attached [`Metadata`].
///
/// Metadata and, for SVG sources, the parsed document are stored in
/// [`OnceLock`]s, so probing and parsing happen at most once per asset even
/// when several threads ask for them.
pub struct SourceAsset {
    name: String,
    contents: Vec<u8>,
    metadata: OnceLock<Metadata>,
    svg_tree: OnceLock<usvg::Tree>,
}

impl std::fmt::Debug for SourceAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceAsset")
            .field("name", &self.name)
            .field("len", &self.contents.len())
            .field("metadata", &self.metadata.get())
            .finish()
    }
}

impl SourceAsset {
    /// Creates an asset from a filename and its bytes.
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
            metadata: OnceLock::new(),
            svg_tree: OnceLock::new(),
        }
    }

    /// Reads an asset from disk.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, contents))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Returns the extension of the asset name, without the dot.
    pub fn extension(&self) -> &str {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
    }

    /// Returns the declared kind, or `UnsupportedFormat` for other extensions.
    pub fn kind(&self) -> Result<SourceKind> {
        SourceKind::from_extension(self.extension()).ok_or_else(|| {
            FaviconError::UnsupportedFormat {
                name: self.name.clone(),
                format: self.extension().to_string(),
            }
        })
    }

    /// Returns true if this asset is declared as a vector document.
    pub fn is_vector(&self) -> bool {
        self.kind().is_ok_and(SourceKind::is_vector)
    }

    /// Returns the attached metadata, if the asset has been probed.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.get()
    }

    /// Returns the attached metadata, probing with `probe` on first use.
    pub fn metadata_with<F>(&self, probe: F) -> Result<&Metadata>
    where
        F: FnOnce(&SourceAsset) -> Result<Metadata>,
    {
        if let Some(metadata) = self.metadata.get() {
            return Ok(metadata);
        }
        let metadata = probe(self)?;
        Ok(self.metadata.get_or_init(|| metadata))
    }

    /// Returns the attached metadata, probing with the built-in decoders.
    pub fn probe(&self) -> Result<&Metadata> {
        self.metadata_with(probe_metadata)
    }

    /// Returns the parsed SVG document, parsing it on first use.
    pub(crate) fn svg_tree(&self) -> Result<&usvg::Tree> {
        if let Some(tree) = self.svg_tree.get() {
            return Ok(tree);
        }
        let options = usvg::Options::default();
        let tree = usvg::Tree::from_data(&self.contents, &options)
            .map_err(|e| FaviconError::decode(&self.name, e))?;
        Ok(self.svg_tree.get_or_init(|| tree))
    }
}

// ============================================================================
// Probing
// ============================================================================

/// Reads intrinsic size and format without rendering.
///
/// SVG documents report their declared size; PNGs are read up to the header.
pub fn probe_metadata(source: &SourceAsset) -> Result<Metadata> {
    match source.kind()? {
        SourceKind::Svg => {
            let size = source.svg_tree()?.size();
            Ok(Metadata {
                kind: SourceKind::Svg,
                width: size.width().round() as u32,
                height: size.height().round() as u32,
            })
        }
        SourceKind::Png => {
            let reader = ImageReader::new(Cursor::new(source.contents()))
                .with_guessed_format()
                .map_err(|e| FaviconError::decode(source.name(), e))?;

            match reader.format() {
                Some(ImageFormat::Png) => {}
                other => {
                    return Err(FaviconError::UnsupportedFormat {
                        name: source.name().to_string(),
                        format: other
                            .map(|f| format!("{f:?}").to_ascii_lowercase())
                            .unwrap_or_else(|| "unknown".into()),
                    });
                }
            }

            let (width, height) = reader
                .into_dimensions()
                .map_err(|e| FaviconError::decode(source.name(), e))?;

            Ok(Metadata {
                kind: SourceKind::Png,
                width,
                height,
            })
        }
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Picks the best source to rasterize into a box of `target` size.
///
/// - Any vector source wins outright (the first one in input order).
/// - Otherwise the raster whose longest side is the smallest value not
///   below the target's longest side is chosen.
/// - If no raster is large enough, the largest one is used and upscaled.
///
/// Ties go to the earliest source. Unprobed sources are probed here.
pub fn select_source(sources: &[SourceAsset], target: SizePx) -> Result<&SourceAsset> {
    if let Some(vector) = sources.iter().find(|s| s.is_vector()) {
        return Ok(vector);
    }

    let needed = target.longest_side();
    let mut nearest: Option<(&SourceAsset, u32)> = None;
    let mut largest: Option<(&SourceAsset, u32)> = None;

    for source in sources {
        let side = source.probe()?.size().longest_side();

        if side >= needed && nearest.is_none_or(|(_, best)| side < best) {
            nearest = Some((source, side));
        }
        if largest.is_none_or(|(_, best)| side > best) {
            largest = Some((source, side));
        }
    }

    if let Some((source, _)) = nearest {
        return Ok(source);
    }

    match largest {
        Some((source, side)) => {
            log::warn!(
                "no source covers {target}; upscaling `{}` from {side}px",
                source.name()
            );
            Ok(source)
        }
        None => Err(FaviconError::Validation("no sources provided".into())),
    }
}
