//! Static catalog of the icons generated for each family.

use serde::{Deserialize, Serialize};

use crate::icon::SizePx;

// ============================================================================
// IconFamily
// ============================================================================

/// The purpose an icon is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum IconFamily {
    /// Browser favicons, including the multi-resolution `favicon.ico`.
    Favicon,
    /// Android home-screen icons referenced from the web-app manifest.
    Android,
    /// iOS home-screen icons.
    Apple,
    /// iOS launch images.
    AppleStartup,
}

impl IconFamily {
    /// All families in generation order.
    pub const ALL: [IconFamily; 4] = [
        IconFamily::Favicon,
        IconFamily::Android,
        IconFamily::Apple,
        IconFamily::AppleStartup,
    ];

    /// Returns the configuration key of this family.
    pub fn name(self) -> &'static str {
        match self {
            Self::Favicon => "favicon",
            Self::Android => "android",
            Self::Apple => "apple",
            Self::AppleStartup => "appleStartup",
        }
    }

    /// Returns true if icons of this family default to a transparent background.
    pub fn supports_transparency(self) -> bool {
        match self {
            Self::Favicon | Self::Android => true,
            Self::Apple | Self::AppleStartup => false,
        }
    }

    /// Returns the catalog entries for this family, in declaration order.
    pub fn targets(self) -> &'static [TargetSpec] {
        match self {
            Self::Favicon => FAVICON,
            Self::Android => ANDROID,
            Self::Apple => APPLE,
            Self::AppleStartup => APPLE_STARTUP,
        }
    }
}

impl std::fmt::Display for IconFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// TargetSpec
// ============================================================================

/// Geometry of one catalog-declared output file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSpec {
    /// Output filename.
    pub filename: &'static str,

    /// Target width. For containers, the largest sub-size width.
    pub width: u32,

    /// Target height. For containers, the largest sub-size height.
    pub height: u32,

    /// Rotate the sprite by 90° (landscape content in portrait geometry).
    pub rotate: bool,

    /// Sub-sizes packed into a container, in packing order.
    ///
    /// When present, this target is a container and only these sizes are
    /// rendered.
    pub sizes: Option<&'static [SizePx]>,

    /// Device pixel ratio the image targets, used for media queries.
    pub pixel_ratio: Option<f32>,
}

impl TargetSpec {
    const fn square(filename: &'static str, side: u32) -> Self {
        Self {
            filename,
            width: side,
            height: side,
            rotate: false,
            sizes: None,
            pixel_ratio: None,
        }
    }

    const fn startup(
        filename: &'static str,
        width: u32,
        height: u32,
        pixel_ratio: f32,
        rotate: bool,
    ) -> Self {
        Self {
            filename,
            width,
            height,
            rotate,
            sizes: None,
            pixel_ratio: Some(pixel_ratio),
        }
    }

    const fn container(filename: &'static str, sizes: &'static [SizePx]) -> Self {
        let mut width = 0;
        let mut height = 0;
        let mut i = 0;
        while i < sizes.len() {
            if sizes[i].width > width {
                width = sizes[i].width;
            }
            if sizes[i].height > height {
                height = sizes[i].height;
            }
            i += 1;
        }
        Self {
            filename,
            width,
            height,
            rotate: false,
            sizes: Some(sizes),
            pixel_ratio: None,
        }
    }

    /// Returns the target pixel dimensions.
    pub fn size(&self) -> SizePx {
        SizePx::new(self.width, self.height)
    }

    /// Returns true if this target packs several sub-images into one file.
    pub fn is_container(&self) -> bool {
        self.sizes.is_some()
    }
}

// ============================================================================
// Tables
// ============================================================================

const FAVICON_ICO_SIZES: &[SizePx] = &[
    SizePx::new(16, 16),
    SizePx::new(24, 24),
    SizePx::new(32, 32),
    SizePx::new(48, 48),
    SizePx::new(64, 64),
];

const FAVICON: &[TargetSpec] = &[
    TargetSpec::container("favicon.ico", FAVICON_ICO_SIZES),
    TargetSpec::square("favicon-16x16.png", 16),
    TargetSpec::square("favicon-32x32.png", 32),
];

const ANDROID: &[TargetSpec] = &[
    TargetSpec::square("android-chrome-36x36.png", 36),
    TargetSpec::square("android-chrome-48x48.png", 48),
    TargetSpec::square("android-chrome-72x72.png", 72),
    TargetSpec::square("android-chrome-96x96.png", 96),
    TargetSpec::square("android-chrome-144x144.png", 144),
    TargetSpec::square("android-chrome-192x192.png", 192),
    TargetSpec::square("android-chrome-256x256.png", 256),
    TargetSpec::square("android-chrome-384x384.png", 384),
    TargetSpec::square("android-chrome-512x512.png", 512),
];

const APPLE: &[TargetSpec] = &[
    TargetSpec::square("apple-touch-icon-57x57.png", 57),
    TargetSpec::square("apple-touch-icon-60x60.png", 60),
    TargetSpec::square("apple-touch-icon-72x72.png", 72),
    TargetSpec::square("apple-touch-icon-76x76.png", 76),
    TargetSpec::square("apple-touch-icon-114x114.png", 114),
    TargetSpec::square("apple-touch-icon-120x120.png", 120),
    TargetSpec::square("apple-touch-icon-144x144.png", 144),
    TargetSpec::square("apple-touch-icon-152x152.png", 152),
    TargetSpec::square("apple-touch-icon-167x167.png", 167),
    TargetSpec::square("apple-touch-icon-180x180.png", 180),
    TargetSpec::square("apple-touch-icon.png", 180),
    TargetSpec::square("apple-touch-icon-precomposed.png", 180),
];

// Landscape launch images are stored in portrait geometry with rotated content.
// Pixel ratios are the scale factor of the device class each size was made for
// (1x non-retina, 2x retina, 3x plus-size phones).
const APPLE_STARTUP: &[TargetSpec] = &[
    TargetSpec::startup("apple-touch-startup-image-320x460.png", 320, 460, 1.0, false),
    TargetSpec::startup("apple-touch-startup-image-640x920.png", 640, 920, 2.0, false),
    TargetSpec::startup("apple-touch-startup-image-640x1096.png", 640, 1096, 2.0, false),
    TargetSpec::startup("apple-touch-startup-image-748x1024.png", 748, 1024, 1.0, true),
    TargetSpec::startup("apple-touch-startup-image-750x1294.png", 750, 1294, 2.0, false),
    TargetSpec::startup("apple-touch-startup-image-768x1004.png", 768, 1004, 1.0, false),
    TargetSpec::startup("apple-touch-startup-image-1182x2208.png", 1182, 2208, 3.0, true),
    TargetSpec::startup("apple-touch-startup-image-1242x2148.png", 1242, 2148, 3.0, false),
    TargetSpec::startup("apple-touch-startup-image-1242x2208.png", 1242, 2208, 3.0, false),
    TargetSpec::startup("apple-touch-startup-image-1496x2048.png", 1496, 2048, 2.0, true),
    TargetSpec::startup("apple-touch-startup-image-1536x2008.png", 1536, 2008, 2.0, false),
];

/// Looks up a catalog entry by family and filename.
pub fn find_target(family: IconFamily, filename: &str) -> Option<&'static TargetSpec> {
    family.targets().iter().find(|t| t.filename == filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn favicon_catalog_shape() {
        let targets = IconFamily::Favicon.targets();
        assert_eq!(targets.len(), 3);

        let ico = &targets[0];
        assert_eq!(ico.filename, "favicon.ico");
        assert!(ico.is_container());
        let sides: Vec<u32> = ico.sizes.unwrap().iter().map(|s| s.width).collect();
        assert_eq!(sides, vec![16, 24, 32, 48, 64]);
        assert_eq!(ico.size(), SizePx::new(64, 64));

        assert_eq!(targets[1].size(), SizePx::new(16, 16));
        assert_eq!(targets[2].size(), SizePx::new(32, 32));
    }

    #[test]
    fn filenames_are_unique_across_families() {
        let mut seen = HashSet::new();
        for family in IconFamily::ALL {
            for target in family.targets() {
                assert!(seen.insert(target.filename), "duplicate {}", target.filename);
            }
        }
    }

    #[test]
    fn only_favicon_has_a_container() {
        for family in IconFamily::ALL {
            let containers = family.targets().iter().filter(|t| t.is_container()).count();
            let expected = usize::from(family == IconFamily::Favicon);
            assert_eq!(containers, expected, "{family}");
        }
    }

    #[test]
    fn sized_filenames_match_geometry() {
        for family in IconFamily::ALL {
            for target in family.targets().iter().filter(|t| !t.is_container()) {
                let suffix = format!("{}x{}.png", target.width, target.height);
                if target.filename.chars().any(|c| c.is_ascii_digit()) {
                    assert!(target.filename.ends_with(&suffix), "{}", target.filename);
                }
            }
        }
    }

    #[test]
    fn transparency_eligibility() {
        assert!(IconFamily::Favicon.supports_transparency());
        assert!(IconFamily::Android.supports_transparency());
        assert!(!IconFamily::Apple.supports_transparency());
        assert!(!IconFamily::AppleStartup.supports_transparency());
    }

    #[test]
    fn startup_catalog_shape() {
        let targets = IconFamily::AppleStartup.targets();
        assert_eq!(targets.len(), 11);
        assert_eq!(targets.iter().filter(|t| t.rotate).count(), 3);
        assert!(targets.iter().all(|t| t.pixel_ratio.is_some()));
        assert!(find_target(IconFamily::AppleStartup, "apple-touch-startup-image-1125x2436.png").is_none());
    }

    #[test]
    fn find_target_by_name() {
        let target = find_target(IconFamily::AppleStartup, "apple-touch-startup-image-1242x2208.png");
        assert_eq!(target.map(|t| t.pixel_ratio), Some(Some(3.0)));
        assert!(find_target(IconFamily::Apple, "favicon.ico").is_none());
    }

    #[test]
    fn family_serializes_camel_case() {
        let json = serde_json::to_string(&IconFamily::AppleStartup).unwrap();
        assert_eq!(json, "\"appleStartup\"");
        assert_eq!(IconFamily::AppleStartup.to_string(), "appleStartup");
    }
}
