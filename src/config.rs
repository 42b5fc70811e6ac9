//! Serializable generator configuration and per-family config resolution.
//!
//! A [`FaviconsConfig`] captures everything the pipeline needs in a format
//! that can be read from JSON:
//!
//! ```json
//! {
//!   "path": "/static/icons",
//!   "manifest": { "name": "App", "background_color": "#fff" },
//!   "icons": {
//!     "favicon": true,
//!     "android": { "offset": 10 },
//!     "apple": { "background": "#336699" },
//!     "appleStartup": false
//!   }
//! }
//! ```

use image::Rgba;
use palette::{FromColor, Hsl, Srgb, Srgba, WithAlpha};
use serde::{Deserialize, Serialize};

use crate::catalog::IconFamily;
use crate::error::{FaviconError, Result};
use crate::manifest::ManifestConfig;

/// Background color used when the manifest does not declare one.
pub const DEFAULT_BACKGROUND_COLOR: &str = "#fff";

// ============================================================================
// Raw (user-facing) icon options
// ============================================================================

/// Background option as written by the user: a flag or a color string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum BackgroundOption {
    /// `true` uses the manifest color, `false` requests transparency where allowed.
    Flag(bool),
    /// An explicit color, or `"transparent"`.
    Color(String),
}

/// Explicit per-family options.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct IconOptions {
    /// Inset from the canvas edges, in percent of the longest target side.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<f32>,

    /// Canvas background.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<BackgroundOption>,
}

/// A family entry: boolean shorthand or explicit options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum IconEntry {
    Enabled(bool),
    Options(IconOptions),
}

impl IconEntry {
    /// Returns false for `false`; options and `true` enable the family.
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Enabled(false))
    }
}

impl From<bool> for IconEntry {
    fn from(enabled: bool) -> Self {
        Self::Enabled(enabled)
    }
}

impl From<IconOptions> for IconEntry {
    fn from(options: IconOptions) -> Self {
        Self::Options(options)
    }
}

/// Per-family enablement table. Absent families are disabled.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct IconsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<IconEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub android: Option<IconEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apple: Option<IconEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apple_startup: Option<IconEntry>,
}

impl IconsConfig {
    /// Every family enabled with default options.
    pub fn all() -> Self {
        Self {
            favicon: Some(IconEntry::Enabled(true)),
            android: Some(IconEntry::Enabled(true)),
            apple: Some(IconEntry::Enabled(true)),
            apple_startup: Some(IconEntry::Enabled(true)),
        }
    }

    /// Returns the raw entry for a family.
    pub fn entry(&self, family: IconFamily) -> Option<&IconEntry> {
        match family {
            IconFamily::Favicon => self.favicon.as_ref(),
            IconFamily::Android => self.android.as_ref(),
            IconFamily::Apple => self.apple.as_ref(),
            IconFamily::AppleStartup => self.apple_startup.as_ref(),
        }
    }

    /// Sets the raw entry for a family.
    pub fn set(&mut self, family: IconFamily, entry: impl Into<IconEntry>) {
        let slot = match family {
            IconFamily::Favicon => &mut self.favicon,
            IconFamily::Android => &mut self.android,
            IconFamily::Apple => &mut self.apple,
            IconFamily::AppleStartup => &mut self.apple_startup,
        };
        *slot = Some(entry.into());
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, family: IconFamily, entry: impl Into<IconEntry>) -> Self {
        self.set(family, entry);
        self
    }

    /// Returns true if the family produces any icons.
    pub fn is_enabled(&self, family: IconFamily) -> bool {
        self.entry(family).is_some_and(IconEntry::is_enabled)
    }
}

// ============================================================================
// FaviconsConfig
// ============================================================================

/// Top-level generator configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct FaviconsConfig {
    /// Public path prefix for manifest and HTML references.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Web-app manifest; `background_color` feeds background defaulting.
    #[serde(default)]
    pub manifest: ManifestConfig,

    /// Icon families to generate. `None` enables every family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icons: Option<IconsConfig>,
}

impl FaviconsConfig {
    /// Creates a config that generates every family.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the public path prefix.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the manifest.
    pub fn with_manifest(mut self, manifest: ManifestConfig) -> Self {
        self.manifest = manifest;
        self
    }

    /// Sets the icons table.
    pub fn with_icons(mut self, icons: IconsConfig) -> Self {
        self.icons = Some(icons);
        self
    }

    /// Returns the effective icons table.
    pub fn icons(&self) -> IconsConfig {
        self.icons.clone().unwrap_or_else(IconsConfig::all)
    }

    /// Returns the manifest background color, falling back to white.
    pub fn background_color(&self) -> &str {
        self.manifest
            .background_color
            .as_deref()
            .unwrap_or(DEFAULT_BACKGROUND_COLOR)
    }

    /// Resolves every enabled family, in generation order.
    pub fn resolved_families(&self) -> Vec<(IconFamily, IconConfig)> {
        let icons = self.icons();
        IconFamily::ALL
            .into_iter()
            .filter_map(|family| {
                resolve(family, &icons, self.background_color()).map(|config| (family, config))
            })
            .collect()
    }

    /// Serializes the config to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the config to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Resolved config
// ============================================================================

/// Canvas background after resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Background {
    Transparent,
    Color(String),
}

impl Background {
    /// Parses a user color string; `"transparent"` maps to [`Background::Transparent`].
    pub fn from_color(color: &str) -> Self {
        if color.trim().eq_ignore_ascii_case("transparent") {
            Self::Transparent
        } else {
            Self::Color(color.to_string())
        }
    }

    /// Converts to an RGBA pixel.
    ///
    /// Accepts CSS named colors, `#rgb` / `#rgba` / `#rrggbb` / `#rrggbbaa`
    /// hex codes and the functional `rgb[a]()` / `hsl[a]()` notations.
    pub fn to_rgba(&self) -> Result<Rgba<u8>> {
        match self {
            Self::Transparent => Ok(Rgba([0, 0, 0, 0])),
            Self::Color(color) => parse_color(color)
                .map(|c| Rgba([c.red, c.green, c.blue, c.alpha]))
                .ok_or_else(|| {
                    FaviconError::Validation(format!("unrecognized background color `{color}`"))
                }),
        }
    }
}

impl std::fmt::Display for Background {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transparent => f.write_str("transparent"),
            Self::Color(color) => f.write_str(color),
        }
    }
}

fn parse_color(color: &str) -> Option<Srgba<u8>> {
    let color = color.trim().to_ascii_lowercase();
    if let Some(hex) = color.strip_prefix('#') {
        return parse_hex(hex);
    }
    if color.ends_with(')') {
        return parse_function(&color);
    }
    palette::named::from_str(&color).map(|c| c.with_alpha(u8::MAX))
}

fn parse_hex(hex: &str) -> Option<Srgba<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let (rgb, alpha) = match hex.len() {
        3 | 6 => (hex, None),
        4 => (&hex[..3], Some(hex[3..].repeat(2))),
        8 => (&hex[..6], Some(hex[6..].to_string())),
        _ => return None,
    };
    let rgb = format!("#{rgb}").parse::<Srgb<u8>>().ok()?;
    let alpha = match alpha {
        Some(alpha) => u8::from_str_radix(&alpha, 16).ok()?,
        None => u8::MAX,
    };
    Some(rgb.with_alpha(alpha))
}

/// Parses `rgb()`, `rgba()`, `hsl()` and `hsla()` in comma or space syntax.
fn parse_function(color: &str) -> Option<Srgba<u8>> {
    let (name, args) = color.strip_suffix(')')?.split_once('(')?;
    let args: Vec<&str> = args
        .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
        .filter(|arg| !arg.is_empty())
        .collect();
    let (channels, alpha) = match args.as_slice() {
        [a, b, c] => ([*a, *b, *c], 1.0),
        [a, b, c, alpha] => ([*a, *b, *c], parse_unit(alpha, 1.0)?),
        _ => return None,
    };

    let rgb: Srgb<f32> = match name.trim() {
        "rgb" | "rgba" => Srgb::new(
            parse_unit(channels[0], 255.0)?,
            parse_unit(channels[1], 255.0)?,
            parse_unit(channels[2], 255.0)?,
        ),
        "hsl" | "hsla" => {
            let hue = channels[0].trim_end_matches("deg").parse::<f32>().ok()?;
            if !hue.is_finite() {
                return None;
            }
            let hsl: Hsl = Hsl::new(hue, parse_percent(channels[1])?, parse_percent(channels[2])?);
            Srgb::from_color(hsl)
        }
        _ => return None,
    };

    Some(rgb.with_alpha(alpha).into_format())
}

/// Maps a number in `0..=max` or a percentage to `0.0..=1.0`.
fn parse_unit(value: &str, max: f32) -> Option<f32> {
    let unit = match value.strip_suffix('%') {
        Some(percent) => percent.parse::<f32>().ok()? / 100.0,
        None => value.parse::<f32>().ok()? / max,
    };
    unit.is_finite().then(|| unit.clamp(0.0, 1.0))
}

/// Parses a percentage; hsl saturation and lightness require the `%` sign.
fn parse_percent(value: &str) -> Option<f32> {
    value.ends_with('%').then(|| parse_unit(value, 1.0)).flatten()
}

/// Fully resolved options for one family.
#[derive(Debug, Clone, PartialEq)]
pub struct IconConfig {
    /// Inset in percent of the longest target side (0-100).
    pub offset: f32,
    pub background: Background,
}

/// Resolves a family's raw entry against the manifest background color.
///
/// Returns `None` when the family is disabled or absent.
pub fn resolve(
    family: IconFamily,
    icons: &IconsConfig,
    manifest_background: &str,
) -> Option<IconConfig> {
    let options = match icons.entry(family)? {
        IconEntry::Enabled(false) => return None,
        IconEntry::Enabled(true) => IconOptions::default(),
        IconEntry::Options(options) => options.clone(),
    };

    let offset = options.offset.unwrap_or(0.0);
    let background = match options.background.unwrap_or(BackgroundOption::Flag(false)) {
        BackgroundOption::Color(color) => Background::from_color(&color),
        BackgroundOption::Flag(explicit) => {
            if family.supports_transparency() && !explicit {
                Background::Transparent
            } else {
                Background::from_color(manifest_background)
            }
        }
    };

    Some(IconConfig { offset, background })
}
