//! HTML `<head>` entries for generated icons.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{IconFamily, TargetSpec};
use crate::config::FaviconsConfig;
use crate::manifest::apply_path;

/// Manifest filename referenced from the android headers.
pub const MANIFEST_FILENAME: &str = "manifest.json";

// ============================================================================
// HeadersConfig
// ============================================================================

/// Options for the meta tags that are not derived from the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct HeadersConfig {
    /// Emits `yes` or `no` for the web-app-capable meta tags.
    #[serde(default = "default_web_app_capable")]
    pub web_app_capable: bool,

    /// Value of `apple-mobile-web-app-status-bar-style`.
    #[serde(default = "default_status_bar_style")]
    pub status_bar_style: String,
}

fn default_web_app_capable() -> bool {
    true
}

fn default_status_bar_style() -> String {
    "black-translucent".into()
}

impl Default for HeadersConfig {
    fn default() -> Self {
        Self {
            web_app_capable: default_web_app_capable(),
            status_bar_style: default_status_bar_style(),
        }
    }
}

impl HeadersConfig {
    fn capable(&self) -> &'static str {
        if self.web_app_capable { "yes" } else { "no" }
    }
}

// ============================================================================
// HtmlHeader
// ============================================================================

/// Tag of a head entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HtmlTag {
    Link,
    Meta,
}

impl HtmlTag {
    pub fn name(self) -> &'static str {
        match self {
            HtmlTag::Link => "link",
            HtmlTag::Meta => "meta",
        }
    }
}

/// One `<link>` or `<meta>` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HtmlHeader {
    pub tag_name: HtmlTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sizes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
}

impl HtmlHeader {
    fn empty(tag_name: HtmlTag) -> Self {
        Self {
            tag_name,
            name: None,
            content: None,
            rel: None,
            mime_type: None,
            sizes: None,
            media: None,
            href: None,
        }
    }

    pub fn link(rel: impl Into<String>, href: impl Into<String>) -> Self {
        Self {
            rel: Some(rel.into()),
            href: Some(href.into()),
            ..Self::empty(HtmlTag::Link)
        }
    }

    pub fn meta(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            content: Some(content.into()),
            ..Self::empty(HtmlTag::Meta)
        }
    }

    fn with_type(mut self, mime_type: &str) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    fn with_sizes(mut self, target: &TargetSpec) -> Self {
        self.sizes = Some(target.size().to_string());
        self
    }

    fn with_media(mut self, media: String) -> Self {
        self.media = Some(media);
        self
    }

    /// Attributes in output order, skipping unset ones.
    fn attributes(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("name", &self.name),
            ("content", &self.content),
            ("rel", &self.rel),
            ("type", &self.mime_type),
            ("sizes", &self.sizes),
            ("media", &self.media),
            ("href", &self.href),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
    }
}

impl fmt::Display for HtmlHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.tag_name.name())?;
        for (key, value) in self.attributes() {
            write!(f, " {key}=\"{}\"", escape_attribute(value))?;
        }
        f.write_str(">")
    }
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

// ============================================================================
// Header builders
// ============================================================================

/// Returns the head entries for every enabled family, in family order.
pub fn html_headers(config: &FaviconsConfig, headers: &HeadersConfig) -> Vec<HtmlHeader> {
    let icons = config.icons();
    let path = config.path.as_deref();

    IconFamily::ALL
        .into_iter()
        .filter(|family| icons.is_enabled(*family))
        .flat_map(|family| match family {
            IconFamily::Favicon => favicon_headers(path),
            IconFamily::Android => android_headers(config, headers),
            IconFamily::Apple => apple_headers(config, headers),
            IconFamily::AppleStartup => startup_headers(path),
        })
        .collect()
}

/// Renders headers as markup, one element per line.
pub fn html_markup(headers: &[HtmlHeader]) -> String {
    headers
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn favicon_headers(path: Option<&str>) -> Vec<HtmlHeader> {
    IconFamily::Favicon
        .targets()
        .iter()
        .map(|target| {
            let href = apply_path(path, target.filename);
            if target.is_container() {
                HtmlHeader::link("shortcut icon", href)
            } else {
                HtmlHeader::link("icon", href)
                    .with_type("image/png")
                    .with_sizes(target)
            }
        })
        .collect()
}

fn android_headers(config: &FaviconsConfig, headers: &HeadersConfig) -> Vec<HtmlHeader> {
    let manifest = &config.manifest;
    let mut out = vec![
        HtmlHeader::link("manifest", apply_path(config.path.as_deref(), MANIFEST_FILENAME)),
        HtmlHeader::meta("mobile-web-app-capable", headers.capable()),
    ];
    if let Some(name) = &manifest.name {
        out.push(HtmlHeader::meta("application-name", name));
    }
    if let Some(theme) = &manifest.theme_color {
        out.push(HtmlHeader::meta("theme-color", theme));
    }
    out
}

fn apple_headers(config: &FaviconsConfig, headers: &HeadersConfig) -> Vec<HtmlHeader> {
    let mut out = vec![
        HtmlHeader::meta("apple-mobile-web-app-capable", headers.capable()),
        HtmlHeader::meta(
            "apple-mobile-web-app-status-bar-style",
            &headers.status_bar_style,
        ),
    ];
    if let Some(name) = &config.manifest.name {
        out.push(HtmlHeader::meta("apple-mobile-web-app-title", name));
    }
    out.extend(IconFamily::Apple.targets().iter().map(|target| {
        HtmlHeader::link(
            "apple-touch-icon",
            apply_path(config.path.as_deref(), target.filename),
        )
        .with_sizes(target)
    }));
    out
}

fn startup_headers(path: Option<&str>) -> Vec<HtmlHeader> {
    IconFamily::AppleStartup
        .targets()
        .iter()
        .map(|target| {
            HtmlHeader::link("apple-touch-startup-image", apply_path(path, target.filename))
                .with_media(startup_media(target))
        })
        .collect()
}

/// Media query matching the device a startup image was made for.
///
/// Device dimensions are in CSS pixels; rotated images describe a landscape
/// screen so their sides are swapped back.
fn startup_media(target: &TargetSpec) -> String {
    let ratio = target.pixel_ratio.unwrap_or(1.0);
    let (width, height) = if target.rotate {
        (target.height, target.width)
    } else {
        (target.width, target.height)
    };
    let orientation = if target.rotate { "landscape" } else { "portrait" };

    let mut media = format!(
        "(device-width: {}px) and (device-height: {}px) and (orientation: {orientation})",
        width as f32 / ratio,
        height as f32 / ratio,
    );
    if ratio > 1.0 {
        media.push_str(&format!(" and (-webkit-device-pixel-ratio: {ratio})"));
    }
    media
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::find_target;
    use crate::config::IconsConfig;
    use crate::manifest::ManifestConfig;

    fn config(icons: IconsConfig) -> FaviconsConfig {
        FaviconsConfig::new().with_icons(icons)
    }

    #[test]
    fn favicon_headers_markup() {
        let headers = html_headers(
            &config(IconsConfig::default().with(IconFamily::Favicon, true)).with_path("/static"),
            &HeadersConfig::default(),
        );

        assert_eq!(
            html_markup(&headers),
            "<link rel=\"shortcut icon\" href=\"/static/favicon.ico\">\n\
             <link rel=\"icon\" type=\"image/png\" sizes=\"16x16\" href=\"/static/favicon-16x16.png\">\n\
             <link rel=\"icon\" type=\"image/png\" sizes=\"32x32\" href=\"/static/favicon-32x32.png\">"
        );
    }

    #[test]
    fn meta_attribute_order() {
        let header = HtmlHeader::meta("theme-color", "#123456");
        assert_eq!(
            header.to_string(),
            "<meta name=\"theme-color\" content=\"#123456\">"
        );
    }

    #[test]
    fn android_headers_follow_manifest() {
        let manifest = ManifestConfig {
            name: Some("Demo".into()),
            theme_color: Some("#000".into()),
            ..Default::default()
        };
        let headers = html_headers(
            &config(IconsConfig::default().with(IconFamily::Android, true)).with_manifest(manifest),
            &HeadersConfig {
                web_app_capable: false,
                ..Default::default()
            },
        );

        let markup: Vec<_> = headers.iter().map(ToString::to_string).collect();
        assert_eq!(
            markup,
            vec![
                "<link rel=\"manifest\" href=\"manifest.json\">",
                "<meta name=\"mobile-web-app-capable\" content=\"no\">",
                "<meta name=\"application-name\" content=\"Demo\">",
                "<meta name=\"theme-color\" content=\"#000\">",
            ]
        );
    }

    #[test]
    fn apple_headers_include_every_touch_icon() {
        let headers = html_headers(
            &config(IconsConfig::default().with(IconFamily::Apple, true)),
            &HeadersConfig::default(),
        );

        assert_eq!(headers.len(), 2 + IconFamily::Apple.targets().len());
        assert_eq!(
            headers[1].content.as_deref(),
            Some("black-translucent")
        );
        assert!(headers[2..]
            .iter()
            .all(|h| h.rel.as_deref() == Some("apple-touch-icon") && h.sizes.is_some()));
    }

    #[test]
    fn startup_media_queries() {
        let phone = find_target(IconFamily::AppleStartup, "apple-touch-startup-image-1242x2208.png")
            .unwrap();
        assert_eq!(
            startup_media(phone),
            "(device-width: 414px) and (device-height: 736px) and (orientation: portrait) \
             and (-webkit-device-pixel-ratio: 3)"
        );

        let tablet = find_target(IconFamily::AppleStartup, "apple-touch-startup-image-748x1024.png")
            .unwrap();
        assert_eq!(
            startup_media(tablet),
            "(device-width: 1024px) and (device-height: 748px) and (orientation: landscape)"
        );
    }

    #[test]
    fn every_family_enabled_by_default() {
        let headers = html_headers(&FaviconsConfig::new(), &HeadersConfig::default());
        let expected = 3 + 2 + (2 + IconFamily::Apple.targets().len())
            + IconFamily::AppleStartup.targets().len();
        assert_eq!(headers.len(), expected);
    }

    #[test]
    fn attribute_values_are_escaped() {
        let header = HtmlHeader::meta("application-name", "Tom & \"Jerry\"");
        assert_eq!(
            header.to_string(),
            "<meta name=\"application-name\" content=\"Tom &amp; &quot;Jerry&quot;\">"
        );
    }

    #[test]
    fn headers_config_defaults_from_json() {
        let headers: HeadersConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(headers, HeadersConfig::default());
    }
}
