//! Web-app manifest emitter.

use serde::{Deserialize, Serialize};

use crate::catalog::IconFamily;

/// An icon entry of a web-app manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct ManifestIcon {
    pub src: String,
    pub sizes: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

/// A related native application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct RelatedApplication {
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Web-app manifest members.
///
/// Keys follow the manifest's own snake_case naming.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct ManifestConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefer_related_applications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_applications: Option<Vec<RelatedApplication>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icons: Option<Vec<ManifestIcon>>,
}

impl ManifestConfig {
    /// Serializes the manifest to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Prefixes `filename` with a public path, joined by `/`.
pub fn apply_path(path: Option<&str>, filename: &str) -> String {
    match path.map(|p| p.trim_end_matches('/')) {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}/{filename}"),
        Some(_) if path.is_some_and(|p| p.starts_with('/')) => format!("/{filename}"),
        _ => filename.to_string(),
    }
}

/// Returns `manifest` with its `icons` populated from the android catalog.
///
/// The input is returned unchanged when android icons are disabled.
pub fn build_manifest(
    manifest: &ManifestConfig,
    path: Option<&str>,
    android_enabled: bool,
) -> ManifestConfig {
    let mut manifest = manifest.clone();

    if android_enabled {
        manifest.icons = Some(
            IconFamily::Android
                .targets()
                .iter()
                .map(|target| ManifestIcon {
                    src: apply_path(path, target.filename),
                    sizes: target.size().to_string(),
                    mime_type: Some("image/png".into()),
                })
                .collect(),
        );
    }

    manifest
}
