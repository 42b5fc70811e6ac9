//! Command-line front end: renders icons into a directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;

use favicons_renderer::{
    BackgroundOption, FaviconsConfig, HeadersConfig, IconEntry, IconFamily, IconOptions,
    IconPipeline, IconsConfig, MANIFEST_FILENAME, ManifestConfig, SourceAsset, html_markup,
};

const HTML_FILENAME: &str = "favicons.html";

/// Generate favicons, web-app icons and startup images from PNG or SVG sources.
#[derive(Debug, Parser)]
#[command(name = "favicons", version, about)]
struct Cli {
    /// Source images (.png or .svg)
    #[arg(required = true)]
    sources: Vec<PathBuf>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    dest: PathBuf,

    /// Public path prefix used in the manifest and HTML headers
    #[arg(short, long)]
    path: Option<String>,

    /// Manifest background color
    #[arg(short, long)]
    background: Option<String>,

    /// JSON web-app manifest to add icons to; written back as `manifest.json`
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// JSON file with the full generator configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write HTML headers for the icons to `favicons.html`
    #[arg(short = 'H', long)]
    headers: bool,

    /// Log every rendered icon
    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    skip_favicon: bool,
    #[arg(long)]
    skip_android: bool,
    #[arg(long)]
    skip_apple: bool,
    #[arg(long)]
    skip_apple_startup: bool,

    /// Android background: a color, `true` or `false`
    #[arg(long)]
    android_background: Option<String>,
    /// Android inset in percent
    #[arg(long)]
    android_offset: Option<f32>,

    /// Apple touch icon background: a color, `true` or `false`
    #[arg(long)]
    apple_background: Option<String>,
    /// Apple touch icon inset in percent
    #[arg(long)]
    apple_offset: Option<f32>,

    /// Apple startup background: a color, `true` or `false`
    #[arg(long)]
    apple_startup_background: Option<String>,
    /// Apple startup inset in percent
    #[arg(long)]
    apple_startup_offset: Option<f32>,
}

impl Cli {
    fn skip(&self, family: IconFamily) -> bool {
        match family {
            IconFamily::Favicon => self.skip_favicon,
            IconFamily::Android => self.skip_android,
            IconFamily::Apple => self.skip_apple,
            IconFamily::AppleStartup => self.skip_apple_startup,
        }
    }

    fn overrides(&self, family: IconFamily) -> (Option<&str>, Option<f32>) {
        match family {
            IconFamily::Favicon => (None, None),
            IconFamily::Android => (self.android_background.as_deref(), self.android_offset),
            IconFamily::Apple => (self.apple_background.as_deref(), self.apple_offset),
            IconFamily::AppleStartup => (
                self.apple_startup_background.as_deref(),
                self.apple_startup_offset,
            ),
        }
    }

    /// Builds the generator config; the flag is set when a manifest was supplied.
    fn build_config(&self) -> Result<(FaviconsConfig, bool)> {
        let mut config = match &self.config {
            Some(path) => FaviconsConfig::from_json(&read_to_string(path)?)
                .with_context(|| format!("invalid config `{}`", path.display()))?,
            None => FaviconsConfig::new(),
        };

        if let Some(path) = &self.manifest {
            config.manifest = serde_json::from_str::<ManifestConfig>(&read_to_string(path)?)
                .with_context(|| format!("invalid manifest `{}`", path.display()))?;
        }
        let manifest_supplied = config.manifest != ManifestConfig::default();
        if let Some(path) = &self.path {
            config.path = Some(path.clone());
        }
        if let Some(color) = &self.background {
            config.manifest.background_color = Some(color.clone());
        }

        let mut icons = config.icons();
        for family in IconFamily::ALL {
            if self.skip(family) {
                icons.set(family, false);
                continue;
            }
            if let (None, None) = self.overrides(family) {
                continue;
            }
            let options = merge_options(&icons, family, self.overrides(family));
            icons.set(family, options);
        }
        config.icons = Some(icons);

        Ok((config, manifest_supplied))
    }
}

/// Applies command-line overrides on top of a family's configured options.
fn merge_options(
    icons: &IconsConfig,
    family: IconFamily,
    (background, offset): (Option<&str>, Option<f32>),
) -> IconOptions {
    let mut options = match icons.entry(family) {
        Some(IconEntry::Options(options)) => options.clone(),
        _ => IconOptions::default(),
    };
    if let Some(background) = background {
        options.background = Some(match background {
            "true" => BackgroundOption::Flag(true),
            "false" => BackgroundOption::Flag(false),
            color => BackgroundOption::Color(color.to_string()),
        });
    }
    if offset.is_some() {
        options.offset = offset;
    }
    options
}

fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let (config, manifest_supplied) = cli.build_config()?;
    let sources = cli
        .sources
        .iter()
        .map(|path| {
            SourceAsset::from_path(path)
                .with_context(|| format!("failed to read source `{}`", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    fs::create_dir_all(&cli.dest)
        .with_context(|| format!("failed to create `{}`", cli.dest.display()))?;

    let pipeline = IconPipeline::new(config);
    let mut written = 0;
    for icon in pipeline.generate(sources)? {
        let icon = icon?;
        let target = cli.dest.join(&icon.filename);
        fs::write(&target, &icon.contents)
            .with_context(|| format!("failed to write `{}`", target.display()))?;
        written += 1;
    }
    if written == 0 {
        bail!("every icon family is disabled");
    }
    log::info!("wrote {written} icons to {}", cli.dest.display());

    if cli.headers {
        let markup = html_markup(&pipeline.html_headers(&HeadersConfig::default()));
        write_text(&cli.dest.join(HTML_FILENAME), &markup)?;
    }

    if manifest_supplied {
        let manifest = pipeline.manifest().to_json_pretty()?;
        write_text(&cli.dest.join(MANIFEST_FILENAME), &manifest)?;
    }

    Ok(())
}

fn write_text(target: &Path, contents: &str) -> Result<()> {
    fs::write(target, format!("{contents}\n"))
        .with_context(|| format!("failed to write `{}`", target.display()))?;
    log::info!("wrote {}", target.display());
    Ok(())
}
