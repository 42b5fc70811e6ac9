//! Icon generation pipeline.
//!
//! [`IconPipeline`] turns a set of sources into every icon the configuration
//! enables. A call to [`generate`](IconPipeline::generate) moves through:
//!
//! ```text
//! Validating ──► Probing ──► Resolving families ──► Rendering (worker pool)
//!                                                        │
//!                                         IconStream ◄───┘ (bounded channel)
//! ```
//!
//! Everything up to rendering happens synchronously, so invalid input fails
//! before any icon is produced. Rendering runs on a pool of worker threads;
//! finished icons are delivered through a bounded channel, so workers never
//! run more than one pool's worth ahead of the consumer.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use image::Rgba;

use crate::catalog::{IconFamily, TargetSpec};
use crate::config::FaviconsConfig;
use crate::error::{FaviconError, Result};
use crate::html::{self, HeadersConfig, HtmlHeader};
use crate::icon::{GeneratedIcon, SizePx};
use crate::manifest::{self, ManifestConfig};
use crate::render::{self, IconRenderer, RasterRenderer, RenderRequest};
use crate::source::SourceAsset;

// ============================================================================
// Jobs
// ============================================================================

/// One catalog entry resolved against its family config.
#[derive(Debug, Clone, Copy)]
struct Job {
    family: IconFamily,
    target: &'static TargetSpec,
    background: Rgba<u8>,
    offset: f32,
}

impl Job {
    fn request(&self, size: SizePx) -> RenderRequest {
        RenderRequest {
            width: size.width,
            height: size.height,
            background: self.background,
            offset: self.offset,
            rotate: self.target.rotate,
        }
    }

    /// Renders the target, packing sub-sizes for containers.
    fn run<R: IconRenderer + ?Sized>(
        &self,
        renderer: &R,
        sources: &[SourceAsset],
    ) -> Result<GeneratedIcon> {
        let filename = self.target.filename;

        let contents = match self.target.sizes {
            Some(sizes) => {
                let images = sizes
                    .iter()
                    .map(|size| renderer.render(sources, &self.request(*size)))
                    .collect::<Result<Vec<_>>>()?;
                render::pack_ico(filename, &images)?
            }
            None => {
                let image = renderer.render(sources, &self.request(self.target.size()))?;
                render::encode_png(filename, &image)?
            }
        };

        Ok(GeneratedIcon {
            family: self.family,
            filename: filename.to_string(),
            width: self.target.width,
            height: self.target.height,
            contents,
        })
    }

    /// Runs the job, attaching family and filename to any failure.
    fn run_isolated<R: IconRenderer + ?Sized>(
        &self,
        renderer: &R,
        sources: &[SourceAsset],
    ) -> Result<GeneratedIcon> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(renderer, sources)))
            .unwrap_or_else(|_| {
                Err(FaviconError::decode(
                    self.target.filename,
                    "renderer panicked",
                ))
            });

        outcome.map_err(|source| FaviconError::Render {
            family: self.family,
            filename: self.target.filename.to_string(),
            source: Box::new(source),
        })
    }
}

// ============================================================================
// IconPipeline
// ============================================================================

/// Generates icons, a manifest and HTML headers from one configuration.
///
/// # Example
///
/// ```no_run
/// use favicons_renderer::{FaviconsConfig, IconPipeline, SourceAsset};
///
/// let pipeline = IconPipeline::new(FaviconsConfig::new());
/// let sources = vec![SourceAsset::from_path("logo.svg").unwrap()];
///
/// for icon in pipeline.generate(sources).unwrap() {
///     let icon = icon.unwrap();
///     std::fs::write(&icon.filename, &icon.contents).unwrap();
/// }
/// ```
pub struct IconPipeline<R = RasterRenderer> {
    config: FaviconsConfig,
    renderer: Arc<R>,
    workers: usize,
}

impl IconPipeline<RasterRenderer> {
    /// Creates a pipeline with the default renderer.
    pub fn new(config: FaviconsConfig) -> Self {
        Self::with_renderer(config, RasterRenderer::new())
    }
}

impl<R: IconRenderer + 'static> IconPipeline<R> {
    /// Creates a pipeline with a custom renderer.
    pub fn with_renderer(config: FaviconsConfig, renderer: R) -> Self {
        let workers = thread::available_parallelism().map_or(1, |n| n.get());
        Self {
            config,
            renderer: Arc::new(renderer),
            workers,
        }
    }

    /// Sets the number of render workers (at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn config(&self) -> &FaviconsConfig {
        &self.config
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Starts generating every enabled icon.
    ///
    /// Validation, probing and family resolution happen before this returns;
    /// their errors surface here and no icon is produced. Rendering errors
    /// surface through the returned stream.
    pub fn generate(&self, sources: Vec<SourceAsset>) -> Result<IconStream> {
        let jobs = self.plan(&sources)?;
        let workers = self.workers.min(jobs.len()).max(1);

        log::info!(
            "generating {} icons from {} source(s) on {} worker(s)",
            jobs.len(),
            sources.len(),
            workers
        );

        IconStream::spawn(Arc::clone(&self.renderer), Arc::from(sources), jobs, workers)
    }

    /// Generates every enabled icon and collects them.
    ///
    /// Fails with the first error encountered.
    pub fn generate_all(&self, sources: Vec<SourceAsset>) -> Result<Vec<GeneratedIcon>> {
        self.generate(sources)?.collect()
    }

    /// Returns the manifest with android icons filled in.
    pub fn manifest(&self) -> ManifestConfig {
        manifest::build_manifest(
            &self.config.manifest,
            self.config.path.as_deref(),
            self.config.icons().is_enabled(IconFamily::Android),
        )
    }

    /// Returns the HTML head entries for every enabled family.
    pub fn html_headers(&self, headers: &HeadersConfig) -> Vec<HtmlHeader> {
        html::html_headers(&self.config, headers)
    }

    /// Validates and probes sources, then expands enabled families into jobs.
    fn plan(&self, sources: &[SourceAsset]) -> Result<Vec<Job>> {
        if sources.is_empty() {
            return Err(FaviconError::Validation("no sources provided".into()));
        }

        for source in sources {
            source.kind()?;
        }
        for source in sources {
            let metadata = source.metadata_with(|s| self.renderer.probe(s))?;
            log::debug!(
                "source `{}`: {:?} {}",
                source.name(),
                metadata.kind,
                metadata.size()
            );
        }

        let mut jobs = Vec::new();
        for (family, config) in self.config.resolved_families() {
            let background = config.background.to_rgba()?;
            log::debug!(
                "{family}: offset {}%, background {}",
                config.offset,
                config.background
            );
            jobs.extend(family.targets().iter().map(|target| Job {
                family,
                target,
                background,
                offset: config.offset,
            }));
        }

        Ok(jobs)
    }
}

// ============================================================================
// IconStream
// ============================================================================

/// Incremental sequence of generated icons.
///
/// Icons arrive as soon as they are rendered, not necessarily in catalog
/// order. The first error is yielded once and ends the stream; remaining
/// work is cancelled. Dropping the stream early cancels outstanding renders
/// and waits for the workers to stop.
pub struct IconStream {
    results: Option<Receiver<Result<GeneratedIcon>>>,
    cancelled: Arc<AtomicBool>,
    workers: Vec<JoinHandle<()>>,
    remaining: usize,
    finished: bool,
}

impl IconStream {
    fn spawn<R: IconRenderer + 'static>(
        renderer: Arc<R>,
        sources: Arc<[SourceAsset]>,
        jobs: Vec<Job>,
        workers: usize,
    ) -> Result<Self> {
        let remaining = jobs.len();
        let (job_tx, job_rx) = channel::unbounded();
        for job in jobs {
            // The receiver is alive, so this cannot fail
            let _ = job_tx.send(job);
        }
        drop(job_tx);

        let (result_tx, result_rx) = channel::bounded(workers);
        let cancelled = Arc::new(AtomicBool::new(false));

        let mut stream = Self {
            results: Some(result_rx),
            cancelled: Arc::clone(&cancelled),
            workers: Vec::with_capacity(workers),
            remaining,
            finished: remaining == 0,
        };

        for index in 0..workers {
            let worker = Worker {
                renderer: Arc::clone(&renderer),
                sources: Arc::clone(&sources),
                jobs: job_rx.clone(),
                results: result_tx.clone(),
                cancelled: Arc::clone(&cancelled),
            };
            let handle = thread::Builder::new()
                .name(format!("favicons-render-{index}"))
                .spawn(move || worker.run())
                .map_err(FaviconError::Worker)?;
            stream.workers.push(handle);
        }

        Ok(stream)
    }

    /// Number of icons not yet delivered.
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    fn finish(&mut self) {
        self.finished = true;
        self.cancelled.store(true, Ordering::SeqCst);
        // Unblock workers waiting on a full channel before joining them
        self.results = None;
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

impl Iterator for IconStream {
    type Item = Result<GeneratedIcon>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let received = self.results.as_ref()?.recv();
        match received {
            Ok(Ok(icon)) => {
                self.remaining = self.remaining.saturating_sub(1);
                log::debug!("generated {} ({} bytes)", icon.filename, icon.contents.len());
                if self.remaining == 0 {
                    self.finish();
                    log::info!("icon generation finished");
                }
                Some(Ok(icon))
            }
            Ok(Err(err)) => {
                log::error!("icon generation aborted: {err}");
                self.finish();
                Some(Err(err))
            }
            Err(_) => {
                self.finish();
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (0, Some(self.remaining))
        }
    }
}

impl Drop for IconStream {
    fn drop(&mut self) {
        if !self.workers.is_empty() {
            self.finish();
        }
    }
}

struct Worker<R> {
    renderer: Arc<R>,
    sources: Arc<[SourceAsset]>,
    jobs: Receiver<Job>,
    results: Sender<Result<GeneratedIcon>>,
    cancelled: Arc<AtomicBool>,
}

impl<R: IconRenderer> Worker<R> {
    fn run(self) {
        for job in self.jobs.iter() {
            if self.cancelled.load(Ordering::SeqCst) {
                break;
            }

            let result = job.run_isolated(&*self.renderer, &self.sources);
            let failed = result.is_err();
            if failed {
                self.cancelled.store(true, Ordering::SeqCst);
            }
            if self.results.send(result).is_err() || failed {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackgroundOption, IconOptions, IconsConfig};
    use crate::render::ico::tests::ico_entries;
    use crate::source::Metadata;
    use crate::source::tests::{SQUARE_SVG, png_source};
    use image::RgbaImage;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn svg_sources() -> Vec<SourceAsset> {
        vec![SourceAsset::new("logo.svg", SQUARE_SVG)]
    }

    fn pipeline(icons: IconsConfig) -> IconPipeline {
        let manifest = ManifestConfig {
            background_color: Some("#fff".into()),
            ..Default::default()
        };
        IconPipeline::new(FaviconsConfig::new().with_manifest(manifest).with_icons(icons))
            .with_workers(2)
    }

    fn sorted(mut icons: Vec<GeneratedIcon>) -> Vec<GeneratedIcon> {
        icons.sort_by(|a, b| a.filename.cmp(&b.filename));
        icons
    }

    #[test]
    fn favicon_family_scenario() {
        let icons = pipeline(IconsConfig::default().with(IconFamily::Favicon, true))
            .generate_all(svg_sources())
            .unwrap();
        let icons = sorted(icons);

        let names: Vec<_> = icons.iter().map(|i| i.filename.as_str()).collect();
        assert_eq!(names, vec!["favicon-16x16.png", "favicon-32x32.png", "favicon.ico"]);

        // Container holds the five declared sub-sizes
        let ico = &icons[2];
        assert_eq!(
            ico_entries(&ico.contents),
            vec![(16, 16), (24, 24), (32, 32), (48, 48), (64, 64)]
        );

        // PNGs decode at their catalog dimensions
        for icon in &icons[..2] {
            let decoded = image::load_from_memory(&icon.contents).unwrap().to_rgba8();
            assert_eq!(decoded.dimensions(), (icon.width, icon.height));
        }
    }

    #[test]
    fn every_png_matches_catalog_dimensions() {
        let icons = pipeline(
            IconsConfig::default()
                .with(IconFamily::Android, true)
                .with(IconFamily::Apple, true),
        )
        .generate_all(vec![png_source("icon.png", 64, 64)])
        .unwrap();

        let expected = IconFamily::Android.targets().len() + IconFamily::Apple.targets().len();
        assert_eq!(icons.len(), expected);

        for icon in icons {
            let decoded = image::load_from_memory(&icon.contents).unwrap();
            assert_eq!(
                (decoded.width(), decoded.height()),
                (icon.width, icon.height),
                "{}",
                icon.filename
            );
        }
    }

    #[test]
    fn transparent_and_opaque_backgrounds() {
        let icons = pipeline(
            IconsConfig::default()
                .with(
                    IconFamily::Favicon,
                    IconOptions {
                        offset: Some(25.0),
                        background: None,
                    },
                )
                .with(
                    IconFamily::Apple,
                    IconOptions {
                        offset: Some(25.0),
                        background: Some(BackgroundOption::Flag(true)),
                    },
                ),
        )
        .generate_all(svg_sources())
        .unwrap();

        let corner = |name: &str| {
            let icon = icons.iter().find(|i| i.filename == name).unwrap();
            let decoded = image::load_from_memory(&icon.contents).unwrap().to_rgba8();
            *decoded.get_pixel(0, 0)
        };

        assert_eq!(corner("favicon-32x32.png"), Rgba([0, 0, 0, 0]));
        assert_eq!(corner("apple-touch-icon-180x180.png"), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn disabled_family_yields_nothing() {
        let icons = pipeline(
            IconsConfig::default()
                .with(IconFamily::Favicon, false)
                .with(IconFamily::Apple, true),
        )
        .generate_all(svg_sources())
        .unwrap();

        assert_eq!(icons.len(), IconFamily::Apple.targets().len());
        assert!(icons.iter().all(|i| i.family == IconFamily::Apple));
    }

    #[test]
    fn nothing_enabled_yields_empty_stream() {
        let mut stream = pipeline(IconsConfig::default())
            .generate(svg_sources())
            .unwrap();
        assert!(stream.next().is_none());
    }

    #[test]
    fn generation_is_deterministic() {
        let run = || {
            sorted(
                pipeline(IconsConfig::default().with(IconFamily::Favicon, true))
                    .generate_all(svg_sources())
                    .unwrap(),
            )
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn empty_sources_fail_fast() {
        let err = pipeline(IconsConfig::all()).generate(Vec::new()).err().unwrap();
        assert!(matches!(err, FaviconError::Validation(_)));
    }

    #[test]
    fn unsupported_extension_fails_fast() {
        let sources = vec![
            SourceAsset::new("logo.svg", SQUARE_SVG),
            SourceAsset::new("logo.bmp", vec![0u8; 8]),
        ];
        let err = pipeline(IconsConfig::all()).generate(sources).err().unwrap();
        assert!(matches!(err, FaviconError::UnsupportedFormat { .. }));
    }

    #[test]
    fn invalid_background_fails_fast() {
        let icons = IconsConfig::default().with(
            IconFamily::Apple,
            IconOptions {
                offset: None,
                background: Some(BackgroundOption::Color("nope".into())),
            },
        );
        let err = pipeline(icons).generate(svg_sources()).err().unwrap();
        assert!(matches!(err, FaviconError::Validation(_)));
    }

    /// Renderer that fails for one output width.
    struct FailingRenderer(u32);

    impl IconRenderer for FailingRenderer {
        fn probe(&self, source: &SourceAsset) -> Result<Metadata> {
            crate::source::probe_metadata(source)
        }

        fn render(&self, _sources: &[SourceAsset], request: &RenderRequest) -> Result<RgbaImage> {
            if request.width == self.0 {
                return Err(FaviconError::decode("logo.svg", "boom"));
            }
            Ok(RgbaImage::new(request.width, request.height))
        }
    }

    #[test]
    fn render_failure_aborts_with_context() {
        let pipeline = IconPipeline::with_renderer(
            FaviconsConfig::new().with_icons(IconsConfig::default().with(IconFamily::Android, true)),
            FailingRenderer(192),
        )
        .with_workers(1);

        let results: Vec<_> = pipeline.generate(svg_sources()).unwrap().collect();
        let (last, delivered) = results.split_last().unwrap();

        assert!(delivered.iter().all(|r| r.is_ok()));
        match last {
            Err(FaviconError::Render { family, filename, .. }) => {
                assert_eq!(*family, IconFamily::Android);
                assert_eq!(filename, "android-chrome-192x192.png");
            }
            other => panic!("expected a render error, got {other:?}"),
        }
        assert!(results.len() < IconFamily::Android.targets().len() + 1);
    }

    #[test]
    fn generate_all_returns_first_error() {
        let pipeline = IconPipeline::with_renderer(
            FaviconsConfig::new().with_icons(IconsConfig::default().with(IconFamily::Favicon, true)),
            FailingRenderer(24),
        );
        let err = pipeline.generate_all(svg_sources()).unwrap_err();
        assert!(matches!(err, FaviconError::Render { .. }));
    }

    /// Renderer that counts calls and paints a flat color.
    struct CountingRenderer {
        renders: AtomicUsize,
        probes: AtomicUsize,
    }

    impl CountingRenderer {
        fn new() -> Self {
            Self {
                renders: AtomicUsize::new(0),
                probes: AtomicUsize::new(0),
            }
        }

        fn renders(&self) -> usize {
            self.renders.load(Ordering::SeqCst)
        }
    }

    impl IconRenderer for CountingRenderer {
        fn probe(&self, source: &SourceAsset) -> Result<Metadata> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            crate::source::probe_metadata(source)
        }

        fn render(&self, _sources: &[SourceAsset], request: &RenderRequest) -> Result<RgbaImage> {
            self.renders.fetch_add(1, Ordering::SeqCst);
            Ok(RgbaImage::from_pixel(request.width, request.height, request.background))
        }
    }

    #[test]
    fn custom_renderer_is_used_and_probes_once() {
        let pipeline = IconPipeline::with_renderer(
            FaviconsConfig::new().with_icons(IconsConfig::default().with(IconFamily::Favicon, true)),
            CountingRenderer::new(),
        )
        .with_workers(3);

        let icons = pipeline
            .generate_all(vec![png_source("a.png", 32, 32), png_source("b.png", 64, 64)])
            .unwrap();

        assert_eq!(icons.len(), 3);
        // 5 container sub-sizes + 2 PNGs
        assert_eq!(pipeline.renderer().renders(), 7);
        assert_eq!(pipeline.renderer().probes.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn stalled_consumer_bounds_rendering() {
        let workers = 2;
        let icons = IconsConfig::default()
            .with(IconFamily::Android, true)
            .with(IconFamily::Apple, true);
        let total = IconFamily::Android.targets().len() + IconFamily::Apple.targets().len();
        let pipeline = IconPipeline::with_renderer(
            FaviconsConfig::new().with_icons(icons),
            CountingRenderer::new(),
        )
        .with_workers(workers);

        let mut stream = pipeline.generate(svg_sources()).unwrap();
        stream.next().unwrap().unwrap();
        thread::sleep(Duration::from_millis(200));

        // One delivered, one buffered per channel slot, one held per worker
        let rendered = pipeline.renderer().renders();
        assert!(
            rendered <= 1 + 2 * workers,
            "{rendered} renders with one icon consumed"
        );

        drop(stream);
        let after_drop = pipeline.renderer().renders();
        thread::sleep(Duration::from_millis(100));
        assert_eq!(pipeline.renderer().renders(), after_drop);
        assert!(after_drop < total);
    }

    #[test]
    fn functional_manifest_color_fills_opaque_families() {
        let manifest = ManifestConfig {
            background_color: Some("rgb(0, 0, 0)".into()),
            ..Default::default()
        };
        let pipeline = IconPipeline::new(
            FaviconsConfig::new()
                .with_manifest(manifest)
                .with_icons(IconsConfig::default().with(
                    IconFamily::Apple,
                    IconOptions {
                        offset: Some(25.0),
                        background: None,
                    },
                )),
        )
        .with_workers(2);

        let icons = pipeline.generate_all(svg_sources()).unwrap();
        let icon = icons
            .iter()
            .find(|i| i.filename == "apple-touch-icon-57x57.png")
            .unwrap();
        let decoded = image::load_from_memory(&icon.contents).unwrap().to_rgba8();
        assert_eq!(*decoded.get_pixel(0, 0), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn manifest_and_headers_follow_config() {
        let pipeline = pipeline(IconsConfig::default().with(IconFamily::Favicon, true));
        assert!(pipeline.manifest().icons.is_none());
        assert_eq!(pipeline.html_headers(&HeadersConfig::default()).len(), 3);
    }
}
