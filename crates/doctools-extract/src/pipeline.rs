//! The PDF fallback pipeline.
//!
//! A [`PdfPipeline`] holds an ordered list of [`ExtractionTier`]s. Each run
//! creates an [`ExtractionJob`], tries the tiers in priority order and stops
//! at the first one that succeeds. A failed tier leaves a `Warning:` item in
//! the output; when every tier fails the result is a single diagnostic.
//!
//! In full mode the job owns a scratch directory under the configured
//! `scratch_root`. It is removed when the job ends, whatever the outcome.

use async_trait::async_trait;
use doctools_core::{ContentItem, EngineError, ToolError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::config::{OcrConfig, PdfConfig};
use crate::markdown::PdfExtractMarkdown;
use crate::ocr::ImageAnalyzer;
use crate::pdf::LopdfEngine;
use crate::poppler::{PdftoppmRasterizer, PopplerReader};
use crate::tiers::{MarkdownTier, MinimalTier, StructuredTier};

/// Extraction depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PdfMode {
    /// Text only
    Quick,
    /// Text, embedded images and OCR
    #[default]
    Full,
}

impl PdfMode {
    /// Parse `quick` or `full`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "quick" => Some(Self::Quick),
            "full" => Some(Self::Full),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Full => "full",
        }
    }
}

/// Pages processed out of a document's total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBudget {
    pub total: usize,
    pub cap: usize,
}

impl PageBudget {
    #[must_use]
    pub fn new(total: usize, cap: usize) -> Self {
        Self { total, cap }
    }

    /// Number of pages to process.
    #[must_use]
    pub fn pages(&self) -> usize {
        self.total.min(self.cap)
    }

    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.total > self.cap
    }

    /// Notice shown when pages were skipped.
    #[must_use]
    pub fn notice(&self) -> Option<String> {
        self.is_truncated().then(|| {
            format!(
                "Note: processing only the first {} of {} pages.",
                self.pages(),
                self.total
            )
        })
    }
}

/// State of one pipeline run.
pub struct ExtractionJob {
    path: PathBuf,
    mode: PdfMode,
    cap: usize,
    render_dpi: u32,
    scratch: Option<TempDir>,
}

impl ExtractionJob {
    /// Start a job. Full mode creates the scratch directory.
    pub fn new(path: &Path, mode: PdfMode, config: &PdfConfig) -> std::io::Result<Self> {
        let cap = match mode {
            PdfMode::Quick => config.quick_page_cap,
            PdfMode::Full => config.full_page_cap,
        };

        let scratch = match mode {
            PdfMode::Quick => None,
            PdfMode::Full => {
                let mut builder = tempfile::Builder::new();
                builder.prefix("doctools-");
                let dir = match &config.scratch_root {
                    Some(root) => builder.tempdir_in(root)?,
                    None => builder.tempdir()?,
                };
                debug!("Created scratch directory {:?}", dir.path());
                Some(dir)
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            mode,
            cap,
            render_dpi: config.render_dpi,
            scratch,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn mode(&self) -> PdfMode {
        self.mode
    }

    /// Page cap for this job's mode.
    #[must_use]
    pub fn cap(&self) -> usize {
        self.cap
    }

    #[must_use]
    pub fn render_dpi(&self) -> u32 {
        self.render_dpi
    }

    #[must_use]
    pub fn budget(&self, total: usize) -> PageBudget {
        PageBudget::new(total, self.cap)
    }

    /// File name for report headings.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path.file_name().map_or_else(
            || self.path.display().to_string(),
            |name| name.to_string_lossy().into_owned(),
        )
    }

    #[must_use]
    pub fn scratch_dir(&self) -> Option<&Path> {
        self.scratch.as_ref().map(TempDir::path)
    }

    /// Create (or reuse) a named subdirectory of the scratch directory.
    pub fn scratch_subdir(&self, name: &str) -> Result<PathBuf, EngineError> {
        let root = self
            .scratch_dir()
            .ok_or_else(|| EngineError::Failed("no scratch directory in quick mode".to_string()))?;
        let dir = root.join(name);
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// End the job, removing the scratch directory.
    ///
    /// Removal failures are logged and otherwise ignored.
    pub fn finish(self) {
        if let Some(dir) = self.scratch {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!("ResourceCleanupFailure: could not remove {:?}: {}", path, e);
            } else {
                debug!("Removed scratch directory {:?}", path);
            }
        }
    }
}

/// One strategy in the fallback chain.
///
/// A tier either produces its whole output or fails; partial output of a
/// failed tier is discarded.
#[async_trait]
pub trait ExtractionTier: Send + Sync {
    /// Name used in warnings and diagnostics.
    fn label(&self) -> &str;

    async fn attempt(
        &self,
        job: &ExtractionJob,
        analyzer: &ImageAnalyzer,
    ) -> Result<Vec<ContentItem>, EngineError>;
}

/// Ordered fallback chain over PDF engines.
pub struct PdfPipeline {
    config: PdfConfig,
    tiers: Vec<Box<dyn ExtractionTier>>,
    analyzer: ImageAnalyzer,
}

impl PdfPipeline {
    /// Create a pipeline with no tiers.
    #[must_use]
    pub fn new(config: PdfConfig, analyzer: ImageAnalyzer) -> Self {
        Self {
            config,
            tiers: Vec::new(),
            analyzer,
        }
    }

    /// Append a tier at the lowest priority.
    #[must_use]
    pub fn with_tier(mut self, tier: impl ExtractionTier + 'static) -> Self {
        self.tiers.push(Box::new(tier));
        self
    }

    /// The standard chain: lopdf, then pdf-extract markdown, then poppler.
    #[must_use]
    pub fn with_default_engines(pdf: &PdfConfig, ocr: &OcrConfig) -> Self {
        Self::new(pdf.clone(), ImageAnalyzer::from_config(ocr))
            .with_tier(StructuredTier::new(Arc::new(LopdfEngine::new())))
            .with_tier(
                MarkdownTier::new(Arc::new(PdfExtractMarkdown::new()))
                    .with_image_format(markdown_image_format(&pdf.image_format)),
            )
            .with_tier(MinimalTier::new(
                Arc::new(PopplerReader::new()),
                Arc::new(PdftoppmRasterizer::new()),
            ))
    }

    #[must_use]
    pub fn config(&self) -> &PdfConfig {
        &self.config
    }

    /// Tier labels in priority order.
    #[must_use]
    pub fn tier_labels(&self) -> Vec<&str> {
        self.tiers.iter().map(|t| t.label()).collect()
    }

    /// Extract `path`. Never fails; errors come back as diagnostic content.
    pub async fn run(&self, path: &Path, mode: PdfMode) -> Vec<ContentItem> {
        match self.try_run(path, mode).await {
            Ok(items) => items,
            Err(e) => vec![e.into_content()],
        }
    }

    async fn try_run(&self, path: &Path, mode: PdfMode) -> Result<Vec<ContentItem>, ToolError> {
        info!("Extracting {:?} in {} mode", path, mode.as_str());
        let job = ExtractionJob::new(path, mode, &self.config)?;

        let mut output = Vec::new();
        let mut failures = Vec::new();
        for tier in &self.tiers {
            debug!("Trying {} extraction", tier.label());
            match tier.attempt(&job, &self.analyzer).await {
                Ok(items) => {
                    debug!("{} extraction produced {} items", tier.label(), items.len());
                    output.extend(items);
                    job.finish();
                    return Ok(output);
                }
                Err(e) => {
                    warn!("{} extraction failed for {:?}: {}", tier.label(), path, e);
                    output.push(ContentItem::warning(format!(
                        "{} extraction failed: {e}. Trying the next method...",
                        tier.label()
                    )));
                    failures.push((tier.label().to_string(), e.to_string()));
                }
            }
        }

        job.finish();
        Err(ToolError::AllTiersExhausted {
            path: path.to_path_buf(),
            failures,
        })
    }
}

/// Image format named by `extension`, PNG when unknown.
fn markdown_image_format(extension: &str) -> image::ImageFormat {
    match image::ImageFormat::from_extension(extension) {
        Some(format @ (image::ImageFormat::Png | image::ImageFormat::Jpeg)) => format,
        _ => {
            warn!("Unsupported image_format '{}', using png", extension);
            image::ImageFormat::Png
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ocr::DisabledOcr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    /// Tier that records the scratch directory it saw and then succeeds or fails.
    struct ScriptedTier {
        label: &'static str,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedTier {
        fn ok(label: &'static str) -> Self {
            Self {
                label,
                fail: false,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing(label: &'static str) -> Self {
            Self {
                fail: true,
                ..Self::ok(label)
            }
        }
    }

    #[async_trait]
    impl ExtractionTier for ScriptedTier {
        fn label(&self) -> &str {
            self.label
        }

        async fn attempt(
            &self,
            job: &ExtractionJob,
            _analyzer: &ImageAnalyzer,
        ) -> Result<Vec<ContentItem>, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if job.mode() == PdfMode::Full {
                let dir = job.scratch_subdir(self.label)?;
                std::fs::write(dir.join("page_1_img_1.png"), b"scratch")?;
            }
            if self.fail {
                Err(EngineError::Parse(format!("{} cannot read this", self.label)))
            } else {
                Ok(vec![ContentItem::text(format!("content from {}", self.label))])
            }
        }
    }

    fn config_in(root: &Path) -> PdfConfig {
        PdfConfig {
            scratch_root: Some(root.to_path_buf()),
            ..Default::default()
        }
    }

    fn analyzer() -> ImageAnalyzer {
        ImageAnalyzer::new(Arc::new(DisabledOcr), "eng")
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!(PdfMode::parse("quick"), Some(PdfMode::Quick));
        assert_eq!(PdfMode::parse("full"), Some(PdfMode::Full));
        assert_eq!(PdfMode::parse("FULL"), None);
        assert_eq!(PdfMode::default(), PdfMode::Full);
        assert_eq!(PdfMode::Quick.as_str(), "quick");
    }

    #[test]
    fn test_page_budget() {
        let budget = PageBudget::new(120, 50);
        assert_eq!(budget.pages(), 50);
        assert!(budget.is_truncated());
        assert_eq!(
            budget.notice().as_deref(),
            Some("Note: processing only the first 50 of 120 pages.")
        );

        let budget = PageBudget::new(50, 50);
        assert_eq!(budget.pages(), 50);
        assert!(budget.notice().is_none());

        assert_eq!(PageBudget::new(0, 30).pages(), 0);
    }

    #[test]
    fn test_job_caps_and_scratch() {
        let root = tempdir().unwrap();
        let config = config_in(root.path());

        let quick = ExtractionJob::new(Path::new("a.pdf"), PdfMode::Quick, &config).unwrap();
        assert_eq!(quick.cap(), 50);
        assert!(quick.scratch_dir().is_none());
        assert!(quick.scratch_subdir("x").is_err());

        let full = ExtractionJob::new(Path::new("a.pdf"), PdfMode::Full, &config).unwrap();
        assert_eq!(full.cap(), 30);
        let scratch = full.scratch_dir().unwrap().to_path_buf();
        assert!(scratch.starts_with(root.path()));
        assert!(scratch
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("doctools-"));

        full.finish();
        assert!(!scratch.exists());
    }

    #[tokio::test]
    async fn test_first_success_stops_chain() {
        let root = tempdir().unwrap();
        let second = ScriptedTier::ok("second");
        let second_calls = second.calls.clone();
        let pipeline = PdfPipeline::new(config_in(root.path()), analyzer())
            .with_tier(ScriptedTier::ok("first"))
            .with_tier(second);

        let items = pipeline.run(Path::new("doc.pdf"), PdfMode::Quick).await;
        assert_eq!(items, vec![ContentItem::text("content from first")]);
        assert_eq!(second_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_warns_and_cleans_scratch() {
        let root = tempdir().unwrap();
        let pipeline = PdfPipeline::new(config_in(root.path()), analyzer())
            .with_tier(ScriptedTier::failing("structured"))
            .with_tier(ScriptedTier::ok("markdown"));

        let items = pipeline.run(Path::new("doc.pdf"), PdfMode::Full).await;
        assert_eq!(items.len(), 2);
        assert_eq!(
            items[0].as_text(),
            Some(
                "Warning: structured extraction failed: parse error: structured cannot read this. \
                 Trying the next method..."
            )
        );
        assert_eq!(items[1].as_text(), Some("content from markdown"));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_all_tiers_failed_is_single_diagnostic() {
        let root = tempdir().unwrap();
        let pipeline = PdfPipeline::new(config_in(root.path()), analyzer())
            .with_tier(ScriptedTier::failing("structured"))
            .with_tier(ScriptedTier::failing("markdown"))
            .with_tier(ScriptedTier::failing("minimal"));

        let items = pipeline.run(Path::new("broken.pdf"), PdfMode::Full).await;
        assert_eq!(items.len(), 1);
        let text = items[0].as_text().unwrap();
        assert!(text.starts_with("Error: unable to extract content from broken.pdf"));
        assert!(text.contains("- structured: parse error: structured cannot read this"));
        assert!(text.contains("- minimal: parse error: minimal cannot read this"));
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_empty_chain_is_diagnostic() {
        let pipeline = PdfPipeline::new(PdfConfig::default(), analyzer());
        let items = pipeline.run(Path::new("x.pdf"), PdfMode::Quick).await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_error());
    }

    #[tokio::test]
    async fn test_unwritable_scratch_root_is_diagnostic() {
        let root = tempdir().unwrap();
        let missing = root.path().join("missing").join("deeper");
        let pipeline = PdfPipeline::new(config_in(&missing), analyzer())
            .with_tier(ScriptedTier::ok("first"));
        let items = pipeline.run(Path::new("doc.pdf"), PdfMode::Full).await;
        assert_eq!(items.len(), 1);
        assert!(items[0].is_error());
    }

    #[test]
    fn test_default_engine_order() {
        let pipeline = PdfPipeline::with_default_engines(&PdfConfig::default(), &OcrConfig::default());
        assert_eq!(pipeline.tier_labels(), vec!["structured", "markdown", "minimal"]);
    }

    #[test]
    fn test_markdown_image_format() {
        assert_eq!(markdown_image_format("png"), image::ImageFormat::Png);
        assert_eq!(markdown_image_format("jpg"), image::ImageFormat::Jpeg);
        assert_eq!(markdown_image_format("JPEG"), image::ImageFormat::Jpeg);
        assert_eq!(markdown_image_format("tiff"), image::ImageFormat::Png);
    }
}
