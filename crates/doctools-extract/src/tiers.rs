//! The three extraction tiers of the default PDF pipeline.
//!
//! | Tier | Engine | Full-mode images |
//! |------|--------|------------------|
//! | [`StructuredTier`] | [`PdfTextEngine`] | embedded images decoded in memory |
//! | [`MarkdownTier`] | [`MarkdownEngine`] | images written to scratch, then read back |
//! | [`MinimalTier`] | [`MinimalPdfReader`] | pages rasterized to scratch |

use async_trait::async_trait;
use doctools_core::{ContentItem, EngineError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::engine::{
    MarkdownEngine, MarkdownOptions, MinimalPdfReader, PageRasterizer, PdfTextEngine, RawImage,
};
use crate::image::probe_image;
use crate::ocr::ImageAnalyzer;
use crate::pipeline::{ExtractionJob, ExtractionTier, PdfMode};
use crate::report::{analyzed_image, full_header, page_item, page_sections, quick_report};

/// Run blocking engine work off the async runtime.
async fn blocking<T, F>(work: F) -> Result<T, EngineError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, EngineError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| EngineError::Join(e.to_string()))?
}

// ============================================================================
// Tier 1: structured
// ============================================================================

/// Page-structured extraction with embedded images.
pub struct StructuredTier {
    engine: Arc<dyn PdfTextEngine>,
}

impl StructuredTier {
    #[must_use]
    pub fn new(engine: Arc<dyn PdfTextEngine>) -> Self {
        Self { engine }
    }
}

struct StructuredPage {
    number: usize,
    text: String,
    images: Result<Vec<Result<RawImage, EngineError>>, EngineError>,
}

struct StructuredDocument {
    total: usize,
    metadata: Vec<(String, String)>,
    pages: Vec<StructuredPage>,
}

fn read_structured(
    engine: &dyn PdfTextEngine,
    path: &Path,
    cap: usize,
    with_images: bool,
) -> Result<StructuredDocument, EngineError> {
    let document = engine.open(path)?;
    let total = document.page_count();
    let count = total.min(cap);

    let mut pages = Vec::with_capacity(count);
    for index in 0..count {
        debug!("Reading page {} of {:?}", index + 1, path);
        let text = document.page_text(index)?;
        let images = if with_images {
            document.page_images(index)
        } else {
            Ok(Vec::new())
        };
        pages.push(StructuredPage {
            number: index + 1,
            text,
            images,
        });
    }

    Ok(StructuredDocument {
        total,
        metadata: document.metadata(),
        pages,
    })
}

#[async_trait]
impl ExtractionTier for StructuredTier {
    fn label(&self) -> &str {
        "structured"
    }

    async fn attempt(
        &self,
        job: &ExtractionJob,
        analyzer: &ImageAnalyzer,
    ) -> Result<Vec<ContentItem>, EngineError> {
        let engine = Arc::clone(&self.engine);
        let path = job.path().to_path_buf();
        let cap = job.cap();
        let with_images = job.mode() == PdfMode::Full;
        let document =
            blocking(move || read_structured(engine.as_ref(), &path, cap, with_images)).await?;
        let budget = job.budget(document.total);

        if job.mode() == PdfMode::Quick {
            let pages: Vec<(usize, String)> = document
                .pages
                .into_iter()
                .map(|p| (p.number, p.text))
                .collect();
            return Ok(vec![quick_report(
                job,
                &budget,
                &document.metadata,
                &page_sections(&pages),
            )]);
        }

        let mut items = vec![full_header(job, &budget, &document.metadata)];
        for page in document.pages {
            items.push(page_item(page.number, &page.text));

            let images = match page.images {
                Ok(images) => images,
                Err(e) => {
                    items.push(ContentItem::warning(format!(
                        "could not list images on page {}: {e}",
                        page.number
                    )));
                    continue;
                }
            };
            for (k, image) in images.into_iter().enumerate() {
                let title = format!("Page {} image {}", page.number, k + 1);
                match image {
                    Ok(raw) => {
                        items.extend(analyzed_image(title, raw.data, raw.mime_type, analyzer).await);
                    }
                    Err(e) => {
                        items.push(ContentItem::warning(format!("{title} could not be extracted: {e}")));
                    }
                }
            }
        }

        Ok(items)
    }
}

// ============================================================================
// Tier 2: markdown
// ============================================================================

/// Markdown conversion; full mode reads images back from scratch.
pub struct MarkdownTier {
    engine: Arc<dyn MarkdownEngine>,
    image_format: image::ImageFormat,
}

impl MarkdownTier {
    #[must_use]
    pub fn new(engine: Arc<dyn MarkdownEngine>) -> Self {
        Self {
            engine,
            image_format: image::ImageFormat::Png,
        }
    }

    /// Format the engine writes decodable images in.
    #[must_use]
    pub fn with_image_format(mut self, format: image::ImageFormat) -> Self {
        self.image_format = format;
        self
    }
}

#[async_trait]
impl ExtractionTier for MarkdownTier {
    fn label(&self) -> &str {
        "markdown"
    }

    async fn attempt(
        &self,
        job: &ExtractionJob,
        analyzer: &ImageAnalyzer,
    ) -> Result<Vec<ContentItem>, EngineError> {
        let image_dir = match job.mode() {
            PdfMode::Quick => None,
            PdfMode::Full => Some(job.scratch_subdir("markdown")?),
        };
        let options = MarkdownOptions {
            write_images: image_dir.is_some(),
            image_dir: image_dir.clone(),
            image_format: self.image_format,
        };

        let engine = Arc::clone(&self.engine);
        let path = job.path().to_path_buf();
        let cap = job.cap();
        let (total, markdown) = blocking(move || {
            let total = engine.page_count(&path)?;
            let markdown = engine.to_markdown(&path, 0..total.min(cap), &options)?;
            Ok((total, markdown))
        })
        .await?;
        let budget = job.budget(total);

        let Some(image_dir) = image_dir else {
            return Ok(vec![quick_report(job, &budget, &[], &markdown)]);
        };

        let mut items = vec![full_header(job, &budget, &[])];
        if !markdown.trim().is_empty() {
            items.push(ContentItem::text(markdown.trim()));
        }

        for file in scratch_images(&image_dir).await? {
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let data = tokio::fs::read(&file).await?;
            match probe_image(&data) {
                Ok(probe) => {
                    let title = image_title(&name);
                    debug!("{} is a {} image", name, probe);
                    let [image, analysis] =
                        analyzed_image(title.clone(), data, probe.mime_type.clone(), analyzer).await;
                    items.push(ContentItem::text(format!("{title}: {probe}")));
                    items.push(image);
                    items.push(analysis);
                }
                Err(e) => {
                    items.push(ContentItem::warning(format!("{name} is not a readable image: {e}")));
                }
            }
        }

        Ok(items)
    }
}

/// Image files in `dir`, in page and image order.
async fn scratch_images(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }

    files.sort_by_key(|path| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (image_position(&name).unwrap_or((usize::MAX, usize::MAX)), name)
    });
    Ok(files)
}

/// `(page, image)` from a name such as `page_3_img_2.png`.
fn image_position(file_name: &str) -> Option<(usize, usize)> {
    let stem = file_name.split('.').next()?;
    let rest = stem.strip_prefix("page_")?;
    let (page, image) = rest.split_once("_img_")?;
    Some((page.parse().ok()?, image.parse().ok()?))
}

fn image_title(file_name: &str) -> String {
    match image_position(file_name) {
        Some((page, image)) => format!("Page {page} image {image}"),
        None => file_name.to_string(),
    }
}

// ============================================================================
// Tier 3: minimal
// ============================================================================

/// Minimal reader; full mode rasterizes pages for OCR.
pub struct MinimalTier {
    reader: Arc<dyn MinimalPdfReader>,
    rasterizer: Arc<dyn PageRasterizer>,
}

impl MinimalTier {
    #[must_use]
    pub fn new(reader: Arc<dyn MinimalPdfReader>, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self { reader, rasterizer }
    }
}

#[async_trait]
impl ExtractionTier for MinimalTier {
    fn label(&self) -> &str {
        "minimal"
    }

    async fn attempt(
        &self,
        job: &ExtractionJob,
        analyzer: &ImageAnalyzer,
    ) -> Result<Vec<ContentItem>, EngineError> {
        let path = job.path();
        let info = self.reader.info(path).await?;
        let budget = job.budget(info.page_count);

        let mut pages = Vec::with_capacity(budget.pages());
        for index in 0..budget.pages() {
            pages.push((index + 1, self.reader.page_text(path, index).await?));
        }

        if job.mode() == PdfMode::Quick {
            return Ok(vec![quick_report(
                job,
                &budget,
                &info.metadata,
                &page_sections(&pages),
            )]);
        }

        let mut items = vec![full_header(job, &budget, &info.metadata)];

        let out_dir = job.scratch_subdir("pages")?;
        let mut rendered = match self
            .rasterizer
            .render(path, job.render_dpi(), 0..budget.pages(), &out_dir)
            .await
        {
            Ok(rendered) => rendered,
            Err(e) => {
                items.push(ContentItem::warning(format!("page rendering unavailable: {e}")));
                Vec::new()
            }
        };
        rendered.sort_by_key(|r| r.page);
        let mut rendered = rendered.into_iter().peekable();

        for (number, text) in pages {
            items.push(page_item(number, &text));
            while let Some(render) = rendered.next_if(|r| r.page <= number) {
                if render.page < number {
                    continue;
                }
                let title = format!("Page {number} image");
                items.extend(analyzed_image(title, render.data, render.mime_type, analyzer).await);
            }
        }

        Ok(items)
    }
}
