//! Poppler command-line engines: `pdfinfo`, `pdftotext` and `pdftoppm`.

use async_trait::async_trait;
use doctools_core::EngineError;
use std::ops::Range;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

use crate::engine::{MinimalPdfReader, PageRasterizer, PdfInfo, RenderedPage};
use crate::process;

/// `pdfinfo` keys reported as document metadata.
const METADATA_KEYS: &[&str] = &[
    "Title",
    "Subject",
    "Keywords",
    "Author",
    "Creator",
    "Producer",
    "CreationDate",
    "ModDate",
];

/// Minimal reader built on `pdfinfo` and `pdftotext`.
pub struct PopplerReader {
    bin_dir: Option<PathBuf>,
}

impl PopplerReader {
    /// Use the poppler tools found on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self { bin_dir: None }
    }

    /// Use the poppler tools installed in `dir`.
    #[must_use]
    pub fn with_bin_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: Some(dir.into()),
        }
    }

    fn command(&self, program: &str) -> Command {
        tool_command(self.bin_dir.as_deref(), program)
    }
}

impl Default for PopplerReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MinimalPdfReader for PopplerReader {
    fn name(&self) -> &str {
        "poppler"
    }

    async fn info(&self, path: &Path) -> Result<PdfInfo, EngineError> {
        let mut command = self.command("pdfinfo");
        command.arg("-enc").arg("UTF-8").arg(path);
        let stdout = process::run(command, None).await?;
        parse_pdfinfo(&String::from_utf8_lossy(&stdout))
    }

    async fn page_text(&self, path: &Path, index: usize) -> Result<String, EngineError> {
        let page = (index + 1).to_string();
        let mut command = self.command("pdftotext");
        command
            .args(["-layout", "-enc", "UTF-8", "-f", &page, "-l", &page])
            .arg(path)
            .arg("-");
        let stdout = process::run(command, None).await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// Parse `pdfinfo` output into page count and metadata.
fn parse_pdfinfo(output: &str) -> Result<PdfInfo, EngineError> {
    let mut info = PdfInfo::default();
    let mut pages = None;

    for line in output.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();

        if key == "Pages" {
            pages = value.parse::<usize>().ok();
        } else if METADATA_KEYS.contains(&key) && !value.is_empty() {
            info.metadata.push((key.to_string(), value.to_string()));
        }
    }

    info.page_count =
        pages.ok_or_else(|| EngineError::Parse("pdfinfo reported no page count".to_string()))?;
    Ok(info)
}

/// Page rasterizer built on `pdftoppm`, writing PNG files.
pub struct PdftoppmRasterizer {
    bin_dir: Option<PathBuf>,
}

impl PdftoppmRasterizer {
    #[must_use]
    pub fn new() -> Self {
        Self { bin_dir: None }
    }

    #[must_use]
    pub fn with_bin_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            bin_dir: Some(dir.into()),
        }
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    fn name(&self) -> &str {
        "pdftoppm"
    }

    async fn render(
        &self,
        path: &Path,
        dpi: u32,
        pages: Range<usize>,
        out_dir: &Path,
    ) -> Result<Vec<RenderedPage>, EngineError> {
        if pages.is_empty() {
            return Ok(Vec::new());
        }

        let mut command = tool_command(self.bin_dir.as_deref(), "pdftoppm");
        command
            .arg("-png")
            .args(["-r", &dpi.to_string()])
            .args(["-f", &(pages.start + 1).to_string()])
            .args(["-l", &pages.end.to_string()])
            .arg(path)
            .arg(out_dir.join("page"));
        process::run(command, None).await?;

        let mut rendered = Vec::new();
        let mut entries = tokio::fs::read_dir(out_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(page) = rendered_page_number(&name.to_string_lossy()) else {
                continue;
            };
            let data = tokio::fs::read(entry.path()).await?;
            rendered.push(RenderedPage {
                page,
                data,
                mime_type: "image/png".to_string(),
            });
        }
        rendered.sort_by_key(|r| r.page);

        debug!("Rendered {} pages of {:?}", rendered.len(), path);
        Ok(rendered)
    }
}

/// Page number from a `pdftoppm` output name such as `page-07.png`.
fn rendered_page_number(file_name: &str) -> Option<usize> {
    let stem = file_name.strip_prefix("page-")?.strip_suffix(".png")?;
    stem.parse().ok()
}

fn tool_command(bin_dir: Option<&Path>, program: &str) -> Command {
    match bin_dir {
        Some(dir) => Command::new(dir.join(program)),
        None => Command::new(program),
    }
}
