//! Error types for doctools.
//!
//! Errors never cross the tool boundary as failures. They are recovered as
//! close to their source as possible and surfaced as diagnostic content via
//! [`ToolError::into_content`].

use std::error::Error as _;
use std::fmt::Write as _;
use std::path::PathBuf;
use thiserror::Error;

use crate::content::ContentItem;

/// Failure of one extraction engine. Recoverable: triggers a fallback tier
/// or a per-item warning.
#[derive(Error, Debug)]
pub enum EngineError {
    /// A required library, binary or capability is missing.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("engine failed: {0}")]
    Failed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking engine task panicked or was cancelled.
    #[error("engine task aborted: {0}")]
    Join(String),
}

/// Tool-level errors, reported to the caller as `Error:` text items.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("missing required argument '{0}'")]
    ArgumentMissing(String),

    #[error("argument '{name}' {reason}")]
    InvalidArgument { name: String, reason: String },

    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("file is too large: {size} bytes exceeds the limit of {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Every tier of a fallback chain failed. `failures` holds
    /// `(tier, message)` pairs in attempt order.
    #[error("unable to extract content from {}", path.display())]
    AllTiersExhausted {
        path: PathBuf,
        failures: Vec<(String, String)>,
    },

    #[error("failed to parse {kind} document: {source}")]
    Parse {
        kind: &'static str,
        #[source]
        source: EngineError,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolError {
    /// Possible causes shown with terminal extraction failures.
    fn possible_causes(&self) -> &'static [&'static str] {
        match self {
            Self::AllTiersExhausted { .. } => &[
                "The file is corrupt or encrypted",
                "A required system library or tool is missing",
                "The file is too large to process",
                "Processing timed out",
            ],
            Self::Parse { .. } => &[
                "The file format is incompatible or the file is corrupt",
                "The file is password protected",
                "The file contains unsupported content",
            ],
            _ => &[],
        }
    }

    /// Full diagnostic text: message, possible causes and captured detail.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        let mut text = format!("Error: {self}");

        let causes = self.possible_causes();
        if !causes.is_empty() {
            text.push_str("\nPossible causes:");
            for (i, cause) in causes.iter().enumerate() {
                let _ = write!(text, "\n{}. {cause}", i + 1);
            }
        }

        if let Self::AllTiersExhausted { failures, .. } = self {
            text.push_str("\n\nDetails:");
            for (tier, message) in failures {
                let _ = write!(text, "\n- {tier}: {message}");
            }
        }

        let mut source = self.source();
        // `Parse` already prints its source inline.
        if matches!(self, Self::Parse { .. }) {
            source = source.and_then(|s| s.source());
        }
        while let Some(err) = source {
            let _ = write!(text, "\nCaused by: {err}");
            source = err.source();
        }

        text
    }

    /// Render this error as a single diagnostic content item.
    #[must_use]
    pub fn into_content(self) -> ContentItem {
        ContentItem::text(self.diagnostic())
    }
}

/// Registry lookup errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown tool: {0}")]
    NotFound(String),
}
