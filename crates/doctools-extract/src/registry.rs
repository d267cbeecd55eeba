//! Tool registry for managing extraction tools.

use doctools_core::{Arguments, ContentItem, RegistryError, Tool, ToolDefinition};
use futures::FutureExt;
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::ExtractConfig;
use crate::docx::DocxReader;
use crate::pipeline::PdfPipeline;
use crate::tools::{ExcelTool, FileTool, PdfTool, QuickPdfTool, WordTool};
use crate::workbook::WorkbookReader;

/// Registry of tools: definitions and live instances keyed by name.
pub struct ToolRegistry {
    /// Names in registration order
    order: Vec<String>,
    definitions: HashMap<String, ToolDefinition>,
    instances: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            definitions: HashMap::new(),
            instances: HashMap::new(),
        }
    }

    /// Register a tool under its own name.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    /// Register a shared tool. A repeated name replaces the earlier tool
    /// and keeps its listing position.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let definition = tool.definition();
        let name = definition.name.clone();
        if self.instances.insert(name.clone(), tool).is_some() {
            debug!("Replacing tool {}", name);
        } else {
            self.order.push(name.clone());
        }
        self.definitions.insert(name, definition);
    }

    /// Definitions in registration order.
    #[must_use]
    pub fn list_tools(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.definitions.get(name))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn has_tool(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn get_tool(&self, name: &str) -> Result<&ToolDefinition, RegistryError> {
        self.definitions
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Live instance of a tool.
    #[must_use]
    pub fn instance(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.instances.get(name).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Invoke a tool by name. Lookup failures and panics inside the tool
    /// come back as `Error:` text items.
    pub async fn dispatch(&self, name: &str, arguments: &Arguments) -> Vec<ContentItem> {
        if let Err(e) = self.get_tool(name) {
            return vec![ContentItem::text(format!("Error: {e}"))];
        }
        let Some(tool) = self.instance(name) else {
            return vec![ContentItem::text(format!(
                "Error: Tool instance for {name} not found"
            ))];
        };

        match AssertUnwindSafe(tool.execute(arguments)).catch_unwind().await {
            Ok(items) => {
                debug!("Tool {} returned {} items", name, items.len());
                items
            }
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!("Tool {} panicked: {}", name, message);
                vec![ContentItem::text(format!(
                    "Error: Error executing tool {name}: {message}"
                ))]
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Build the registry of built-in tools: `file`, `pdf`, `quick_pdf`,
/// `word` and `excel`.
#[must_use]
pub fn builtin_registry(config: &ExtractConfig) -> ToolRegistry {
    let pipeline = Arc::new(PdfPipeline::with_default_engines(&config.pdf, &config.ocr));
    let pdf = PdfTool::new(Arc::clone(&pipeline));
    let word = WordTool::new(Arc::new(DocxReader::new()));
    let excel = ExcelTool::new(Arc::new(WorkbookReader::new()), config.office.max_sheet_rows);

    let mut registry = ToolRegistry::new();
    registry.register(FileTool::new(pdf.clone(), word.clone(), excel.clone()));
    registry.register(pdf);
    registry.register(QuickPdfTool::new(pipeline));
    registry.register(word);
    registry.register(excel);
    registry
}
