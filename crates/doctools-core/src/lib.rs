//! # doctools-core
//!
//! Core types and traits for the doctools extraction tools.
//!
//! This crate provides the foundational abstractions shared by every tool:
//!
//! - **Content Model**: [`ContentItem`], the ordered result blocks a tool returns
//! - **Tool Contract**: [`Tool`] trait with identity, input schema and `execute`
//! - **Arguments**: helpers that validate caller arguments before any I/O
//! - **Errors**: [`ToolError`] and [`EngineError`], rendered as diagnostic content
//!
//! ## Architecture
//!
//! ```text
//! caller → ToolRegistry::dispatch → Tool::execute → engines → Vec<ContentItem>
//! ```
//!
//! Tools never fail past the boundary. Every failure is converted to a
//! [`ContentItem::Text`] starting with `Error:` via [`ToolError::into_content`].
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ContentItem`] | Text, image or embedded-resource result block |
//! | [`ToolDefinition`] | Name, description and JSON input schema of a tool |
//! | [`Arguments`] | JSON object passed to `execute` |
//!
//! ## Related Crates
//!
//! - `doctools-extract`: registry, engines, PDF pipeline and office extractors
//! - `doctools`: command-line host

pub mod content;
pub mod error;
pub mod tool;

pub use content::{ContentItem, concat_text};
pub use error::{EngineError, RegistryError, ToolError};
pub use tool::{
    Arguments, FILE_PATH, Tool, ToolDefinition, optional_str, require_existing_file, required_str,
};
