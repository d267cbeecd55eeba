//! The tool capability contract.
//!
//! Every tool declares a name, a description and a JSON Schema for its
//! arguments, and implements an asynchronous [`Tool::execute`] that always
//! returns a non-empty content sequence.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::content::ContentItem;
use crate::error::ToolError;

/// Arguments passed to a tool invocation.
pub type Arguments = serde_json::Map<String, Value>;

/// Argument key holding the source file path.
pub const FILE_PATH: &str = "file_path";

/// Metadata advertised for a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A named, independently invokable extraction tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique name within a registry.
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// JSON Schema describing accepted arguments.
    fn input_schema(&self) -> Value;

    /// Metadata for `list_tools`.
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }

    /// Run the tool.
    ///
    /// Never fails: problems are reported as `Error:` or `Warning:` text
    /// items, and the returned sequence is never empty.
    async fn execute(&self, arguments: &Arguments) -> Vec<ContentItem>;
}

/// Fetch a required string argument.
pub fn required_str<'a>(arguments: &'a Arguments, key: &str) -> Result<&'a str, ToolError> {
    match arguments.get(key) {
        None | Some(Value::Null) => Err(ToolError::ArgumentMissing(key.to_string())),
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(ToolError::InvalidArgument {
            name: key.to_string(),
            reason: "must be a string".to_string(),
        }),
    }
}

/// Fetch an optional string argument, falling back to `default`.
pub fn optional_str<'a>(
    arguments: &'a Arguments,
    key: &str,
    default: &'a str,
) -> Result<&'a str, ToolError> {
    match required_str(arguments, key) {
        Ok(value) => Ok(value),
        Err(ToolError::ArgumentMissing(_)) => Ok(default),
        Err(err) => Err(err),
    }
}

/// Validate the `file_path` argument and check the file exists.
///
/// Runs before any engine is touched.
pub fn require_existing_file(arguments: &Arguments) -> Result<PathBuf, ToolError> {
    let path = PathBuf::from(required_str(arguments, FILE_PATH)?);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ToolError::FileNotFound(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the file path"
        }

        fn input_schema(&self) -> Value {
            json!({"type": "object", "required": ["file_path"]})
        }

        async fn execute(&self, arguments: &Arguments) -> Vec<ContentItem> {
            match required_str(arguments, FILE_PATH) {
                Ok(path) => vec![ContentItem::text(path)],
                Err(err) => vec![err.into_content()],
            }
        }
    }

    #[test]
    fn test_required_str_present() {
        let a = args(json!({"file_path": "/tmp/a.pdf"}));
        assert_eq!(required_str(&a, FILE_PATH).unwrap(), "/tmp/a.pdf");
    }

    #[test]
    fn test_required_str_missing() {
        let a = args(json!({}));
        let err = required_str(&a, FILE_PATH).unwrap_err();
        assert!(matches!(err, ToolError::ArgumentMissing(ref k) if k == "file_path"));
    }

    #[test]
    fn test_required_str_null_is_missing() {
        let a = args(json!({"file_path": null}));
        assert!(matches!(
            required_str(&a, FILE_PATH),
            Err(ToolError::ArgumentMissing(_))
        ));
    }

    #[test]
    fn test_required_str_wrong_type() {
        let a = args(json!({"file_path": 42}));
        let err = required_str(&a, FILE_PATH).unwrap_err();
        assert_eq!(err.to_string(), "argument 'file_path' must be a string");
    }

    #[test]
    fn test_optional_str_default() {
        let a = args(json!({}));
        assert_eq!(optional_str(&a, "mode", "full").unwrap(), "full");

        let a = args(json!({"mode": "quick"}));
        assert_eq!(optional_str(&a, "mode", "full").unwrap(), "quick");
    }

    #[test]
    fn test_require_existing_file_missing() {
        let a = args(json!({"file_path": "/definitely/not/here.pdf"}));
        let err = require_existing_file(&a).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.pdf"));
    }

    #[test]
    fn test_require_existing_file_present() {
        let path = std::env::temp_dir().join(format!("doctools-core-{}.txt", std::process::id()));
        std::fs::write(&path, b"x").unwrap();
        let a = args(json!({"file_path": path.to_string_lossy()}));
        assert_eq!(require_existing_file(&a).unwrap(), path);
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_definition_from_trait() {
        let tool = EchoTool;
        let definition = tool.definition();
        assert_eq!(definition.name, "echo");
        assert_eq!(definition.input_schema["required"][0], "file_path");

        let out = tool.execute(&args(json!({}))).await;
        assert_eq!(out.len(), 1);
        assert!(out[0].is_error());
    }
}
