//! # doctools CLI
//!
//! Command-line host for the doctools extraction tools.
//!
//! The binary loads configuration, builds the tool registry once and
//! dispatches a single tool call, printing the resulting content items.
//!
//! ## Commands
//!
//! - `doctools tools` - List the registered tools and their input schemas
//! - `doctools call <TOOL>` - Invoke a tool
//! - `doctools config show|init|path` - Inspect configuration
//!
//! ## Examples
//!
//! ```bash
//! # Preview a PDF
//! doctools call file --file report.pdf --mode quick
//!
//! # Full extraction with images, as JSON
//! doctools call pdf --file scan.pdf --format json
//!
//! # Raw arguments
//! doctools call excel --args '{"file_path": "budget.xlsx"}'
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doctools_core::{Arguments, ContentItem, FILE_PATH, ToolDefinition};
use doctools_extract::builtin_registry;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::{Level, debug, info};
use tracing_subscriber::FmtSubscriber;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "doctools")]
#[command(about = "Extract text, tables and images from PDF, Word and Excel files")]
#[command(version)]
struct Cli {
    /// Config file path (default: the doctools config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum ModeArg {
    Quick,
    Full,
}

impl ModeArg {
    fn as_str(self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Full => "full",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List available tools
    Tools,

    /// Invoke a tool
    Call {
        /// Tool name, e.g. file, pdf, quick_pdf, word, excel
        tool: String,

        /// Path of the document to process
        #[arg(long)]
        file: Option<PathBuf>,

        /// PDF extraction mode
        #[arg(short, long)]
        mode: Option<ModeArg>,

        /// Tool arguments as a JSON object; --file and --mode take precedence
        #[arg(long)]
        args: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Print sample configuration file
    Init,
    /// Show config file path
    Path,
}

/// Output structure for `tools`.
#[derive(Serialize)]
struct ToolsOutput {
    tools: Vec<ToolDefinition>,
}

/// Output structure for `call`.
#[derive(Serialize)]
struct CallOutput<'a> {
    tool: &'a str,
    content: &'a [ContentItem],
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = if let Some(ref path) = cli.config {
        Config::load_from(Some(path.clone()))
            .context(format!("Failed to load config from {}", path.display()))?
    } else {
        Config::load().context("Failed to load config")?
    };

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config.logging.level.parse().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    match cli.command {
        Commands::Tools => {
            let registry = builtin_registry(&config.extract());
            let tools = registry.list_tools();

            match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&ToolsOutput { tools })
                            .context("Failed to serialize tool list")?
                    );
                }
                OutputFormat::Text => {
                    println!("Available tools ({}):\n", tools.len());
                    for tool in &tools {
                        println!("  {:<10} {}", tool.name, tool.description);
                    }
                }
            }
        }

        Commands::Call {
            tool,
            file,
            mode,
            args,
        } => {
            let arguments = build_arguments(args.as_deref(), file, mode)?;
            let registry = builtin_registry(&config.extract());

            info!("Calling {}", tool);
            debug!("Arguments: {}", serde_json::Value::Object(arguments.clone()));
            let content = registry.dispatch(&tool, &arguments).await;

            match cli.format {
                OutputFormat::Json => {
                    let output = CallOutput {
                        tool: &tool,
                        content: &content,
                    };
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&output)
                            .context("Failed to serialize tool output")?
                    );
                }
                OutputFormat::Text => {
                    for item in &content {
                        println!("{}\n", render_text(item));
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => match cli.format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&config)
                            .context("Failed to serialize config")?
                    );
                }
                OutputFormat::Text => {
                    println!(
                        "{}",
                        toml::to_string_pretty(&config).context("Failed to serialize config")?
                    );
                }
            },
            ConfigAction::Init => {
                println!("{}", Config::sample_toml());
            }
            ConfigAction::Path => {
                if let Some(path) = Config::config_path() {
                    println!("{}", path.display());
                } else {
                    println!("Could not determine config directory");
                }
            }
        },
    }

    Ok(())
}

/// Merge `--args` JSON with the `--file` and `--mode` shortcuts.
fn build_arguments(
    raw: Option<&str>,
    file: Option<PathBuf>,
    mode: Option<ModeArg>,
) -> Result<Arguments> {
    let mut arguments = match raw {
        Some(raw) => match serde_json::from_str(raw).context("--args is not valid JSON")? {
            Value::Object(map) => map,
            _ => anyhow::bail!("--args must be a JSON object"),
        },
        None => Arguments::new(),
    };

    if let Some(file) = file {
        arguments.insert(
            FILE_PATH.to_string(),
            Value::String(file.to_string_lossy().into_owned()),
        );
    }
    if let Some(mode) = mode {
        arguments.insert("mode".to_string(), Value::String(mode.as_str().to_string()));
    }
    Ok(arguments)
}

/// Text rendering of one item; binary payloads are summarized.
fn render_text(item: &ContentItem) -> String {
    match item {
        ContentItem::Text { text } => text.clone(),
        ContentItem::Image {
            title,
            data,
            mime_type,
        } => format!("[image: {title} ({mime_type}, {} bytes)]", data.len()),
        ContentItem::EmbeddedResource { resource } => format!("[resource: {resource}]"),
    }
}
