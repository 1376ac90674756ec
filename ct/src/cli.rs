//! CLI argument parsing for chattemplate

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ct")]
#[command(author, version, about = "Render chat requests into model-specific prompts", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a chat-completion request (JSON) into a prompt
    Render {
        /// Request file, or '-' for stdin
        #[arg(required = true)]
        request: PathBuf,

        /// Template name (default: from config, then matched on the request's model)
        #[arg(short, long)]
        template: Option<String>,

        /// System message overriding the template default
        #[arg(short, long)]
        system: Option<String>,

        /// Continue the final assistant message instead of priming a new one
        #[arg(long = "continue")]
        continue_final: bool,

        /// Print prompt, media and stop strings as JSON
        #[arg(long)]
        json: bool,
    },

    /// List registered templates
    List,

    /// Show a template definition as YAML
    Show {
        /// Template name
        #[arg(required = true)]
        name: String,
    },
}
