//! ct - render chat requests into model-specific prompts

use std::io::Read;
use std::path::Path;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use chattemplate::cli::{Cli, Command};
use chattemplate::config::Config;
use chattemplate::{
    ChatCompletionRequest, build_conversation, builtins_loaded, match_template, resolve_template, template_names,
};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > RUST_LOG > warn
    let filter = match cli_log_level.or(config_log_level) {
        Some(level) => tracing_subscriber::EnvFilter::try_new(level.to_lowercase())
            .context(format!("Invalid log level '{}'", level))?,
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
    };

    // stdout carries the prompt, so logs go to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
    Ok(())
}

fn read_request(path: &Path) -> Result<ChatCompletionRequest> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).context(format!("Failed to read request file {}", path.display()))?
    };
    serde_json::from_str(&content).context("Failed to parse chat-completion request")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    builtins_loaded().context("Failed to load embedded templates")?;
    let registered = config.register_templates().context("Failed to register template files")?;
    if !registered.is_empty() {
        info!(count = registered.len(), "Registered templates from config");
    }

    match cli.command {
        Command::Render {
            request,
            template,
            system,
            continue_final,
            json,
        } => {
            let request = read_request(&request)?;
            // --template, then model patterns, then the configured default
            let name = template
                .or_else(|| match_template(&request.model))
                .or_else(|| config.default_template.clone())
                .ok_or_else(|| eyre!("No template matches model '{}'; pass --template", request.model))?;
            debug!(%name, model = %request.model, "main: rendering");

            let conv = build_conversation(
                &name,
                system.as_deref(),
                &request.messages,
                continue_final || request.continue_final_message,
            )?;
            let rendered = conv.render()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&rendered)?);
            } else {
                print!("{}", rendered.prompt);
                for (index, media) in rendered.media.iter().enumerate() {
                    eprintln!("{} [{}] {} {}", "media".cyan(), index, media.kind.to_string().yellow(), media.url);
                }
            }
        }
        Command::List => {
            for name in template_names() {
                println!("{}", name);
            }
        }
        Command::Show { name } => {
            let template = resolve_template(&name)?;
            print!("{}", serde_yaml::to_string(&template)?);
        }
    }

    Ok(())
}
