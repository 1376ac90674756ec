//! Embedded templates
//!
//! These are compiled into the binary from .yml files at build time.

use tracing::debug;

use crate::error::TemplateError;
use crate::template::Template;

/// Qwen2-VL / Qwen2.5-VL chat markup with vision placeholders
pub const QWEN2_VL: &str = include_str!("../templates/qwen2-vl.yml");

/// Plain ChatML
pub const CHATML: &str = include_str!("../templates/chatml.yml");

/// ChatML with LLaVA-style `<image>` placeholders
pub const CHATML_LLAVA: &str = include_str!("../templates/chatml-llava.yml");

/// Llama 2 chat `[INST]` format
pub const LLAMA_2: &str = include_str!("../templates/llama-2.yml");

/// Llama 3 instruct header format
pub const LLAMA_3_INSTRUCT: &str = include_str!("../templates/llama-3-instruct.yml");

/// Vicuna v1.1 `USER:`/`ASSISTANT:` format
pub const VICUNA_V1_1: &str = include_str!("../templates/vicuna_v1.1.yml");

/// Alpaca instruction format
pub const ALPACA: &str = include_str!("../templates/alpaca.yml");

/// Names of all embedded templates
pub const EMBEDDED_NAMES: &[&str] = &[
    "alpaca",
    "chatml",
    "chatml-llava",
    "llama-2",
    "llama-3-instruct",
    "qwen2-vl",
    "vicuna_v1.1",
];

/// Get the embedded template source by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "qwen2-vl" => Some(QWEN2_VL),
        "chatml" => Some(CHATML),
        "chatml-llava" => Some(CHATML_LLAVA),
        "llama-2" => Some(LLAMA_2),
        "llama-3-instruct" => Some(LLAMA_3_INSTRUCT),
        "vicuna_v1.1" => Some(VICUNA_V1_1),
        "alpaca" => Some(ALPACA),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}

/// Parse an embedded template by name
pub fn load_embedded(name: &str) -> Result<Template, TemplateError> {
    let source = get_embedded(name).ok_or_else(|| TemplateError::UnknownTemplate { name: name.to_string() })?;
    let template: Template = serde_yaml::from_str(source)
        .map_err(|e| TemplateError::malformed_template(name, format!("embedded definition does not parse: {}", e)))?;
    template.validate()?;
    Ok(template)
}
