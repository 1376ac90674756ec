//! ChatTemplate - chat-prompt templating engine
//!
//! Converts a structured, multi-turn, multi-modal chat request into the single
//! flat string a causal language model consumes, following the formatting
//! convention of a model family (role markers, separators, media placeholders).
//!
//! # Flow
//!
//! ```text
//! request + template name
//!     -> request::build_conversation   (resolve template, normalize content)
//!     -> Conversation                  (system message, turns, media refs)
//!     -> render::render                (separator-style strategy)
//!     -> RenderedPrompt { prompt, media, stop }
//! ```
//!
//! # Example
//!
//! ```
//! use chattemplate::{ChatMessage, ContentPart, build_conversation};
//!
//! let messages = vec![ChatMessage::user(vec![
//!     ContentPart::text("describe this image"),
//!     ContentPart::image_url("https://example.com/cat.png"),
//! ])];
//! let conv = build_conversation("qwen2-vl", None, &messages, false).unwrap();
//! let rendered = conv.render().unwrap();
//! assert!(rendered.prompt.ends_with("<|im_start|>assistant\n"));
//! assert_eq!(rendered.media.len(), 1);
//! ```

pub mod cli;
pub mod config;
pub mod content;
pub mod conversation;
pub mod embedded;
mod error;
pub mod registry;
pub mod render;
pub mod request;
pub mod template;

pub use content::{ContentPart, Fragment, MediaRef, MediaUrl, MessageContent, normalize};
pub use conversation::{Conversation, Role, Trailing, Turn};
pub use error::TemplateError;
pub use registry::{
    TemplateRegistry, builtins_loaded, load_template_file, match_template, register_template, resolve_template,
    template_exists, template_names,
};
pub use render::{RenderedPrompt, render};
pub use request::{ChatCompletionRequest, ChatMessage, build_conversation, build_from_request, populate};
pub use template::{MediaKind, MediaToken, MediaTokens, RoleMarkers, SeparatorStyle, Template};
