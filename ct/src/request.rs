//! Request adapter
//!
//! Maps an external chat-completion request onto a populated [`Conversation`].
//! The adapter resolves the template, normalizes each message in order and
//! decides how the prompt should end. It never renders.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::content::{self, Fragment, MessageContent};
use crate::conversation::{Conversation, Role, Trailing};
use crate::error::TemplateError;
use crate::registry;
use crate::template::Template;

/// A message as it arrives from the caller; the role is validated on use
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<MessageContent>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new("assistant", content)
    }
}

/// OpenAI-style chat-completion request, reduced to what prompt building needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub model: String,
    pub messages: Vec<ChatMessage>,
    /// Extend the final assistant message instead of starting a new one
    #[serde(default)]
    pub continue_final_message: bool,
}

/// Build a conversation using a template from the process-wide registry
pub fn build_conversation(
    template_name: &str,
    system_override: Option<&str>,
    messages: &[ChatMessage],
    continuation: bool,
) -> Result<Conversation, TemplateError> {
    debug!(%template_name, message_count = messages.len(), %continuation, "build_conversation: called");
    let template = registry::resolve_template(template_name)?;
    populate(template, system_override, messages, continuation)
}

/// Build a conversation for a request
///
/// When `template_name` is `None` the template is chosen by matching the
/// request's model id against the registered model patterns.
pub fn build_from_request(
    request: &ChatCompletionRequest,
    template_name: Option<&str>,
) -> Result<Conversation, TemplateError> {
    debug!(model = %request.model, ?template_name, "build_from_request: called");
    let name = match template_name {
        Some(name) => name.to_string(),
        None => registry::match_template(&request.model).ok_or_else(|| TemplateError::UnknownTemplate {
            name: format!("(no template matches model '{}')", request.model),
        })?,
    };
    build_conversation(&name, None, &request.messages, request.continue_final_message)
}

/// Populate a conversation from an already resolved template
pub fn populate(
    template: Template,
    system_override: Option<&str>,
    messages: &[ChatMessage],
    continuation: bool,
) -> Result<Conversation, TemplateError> {
    let mut conv = Conversation::new(template);
    if let Some(system) = system_override.filter(|s| !s.is_empty()) {
        conv.set_system_message(system);
    }

    for message in messages {
        let role: Role = message.role.parse()?;
        let fragments = content::normalize(&message.content)?;
        match role {
            Role::System => conv.set_system_message(system_text(fragments)?),
            Role::User | Role::Assistant => conv.append_message(role, fragments),
        }
    }

    let ends_with_assistant = messages.last().is_some_and(|m| m.role == "assistant");
    let trailing = if continuation && ends_with_assistant {
        Trailing::Continue
    } else {
        Trailing::Prime
    };
    debug!(?trailing, turn_count = conv.turns().len(), "populate: done");
    conv.set_trailing(trailing);
    Ok(conv)
}

/// System messages carry text only
fn system_text(fragments: Vec<Fragment>) -> Result<String, TemplateError> {
    let mut text = String::new();
    for fragment in fragments {
        match fragment {
            Fragment::Text(t) => text.push_str(&t),
            Fragment::Media(media) => {
                return Err(TemplateError::MalformedContent(format!(
                    "system messages cannot carry media ({} {})",
                    media.kind, media.url
                )));
            }
        }
    }
    Ok(text)
}
