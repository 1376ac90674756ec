//! Conversation state
//!
//! A [`Conversation`] is built once per request: it owns a copy of the resolved
//! template, the system message, the turns in order and the media references
//! found in them. It is mutated only while being populated and then handed to
//! the renderer.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::content::{Fragment, MediaRef};
use crate::error::TemplateError;
use crate::render::{self, RenderedPrompt};
use crate::template::Template;

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(TemplateError::UnsupportedRole { role: s.to_string() }),
        }
    }
}

/// One role-attributed block of normalized content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: Vec<Fragment>,
}

/// How the rendered prompt ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trailing {
    /// Append an empty assistant turn so generation starts a new reply
    #[default]
    Prime,
    /// Leave the final assistant turn open so generation extends it
    Continue,
}

/// Per-request accumulator of a system message and ordered turns
#[derive(Debug, Clone)]
pub struct Conversation {
    template: Template,
    system_message: Option<String>,
    turns: Vec<Turn>,
    media: Vec<MediaRef>,
    trailing: Trailing,
}

impl Conversation {
    /// Start an empty conversation for a resolved template
    pub fn new(template: Template) -> Self {
        debug!(template = %template.name, "Conversation::new: called");
        Self {
            template,
            system_message: None,
            turns: Vec::new(),
            media: Vec::new(),
            trailing: Trailing::default(),
        }
    }

    /// Override the template's default system message
    pub fn set_system_message(&mut self, text: impl Into<String>) {
        let text = text.into();
        debug!(text_len = text.len(), "Conversation::set_system_message: called");
        self.system_message = Some(text);
    }

    /// Append a turn; media references in `content` are collected in order
    pub fn append_message(&mut self, role: Role, content: Vec<Fragment>) {
        debug!(%role, fragment_count = content.len(), "Conversation::append_message: called");
        self.media
            .extend(content.iter().filter_map(Fragment::as_media).cloned());
        self.turns.push(Turn { role, content });
    }

    /// Convenience for appending a single text fragment
    pub fn append_text(&mut self, role: Role, text: impl Into<String>) {
        self.append_message(role, vec![Fragment::Text(text.into())]);
    }

    pub fn set_trailing(&mut self, trailing: Trailing) {
        self.trailing = trailing;
    }

    pub fn trailing(&self) -> Trailing {
        self.trailing
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    /// The system message in effect: the explicit one if set, else the template default
    pub fn system_message(&self) -> &str {
        self.system_message
            .as_deref()
            .or(self.template.system_message.as_deref())
            .unwrap_or("")
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn media(&self) -> &[MediaRef] {
        &self.media
    }

    pub fn stop_strings(&self) -> &[String] {
        &self.template.stop
    }

    /// Render this conversation into a prompt
    pub fn render(&self) -> Result<RenderedPrompt, TemplateError> {
        render::render(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{MediaKind, RoleMarkers, SeparatorStyle};

    fn template() -> Template {
        Template::new(
            "test",
            SeparatorStyle::AddColonSingle,
            RoleMarkers::new("USER", "ASSISTANT"),
            "\n",
        )
        .with_system_message("default system")
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("user".parse::<Role>().unwrap(), Role::User);
        assert_eq!("assistant".parse::<Role>().unwrap(), Role::Assistant);
        assert_eq!("system".parse::<Role>().unwrap(), Role::System);
        assert_eq!(
            "tool".parse::<Role>(),
            Err(TemplateError::UnsupportedRole {
                role: "tool".to_string()
            })
        );
    }

    #[test]
    fn test_system_message_default_and_override() {
        let mut conv = Conversation::new(template());
        assert_eq!(conv.system_message(), "default system");

        conv.set_system_message("custom");
        assert_eq!(conv.system_message(), "custom");

        conv.set_system_message("");
        assert_eq!(conv.system_message(), "");
    }

    #[test]
    fn test_append_collects_media_in_order_across_roles() {
        let mut conv = Conversation::new(template());
        conv.append_message(
            Role::User,
            vec![
                Fragment::Text("look".to_string()),
                Fragment::Media(MediaRef::new(MediaKind::Image, "first.png")),
            ],
        );
        conv.append_text(Role::Assistant, "ok");
        conv.append_message(
            Role::Assistant,
            vec![Fragment::Media(MediaRef::new(MediaKind::Audio, "second.wav"))],
        );

        let urls: Vec<&str> = conv.media().iter().map(|m| m.url.as_str()).collect();
        assert_eq!(urls, vec!["first.png", "second.wav"]);
        assert_eq!(conv.turns().len(), 3);
        assert_eq!(conv.turns()[1].role, Role::Assistant);
    }

    #[test]
    fn test_trailing_defaults_to_prime() {
        let conv = Conversation::new(template());
        assert_eq!(conv.trailing(), Trailing::Prime);
    }
}
