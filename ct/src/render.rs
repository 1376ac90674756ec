//! Prompt rendering
//!
//! Walks a populated [`Conversation`] and emits the flat prompt string. Every
//! marker, separator and placeholder is copied from the template verbatim;
//! message text is never trimmed.
//!
//! Emission order:
//!
//! ```text
//! prefix
//! system_marker + system message + system_suffix|sep        (when non-empty)
//! head(role) + content + closing(role)                      (per turn)
//! empty assistant head                                      (when priming)
//! ```

use serde::Serialize;
use tracing::debug;

use crate::content::{Fragment, MediaRef};
use crate::conversation::{Conversation, Role, Trailing};
use crate::error::TemplateError;
use crate::template::{SeparatorStyle, Template};

/// The rendered prompt plus everything a caller needs to run generation on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedPrompt {
    pub prompt: String,
    /// Media references in the order their placeholders appear in `prompt`
    pub media: Vec<MediaRef>,
    pub stop: Vec<String>,
}

/// Render a conversation into its prompt string
pub fn render(conv: &Conversation) -> Result<RenderedPrompt, TemplateError> {
    let template = conv.template();
    let turns = conv.turns();
    debug!(template = %template.name, turn_count = turns.len(), trailing = ?conv.trailing(), "render: called");

    template.validate_layout()?;
    let Some(last) = turns.last() else {
        return Err(TemplateError::EmptyConversation);
    };
    let continuing = conv.trailing() == Trailing::Continue;
    if continuing && last.role != Role::Assistant {
        return Err(TemplateError::MalformedContent(format!(
            "cannot continue a final {} turn, only an assistant turn",
            last.role
        )));
    }

    let mut out = String::new();
    out.push_str(&template.prefix);

    // llama2 folds the first user message into the opening [INST] block
    let mut bare_first_user = false;
    let system = conv.system_message();
    if !system.is_empty() {
        out.push_str(&template.system_marker);
        out.push_str(system);
        out.push_str(template.system_terminator());
        bare_first_user = template.style == SeparatorStyle::Llama2;
    } else if template.style == SeparatorStyle::Llama2 {
        out.push_str(&template.roles.user);
        out.push_str(&template.sep);
        bare_first_user = true;
    }

    let last_index = turns.len() - 1;
    for (index, turn) in turns.iter().enumerate() {
        let open_ended = continuing && index == last_index;
        let bare = bare_first_user && index == 0 && turn.role == Role::User;

        if turn.role == Role::System {
            out.push_str(&template.system_marker);
        } else if !bare {
            write_head(&mut out, template, marker(template, turn.role));
        }
        write_content(&mut out, template, &turn.content);
        if !open_ended {
            out.push_str(closing(template, turn.role)?);
        }
    }

    if !continuing {
        write_empty_head(&mut out, template, &template.roles.assistant);
    }

    debug!(prompt_len = out.len(), media_count = conv.media().len(), "render: done");
    Ok(RenderedPrompt {
        prompt: out,
        media: conv.media().to_vec(),
        stop: template.stop.clone(),
    })
}

fn marker(template: &Template, role: Role) -> &str {
    match role {
        Role::System => template.system_marker.as_str(),
        Role::User => template.roles.user.as_str(),
        Role::Assistant => template.roles.assistant.as_str(),
    }
}

fn closing(template: &Template, role: Role) -> Result<&str, TemplateError> {
    match role {
        Role::System => Ok(template.system_terminator()),
        Role::User => Ok(template.sep.as_str()),
        Role::Assistant if template.style.uses_two_separators() => template.sep2_checked(),
        Role::Assistant => Ok(template.sep.as_str()),
    }
}

/// Role marker as it appears before a turn's content
fn write_head(out: &mut String, template: &Template, marker: &str) {
    out.push_str(marker);
    match template.style {
        SeparatorStyle::AddColonSingle | SeparatorStyle::AddColonTwo | SeparatorStyle::AddColonSpaceSingle => {
            out.push_str(": ")
        }
        SeparatorStyle::NoColonSingle | SeparatorStyle::NoColonTwo => {}
        SeparatorStyle::AddNewLineSingle => out.push('\n'),
        SeparatorStyle::Llama2 => out.push(' '),
    }
}

/// Role marker as it appears when priming a turn with no content
fn write_empty_head(out: &mut String, template: &Template, marker: &str) {
    out.push_str(marker);
    match template.style {
        SeparatorStyle::AddColonSingle | SeparatorStyle::AddColonTwo => out.push(':'),
        SeparatorStyle::AddColonSpaceSingle => out.push_str(": "),
        SeparatorStyle::NoColonSingle | SeparatorStyle::NoColonTwo | SeparatorStyle::Llama2 => {}
        SeparatorStyle::AddNewLineSingle => out.push('\n'),
    }
}

fn write_content(out: &mut String, template: &Template, content: &[Fragment]) {
    for fragment in content {
        match fragment {
            Fragment::Text(text) => out.push_str(text),
            Fragment::Media(media) => template.media.get(media.kind).write_to(out),
        }
    }
}
