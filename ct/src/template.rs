//! Template definitions
//!
//! A [`Template`] is the immutable formatting ruleset for one model family:
//! role markers, separators, the system-turn wrapper and the placeholder tokens
//! substituted for media. Templates are plain data so they can be embedded as
//! YAML, loaded from user files, or built in code.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TemplateError;

/// How role blocks are delimited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeparatorStyle {
    /// `ROLE: content{sep}`, priming with `ROLE:`
    AddColonSingle,
    /// `ROLE: content{sep|sep2}`, priming with `ROLE:`
    AddColonTwo,
    /// `ROLE: content{sep}`, priming with `ROLE: `
    AddColonSpaceSingle,
    /// `ROLEcontent{sep}`, priming with `ROLE`
    NoColonSingle,
    /// `ROLEcontent{sep|sep2}`, priming with `ROLE`
    NoColonTwo,
    /// `ROLE\ncontent{sep}`, priming with `ROLE\n`
    AddNewLineSingle,
    /// `[INST]`-style wrapping where the first user turn shares the opening block
    Llama2,
}

impl SeparatorStyle {
    /// Styles that close assistant turns with `sep2` instead of `sep`
    pub fn uses_two_separators(&self) -> bool {
        matches!(
            self,
            SeparatorStyle::AddColonTwo | SeparatorStyle::NoColonTwo | SeparatorStyle::Llama2
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AddColonSingle => "add_colon_single",
            Self::AddColonTwo => "add_colon_two",
            Self::AddColonSpaceSingle => "add_colon_space_single",
            Self::NoColonSingle => "no_colon_single",
            Self::NoColonTwo => "no_colon_two",
            Self::AddNewLineSingle => "add_new_line_single",
            Self::Llama2 => "llama2",
        }
    }
}

impl std::fmt::Display for SeparatorStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The two conversational role markers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMarkers {
    pub user: String,
    pub assistant: String,
}

impl RoleMarkers {
    pub fn new(user: impl Into<String>, assistant: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            assistant: assistant.into(),
        }
    }
}

/// Kind of media a content part refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
        }
    }
}

/// Placeholder emitted in place of one media item: `prefix + token + suffix`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaToken {
    #[serde(default)]
    pub prefix: String,
    pub token: String,
    #[serde(default)]
    pub suffix: String,
}

impl MediaToken {
    /// A bare token with no wrapper
    pub fn bare(token: impl Into<String>) -> Self {
        Self {
            prefix: String::new(),
            token: token.into(),
            suffix: String::new(),
        }
    }

    /// A token surrounded by start/end markers
    pub fn wrapped(prefix: impl Into<String>, token: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            token: token.into(),
            suffix: suffix.into(),
        }
    }

    /// Append the full placeholder to `out`
    pub fn write_to(&self, out: &mut String) {
        out.push_str(&self.prefix);
        out.push_str(&self.token);
        out.push_str(&self.suffix);
    }

    /// The full placeholder string
    pub fn rendered(&self) -> String {
        let mut out = String::with_capacity(self.prefix.len() + self.token.len() + self.suffix.len());
        self.write_to(&mut out);
        out
    }
}

/// Per-kind media placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaTokens {
    pub image: MediaToken,
    pub video: MediaToken,
    pub audio: MediaToken,
}

impl Default for MediaTokens {
    fn default() -> Self {
        Self {
            image: MediaToken::bare("<image>"),
            video: MediaToken::bare("<video>"),
            audio: MediaToken::bare("<audio>"),
        }
    }
}

impl MediaTokens {
    pub fn get(&self, kind: MediaKind) -> &MediaToken {
        match kind {
            MediaKind::Image => &self.image,
            MediaKind::Video => &self.video,
            MediaKind::Audio => &self.audio,
        }
    }
}

/// Formatting rules for one model family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Template {
    /// Registry name, e.g. `qwen2-vl`
    pub name: String,

    /// Default system message used when the request supplies none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,

    /// Emitted once before everything else (BOS tokens and the like)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,

    /// Opens the system turn
    #[serde(default)]
    pub system_marker: String,

    /// Closes the system turn; the first separator is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_suffix: Option<String>,

    pub roles: RoleMarkers,

    pub style: SeparatorStyle,

    pub sep: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sep2: Option<String>,

    #[serde(default)]
    pub media: MediaTokens,

    /// Stop strings handed to the generator alongside the prompt
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stop: Vec<String>,

    /// Regexes matched against a request's model id to pick this template
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub model_patterns: Vec<String>,
}

impl Template {
    /// Create a template with no system message, prefix or media overrides
    pub fn new(name: impl Into<String>, style: SeparatorStyle, roles: RoleMarkers, sep: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            system_message: None,
            prefix: String::new(),
            system_marker: String::new(),
            system_suffix: None,
            roles,
            style,
            sep: sep.into(),
            sep2: None,
            media: MediaTokens::default(),
            stop: Vec::new(),
            model_patterns: Vec::new(),
        }
    }

    pub fn with_sep2(mut self, sep2: impl Into<String>) -> Self {
        self.sep2 = Some(sep2.into());
        self
    }

    pub fn with_system_message(mut self, text: impl Into<String>) -> Self {
        self.system_message = Some(text.into());
        self
    }

    pub fn with_system_marker(mut self, marker: impl Into<String>) -> Self {
        self.system_marker = marker.into();
        self
    }

    pub fn with_system_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.system_suffix = Some(suffix.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_media(mut self, kind: MediaKind, token: MediaToken) -> Self {
        match kind {
            MediaKind::Image => self.media.image = token,
            MediaKind::Video => self.media.video = token,
            MediaKind::Audio => self.media.audio = token,
        }
        self
    }

    pub fn with_stop(mut self, stop: impl Into<String>) -> Self {
        self.stop.push(stop.into());
        self
    }

    pub fn with_model_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.model_patterns.push(pattern.into());
        self
    }

    /// Check the template is internally consistent, model patterns included
    pub fn validate(&self) -> Result<(), TemplateError> {
        self.validate_layout()?;
        self.compile_patterns().map(|_| ())
    }

    /// Check everything rendering depends on: name, role markers, separators and media tokens
    pub(crate) fn validate_layout(&self) -> Result<(), TemplateError> {
        debug!(name = %self.name, style = %self.style, "Template::validate_layout: called");
        if self.name.is_empty() {
            return Err(TemplateError::malformed_template("", "template name is empty"));
        }
        if self.roles.user.is_empty() || self.roles.assistant.is_empty() {
            return Err(TemplateError::malformed_template(
                &self.name,
                "both user and assistant role markers are required",
            ));
        }
        if self.style.uses_two_separators() && self.sep2.is_none() {
            return Err(TemplateError::malformed_template(
                &self.name,
                format!("separator style {} requires sep2", self.style),
            ));
        }
        for kind in [MediaKind::Image, MediaKind::Video, MediaKind::Audio] {
            if self.media.get(kind).token.is_empty() {
                return Err(TemplateError::malformed_template(
                    &self.name,
                    format!("{} placeholder token is empty", kind),
                ));
            }
        }
        Ok(())
    }

    /// Compile the model patterns, failing on the first invalid one
    pub fn compile_patterns(&self) -> Result<Vec<Regex>, TemplateError> {
        self.model_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    TemplateError::malformed_template(
                        &self.name,
                        format!("invalid model pattern '{}': {}", pattern, e),
                    )
                })
            })
            .collect()
    }

    /// Second separator, required by two-separator styles
    pub(crate) fn sep2_checked(&self) -> Result<&str, TemplateError> {
        self.sep2.as_deref().ok_or_else(|| {
            TemplateError::malformed_template(&self.name, format!("separator style {} requires sep2", self.style))
        })
    }

    /// String closing the system pseudo-turn
    pub fn system_terminator(&self) -> &str {
        self.system_suffix.as_deref().unwrap_or(&self.sep)
    }

    /// Whether any of the model patterns match the given model id
    ///
    /// Patterns are compiled on every call; the registry keeps compiled copies
    /// for repeated matching.
    pub fn matches_model(&self, model: &str) -> bool {
        self.compile_patterns()
            .map(|patterns| patterns.iter().any(|re| re.is_match(model)))
            .unwrap_or(false)
    }
}
