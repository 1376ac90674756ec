//! Content normalization
//!
//! Message content arrives either as a plain string or as an ordered list of
//! typed parts (OpenAI chat-completion shape). Both are reduced to an ordered
//! list of [`Fragment`]s. Media parts are only tagged here; their placeholder
//! text is chosen by the renderer from the conversation's template.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::TemplateError;
use crate::template::MediaKind;

/// Message content - either plain text or structured parts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<Vec<ContentPart>> for MessageContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        MessageContent::Parts(parts)
    }
}

/// Location of a media item plus its optional detail hint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaUrl {
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl MediaUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            detail: None,
        }
    }
}

/// A content part in a message
///
/// Fields are optional on the wire so that a structurally incomplete part is
/// reported as [`TemplateError::MalformedContent`] rather than a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text {
        #[serde(default)]
        text: Option<String>,
    },

    #[serde(rename = "image_url")]
    ImageUrl {
        #[serde(default)]
        image_url: Option<MediaUrl>,
    },

    #[serde(rename = "video_url")]
    VideoUrl {
        #[serde(default)]
        video_url: Option<MediaUrl>,
    },

    #[serde(rename = "audio_url")]
    AudioUrl {
        #[serde(default)]
        audio_url: Option<MediaUrl>,
    },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: Some(text.into()) }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl {
            image_url: Some(MediaUrl::new(url)),
        }
    }

    pub fn video_url(url: impl Into<String>) -> Self {
        ContentPart::VideoUrl {
            video_url: Some(MediaUrl::new(url)),
        }
    }

    pub fn audio_url(url: impl Into<String>) -> Self {
        ContentPart::AudioUrl {
            audio_url: Some(MediaUrl::new(url)),
        }
    }
}

/// A media item collected from the conversation, in the order it was seen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub kind: MediaKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl MediaRef {
    pub fn new(kind: MediaKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            detail: None,
        }
    }
}

/// One normalized piece of message content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Media(MediaRef),
}

impl Fragment {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Fragment::Text(text) => Some(text),
            Fragment::Media(_) => None,
        }
    }

    pub fn as_media(&self) -> Option<&MediaRef> {
        match self {
            Fragment::Text(_) => None,
            Fragment::Media(media) => Some(media),
        }
    }
}

/// Convert message content into ordered fragments
pub fn normalize(content: &MessageContent) -> Result<Vec<Fragment>, TemplateError> {
    match content {
        MessageContent::Text(text) => {
            debug!(text_len = text.len(), "normalize: plain text");
            Ok(vec![Fragment::Text(text.clone())])
        }
        MessageContent::Parts(parts) => {
            debug!(part_count = parts.len(), "normalize: content parts");
            if parts.is_empty() {
                return Err(TemplateError::MalformedContent(
                    "message has an empty content part list".to_string(),
                ));
            }
            parts
                .iter()
                .enumerate()
                .map(|(index, part)| normalize_part(index, part))
                .collect()
        }
    }
}

fn normalize_part(index: usize, part: &ContentPart) -> Result<Fragment, TemplateError> {
    match part {
        ContentPart::Text { text } => text
            .as_ref()
            .map(|t| Fragment::Text(t.clone()))
            .ok_or_else(|| TemplateError::MalformedContent(format!("text part {} has no text", index))),
        ContentPart::ImageUrl { image_url } => media_fragment(index, MediaKind::Image, image_url.as_ref()),
        ContentPart::VideoUrl { video_url } => media_fragment(index, MediaKind::Video, video_url.as_ref()),
        ContentPart::AudioUrl { audio_url } => media_fragment(index, MediaKind::Audio, audio_url.as_ref()),
    }
}

fn media_fragment(index: usize, kind: MediaKind, source: Option<&MediaUrl>) -> Result<Fragment, TemplateError> {
    match source {
        Some(media) if !media.url.trim().is_empty() => Ok(Fragment::Media(MediaRef {
            kind,
            url: media.url.clone(),
            detail: media.detail.clone(),
        })),
        _ => Err(TemplateError::MalformedContent(format!(
            "{} part {} has no url",
            kind, index
        ))),
    }
}
