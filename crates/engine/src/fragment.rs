//! Stored message model.
//!
//! A [`Fragment`] keeps the handful of Telegram message fields the engine
//! reads and carries every other field through untouched in `extra`, so a
//! stored message serializes back to the shape it arrived in.

use {
    serde::{Deserialize, Serialize},
    serde_json::{Map, Value},
};

/// One message, possibly part of a media group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub message_id: i32,
    pub chat: ChatRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption_entities: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_caption_above_media: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<Vec<MediaFile>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<MediaFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<MediaFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<MediaFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio: Option<MediaFile>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The chat a fragment was sent in. Only the id matters to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRef {
    pub id: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A file attached to a message (photo size, video, document, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaFile {
    /// Reusable reference; sending it again does not re-upload the file.
    pub file_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MediaFile {
    pub fn new(file_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            extra: Map::new(),
        }
    }
}

/// Deduplication key: message ids are only unique within a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FragmentId {
    pub message_id: i32,
    pub chat_id: i64,
}

/// The media payload of a fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Media<'a> {
    /// All sizes of a photo, smallest first.
    Photo(&'a [MediaFile]),
    Video(&'a MediaFile),
    Animation(&'a MediaFile),
    Document(&'a MediaFile),
    Audio(&'a MediaFile),
}

impl Fragment {
    /// Minimal fragment with no media and no group.
    pub fn new(message_id: i32, chat_id: i64) -> Self {
        Self {
            message_id,
            chat: ChatRef {
                id: chat_id,
                extra: Map::new(),
            },
            media_group_id: None,
            caption: None,
            caption_entities: None,
            show_caption_above_media: None,
            photo: None,
            video: None,
            animation: None,
            document: None,
            audio: None,
            extra: Map::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> FragmentId {
        FragmentId {
            message_id: self.message_id,
            chat_id: self.chat.id,
        }
    }

    #[must_use]
    pub fn group_key(&self) -> Option<&str> {
        self.media_group_id.as_deref()
    }

    /// Animations also carry a `document` field for older clients, so
    /// `animation` has to be checked first.
    #[must_use]
    pub fn media(&self) -> Option<Media<'_>> {
        if let Some(sizes) = &self.photo {
            return Some(Media::Photo(sizes));
        }
        if let Some(video) = &self.video {
            return Some(Media::Video(video));
        }
        if let Some(animation) = &self.animation {
            return Some(Media::Animation(animation));
        }
        if let Some(document) = &self.document {
            return Some(Media::Document(document));
        }
        self.audio.as_ref().map(Media::Audio)
    }
}
