//! Display metadata for the notification.

use bridge_traits::engine::ParsedMetadata;
use serde::{Deserialize, Serialize};

/// Fields the notification displays for the current item.
///
/// Every field is optional; missing fields are filled from lower-priority
/// sources (see [`NotificationMetadata::or`]).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub artwork: Option<String>,
    pub duration_ms: Option<u64>,
}

impl NotificationMetadata {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_artist(mut self, artist: impl Into<String>) -> Self {
        self.artist = Some(artist.into());
        self
    }

    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    pub fn with_artwork(mut self, artwork: impl Into<String>) -> Self {
        self.artwork = Some(artwork.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Fill each missing field from `fallback`.
    pub fn or(self, fallback: &NotificationMetadata) -> NotificationMetadata {
        NotificationMetadata {
            title: self.title.or_else(|| fallback.title.clone()),
            artist: self.artist.or_else(|| fallback.artist.clone()),
            album: self.album.or_else(|| fallback.album.clone()),
            artwork: self.artwork.or_else(|| fallback.artwork.clone()),
            duration_ms: self.duration_ms.or(fallback.duration_ms),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.artist.is_none()
            && self.album.is_none()
            && self.artwork.is_none()
            && self.duration_ms.is_none()
    }
}

impl From<&ParsedMetadata> for NotificationMetadata {
    fn from(parsed: &ParsedMetadata) -> Self {
        Self {
            title: parsed.title.clone(),
            artist: parsed.artist.clone(),
            album: parsed.album.clone(),
            artwork: parsed.artwork.clone(),
            duration_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_fills_missing_fields_only() {
        let item = NotificationMetadata::default()
            .with_title("Episode 12")
            .with_duration_ms(3_600_000);
        let stream = NotificationMetadata::default()
            .with_title("Stream title")
            .with_artist("Stream artist")
            .with_artwork("https://img.example/cover.jpg");

        let merged = item.or(&stream);
        assert_eq!(merged.title.as_deref(), Some("Episode 12"));
        assert_eq!(merged.artist.as_deref(), Some("Stream artist"));
        assert_eq!(merged.artwork.as_deref(), Some("https://img.example/cover.jpg"));
        assert_eq!(merged.duration_ms, Some(3_600_000));
    }

    #[test]
    fn test_from_parsed_metadata() {
        let parsed = ParsedMetadata {
            title: Some("Now playing".into()),
            genre: Some("Jazz".into()),
            ..Default::default()
        };
        let meta = NotificationMetadata::from(&parsed);
        assert_eq!(meta.title.as_deref(), Some("Now playing"));
        assert!(meta.artist.is_none());
        assert!(!meta.is_empty());
        assert!(NotificationMetadata::default().is_empty());
    }
}
