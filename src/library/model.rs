use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use base64::{Engine as _, engine::general_purpose::STANDARD};

/// Embedded cover art decoded from an audio file.
///
/// The bytes are shared, so cloning a `Track` never copies the image; the
/// buffer is released when the last track referencing it is dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct Artwork {
    data: Arc<[u8]>,
    mime_type: String,
}

impl Artwork {
    pub fn new(data: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// Encode as a `data:` URL, the form desktop media controls accept for `artUrl`.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.data))
    }
}

impl fmt::Debug for Artwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artwork")
            .field("mime_type", &self.mime_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// One playable item of the library. Never mutated after the loader builds it.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    pub artist: String,
    pub album: String,
    /// Where the audio lives: a filesystem path or a `file://` URI.
    pub locator: String,
    pub artwork: Option<Artwork>,
    /// `Duration::ZERO` when the container did not report a length.
    pub duration: Duration,
}

/// Name shown for a track whose tags could not be read: the last path segment of its locator.
pub fn name_from_locator(locator: &str) -> String {
    locator
        .trim_end_matches('/')
        .rsplit(['/', '\\'])
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}
