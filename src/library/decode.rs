//! Tag decoding for raw audio blobs.
//!
//! The loader treats the decoder as a black box: bytes in, `RawMetadata` out.

use std::io::Cursor;
use std::time::Duration;

use lofty::picture::PictureType;
use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use lofty::probe::Probe;

use super::LoadError;

/// Everything the decoder could find in a blob; every field is optional.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
    pub picture: Option<RawPicture>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPicture {
    pub data: Vec<u8>,
    pub mime_type: Option<String>,
}

pub trait MetadataDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RawMetadata, LoadError>;
}

/// Decoder backed by `lofty`'s format probing.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyDecoder;

impl MetadataDecoder for LoftyDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<RawMetadata, LoadError> {
        let tagged = Probe::new(Cursor::new(bytes))
            .guess_file_type()
            .map_err(LoadError::Probe)?
            .read()?;

        let mut meta = RawMetadata {
            duration: Some(tagged.properties().duration()).filter(|d| !d.is_zero()),
            ..RawMetadata::default()
        };

        let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
            return Ok(meta);
        };

        meta.title = non_blank(tag.title().as_deref());
        meta.artist = non_blank(tag.artist().as_deref());
        meta.album = non_blank(tag.album().as_deref());

        // Prefer the front cover, otherwise take whatever picture comes first.
        let pictures = tag.pictures();
        meta.picture = pictures
            .iter()
            .find(|p| matches!(p.pic_type(), PictureType::CoverFront))
            .or_else(|| pictures.first())
            .map(|p| RawPicture {
                data: p.data().to_vec(),
                mime_type: p.mime_type().map(|m| m.as_str().to_string()),
            });

        Ok(meta)
    }
}

fn non_blank(v: Option<&str>) -> Option<String> {
    v.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
