//! Music library: locating audio files and turning them into `Track`s.

mod decode;
mod loader;
mod model;
mod scan;
mod source;

pub use decode::{LoftyDecoder, MetadataDecoder, RawMetadata, RawPicture};
pub use loader::{MetadataLoader, load_track};
pub use model::{Artwork, Track, name_from_locator};
pub use scan::{locate, resolve_locators};
pub use source::{ByteSource, FsSource, locator_path};

use thiserror::Error;

/// Why a locator could not be turned into a fully-tagged track.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to fetch {locator}: {source}")]
    Fetch {
        locator: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to probe audio format: {0}")]
    Probe(#[source] std::io::Error),

    #[error(transparent)]
    Decode(#[from] lofty::error::LoftyError),
}
