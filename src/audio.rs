//! Audio playback: the engine, the media-resource seam and its rodio implementation.

mod engine;
mod resource;
mod sink;
mod types;

pub use engine::PlaybackEngine;
pub use resource::{MediaBackend, MediaResource};
pub use sink::RodioBackend;
pub use types::{
    EventSink, Generation, MediaEvent, MediaEventKind, PlaybackError, PlaybackSession,
    TransportState,
};

#[cfg(test)]
pub(crate) mod mock;

#[cfg(test)]
mod tests;
