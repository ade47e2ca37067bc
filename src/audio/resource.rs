//! The seam between the engine and whatever actually produces sound.

use std::time::Duration;

use crate::library::Track;

use super::types::{EventSink, PlaybackError};

/// One bound, playable stream.
///
/// Commands are requests: a resource confirms what really happened by
/// emitting events on the `EventSink` it was bound with.
pub trait MediaResource {
    /// Ask for playback to start or resume.
    fn play(&mut self) -> Result<(), PlaybackError>;
    fn pause(&mut self);
    fn seek(&mut self, position: Duration) -> Result<(), PlaybackError>;
    fn set_volume(&mut self, volume: f32);
    /// Called once per engine pump; resources without their own event source
    /// report progress and end-of-stream from here.
    fn poll(&mut self) {}
    /// Stop output for good. The resource is dropped right after.
    fn stop(&mut self);
}

/// Creates resources for tracks.
pub trait MediaBackend {
    type Resource: MediaResource;

    /// Bind a new, paused resource to `track`.
    fn bind(&mut self, track: &Track, events: EventSink) -> Result<Self::Resource, PlaybackError>;
}
