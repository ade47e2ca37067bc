//! Byte fetching for audio locators.

use std::path::PathBuf;

use super::LoadError;

/// Fetches the raw bytes behind a locator.
pub trait ByteSource {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, LoadError>;
}

/// Reads locators from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

impl ByteSource for FsSource {
    fn fetch(&self, locator: &str) -> Result<Vec<u8>, LoadError> {
        let path = locator_path(locator);
        std::fs::read(&path).map_err(|source| LoadError::Fetch {
            locator: locator.to_string(),
            source,
        })
    }
}

/// Map a locator to a filesystem path, accepting plain paths and `file://` URIs.
pub fn locator_path(locator: &str) -> PathBuf {
    match locator.strip_prefix("file://") {
        Some(rest) => PathBuf::from(rest),
        None => PathBuf::from(locator),
    }
}
