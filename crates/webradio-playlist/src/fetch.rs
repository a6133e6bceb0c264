use std::fs;

use camino::Utf8PathBuf;
use url::Url;

use crate::error::ResolutionError;

/// Source of playlist documents.
pub trait PlaylistFetcher {
    /// Returns the text of the playlist at `url`.
    fn fetch(&self, url: &str) -> Result<String, ResolutionError>;
}

/// Fetcher that reads playlists stored on the local filesystem.
///
/// Accepts plain paths and `file://` URLs. Remote playlists are rejected with
/// [`ResolutionError::RemoteFetch`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFetcher;

impl PlaylistFetcher for LocalFetcher {
    fn fetch(&self, url: &str) -> Result<String, ResolutionError> {
        let path = local_path(url).ok_or_else(|| ResolutionError::RemoteFetch {
            url: url.to_owned(),
        })?;
        fs::read_to_string(&path).map_err(|source| ResolutionError::Fetch { path, source })
    }
}

fn local_path(url: &str) -> Option<Utf8PathBuf> {
    match Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "file" => parsed
            .to_file_path()
            .ok()
            .and_then(|path| Utf8PathBuf::from_path_buf(path).ok()),
        Ok(_) => None,
        Err(_) => Some(Utf8PathBuf::from(url)),
    }
}
