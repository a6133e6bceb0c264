use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

use crate::kind::PlaylistKind;

/// Errors raised while turning a channel URL into a stream URL.
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// The playlist document held no usable entry.
    #[error(
        "no stream url found in {kind} playlist {}",
        .playlist.as_deref().unwrap_or("document")
    )]
    NoStreamUrl {
        /// Playlist format that was parsed.
        kind: PlaylistKind,
        /// Playlist URL, when known.
        playlist: Option<String>,
    },
    /// An extractor was requested for a kind that has none.
    #[error("unknown playlist type: {kind}")]
    UnknownKind {
        /// Kind without an extractor.
        kind: PlaylistKind,
    },
    /// Reading a local playlist document failed.
    #[error("failed to read playlist '{path}': {source}")]
    Fetch {
        /// Local path of the playlist.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The fetcher does not retrieve documents from this location.
    #[error("cannot fetch remote playlist '{url}'; pass its stream url instead")]
    RemoteFetch {
        /// Playlist URL that was requested.
        url: String,
    },
}

impl ResolutionError {
    /// Attaches the playlist URL to extraction failures.
    pub(crate) fn for_url(self, url: &str) -> Self {
        match self {
            Self::NoStreamUrl { kind, .. } => Self::NoStreamUrl {
                kind,
                playlist: Some(url.to_owned()),
            },
            other => other,
        }
    }
}
