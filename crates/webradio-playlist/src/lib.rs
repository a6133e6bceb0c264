//! Turns channel URLs into playable stream URLs.
//!
//! A channel URL either names a stream directly or points at a playlist
//! document (`m3u` or `pls`). Playlists are recognised by the extension of the
//! URL path; their first usable entry becomes the stream URL. Obtaining the
//! document text is delegated to a [`PlaylistFetcher`], so parsing stays a
//! pure function and the player core never performs network access.
//!
//! ```
//! use webradio_playlist::{PlaylistKind, extract};
//!
//! let document = "#EXTM3U\nhttp://radio.example/stream\n";
//! let url = extract(document, PlaylistKind::M3u).expect("stream url");
//! assert_eq!(url, "http://radio.example/stream");
//! ```

mod error;
mod extract;
mod fetch;
mod kind;

pub use error::ResolutionError;
pub use extract::{extract, m3u_candidates, pls_candidates};
pub use fetch::{LocalFetcher, PlaylistFetcher};
pub use kind::{PlaylistKind, classify};

use tracing::debug;

const RESOLVE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::resolve");

/// Resolves `url` to a stream URL.
///
/// Direct stream URLs are returned unchanged without consulting `fetcher`.
/// Playlist URLs are fetched and the first candidate entry is returned.
///
/// # Errors
///
/// Returns [`ResolutionError`] when the playlist cannot be fetched or holds no
/// stream URL.
pub fn resolve(url: &str, fetcher: &dyn PlaylistFetcher) -> Result<String, ResolutionError> {
    let kind = classify(url);
    if kind == PlaylistKind::Direct {
        return Ok(url.to_owned());
    }

    let document = fetcher.fetch(url)?;
    let stream = extract(&document, kind).map_err(|error| error.for_url(url))?;
    debug!(
        target: RESOLVE_TARGET,
        playlist = url,
        %kind,
        stream = stream.as_str(),
        "resolved playlist"
    );
    Ok(stream)
}
