//! Reading the channel list and resolving each entry to a stream URL.

use std::fs;

use camino::Utf8Path;
use tracing::info;
use webradio_playlist::{PlaylistFetcher, resolve};

use crate::CLI_TARGET;
use crate::errors::AppError;

/// Entries of a channel list: one URL per line, blank lines and `#` comments
/// skipped.
pub(crate) fn entries(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
}

/// Reads `path` and resolves every entry with `fetcher`.
pub(crate) fn load(path: &Utf8Path, fetcher: &dyn PlaylistFetcher) -> Result<Vec<String>, AppError> {
    let text = fs::read_to_string(path).map_err(|source| AppError::ReadChannels {
        path: path.to_owned(),
        source,
    })?;
    let channels = entries(&text)
        .enumerate()
        .map(|(index, url)| {
            resolve(url, fetcher).map_err(|source| AppError::Resolve {
                index,
                url: url.to_owned(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if channels.is_empty() {
        return Err(AppError::NoChannels {
            path: path.to_owned(),
        });
    }
    info!(target: CLI_TARGET, file = %path, channels = channels.len(), "loaded channel list");
    Ok(channels)
}
