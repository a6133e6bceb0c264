use camino::Utf8Path;
use strum::{Display, EnumString};
use url::Url;

/// Container type of a channel URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum PlaylistKind {
    /// The URL names the stream itself.
    Direct,
    /// An `m3u` playlist, one location per line.
    M3u,
    /// A `pls` playlist with `FileN=` entries.
    Pls,
}

/// Classifies `url` by the extension of its path.
///
/// Anything other than `m3u` or `pls` is treated as a direct stream. Strings
/// that do not parse as URLs are treated as plain paths.
#[must_use]
pub fn classify(url: &str) -> PlaylistKind {
    let path = Url::parse(url).map_or_else(|_| url.to_owned(), |parsed| parsed.path().to_owned());
    match Utf8Path::new(&path).extension() {
        Some("m3u") => PlaylistKind::M3u,
        Some("pls") => PlaylistKind::Pls,
        _ => PlaylistKind::Direct,
    }
}
