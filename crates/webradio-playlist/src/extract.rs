use url::Url;

use crate::error::ResolutionError;
use crate::kind::PlaylistKind;

/// Returns the stream URL held by a playlist `document` of type `kind`.
///
/// # Errors
///
/// Returns [`ResolutionError::UnknownKind`] for [`PlaylistKind::Direct`],
/// which has no document to parse, and [`ResolutionError::NoStreamUrl`] when
/// the document holds no candidate.
pub fn extract(document: &str, kind: PlaylistKind) -> Result<String, ResolutionError> {
    let first = match kind {
        PlaylistKind::M3u => m3u_candidates(document).next(),
        PlaylistKind::Pls => pls_candidates(document).next(),
        PlaylistKind::Direct => return Err(ResolutionError::UnknownKind { kind }),
    };
    first
        .map(str::to_owned)
        .ok_or(ResolutionError::NoStreamUrl {
            kind,
            playlist: None,
        })
}

/// Yields every network location listed in an `m3u` document.
///
/// Comment lines (`#...`) are skipped, as is anything that does not parse as
/// a URL with a host.
pub fn m3u_candidates(document: &str) -> impl Iterator<Item = &str> {
    document
        .lines()
        .filter(|line| !line.starts_with('#'))
        .map(str::trim)
        .filter(|line| has_network_location(line))
}

/// Yields the value of every `File` entry in a `pls` document.
///
/// The value is the trimmed text after the last `=`; empty values are
/// skipped.
pub fn pls_candidates(document: &str) -> impl Iterator<Item = &str> {
    document
        .lines()
        .filter(|line| line.starts_with("File"))
        .filter_map(|line| line.trim().rsplit('=').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn has_network_location(line: &str) -> bool {
    Url::parse(line)
        .ok()
        .and_then(|url| url.host_str().map(|host| !host.is_empty()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const M3U: &str = "#EXTM3U\n#EXTINF:-1,Example Radio\nhttp://one.example/stream\r\nhttp://two.example/stream\n";

    const PLS: &str = "[playlist]\nNumberOfEntries=2\nFile1=http://one.example:8000/live\nTitle1=One\nFile2=http://two.example/live\nVersion=2\n";

    #[test]
    fn m3u_takes_first_network_location() {
        assert_eq!(
            extract(M3U, PlaylistKind::M3u).expect("m3u stream"),
            "http://one.example/stream"
        );
    }

    #[test]
    fn m3u_skips_lines_without_host() {
        let document = "relative/path.mp3\n\nfile:///local.mp3\nhttp://radio.example/a\n";
        let candidates: Vec<_> = m3u_candidates(document).collect();
        assert_eq!(candidates, ["http://radio.example/a"]);
    }

    #[test]
    fn m3u_with_only_comments_has_no_stream() {
        let error = extract("#EXTM3U\n# http://commented.example/\n", PlaylistKind::M3u)
            .expect_err("no candidate");
        assert!(matches!(
            error,
            ResolutionError::NoStreamUrl {
                kind: PlaylistKind::M3u,
                playlist: None
            }
        ));
    }

    #[test]
    fn pls_takes_first_file_entry() {
        assert_eq!(
            extract(PLS, PlaylistKind::Pls).expect("pls stream"),
            "http://one.example:8000/live"
        );
    }

    #[test]
    fn pls_uses_text_after_last_equals() {
        let document = "File1=http://radio.example/listen?format=mp3\n";
        let candidates: Vec<_> = pls_candidates(document).collect();
        assert_eq!(candidates, ["mp3"]);
    }

    #[test]
    fn pls_ignores_indented_and_empty_entries() {
        let document = "  File1=http://indented.example/\nFile2=\nFile3=http://radio.example/\n";
        let candidates: Vec<_> = pls_candidates(document).collect();
        assert_eq!(candidates, ["http://radio.example/"]);
    }

    #[test]
    fn direct_kind_has_no_extractor() {
        let error = extract("http://x/a.mp3", PlaylistKind::Direct).expect_err("no extractor");
        assert!(matches!(error, ResolutionError::UnknownKind { .. }));
    }
}
