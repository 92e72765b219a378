use std::{fmt::Display, ops::Deref};

use url::Url;

/// Canonical identifier of a video, used as the backup cache key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VideoId(String);

impl VideoId {
    /// Derive the video ID from a YouTube URL.
    ///
    /// Recognized shapes:
    /// - `youtu.be/<id>`
    /// - `*youtube.com/watch?v=<id>`
    /// - `*youtube.com/shorts/<id>` and `*youtube.com/embed/<id>`
    ///
    /// Return None for any other URL shape.
    pub fn from_url(url: &str) -> Option<Self> {
        let url = Url::parse(url.trim()).ok()?;
        let host = url.host_str()?.to_ascii_lowercase();

        let id = if host == "youtu.be" {
            url.path_segments()?.next().map(str::to_owned)
        } else if host == "youtube.com" || host.ends_with(".youtube.com") {
            if url.path() == "/watch" {
                url.query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned())
            } else {
                let mut segments = url.path_segments()?;
                match (segments.next(), segments.next()) {
                    (Some("shorts" | "embed"), Some(id)) => Some(id.to_owned()),
                    _ => None,
                }
            }
        } else {
            None
        }?;

        Self::validate(id)
    }

    /// The ID ends up in file names, so only accept the characters YouTube uses
    fn validate(id: String) -> Option<Self> {
        let id = id.trim();
        let is_valid = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        is_valid.then(|| Self(id.to_owned()))
    }
}

impl Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Deref for VideoId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(url: &str) -> Option<String> {
        VideoId::from_url(url).map(|id| id.to_string())
    }

    #[test]
    fn short_links() {
        assert_eq!(id("https://youtu.be/abc123").as_deref(), Some("abc123"));
        assert_eq!(id("https://youtu.be/abc123?t=42").as_deref(), Some("abc123"));
    }

    #[test]
    fn watch_links() {
        assert_eq!(
            id("https://www.youtube.com/watch?v=xyz789&t=10s").as_deref(),
            Some("xyz789")
        );
        assert_eq!(
            id("https://youtube.com/watch?feature=share&v=xyz789").as_deref(),
            Some("xyz789")
        );
        assert_eq!(
            id("https://m.youtube.com/watch?v=dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn shorts_and_embeds() {
        assert_eq!(
            id("https://www.youtube.com/shorts/a_b-c").as_deref(),
            Some("a_b-c")
        );
        assert_eq!(
            id("https://www.youtube.com/embed/q1w2e3").as_deref(),
            Some("q1w2e3")
        );
    }

    #[test]
    fn unrecognized_shapes() {
        assert_eq!(id("https://example.com/video"), None);
        assert_eq!(id("https://example.com/watch?v=abc"), None);
        assert_eq!(id("https://www.youtube.com/watch"), None);
        assert_eq!(id("https://www.youtube.com/channel/UC123"), None);
        assert_eq!(id("https://youtu.be/"), None);
        assert_eq!(id("not a url"), None);
        assert_eq!(id("https://notyoutube.com/watch?v=abc"), None);
    }

    #[test]
    fn rejects_ids_unsafe_for_paths() {
        assert_eq!(id("https://www.youtube.com/watch?v=../../etc"), None);
    }
}
