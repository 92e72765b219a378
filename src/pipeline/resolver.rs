use std::path::PathBuf;

use miette::miette;
use tracing::debug;

use crate::{
    cache::BackupCache,
    result::{ErrorKind, Failure},
    types::{Snippet, VideoId},
};

/// A source video found in the backup cache, with the snippets to cut from it
#[derive(Debug, Clone)]
pub struct ResolvedSource {
    pub url: String,
    pub video_id: VideoId,
    pub local_path: PathBuf,
    pub snippets: Vec<Snippet>,
}

/// Find the cached video of the URL.
///
/// This only probes the cache, nothing is ever downloaded here.
pub fn resolve_source(
    url: &str,
    snippets: Vec<Snippet>,
    cache: &dyn BackupCache,
) -> Result<ResolvedSource, Failure> {
    let video_id = VideoId::from_url(url).ok_or_else(|| {
        Failure::new(
            ErrorKind::UnresolvableUrl,
            url,
            miette!("Could not extract a video ID from the URL"),
        )
    })?;

    if !cache.has(&video_id) {
        return Err(Failure::new(
            ErrorKind::CacheMiss,
            url,
            miette!(
                "Video '{video_id}' not found in the backup cache at {}",
                cache.path_of(&video_id).display()
            ),
        ));
    }

    let local_path = cache.path_of(&video_id);
    debug!("Resolved {url} to {}", local_path.display());

    Ok(ResolvedSource {
        url: url.to_owned(),
        video_id,
        local_path,
        snippets,
    })
}

#[cfg(test)]
mod tests {
    use std::{collections::HashSet, path::PathBuf};

    use super::*;

    struct SetCache(HashSet<&'static str>);

    impl BackupCache for SetCache {
        fn has(&self, video_id: &VideoId) -> bool {
            self.0.contains(&**video_id)
        }

        fn path_of(&self, video_id: &VideoId) -> PathBuf {
            PathBuf::from(format!("/cache/{video_id}.mp4"))
        }
    }

    #[test]
    fn hit() {
        let cache = SetCache(HashSet::from(["abc123"]));
        let source = resolve_source("https://youtu.be/abc123", vec![], &cache).unwrap();
        assert_eq!(source.local_path, PathBuf::from("/cache/abc123.mp4"));
        assert_eq!(&*source.video_id, "abc123");
    }

    #[test]
    fn miss() {
        let cache = SetCache(HashSet::new());
        let failure = resolve_source("https://youtu.be/abc123", vec![], &cache).unwrap_err();
        assert_eq!(failure.kind, ErrorKind::CacheMiss);
    }

    #[test]
    fn unresolvable() {
        let cache = SetCache(HashSet::from(["video"]));
        let failure = resolve_source("https://example.com/video", vec![], &cache).unwrap_err();
        assert_eq!(failure.kind, ErrorKind::UnresolvableUrl);
        assert_eq!(failure.subject, "https://example.com/video");
    }
}
