use std::path::PathBuf;

use crate::types::{Extension, VideoId};

/// Store of fully downloaded videos, keyed by video ID
pub trait BackupCache: Sync {
    /// Whether the video is present in the cache
    fn has(&self, video_id: &VideoId) -> bool;

    /// Where the video is (or would be) stored
    fn path_of(&self, video_id: &VideoId) -> PathBuf;
}

/// Cache stored as a flat directory of `{video_id}.{ext}` files
#[derive(Debug, Clone)]
pub struct DirCache {
    root: PathBuf,
    ext: Extension,
}

impl DirCache {
    pub fn new(root: impl Into<PathBuf>, ext: Extension) -> Self {
        Self {
            root: root.into(),
            ext,
        }
    }
}

impl BackupCache for DirCache {
    fn has(&self, video_id: &VideoId) -> bool {
        self.path_of(video_id).is_file()
    }

    fn path_of(&self, video_id: &VideoId) -> PathBuf {
        self.root.join(format!("{video_id}{}", self.ext.with_dot()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probes_files_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DirCache::new(dir.path(), Extension::Mp4);

        let id = VideoId::from_url("https://youtu.be/abc123").unwrap();
        assert_eq!(cache.path_of(&id), dir.path().join("abc123.mp4"));
        assert!(!cache.has(&id));

        std::fs::write(cache.path_of(&id), b"video").unwrap();
        assert!(cache.has(&id));
    }

    #[test]
    fn directories_are_not_hits() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DirCache::new(dir.path(), Extension::Mp4);

        let id = VideoId::from_url("https://youtu.be/abc123").unwrap();
        std::fs::create_dir(cache.path_of(&id)).unwrap();
        assert!(!cache.has(&id));
    }
}
