use std::path::Path;

use miette::{miette, IntoDiagnostic, Result, WrapErr};
use tracing::{debug, info};

use crate::{
    cache::BackupCache,
    metadata::load_catalogue,
    outside::VideoDownloader,
    result::{BatchReport, ErrorKind, Failure},
    types::VideoId,
};

/// Make sure every video referenced by the metadata is in the backup cache,
/// downloading the missing ones.
///
/// Snippets are ignored: whole videos are backed up.
/// Per-item errors never stop the run, they are recorded in the report.
pub fn backup(
    metadata_root: &Path,
    cache: &dyn BackupCache,
    downloader: &dyn VideoDownloader,
) -> BatchReport {
    let mut report = BatchReport::default();

    let (catalogue, failures) = load_catalogue(metadata_root);
    report.extend(failures);
    report.sources = catalogue.len();

    for record in catalogue.records() {
        let url = &record.url;
        let Some(video_id) = VideoId::from_url(url) else {
            report.push(Failure::new(
                ErrorKind::UnresolvableUrl,
                url,
                miette!("Could not extract a video ID from the URL"),
            ));
            continue;
        };

        if cache.has(&video_id) {
            debug!("Backup already exists for video ID {video_id}");
            continue;
        }

        let path = cache.path_of(&video_id);
        info!("Backup missing for video ID {video_id}. Downloading...");
        match download(downloader, url, &path) {
            Ok(()) => info!("Downloaded and saved {}", path.display()),
            Err(err) => report.push(Failure::new(
                ErrorKind::DownloadFailure,
                url,
                err.wrap_err(format!("Could not download video {video_id}")),
            )),
        }
    }

    report
}

fn download(downloader: &dyn VideoDownloader, url: &str, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not create cache directory {}", dir.display()))?;
    }

    downloader.download_video(url, path)
}

#[cfg(test)]
mod tests {
    use std::{fs, sync::Mutex};

    use indoc::indoc;
    use miette::bail;

    use super::*;
    use crate::{cache::DirCache, types::Extension};

    #[derive(Default)]
    struct FakeDownloader {
        downloaded: Mutex<Vec<String>>,
    }

    impl VideoDownloader for FakeDownloader {
        fn download_video(&self, url: &str, path: &Path) -> Result<()> {
            if url.contains("gone") {
                bail!("Video is unavailable");
            }
            self.downloaded.lock().unwrap().push(url.to_owned());
            fs::write(path, b"video").into_diagnostic()
        }
    }

    #[test]
    fn creates_the_cache_directory() {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("a.json"), r#"[{ "url": "https://youtu.be/abc" }]"#).unwrap();

        let cache_dir = root.path().join("deep/cache");
        let cache = DirCache::new(&cache_dir, Extension::Mp4);
        let report = backup(&data, &cache, &FakeDownloader::default());

        assert!(report.is_success());
        assert!(cache_dir.join("abc.mp4").is_file());
    }

    #[test]
    fn downloads_only_missing_videos() {
        let root = tempfile::tempdir().unwrap();
        let data = root.path().join("data");
        let cache_dir = root.path().join("cache");
        fs::create_dir_all(&data).unwrap();
        fs::write(
            data.join("videos.json"),
            indoc! {r#"
                [
                    { "url": "https://youtu.be/cached" },
                    { "url": "https://youtu.be/fresh", "start_time": 1, "duration": 2, "title": "t" },
                    { "url": "https://youtu.be/fresh", "start_time": 4, "duration": 2, "title": "u" },
                    { "url": "https://youtu.be/gone" },
                    { "url": "https://example.com/nope" }
                ]
            "#},
        )
        .unwrap();

        let cache = DirCache::new(&cache_dir, Extension::Mp4);
        fs::create_dir_all(&cache_dir).unwrap();
        fs::write(cache_dir.join("cached.mp4"), b"video").unwrap();

        let downloader = FakeDownloader::default();
        let report = backup(&data, &cache, &downloader);

        assert_eq!(
            *downloader.downloaded.lock().unwrap(),
            ["https://youtu.be/fresh"]
        );
        assert!(cache_dir.join("fresh.mp4").is_file());
        assert_eq!(report.count(ErrorKind::DownloadFailure), 1);
        assert_eq!(report.count(ErrorKind::UnresolvableUrl), 1);
        assert_eq!(report.sources, 4);

        // Running it again has nothing left to download
        let downloader = FakeDownloader::default();
        let report = backup(&data, &cache, &downloader);
        assert!(downloader.downloaded.lock().unwrap().is_empty());
        assert_eq!(report.count(ErrorKind::DownloadFailure), 1);
    }
}
