use std::{ffi::OsStr, path::Path};

use miette::{bail, Result};

use crate::types::Extension;

use super::command::{assert_success_command, run_command, Capture, YT_DL, YT_DLP};

/// Interface for downloading full videos
pub trait VideoDownloader {
    /// Download the video at the URL into the given path
    fn download_video(&self, url: &str, path: &Path) -> Result<()>;
}

/// Interface for the [youtube-dl](https://github.com/ytdl-org/youtube-dl) program
#[derive(Debug)]
pub struct Ytdl {
    program: &'static str,
    format: String,
    /// Container the streams are merged into
    merge_ext: Extension,
}

impl Ytdl {
    /// Verify that the `yt-dlp` or `youtube-dl` binaries are reachable
    pub fn new(format: impl Into<String>, merge_ext: Extension) -> Result<Self> {
        let format = format.into();

        // Check `yt-dlp`
        if assert_success_command(YT_DLP, |cmd| cmd.arg("--version")).is_ok() {
            Ok(Self {
                program: YT_DLP,
                format,
                merge_ext,
            })
        } else if assert_success_command(YT_DL, |cmd| cmd.arg("--version")).is_ok() {
            // Check `youtube-dl`
            Ok(Self {
                program: YT_DL,
                format,
                merge_ext,
            })
        } else {
            bail!("Neither yt-dlp nor youtube-dl found")
        }
    }
}

impl VideoDownloader for Ytdl {
    fn download_video(&self, url: &str, path: &Path) -> Result<()> {
        let res = run_command(
            self.program,
            |cmd| {
                cmd.arg("-q")
                    .args([OsStr::new("-o"), path.as_os_str()])
                    .arg("--no-continue") // Or else fails when file already exists, even an empty one
                    .args(["-f", &self.format])
                    .args(["--merge-output-format", self.merge_ext.with_no_dot()])
                    .arg("--")
                    .arg(url)
            },
            Capture::STDERR,
        )?;

        if res.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&res.stderr);
        if is_unavailable(&stderr) {
            bail!("Video is unavailable")
        } else {
            bail!("{} exited with {}: {}", self.program, res.status, stderr.trim())
        }
    }
}

/// Whether the downloader reported the video as gone (private, removed...)
fn is_unavailable(stderr: &str) -> bool {
    stderr
        .lines()
        .any(|line| line.starts_with("ERROR:") && line.to_lowercase().contains("unavailable"))
}
