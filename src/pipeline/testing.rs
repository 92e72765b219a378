//! Test doubles for the outside programs.
//!
//! Videos are plain text files holding their duration in seconds,
//! so cutting and joining them can be checked without ffmpeg.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    },
};

use miette::{bail, miette, IntoDiagnostic, Result};

use crate::{cache::BackupCache, outside::MediaEditor, types::VideoId};

#[derive(Debug, Default)]
pub struct FakeEditor {
    failing_titles: Mutex<Vec<String>>,
    fail_concat: AtomicBool,
    /// Every clip the editor has been asked to write
    pub written: Mutex<Vec<PathBuf>>,
    /// Inputs of the last concatenation, in order
    pub concatenated: Mutex<Vec<PathBuf>>,
}

impl FakeEditor {
    /// Write a fake source video of the given duration and return its path
    pub fn add_source(&self, dir: &Path, id: &str, duration: f64) -> PathBuf {
        let path = dir.join(format!("{id}.mp4"));
        fs::write(&path, duration.to_string()).unwrap();
        path
    }

    /// Make the cuts whose output name contains the title fail
    pub fn fail_on_title(&self, title: &str) {
        self.failing_titles.lock().unwrap().push(title.to_owned());
    }

    pub fn fail_concat(&self) {
        self.fail_concat.store(true, Ordering::SeqCst);
    }
}

impl MediaEditor for FakeEditor {
    fn extract_clip(&self, input: &Path, output: &Path, _start: f64, duration: f64) -> Result<()> {
        self.written.lock().unwrap().push(output.to_path_buf());

        let name = output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self
            .failing_titles
            .lock()
            .unwrap()
            .iter()
            .any(|title| name.contains(title.as_str()))
        {
            // Leave a partial file, as a crashing encoder would
            fs::write(output, b"garbage").into_diagnostic()?;
            bail!("Encoder crashed");
        }

        self.probe_duration(input)?;
        fs::write(output, duration.to_string()).into_diagnostic()
    }

    fn probe_duration(&self, input: &Path) -> Result<f64> {
        let content = fs::read_to_string(input).into_diagnostic()?;
        content
            .trim()
            .parse()
            .map_err(|_| miette!("{} is not a video", input.display()))
    }

    fn concat(&self, inputs: &[PathBuf], output: &Path, work_dir: &Path) -> Result<()> {
        if !work_dir.is_dir() {
            bail!("Work directory does not exist");
        }
        if self.fail_concat.load(Ordering::SeqCst) {
            fs::write(output, b"partial").into_diagnostic()?;
            bail!("Disk full");
        }

        *self.concatenated.lock().unwrap() = inputs.to_vec();

        let mut total = 0.0;
        for input in inputs {
            total += self.probe_duration(input)?;
        }
        fs::write(output, total.to_string()).into_diagnostic()
    }
}

/// Cache holding a fixed set of IDs, all stored in the same directory
#[derive(Debug)]
pub struct FakeCache {
    pub dir: PathBuf,
    pub ids: HashSet<String>,
}

impl BackupCache for FakeCache {
    fn has(&self, video_id: &VideoId) -> bool {
        self.ids.contains(&**video_id)
    }

    fn path_of(&self, video_id: &VideoId) -> PathBuf {
        self.dir.join(format!("{video_id}.mp4"))
    }
}
