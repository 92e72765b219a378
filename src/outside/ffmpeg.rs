use std::{
    ffi::OsStr,
    fmt::Debug,
    io::Write,
    path::{Path, PathBuf},
    sync::OnceLock,
};

use miette::{miette, IntoDiagnostic, Result, WrapErr};
use regex::Regex;

use crate::types::Extension;

use super::command::{assert_success_command, command_stdout, FFMPEG, FFPROBE, FFXXX_DEFAULT_ARGS};

/// Interface for cutting and joining video files
pub trait MediaEditor: Sync + Debug {
    /// Extract the `[start, start + duration)` range of the input
    /// video into the output file, re-encoding the streams.
    ///
    /// Codecs are selected from the output file extension.
    fn extract_clip(&self, input: &Path, output: &Path, start: f64, duration: f64) -> Result<()>;

    /// Load the file and return its duration in seconds.
    ///
    /// Doubles as a check that the file is a readable video.
    fn probe_duration(&self, input: &Path) -> Result<f64>;

    /// Concatenate the inputs, in order, into a single output video.
    ///
    /// `work_dir` may be used for intermediate files, which must
    /// not outlive the call.
    fn concat(&self, inputs: &[PathBuf], output: &Path, work_dir: &Path) -> Result<()>;
}

/// Interface for the [ffmpeg](https://ffmpeg.org) and ffprobe programs
#[derive(Debug)]
pub struct Ffmpeg;

impl Ffmpeg {
    /// Verify that the `ffmpeg` and `ffprobe` binaries are reachable
    pub fn new() -> Result<Self> {
        assert_success_command(FFMPEG, |cmd| cmd.arg("-version"))
            .wrap_err("ffmpeg is not reachable")?;
        assert_success_command(FFPROBE, |cmd| cmd.arg("-version"))
            .wrap_err("ffprobe is not reachable")?;

        Ok(Self)
    }
}

impl MediaEditor for Ffmpeg {
    fn extract_clip(&self, input: &Path, output: &Path, start: f64, duration: f64) -> Result<()> {
        let ext = output_extension(output)?;

        assert_success_command(FFMPEG, |cmd| {
            cmd.args(FFXXX_DEFAULT_ARGS)
                .arg("-y")
                // Seeking before the input is fast and frame-accurate when re-encoding
                .args(["-ss", &format!("{start:.3}")])
                .args([OsStr::new("-i"), input.as_os_str()])
                .args(["-t", &format!("{duration:.3}")])
                .args(["-c:v", ext.video_codec()])
                .args(["-c:a", ext.audio_codec()])
                .arg(output)
        })
        .map(drop)
    }

    fn probe_duration(&self, input: &Path) -> Result<f64> {
        let output = command_stdout(FFPROBE, |cmd| {
            cmd.args(FFXXX_DEFAULT_ARGS)
                .args(["-show_entries", "format=duration"])
                .arg(input)
        })?;

        parse_probe_duration(&output)
    }

    fn concat(&self, inputs: &[PathBuf], output: &Path, work_dir: &Path) -> Result<()> {
        let ext = output_extension(output)?;

        // The concat demuxer reads the inputs from a list file.
        // It is removed when the handle is dropped, at the end of the function.
        let mut list = tempfile::Builder::new()
            .prefix("concat-")
            .suffix(".txt")
            .tempfile_in(work_dir)
            .into_diagnostic()
            .wrap_err("Could not create the concat list file")?;

        for input in inputs {
            // Relative entries are resolved against the list file directory
            let input = input
                .canonicalize()
                .into_diagnostic()
                .wrap_err_with(|| format!("Could not resolve {}", input.display()))?;
            writeln!(list, "file {}", quote_concat_path(&input))
                .into_diagnostic()
                .wrap_err("Could not write the concat list file")?;
        }
        list.flush().into_diagnostic()?;

        assert_success_command(FFMPEG, |cmd| {
            cmd.args(FFXXX_DEFAULT_ARGS)
                .arg("-y")
                .args(["-f", "concat"])
                .args(["-safe", "0"])
                .args([OsStr::new("-i"), list.path().as_os_str()])
                .args(["-c:v", ext.video_codec()])
                .args(["-c:a", ext.audio_codec()])
                .arg(output)
        })
        .map(drop)
    }
}

fn output_extension(output: &Path) -> Result<Extension> {
    Extension::from_path(output)
        .ok_or_else(|| miette!("Unsupported output extension for {}", output.display()))
}

/// Parse the duration out of `ffprobe -show_entries format=duration`
fn parse_probe_duration(output: &str) -> Result<f64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"duration=(\d+(?:\.\d+)?)").unwrap());

    let cap = re
        .captures(output)
        .ok_or_else(|| miette!("Did not find the duration in the ffprobe output"))?;

    cap[1]
        .parse()
        .into_diagnostic()
        .wrap_err("Could not parse duration")
}

/// Quote a path for the concat demuxer list file.
///
/// Single quotes cannot be escaped inside a quoted string, so the
/// string is closed, an escaped quote is added, and a new string opened.
fn quote_concat_path(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}
