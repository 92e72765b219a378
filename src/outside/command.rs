use std::process::{Command, Output, Stdio};

use bitflags::bitflags;
use miette::{bail, IntoDiagnostic, Result, WrapErr};
use tracing::{debug, enabled, trace, Level};

pub const YT_DL: &str = "youtube-dl";
pub const YT_DLP: &str = "yt-dlp";
pub const FFMPEG: &str = "ffmpeg";
pub const FFPROBE: &str = "ffprobe";
/// Keep ffmpeg and ffprobe quiet unless something goes wrong
pub const FFXXX_DEFAULT_ARGS: [&str; 3] = ["-hide_banner", "-loglevel", "error"];

bitflags! {
    /// Standard streams of a child process to capture
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capture: u8 {
        const STDIN = 0b001;
        const STDOUT = 0b010;
        const STDERR = 0b100;
    }
}

impl Capture {
    fn stdio(self, stream: Capture) -> Stdio {
        if self.contains(stream) {
            Stdio::piped()
        } else {
            Stdio::null()
        }
    }
}

/// Run a command and return its raw output.
///
/// Streams are captured when asked for, and always when debug logs are
/// enabled so that they can be logged.
///
/// Only a command that could not be spawned is an error: a non-zero exit
/// status must be checked by the caller.
pub fn run_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
    capture: Capture,
) -> Result<Output> {
    let is_debug = enabled!(Level::DEBUG);
    let capture = if is_debug {
        capture | Capture::STDOUT | Capture::STDERR
    } else {
        capture
    };

    let mut cmd = Command::new(program);
    let cmd = f(&mut cmd)
        .stdin(capture.stdio(Capture::STDIN))
        .stdout(capture.stdio(Capture::STDOUT))
        .stderr(capture.stdio(Capture::STDERR));

    debug!("Executing command: {cmd:?}");
    let output = cmd
        .output()
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not run {program}"))?;

    if is_debug {
        log_output(&output);
    }
    Ok(output)
}

fn log_output(output: &Output) {
    debug!(
        "status: {}, stdout: {} bytes, stderr: {} bytes",
        output.status,
        output.stdout.len(),
        output.stderr.len()
    );
    trace!("stdout: {:?}", String::from_utf8_lossy(&output.stdout));
    trace!("stderr: {:?}", String::from_utf8_lossy(&output.stderr));
}

/// Fail with the captured stderr if the program did not exit successfully
fn ensure_success(program: &str, output: &Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    bail!(
        "{program} exited with {}: {}",
        output.status,
        stderr.trim()
    )
}

/// Run the command and check that it exited successfully
pub fn assert_success_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
) -> Result<Output> {
    let output = run_command(program, f, Capture::STDERR)?;
    ensure_success(program, &output)?;
    Ok(output)
}

/// Run the command, check that it exited successfully and return its standard output
pub fn command_stdout<F: FnOnce(&mut Command) -> &mut Command>(
    program: &str,
    f: F,
) -> Result<String> {
    let output = run_command(program, f, Capture::STDOUT | Capture::STDERR)?;
    ensure_success(program, &output)?;

    String::from_utf8(output.stdout)
        .into_diagnostic()
        .wrap_err_with(|| format!("{program} output is not valid UTF-8"))
}
