use std::path::PathBuf;

use time::{macros::format_description, Date};

use super::Extension;

/// The concatenated video written at the end of a run
#[derive(Debug, Clone, PartialEq)]
pub struct CompilationResult {
    pub path: PathBuf,
    /// Sum of the durations of every clip, in seconds
    pub total_duration: f64,
    pub clip_count: usize,
}

/// Format a duration as `{H}h{MM}m` when it reaches one hour, else `{M}m`.
///
/// Seconds are truncated.
pub fn format_duration(seconds: f64) -> String {
    let seconds = seconds.max(0.0) as u64;
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours > 0 {
        format!("{hours}h{minutes:02}m")
    } else {
        format!("{minutes}m")
    }
}

/// Build the compilation file name: `{date} - random - all - {duration}.{ext}`
pub fn compilation_file_name(date: Date, total_duration: f64, ext: Extension) -> String {
    let date = date
        .format(format_description!("[year]-[month]-[day]"))
        .unwrap_or_else(|_| date.to_string());

    format!(
        "{date} - random - all - {}{}",
        format_duration(total_duration),
        ext.with_dot()
    )
}
