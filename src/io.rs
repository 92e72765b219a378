use std::{io::ErrorKind, path::Path};

use heck::ToSnakeCase;
use miette::{IntoDiagnostic, Result, WrapErr};

use crate::types::{Extension, VideoId};

/// Remove the directory and all its content, then recreate it empty
pub fn reset_dir(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .into_diagnostic()
                .wrap_err_with(|| format!("Could not clear {}", path.display()))
        }
    }

    std::fs::create_dir_all(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not create {}", path.display()))
}

/// Remove a file, an already absent file counting as a success.
///
/// Return whether a file was actually removed.
pub fn remove_file_if_exists(path: &Path) -> std::io::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Remove a directory only if it is empty.
///
/// Return whether the directory was actually removed.
pub fn remove_dir_if_empty(path: &Path) -> std::io::Result<bool> {
    let is_empty = match path.read_dir() {
        Ok(mut entries) => entries.next().is_none(),
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    if is_empty {
        std::fs::remove_dir(path)?;
    }
    Ok(is_empty)
}

/// Build the file name of a temporary clip.
///
/// The source position and the snippet index make it unique, even when
/// several sources point to the same video. The video ID and the title
/// only make it readable.
pub fn clip_file_name(
    source_idx: usize,
    video_id: &VideoId,
    idx: usize,
    title: &str,
    extension: Extension,
) -> String {
    // Remove potentially problematic characters from the title
    let slug: String = title
        .to_snake_case()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .take(64)
        .collect();

    if slug.is_empty() {
        format!("{source_idx}-{video_id}-{idx}{}", extension.with_dot())
    } else {
        format!("{source_idx}-{video_id}-{idx}-{slug}{}", extension.with_dot())
    }
}
