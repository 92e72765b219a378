//! The compilation pipeline.
//!
//! Metadata loading → per source: snippet dedup, cache resolution, clip
//! extraction → assembly of every clip → cleanup of the temporary clips.
//!
//! Per-item errors are recorded in the [`BatchReport`] and never stop the run.

mod assembler;
mod cleanup;
mod extractor;
mod resolver;
#[cfg(test)]
pub mod testing;

use std::{num::NonZeroUsize, path::PathBuf};

use miette::{IntoDiagnostic, Result, WrapErr};
use time::Date;
use tracing::{debug, info};

pub use assembler::Assembler;
pub use cleanup::TempClips;
pub use extractor::ClipExtractor;
pub use resolver::resolve_source;

use crate::{
    cache::BackupCache,
    io::reset_dir,
    metadata::load_catalogue,
    outside::MediaEditor,
    result::BatchReport,
    types::{dedup_snippets, Extension},
};

/// Everything a compilation run needs to know about its environment
#[derive(Debug, Clone)]
pub struct CompileConfig {
    /// Directory tree holding the JSON metadata files
    pub metadata_root: PathBuf,
    /// Destination of the compilation.
    /// **Its whole content is removed at the start of the run.**
    pub output_dir: PathBuf,
    /// Directory for the temporary clips, created if needed and removed if left empty
    pub temp_dir: PathBuf,
    pub ext: Extension,
    /// Number of sources cut concurrently
    pub jobs: NonZeroUsize,
    /// Date written in the compilation file name
    pub date: Date,
}

/// Run a whole compilation.
///
/// Side effects, done before anything else: the output directory is cleared
/// and the temporary directory is created. Failing to do so is the only case
/// returning an error. Any other problem is recorded in the returned report.
pub fn compile(
    config: &CompileConfig,
    cache: &dyn BackupCache,
    editor: &dyn MediaEditor,
    rng: &mut fastrand::Rng,
) -> Result<BatchReport> {
    reset_dir(&config.output_dir).wrap_err("Could not reset the output directory")?;
    std::fs::create_dir_all(&config.temp_dir)
        .into_diagnostic()
        .wrap_err_with(|| {
            format!(
                "Could not create the temporary directory {}",
                config.temp_dir.display()
            )
        })?;

    let mut report = BatchReport::default();

    info!("Loading metadata from {}", config.metadata_root.display());
    let (catalogue, failures) = load_catalogue(&config.metadata_root);
    report.extend(failures);
    report.sources = catalogue.len();
    if catalogue.is_empty() {
        info!("No source found in {}", config.metadata_root.display());
    }

    let mut sources = Vec::with_capacity(catalogue.len());
    for record in catalogue.records() {
        if record.snippets.is_empty() {
            debug!("No snippet declared for {}, nothing to cut", record.url);
            continue;
        }

        let snippets = dedup_snippets(&record.snippets);
        if snippets.len() < record.snippets.len() {
            debug!(
                "{}: {} duplicated snippets ignored",
                record.url,
                record.snippets.len() - snippets.len()
            );
        }

        match resolve_source(&record.url, snippets, cache) {
            Ok(source) => sources.push(source),
            Err(failure) => report.push(failure),
        }
    }
    info!("{} sources found in the backup cache", sources.len());

    // Released in every case, even when unwinding
    let temp = TempClips::new(&config.temp_dir);

    let extraction =
        ClipExtractor::new(editor, &temp, config.ext).extract_all(&sources, config.jobs);
    report.extend(extraction.failures);
    report.clips_extracted = extraction.clips.len();
    info!("{} clips extracted", extraction.clips.len());

    let assembler = Assembler {
        editor,
        output_dir: &config.output_dir,
        work_dir: temp.dir(),
        ext: config.ext,
        date: config.date,
    };
    let assembly = assembler.assemble(&extraction.clips, rng);
    report.extend(assembly.failures);
    report.compilation = assembly.compilation;

    report.temp_files_created = temp.len();
    let outcome = temp.cleanup();
    report.temp_files_removed = outcome.removed;
    report.extend(outcome.failures);

    Ok(report)
}
