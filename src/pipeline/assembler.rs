use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use time::Date;
use tracing::{debug, info};

use crate::{
    io::remove_file_if_exists,
    outside::MediaEditor,
    result::{ErrorKind, Failure},
    types::{compilation_file_name, format_duration, CompilationResult, Extension},
};

/// Outcome of the assembly stage
#[derive(Debug, Default)]
pub struct Assembly {
    pub compilation: Option<CompilationResult>,
    pub failures: Vec<Failure>,
}

/// Join the extracted clips, in random order, into the final compilation
#[derive(Debug)]
pub struct Assembler<'a> {
    pub editor: &'a dyn MediaEditor,
    pub output_dir: &'a Path,
    /// Where intermediate files may be written
    pub work_dir: &'a Path,
    pub ext: Extension,
    /// Date written in the compilation file name
    pub date: Date,
}

impl Assembler<'_> {
    pub fn assemble(&self, clips: &[PathBuf], rng: &mut fastrand::Rng) -> Assembly {
        let mut assembly = Assembly::default();

        // The same clip must not appear twice in the compilation
        let mut seen = HashSet::with_capacity(clips.len());

        // Reload every clip, dropping those that cannot be read back
        let mut loaded: Vec<(&PathBuf, f64)> = Vec::with_capacity(clips.len());
        for clip in clips {
            if !seen.insert(clip) {
                continue;
            }

            match self.editor.probe_duration(clip) {
                Ok(duration) => loaded.push((clip, duration)),
                Err(report) => assembly.failures.push(Failure::warning(
                    ErrorKind::ExtractionFailure,
                    clip.display(),
                    report.wrap_err("Dropping clip that cannot be reloaded"),
                )),
            }
        }

        if loaded.is_empty() {
            info!("No usable clip, no compilation produced");
            return assembly;
        }

        rng.shuffle(&mut loaded);

        let total_duration: f64 = loaded.iter().map(|(_, duration)| duration).sum();
        let output = self
            .output_dir
            .join(compilation_file_name(self.date, total_duration, self.ext));
        let inputs: Vec<PathBuf> = loaded.iter().map(|(clip, _)| clip.to_path_buf()).collect();

        info!(
            "Concatenating {} clips ({}) into {}",
            inputs.len(),
            format_duration(total_duration),
            output.display()
        );
        debug!("Clip order: {inputs:?}");

        match self.editor.concat(&inputs, &output, self.work_dir) {
            Ok(()) => {
                info!("Compilation created as {}", output.display());
                assembly.compilation = Some(CompilationResult {
                    path: output,
                    total_duration,
                    clip_count: inputs.len(),
                });
            }
            Err(report) => {
                if let Err(err) = remove_file_if_exists(&output) {
                    debug!("Could not remove partial compilation: {err}");
                }
                assembly.failures.push(Failure::new(
                    ErrorKind::AssemblyFailure,
                    output.display(),
                    report.wrap_err("Could not create the compilation"),
                ));
            }
        }

        assembly
    }
}
