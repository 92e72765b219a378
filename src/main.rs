mod backup;
mod cache;
mod cli;
mod io;
mod logging;
mod metadata;
mod outside;
mod pipeline;
mod result;
mod settings;
mod types;
mod utils;

use clap::Parser;
use miette::{miette, IntoDiagnostic, Result, WrapErr};
use time::OffsetDateTime;
use tracing::{error, info};

use crate::{
    backup::backup,
    cache::DirCache,
    cli::{Args, Command},
    logging::init_logging,
    outside::{Ffmpeg, Ytdl},
    pipeline::{compile, CompileConfig},
    result::{BatchReport, ErrorKind},
    settings::Settings,
    types::format_duration,
};

fn main() -> Result<()> {
    let args = Args::parse();

    // Read the local time before any thread is spawned
    let today = OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .date();
    init_logging(args.log_level())?;

    let settings = Settings::load(&args)?;
    let cache = DirCache::new(&settings.cache_dir, settings.cache_ext);

    let report = match args.command {
        Command::Backup(_) => {
            let downloader = Ytdl::new(settings.download_format.as_str(), settings.cache_ext)?;
            backup(&settings.metadata_root, &cache, &downloader)
        }
        Command::Compile(_) => {
            let output_dir = settings
                .output_dir
                .clone()
                .ok_or_else(|| miette!("No output directory given. Use --out or `output_dir`"))?;

            // Kept alive until the end of the compilation
            let (_auto_temp, temp_dir) = match &settings.temp_dir {
                Some(dir) => (None, dir.clone()),
                None => {
                    let dir = tempfile::Builder::new()
                        .prefix("snipreel-")
                        .tempdir()
                        .into_diagnostic()
                        .wrap_err("Could not create a temporary directory")?;
                    let path = dir.path().to_path_buf();
                    (Some(dir), path)
                }
            };

            let config = CompileConfig {
                metadata_root: settings.metadata_root.clone(),
                output_dir,
                temp_dir,
                ext: settings.ext,
                jobs: settings.jobs,
                date: today,
            };
            let editor = Ffmpeg::new()?;
            let mut rng = settings
                .seed
                .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);

            compile(&config, &cache, &editor, &mut rng)?
        }
    };

    summarize(&report);
    if report.is_success() {
        info!("All done");
        Ok(())
    } else {
        Err(miette!(
            "Some errors occurred during processing. Please check the logs above."
        ))
    }
}

fn summarize(report: &BatchReport) {
    info!(
        "{} sources, {} clips extracted, {}/{} temporary files removed",
        report.sources,
        report.clips_extracted,
        report.temp_files_removed,
        report.temp_files_created,
    );

    match &report.compilation {
        Some(compilation) => info!(
            "Compilation of {} clips ({}) saved to {}",
            compilation.clip_count,
            format_duration(compilation.total_duration),
            compilation.path.display()
        ),
        None if report.clips_extracted > 0 || report.count(ErrorKind::AssemblyFailure) > 0 => {
            error!("No compilation produced")
        }
        None => {}
    }

    if report.warning_count() > 0 {
        info!(
            "{} problems: {} cache misses, {} download failures, {} extraction failures",
            report.warning_count(),
            report.count(ErrorKind::CacheMiss),
            report.count(ErrorKind::DownloadFailure),
            report.count(ErrorKind::ExtractionFailure),
        );
    }
}
