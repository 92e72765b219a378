use std::{num::NonZeroUsize, path::PathBuf};

use config::{Config, Environment, File, FileFormat};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Deserialize;

use crate::{
    cli::{Args, Command, CompileArgs, SourceArgs},
    types::Extension,
};

/// Prefix of the environment variables overriding the configuration file
const ENV_PREFIX: &str = "SNIPREEL";

/// Smallest video and audio streams, to keep the backup light
pub const DEFAULT_DOWNLOAD_FORMAT: &str = "worstvideo[ext=mp4]+worstaudio[ext=m4a]/worst[ext=mp4]";

/// The application settings.
///
/// Layered, from the lowest to the highest priority:
/// built-in defaults, configuration file, environment variables, command line.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub metadata_root: PathBuf,
    pub cache_dir: PathBuf,
    /// Extension of the videos in the backup cache
    pub cache_ext: Extension,
    /// Only needed to compile
    pub output_dir: Option<PathBuf>,
    pub temp_dir: Option<PathBuf>,
    pub ext: Extension,
    pub jobs: NonZeroUsize,
    pub seed: Option<u64>,
    pub download_format: String,
}

impl Settings {
    pub fn load(args: &Args) -> Result<Self> {
        let (sources, compile) = match &args.command {
            Command::Backup(sources) => (sources, None),
            Command::Compile(compile) => (&compile.sources, Some(compile)),
        };

        let builder = Config::builder()
            .set_default("metadata_root", "youtube-data")
            .and_then(|b| b.set_default("cache_ext", "mp4"))
            .and_then(|b| b.set_default("ext", "mp4"))
            .and_then(|b| b.set_default("jobs", 1_i64))
            .and_then(|b| b.set_default("download_format", DEFAULT_DOWNLOAD_FORMAT))
            .into_diagnostic()?
            .add_source(File::new(&args.config.to_string_lossy(), FileFormat::Toml).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX));

        let builder = overrides(builder, sources, compile)
            .into_diagnostic()
            .wrap_err("Invalid command line option")?;

        builder
            .build()
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not read configuration {}", args.config.display()))?
            .try_deserialize()
            .into_diagnostic()
            .wrap_err("Invalid configuration")
    }
}

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

/// Apply the options given on the command line
fn overrides(
    builder: Builder,
    sources: &SourceArgs,
    compile: Option<&CompileArgs>,
) -> Result<Builder, config::ConfigError> {
    let path = |p: &Option<PathBuf>| p.as_ref().map(|p| p.to_string_lossy().into_owned());

    let mut builder = builder
        .set_override_option("metadata_root", path(&sources.metadata_root))?
        .set_override_option("cache_dir", path(&sources.cache_dir))?;

    if let Some(compile) = compile {
        builder = builder
            .set_override_option("output_dir", path(&compile.output_dir))?
            .set_override_option("temp_dir", path(&compile.temp_dir))?
            .set_override_option("ext", compile.ext.map(|ext| ext.with_no_dot()))?
            .set_override_option("jobs", compile.jobs.map(|jobs| jobs as i64))?
            .set_override_option("seed", compile.seed.map(|seed| seed.to_string()))?;
    }

    Ok(builder)
}
