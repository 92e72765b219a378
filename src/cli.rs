use std::path::PathBuf;

use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};

use crate::types::Extension;

/// Back up web videos referenced in JSON metadata files
/// and assemble randomized compilations out of their snippets.
///
/// Every option can also be set in the configuration file
/// or with a `SNIPREEL_<OPTION>` environment variable.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// The path to the TOML configuration file. Ignored if it does not exist
    #[arg(long, global = true, default_value = "snipreel.toml")]
    pub config: PathBuf,

    /// Log more details. Can be repeated
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download every video referenced by the metadata that is missing from the backup cache
    Backup(SourceArgs),

    /// Cut the snippets out of the cached videos and join them, shuffled, in a single video.
    ///
    /// The whole content of the output directory is removed beforehand.
    Compile(CompileArgs),
}

/// Where to find the metadata and the videos
#[derive(ClapArgs, Debug, Default)]
pub struct SourceArgs {
    /// The directory tree containing the JSON metadata files
    #[arg(long = "metadata")]
    pub metadata_root: Option<PathBuf>,

    /// The backup cache directory, holding one `<video id>.<ext>` file per video
    #[arg(long = "cache")]
    pub cache_dir: Option<PathBuf>,
}

#[derive(ClapArgs, Debug, Default)]
pub struct CompileArgs {
    #[command(flatten)]
    pub sources: SourceArgs,

    /// The directory receiving the compilation. **Cleared at every run**
    #[arg(long = "out")]
    pub output_dir: Option<PathBuf>,

    /// The directory for the temporary clips. Defaults to a fresh temporary directory
    #[arg(long = "temp")]
    pub temp_dir: Option<PathBuf>,

    /// The file extension of the compilation. Defines the container and codecs to use
    #[arg(long, value_enum)]
    pub ext: Option<Extension>,

    /// The number of source videos to cut concurrently
    #[arg(long)]
    pub jobs: Option<usize>,

    /// Seed of the clip shuffling, for a reproducible order
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Args {
    pub fn log_level(&self) -> tracing::Level {
        match (self.quiet, self.verbose) {
            (true, _) => tracing::Level::WARN,
            (false, 0) => tracing::Level::INFO,
            (false, 1) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        }
    }
}
