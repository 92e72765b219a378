mod command;
mod ffmpeg;
mod ytdl;

pub use ffmpeg::{Ffmpeg, MediaEditor};
pub use ytdl::{VideoDownloader, Ytdl};
