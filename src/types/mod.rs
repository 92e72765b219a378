mod compilation;
mod extension;
mod snippet;
mod video_id;

pub use compilation::{compilation_file_name, format_duration, CompilationResult};
pub use extension::Extension;
pub use snippet::{dedup_snippets, Snippet, SourceRecord};
pub use video_id::VideoId;
