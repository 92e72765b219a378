use std::fmt::Display;

use miette::Report;
use tracing::{error, warn};

use crate::types::CompilationResult;

/// The kind of per-item error that can happen during a run.
///
/// None of them stops the batch: they are recorded in the [`BatchReport`]
/// and the run continues with the next item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A metadata file (or one of its entries) could not be parsed
    MalformedMetadata,
    /// The URL shape is not recognized, no video ID could be derived
    UnresolvableUrl,
    /// The video is not present in the backup cache
    CacheMiss,
    /// A single snippet could not be cut, or a cut clip could not be reloaded
    ExtractionFailure,
    /// The final concatenation or write failed
    AssemblyFailure,
    /// A temporary file could not be removed
    CleanupFailure,
    /// A video could not be downloaded into the cache
    DownloadFailure,
}

impl ErrorKind {
    /// Whether this kind is only a warning.
    ///
    /// A cache miss is expected when the backup step has not run yet.
    pub fn is_warning(self) -> bool {
        matches!(self, ErrorKind::CacheMiss | ErrorKind::CleanupFailure)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::MalformedMetadata => "malformed metadata",
            ErrorKind::UnresolvableUrl => "unresolvable URL",
            ErrorKind::CacheMiss => "cache miss",
            ErrorKind::ExtractionFailure => "extraction failure",
            ErrorKind::AssemblyFailure => "assembly failure",
            ErrorKind::CleanupFailure => "cleanup failure",
            ErrorKind::DownloadFailure => "download failure",
        };
        f.write_str(s)
    }
}

/// A failed item: what went wrong, on what, and why.
#[derive(Debug)]
pub struct Failure {
    pub kind: ErrorKind,
    /// The item the failure is about (file path, URL, clip title...)
    pub subject: String,
    pub report: Report,
    /// Downgraded to a warning whatever its kind
    lenient: bool,
}

impl Failure {
    pub fn new(kind: ErrorKind, subject: impl Display, report: Report) -> Self {
        Self {
            kind,
            subject: subject.to_string(),
            report,
            lenient: false,
        }
    }

    /// A failure the run recovers from by dropping the item, logged as a warning
    pub fn warning(kind: ErrorKind, subject: impl Display, report: Report) -> Self {
        Self {
            lenient: true,
            ..Self::new(kind, subject, report)
        }
    }

    pub fn is_warning(&self) -> bool {
        self.lenient || self.kind.is_warning()
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} on '{}': {}",
            self.kind,
            self.subject,
            chain_message(&self.report)
        )
    }
}

/// Render the report along with all its causes on a single line
pub fn chain_message(report: &Report) -> String {
    report
        .chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

/// Aggregated outcome of a whole run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub failures: Vec<Failure>,
    pub sources: usize,
    pub clips_extracted: usize,
    pub temp_files_created: usize,
    pub temp_files_removed: usize,
    pub compilation: Option<CompilationResult>,
}

impl BatchReport {
    /// Record a failure and log it right away
    pub fn push(&mut self, failure: Failure) {
        if failure.is_warning() {
            warn!("{failure}");
        } else {
            error!("{failure}");
        }
        self.failures.push(failure);
    }

    pub fn extend(&mut self, failures: impl IntoIterator<Item = Failure>) {
        for failure in failures {
            self.push(failure);
        }
    }

    /// Number of recorded items of the given kind
    pub fn count(&self, kind: ErrorKind) -> usize {
        self.failures.iter().filter(|f| f.kind == kind).count()
    }

    /// Number of recorded items, warnings included
    pub fn warning_count(&self) -> usize {
        self.failures.len()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}
