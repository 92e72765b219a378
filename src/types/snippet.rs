use std::{collections::HashSet, fmt::Display};

use miette::{bail, Result};

/// A declared time range of a source video, meant to become one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    start_time: f64,
    duration: f64,
    title: String,
}

impl Snippet {
    /// Create a snippet, checking the time range is usable
    pub fn new(start_time: f64, duration: f64, title: impl Into<String>) -> Result<Self> {
        if !start_time.is_finite() || start_time < 0.0 {
            bail!("Start time must be a non-negative number of seconds, got {start_time}");
        }
        if !duration.is_finite() || duration <= 0.0 {
            bail!("Duration must be a positive number of seconds, got {duration}");
        }

        Ok(Self {
            // Normalize -0.0 so that it compares equal to 0.0 bit-wise
            start_time: start_time + 0.0,
            duration,
            title: title.into(),
        })
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Hashable identity of the snippet
    fn key(&self) -> (u64, u64, &str) {
        (
            self.start_time.to_bits(),
            self.duration.to_bits(),
            &self.title,
        )
    }
}

impl Display for Snippet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "'{}' ({:.3}s - {:.3}s)",
            self.title,
            self.start_time,
            self.end_time()
        )
    }
}

/// Every snippet declared for one source URL
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub url: String,
    pub snippets: Vec<Snippet>,
}

impl SourceRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            snippets: Vec::new(),
        }
    }
}

/// Remove the exact duplicates (same start time, duration and title).
///
/// The first occurrence is kept and the remaining snippets stay in their
/// relative order.
pub fn dedup_snippets(snippets: &[Snippet]) -> Vec<Snippet> {
    let mut seen = HashSet::with_capacity(snippets.len());
    let mut deduped = Vec::with_capacity(snippets.len());
    for snippet in snippets {
        if seen.insert(snippet.key()) {
            deduped.push(snippet.clone());
        }
    }
    deduped
}
