//! Discovery and parsing of the JSON metadata files.
//!
//! Every file holds a list of entries, each one pointing to a source video
//! and optionally declaring a snippet of it:
//!
//! ```json
//! [
//!   { "url": "https://youtu.be/abc123", "start_time": 12, "duration": 30, "title": "Intro" },
//!   { "url": "https://youtu.be/def456" }
//! ]
//! ```

use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

use miette::{miette, IntoDiagnostic, Result, WrapErr};
use serde::Deserialize;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::{
    result::{ErrorKind, Failure},
    types::{Snippet, SourceRecord},
};

/// A raw entry of a metadata file
#[derive(Debug, Clone, Deserialize)]
struct RawEntry {
    url: String,
    start_time: Option<f64>,
    duration: Option<f64>,
    title: Option<String>,
}

impl RawEntry {
    /// Return the declared snippet, if any.
    ///
    /// An entry without any snippet field is a whole video entry.
    fn snippet(&self) -> Result<Option<Snippet>> {
        match (self.start_time, self.duration, &self.title) {
            (None, None, None) => Ok(None),
            (Some(start), Some(duration), Some(title)) => {
                Snippet::new(start, duration, title.as_str()).map(Some)
            }
            _ => Err(miette!(
                "Entry must declare either all or none of start_time, duration and title"
            )),
        }
    }
}

/// Every source video referenced by the metadata files, grouped by URL.
///
/// URLs are kept in the order they are first seen,
/// snippets in the order they are declared.
#[derive(Debug, Default)]
pub struct Catalogue {
    records: Vec<SourceRecord>,
    index: HashMap<String, usize>,
}

impl Catalogue {
    /// Register the URL if needed and return its record
    fn entry(&mut self, url: &str) -> &mut SourceRecord {
        let idx = *self.index.entry(url.to_owned()).or_insert_with(|| {
            self.records.push(SourceRecord::new(url));
            self.records.len() - 1
        });
        &mut self.records[idx]
    }

    pub fn records(&self) -> &[SourceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn snippet_count(&self) -> usize {
        self.records.iter().map(|r| r.snippets.len()).sum()
    }
}

/// Recursively load every `.json` metadata file under the root directory.
///
/// A file (or entry) that cannot be parsed is reported and skipped,
/// the discovery always goes through the whole tree.
pub fn load_catalogue(root: &Path) -> (Catalogue, Vec<Failure>) {
    let mut catalogue = Catalogue::default();
    let mut failures = Vec::new();

    if !root.is_dir() {
        failures.push(Failure::new(
            ErrorKind::MalformedMetadata,
            root.display(),
            miette!("Metadata root is not a directory"),
        ));
        return (catalogue, failures);
    }

    let mut nb_files = 0;
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let subject = err
                    .path()
                    .map_or_else(|| root.display().to_string(), |p| p.display().to_string());
                failures.push(Failure::new(
                    ErrorKind::MalformedMetadata,
                    subject,
                    miette!("Could not walk metadata directory: {err}"),
                ));
                continue;
            }
        };

        let path = entry.path();
        if !entry.file_type().is_file()
            || path.extension().and_then(|ext| ext.to_str()) != Some("json")
        {
            continue;
        }

        nb_files += 1;
        debug!("Loading metadata file {}", path.display());
        let entries = match read_entries(path) {
            Ok(entries) => entries,
            Err(report) => {
                failures.push(Failure::new(ErrorKind::MalformedMetadata, path.display(), report));
                continue;
            }
        };

        for (idx, raw) in entries.into_iter().enumerate() {
            let record = catalogue.entry(&raw.url);
            match raw.snippet() {
                Ok(Some(snippet)) => record.snippets.push(snippet),
                Ok(None) => {}
                Err(report) => failures.push(Failure::new(
                    ErrorKind::MalformedMetadata,
                    format!("{} (entry {idx})", path.display()),
                    report,
                )),
            }
        }
    }

    info!(
        "Loaded {} sources and {} snippets from {nb_files} metadata files",
        catalogue.len(),
        catalogue.snippet_count()
    );

    (catalogue, failures)
}

fn read_entries(path: &Path) -> Result<Vec<RawEntry>> {
    let file = File::open(path)
        .into_diagnostic()
        .wrap_err("Could not open metadata file")?;

    serde_json::from_reader(BufReader::new(file))
        .into_diagnostic()
        .wrap_err("Could not parse metadata file")
}
