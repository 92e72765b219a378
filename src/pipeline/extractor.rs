use std::{num::NonZeroUsize, path::PathBuf, thread};

use crossbeam_channel::unbounded;
use miette::miette;
use tracing::{debug, info, warn};

use crate::{
    io::{clip_file_name, remove_file_if_exists},
    outside::MediaEditor,
    result::{chain_message, ErrorKind, Failure},
    types::Extension,
};

use super::{cleanup::TempClips, resolver::ResolvedSource};

/// Allowed overshoot of a snippet past the end of its source, in seconds.
/// Covers the rounding of the probed duration.
const END_TOLERANCE: f64 = 0.05;

/// Clips cut out of one or more sources
#[derive(Debug, Default)]
pub struct Extraction {
    pub clips: Vec<PathBuf>,
    pub failures: Vec<Failure>,
}

impl Extraction {
    fn merge(&mut self, other: Extraction) {
        self.clips.extend(other.clips);
        self.failures.extend(other.failures);
    }
}

/// Cut the snippets of the sources into temporary clip files
#[derive(Debug)]
pub struct ClipExtractor<'a> {
    editor: &'a dyn MediaEditor,
    temp: &'a TempClips,
    ext: Extension,
}

impl<'a> ClipExtractor<'a> {
    pub fn new(editor: &'a dyn MediaEditor, temp: &'a TempClips, ext: Extension) -> Self {
        Self { editor, temp, ext }
    }

    /// Cut every snippet of the source, one temporary file per snippet.
    ///
    /// `source_idx` is the position of the source in the run, and must be
    /// unique among the sources sharing the temporary directory.
    /// A failing snippet is reported and skipped, the others still get cut.
    pub fn extract(&self, source_idx: usize, source: &ResolvedSource) -> Extraction {
        let mut extraction = Extraction::default();

        let source_duration = match self.editor.probe_duration(&source.local_path) {
            Ok(duration) => duration,
            Err(report) => {
                let reason = chain_message(&report);
                // Without a readable source, no snippet can be cut
                for snippet in &source.snippets {
                    extraction.failures.push(Failure::new(
                        ErrorKind::ExtractionFailure,
                        format!("{} {snippet}", source.url),
                        miette!(
                            "Could not load source video {}: {reason}",
                            source.local_path.display()
                        ),
                    ));
                }
                return extraction;
            }
        };

        for (idx, snippet) in source.snippets.iter().enumerate() {
            let subject = format!("{} {snippet}", source.url);

            if snippet.end_time() > source_duration + END_TOLERANCE {
                extraction.failures.push(Failure::new(
                    ErrorKind::ExtractionFailure,
                    subject,
                    miette!(
                        "Snippet ends at {:.3}s but the source only lasts {source_duration:.3}s",
                        snippet.end_time()
                    ),
                ));
                continue;
            }

            let output = self.temp.dir().join(clip_file_name(
                source_idx,
                &source.video_id,
                idx,
                snippet.title(),
                self.ext,
            ));
            self.temp.register(output.clone());

            info!("Cutting {snippet} out of '{}'", source.video_id);
            let res = self.editor.extract_clip(
                &source.local_path,
                &output,
                snippet.start_time(),
                snippet.duration(),
            );

            match res {
                Ok(()) => extraction.clips.push(output),
                Err(report) => {
                    // Do not leave a half-written clip behind
                    if let Err(err) = remove_file_if_exists(&output) {
                        debug!("Could not remove partial clip {}: {err}", output.display());
                    }
                    extraction.failures.push(Failure::new(
                        ErrorKind::ExtractionFailure,
                        subject,
                        report.wrap_err("Could not cut the snippet"),
                    ));
                }
            }
        }

        debug!(
            "{}: {} of {} snippets cut",
            source.video_id,
            extraction.clips.len(),
            source.snippets.len()
        );
        extraction
    }

    /// Cut the snippets of every source, with up to `jobs` sources processed concurrently.
    ///
    /// Only returns once every source has been processed.
    /// The clips are returned in the order of the sources.
    pub fn extract_all(&self, sources: &[ResolvedSource], jobs: NonZeroUsize) -> Extraction {
        let nb_workers = jobs.get().min(sources.len());
        if nb_workers <= 1 {
            return sources
                .iter()
                .enumerate()
                .fold(Extraction::default(), |mut acc, (idx, source)| {
                    acc.merge(self.extract(idx, source));
                    acc
                });
        }

        let (send_work, receive_work) = unbounded();
        for work in sources.iter().enumerate() {
            // Cannot fail: the receiver is alive
            let _ = send_work.send(work);
        }
        drop(send_work);

        let mut results: Vec<Option<Extraction>> = Vec::new();
        results.resize_with(sources.len(), || None);

        thread::scope(|scope| {
            let (send_result, receive_result) = unbounded();

            for id in 0..nb_workers {
                let receive_work = receive_work.clone();
                let send_result = send_result.clone();
                let spawned = thread::Builder::new()
                    .name(format!("clipper-{id}"))
                    .spawn_scoped(scope, move || {
                        debug!("Worker started, waiting for a source");
                        for (idx, source) in receive_work {
                            let extraction = self.extract(idx, source);
                            if send_result.send((idx, extraction)).is_err() {
                                break;
                            }
                        }
                        debug!("All sources processed. Stopping the worker.");
                    });

                if let Err(err) = spawned {
                    warn!("Could not spawn clipper worker {id}: {err}");
                }
            }
            drop(send_result);

            // Ends once every worker has stopped
            for (idx, extraction) in receive_result {
                results[idx] = Some(extraction);
            }
        });

        // Sources left behind if not a single worker could be spawned
        for (idx, source) in receive_work.try_iter() {
            results[idx] = Some(self.extract(idx, source));
        }

        results
            .into_iter()
            .flatten()
            .fold(Extraction::default(), |mut acc, extraction| {
                acc.merge(extraction);
                acc
            })
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, path::Path, sync::Mutex};

    use miette::{bail, Result};

    use super::*;
    use crate::{
        pipeline::testing::FakeEditor,
        types::{Snippet, VideoId},
    };

    fn source(id: &str, path: &Path, snippets: Vec<Snippet>) -> ResolvedSource {
        ResolvedSource {
            url: format!("https://youtu.be/{id}"),
            video_id: VideoId::from_url(&format!("https://youtu.be/{id}")).unwrap(),
            local_path: path.to_path_buf(),
            snippets,
        }
    }

    fn snippet(start: f64, duration: f64, title: &str) -> Snippet {
        Snippet::new(start, duration, title).unwrap()
    }

    #[test]
    fn one_failing_snippet_does_not_stop_the_others() {
        let root = tempfile::tempdir().unwrap();
        let editor = FakeEditor::default();
        let video = editor.add_source(root.path(), "abc", 100.0);
        editor.fail_on_title("broken");

        let temp = TempClips::new(root.path());
        let extractor = ClipExtractor::new(&editor, &temp, Extension::Mp4);
        let extraction = extractor.extract(0, &source(
            "abc",
            &video,
            vec![
                snippet(0.0, 5.0, "first"),
                snippet(10.0, 5.0, "broken"),
                snippet(20.0, 5.0, "third"),
            ],
        ));

        assert_eq!(extraction.clips.len(), 2);
        assert_eq!(extraction.failures.len(), 1);
        assert_eq!(extraction.failures[0].kind, ErrorKind::ExtractionFailure);
        assert_eq!(temp.len(), 3);
        // The partial output of the failed cut was removed
        assert!(!root.path().join("0-abc-1-broken.mp4").exists());
    }

    #[test]
    fn same_titles_do_not_collide() {
        let root = tempfile::tempdir().unwrap();
        let editor = FakeEditor::default();
        let video = editor.add_source(root.path(), "abc", 100.0);

        let temp = TempClips::new(root.path());
        let extractor = ClipExtractor::new(&editor, &temp, Extension::Mp4);
        let extraction = extractor.extract(0, &source(
            "abc",
            &video,
            vec![snippet(0.0, 5.0, "same"), snippet(10.0, 5.0, "same")],
        ));

        assert_eq!(extraction.clips.len(), 2);
        assert_ne!(extraction.clips[0], extraction.clips[1]);
    }

    #[test]
    fn snippet_past_the_end_fails() {
        let root = tempfile::tempdir().unwrap();
        let editor = FakeEditor::default();
        let video = editor.add_source(root.path(), "abc", 30.0);

        let temp = TempClips::new(root.path());
        let extractor = ClipExtractor::new(&editor, &temp, Extension::Mp4);
        let extraction = extractor.extract(0, &source(
            "abc",
            &video,
            vec![snippet(25.0, 10.0, "too long"), snippet(0.0, 30.0, "whole")],
        ));

        assert_eq!(extraction.clips.len(), 1);
        assert_eq!(extraction.failures.len(), 1);
    }

    #[test]
    fn unreadable_source_fails_every_snippet() {
        let root = tempfile::tempdir().unwrap();
        let editor = FakeEditor::default();
        let missing = root.path().join("missing.mp4");

        let temp = TempClips::new(root.path());
        let extractor = ClipExtractor::new(&editor, &temp, Extension::Mp4);
        let extraction = extractor.extract(0, &source(
            "abc",
            &missing,
            vec![snippet(0.0, 1.0, "a"), snippet(1.0, 1.0, "b")],
        ));

        assert!(extraction.clips.is_empty());
        assert_eq!(extraction.failures.len(), 2);
        assert_eq!(temp.len(), 0);
    }

    #[test]
    fn parallel_extraction_waits_for_every_source() {
        let root = tempfile::tempdir().unwrap();
        let editor = FakeEditor::default();

        let sources: Vec<_> = ["aaa", "bbb", "ccc", "ddd", "eee"]
            .into_iter()
            .map(|id| {
                let video = editor.add_source(root.path(), id, 60.0);
                source(
                    id,
                    &video,
                    vec![snippet(0.0, 2.0, "x"), snippet(5.0, 3.0, "y")],
                )
            })
            .collect();

        let temp = TempClips::new(root.path());
        let extractor = ClipExtractor::new(&editor, &temp, Extension::Mp4);
        let extraction = extractor.extract_all(&sources, NonZeroUsize::new(3).unwrap());

        assert_eq!(extraction.clips.len(), 10);
        assert!(extraction.failures.is_empty());
        assert!(extraction.clips.iter().all(|clip| clip.exists()));
        // Clips come back in source order whatever the scheduling
        assert!(extraction.clips[0]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("0-aaa-0"));
        assert!(extraction.clips[9]
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("4-eee-1"));
    }

    /// Editor whose cuts always fail, recording what was asked
    #[derive(Debug, Default)]
    struct RefusingEditor {
        asked: Mutex<HashMap<PathBuf, f64>>,
    }

    impl MediaEditor for RefusingEditor {
        fn extract_clip(&self, _: &Path, output: &Path, _: f64, duration: f64) -> Result<()> {
            self.asked
                .lock()
                .unwrap()
                .insert(output.to_path_buf(), duration);
            std::fs::write(output, b"partial").unwrap();
            bail!("codec error")
        }

        fn probe_duration(&self, _: &Path) -> Result<f64> {
            Ok(1000.0)
        }

        fn concat(&self, _: &[PathBuf], _: &Path, _: &Path) -> Result<()> {
            bail!("not used")
        }
    }

    #[test]
    fn failed_cuts_leave_nothing_behind() {
        let root = tempfile::tempdir().unwrap();
        let editor = RefusingEditor::default();
        let temp = TempClips::new(root.path());
        let extractor = ClipExtractor::new(&editor, &temp, Extension::Mp4);

        let extraction = extractor.extract(0, &source(
            "abc",
            Path::new("/whatever.mp4"),
            vec![snippet(0.0, 1.0, "a"), snippet(2.0, 1.0, "b")],
        ));

        assert!(extraction.clips.is_empty());
        assert_eq!(extraction.failures.len(), 2);
        assert_eq!(editor.asked.lock().unwrap().len(), 2);
        assert_eq!(root.path().read_dir().unwrap().count(), 0);
    }
}
