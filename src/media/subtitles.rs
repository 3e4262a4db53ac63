use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use rayon::prelude::*;
use regex::Regex;

use crate::error::SyncError;
use crate::types::{CandidateFailure, DialogueSet, TimeInterval};

const BOM: char = '\u{feff}';

fn timing_line() -> Result<&'static Regex, SyncError> {
    static TIMING: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();
    TIMING
        .get_or_init(|| {
            Regex::new(
                r"^\s*(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})\s*-->\s*(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})",
            )
        })
        .as_ref()
        .map_err(|e| SyncError::decode("SRT timing pattern", e))
}

fn capture_seconds(caps: &regex::Captures<'_>, first: usize) -> Option<f64> {
    let hours: f64 = caps.get(first)?.as_str().parse().ok()?;
    let minutes: f64 = caps.get(first + 1)?.as_str().parse().ok()?;
    let seconds: f64 = caps.get(first + 2)?.as_str().parse().ok()?;
    let fraction = caps.get(first + 3)?.as_str();
    let millis: f64 = fraction.parse().ok()?;
    let millis = millis * 10f64.powi(3 - fraction.len() as i32);
    Some(hours * 3600.0 + minutes * 60.0 + seconds + millis / 1000.0)
}

/// Extracts cue display intervals from SRT text, in file order.
///
/// A cue's timing is its first line, or its second after an index line; any
/// other `-->` in the cue text is dialogue. Cue text and numbering are
/// ignored. Interval validity is left to the scorer.
pub fn parse_srt(text: &str) -> Result<Vec<TimeInterval>, SyncError> {
    let text = text.trim_start_matches(BOM);
    let timing = timing_line()?;
    let mut intervals = Vec::new();
    let mut block: Vec<(usize, &str)> = Vec::with_capacity(2);

    // `None` closes the final block
    let lines = text.lines().map(Some).chain(std::iter::once(None));
    for (line_no, line) in lines.enumerate() {
        match line {
            Some(line) if !line.trim().is_empty() => {
                if block.len() < 2 {
                    block.push((line_no + 1, line));
                }
            }
            _ => {
                if let Some(interval) = block_timing(timing, &block)? {
                    intervals.push(interval);
                }
                block.clear();
            }
        }
    }

    if intervals.is_empty() && !text.trim().is_empty() {
        return Err(SyncError::decode("SRT", "no timing lines found"));
    }
    Ok(intervals)
}

/// Timing of one blank-line separated block from its first two lines.
fn block_timing(
    timing: &Regex,
    block: &[(usize, &str)],
) -> Result<Option<TimeInterval>, SyncError> {
    let candidate = match block {
        [first, ..] if first.1.contains("-->") => first,
        [index, second] if index.1.trim().chars().all(|c| c.is_ascii_digit()) => {
            if !second.1.contains("-->") {
                return Ok(None);
            }
            second
        }
        _ => return Ok(None),
    };
    let (line_no, line) = *candidate;

    let caps = timing.captures(line).ok_or_else(|| {
        SyncError::decode("SRT timing", format!("line {line_no}: '{}'", line.trim()))
    })?;
    match (capture_seconds(&caps, 1), capture_seconds(&caps, 5)) {
        (Some(start), Some(end)) => Ok(Some(TimeInterval::new(start, end))),
        _ => Err(SyncError::decode(
            "SRT timing",
            format!("line {line_no}: timestamp out of range"),
        )),
    }
}

/// Reads one UTF-8 SRT file; the candidate id is its file name.
pub fn load_subtitle_file(path: &Path) -> Result<DialogueSet, SyncError> {
    let bytes = std::fs::read(path).map_err(|e| SyncError::io("reading subtitle", e))?;
    let text = String::from_utf8(bytes).map_err(|e| SyncError::decode("subtitle text", e))?;
    let id = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(DialogueSet::new(id, parse_srt(&text)?))
}

#[derive(Debug, Default)]
pub struct SubtitleBatch {
    /// Candidates in file-name order.
    pub candidates: Vec<DialogueSet>,
    pub skipped: Vec<CandidateFailure>,
}

fn is_srt(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("srt"))
}

fn list_srt_files(dir: &Path) -> Result<Vec<PathBuf>, SyncError> {
    let entries = std::fs::read_dir(dir).map_err(|e| SyncError::io("listing subtitles", e))?;
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| SyncError::io("listing subtitles", e))?
            .path();
        if is_srt(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Loads every `*.srt` in `dir`, parsing on `worker_threads` threads.
///
/// Files that cannot be read, decoded or parsed are skipped, as are files
/// without a single cue. Fails with [`SyncError::NoUsableCandidates`] when
/// nothing remains.
pub fn load_subtitle_dir(dir: &Path, worker_threads: usize) -> Result<SubtitleBatch, SyncError> {
    let paths = list_srt_files(dir)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_threads.max(1))
        .thread_name(|idx| format!("subsync-srt-{idx}"))
        .build()
        .map_err(SyncError::worker_pool)?;

    let loaded: Vec<Result<DialogueSet, SyncError>> =
        pool.install(|| paths.par_iter().map(|path| load_subtitle_file(path)).collect());

    let mut batch = SubtitleBatch::default();
    for (path, outcome) in paths.iter().zip(loaded) {
        match outcome {
            Ok(set) if set.is_empty() => {
                tracing::warn!(path = %path.display(), "subtitle has no cues; skipping");
                batch.skipped.push(CandidateFailure {
                    id: set.id,
                    reason: "no dialogue lines".to_string(),
                });
            }
            Ok(set) => batch.candidates.push(set),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "cannot load subtitle; skipping");
                batch.skipped.push(CandidateFailure {
                    id: path
                        .file_name()
                        .map(|name| name.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    reason: err.to_string(),
                });
            }
        }
    }

    tracing::debug!(
        dir = %dir.display(),
        loaded = batch.candidates.len(),
        skipped = batch.skipped.len(),
        "subtitles: directory loaded"
    );

    if batch.candidates.is_empty() {
        return Err(SyncError::NoUsableCandidates {
            failed: batch.skipped.len(),
        });
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:02,500\nHello.\n\n2\n00:01:00.25 --> 00:01:01,5\nAgain.\n";

    #[test]
    fn parses_cue_timings() {
        let intervals = parse_srt(SAMPLE).unwrap();
        assert_eq!(
            intervals,
            vec![TimeInterval::new(1.0, 2.5), TimeInterval::new(60.25, 61.5)]
        );
    }

    #[test]
    fn byte_order_mark_and_crlf_are_tolerated() {
        let text = "\u{feff}1\r\n01:00:00,000 --> 01:00:00,100\r\nx\r\n";
        assert_eq!(
            parse_srt(text).unwrap(),
            vec![TimeInterval::new(3600.0, 3600.1)]
        );
    }

    #[test]
    fn empty_text_has_no_cues() {
        assert!(parse_srt("").unwrap().is_empty());
        assert!(parse_srt("\u{feff}\n\n").unwrap().is_empty());
    }

    #[test]
    fn malformed_timing_is_a_decode_error() {
        let err = parse_srt("1\n00:00:01 --> soon\nhi\n").unwrap_err();
        assert!(matches!(err, SyncError::Decode { .. }));
        assert!(parse_srt("just some text").is_err());
    }

    #[test]
    fn arrow_inside_cue_text_is_dialogue() {
        let text = "1\n00:00:01,000 --> 00:00:02,000\nShe pointed --> that way.\n\n\
                    2\n00:00:03,000 --> 00:00:04,000\n--> over there\nand --> here\n";
        assert_eq!(
            parse_srt(text).unwrap(),
            vec![TimeInterval::new(1.0, 2.0), TimeInterval::new(3.0, 4.0)]
        );
    }

    #[test]
    fn unnumbered_cues_and_extra_blank_lines_parse() {
        let text = "\n\n00:00:05,000 --> 00:00:06,000\nNo index.\n\n\n\n7\n00:00:08,000 --> 00:00:09,000\nx\n";
        assert_eq!(
            parse_srt(text).unwrap(),
            vec![TimeInterval::new(5.0, 6.0), TimeInterval::new(8.0, 9.0)]
        );
    }

    #[test]
    fn directory_load_skips_bad_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("b.srt"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("a.srt"), SAMPLE).unwrap();
        std::fs::write(dir.path().join("latin1.srt"), [0xff, 0xfe, 0x41]).unwrap();
        std::fs::write(dir.path().join("empty.srt"), "").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let batch = load_subtitle_dir(dir.path(), 2).unwrap();
        let ids: Vec<_> = batch.candidates.iter().map(|set| set.id.as_str()).collect();
        assert_eq!(ids, vec!["a.srt", "b.srt"]);
        let skipped: Vec<_> = batch.skipped.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(skipped, vec!["empty.srt", "latin1.srt"]);
    }

    #[test]
    fn directory_without_usable_subtitles_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("broken.srt"), "garbage").unwrap();
        let err = load_subtitle_dir(dir.path(), 1).unwrap_err();
        assert!(matches!(err, SyncError::NoUsableCandidates { failed: 1 }));
    }

    #[test]
    fn empty_directory_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_subtitle_dir(dir.path(), 1).unwrap_err();
        assert!(matches!(err, SyncError::NoUsableCandidates { failed: 0 }));
    }
}
