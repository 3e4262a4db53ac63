use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::SyncError;
use crate::types::{ActivityTimeline, DialogueSet, TimeInterval};

impl ActivityTimeline {
    /// Reference timeline taken from a subtitle already known to be in sync.
    ///
    /// Bounds are truncated to whole seconds, zero-length spans are dropped and
    /// overlapping or touching spans are merged.
    pub fn from_reference_dialogue(reference: &DialogueSet) -> Result<Self, SyncError> {
        let mut spans = Vec::with_capacity(reference.intervals.len());
        for (idx, interval) in reference.intervals.iter().enumerate() {
            interval.check().map_err(|msg| {
                SyncError::invalid_dialogue(format!("{} line {}: {msg}", reference.id, idx + 1))
            })?;
            let start = interval.start.trunc();
            let end = interval.end.trunc();
            if end > start {
                spans.push(TimeInterval::new(start, end));
            }
        }
        spans.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut merged: Vec<TimeInterval> = Vec::with_capacity(spans.len());
        for span in spans {
            match merged.last_mut() {
                Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
                _ => merged.push(span),
            }
        }

        tracing::debug!(
            reference = reference.id.as_str(),
            lines = reference.intervals.len(),
            spans = merged.len(),
            "timeline: built from synced subtitle"
        );
        Ok(Self::from_sorted_unchecked(merged))
    }

    pub fn load_json(path: &Path) -> Result<Self, SyncError> {
        let file = File::open(path).map_err(|e| SyncError::io("open timeline cache", e))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| SyncError::json("parse timeline cache", e))
    }

    pub fn save_json(&self, path: &Path) -> Result<(), SyncError> {
        let file = File::create(path).map_err(|e| SyncError::io("create timeline cache", e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, self)
            .map_err(|e| SyncError::json("write timeline cache", e))?;
        writer
            .flush()
            .map_err(|e| SyncError::io("flush timeline cache", e))
    }
}
