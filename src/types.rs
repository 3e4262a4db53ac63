use serde::{Deserialize, Serialize};

use crate::error::SyncError;

/// Mono PCM audio as handed over by the extraction step.
///
/// `channels` and `bits_per_sample` describe the source the samples came from;
/// the segmenter refuses anything that is not mono 16-bit.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub samples: Vec<i16>,
}

impl PcmAudio {
    pub fn mono(sample_rate_hz: u32, samples: Vec<i16>) -> Self {
        Self {
            sample_rate_hz,
            channels: 1,
            bits_per_sample: 16,
            samples,
        }
    }

    /// Decodes 16-bit signed little-endian mono samples.
    pub fn from_le_bytes(bytes: &[u8], sample_rate_hz: u32) -> Result<Self, SyncError> {
        if bytes.len() % 2 != 0 {
            return Err(SyncError::invalid_audio(format!(
                "16-bit PCM buffer has odd byte length {}",
                bytes.len()
            )));
        }
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Ok(Self::mono(sample_rate_hz, samples))
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate_hz == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate_hz as f64 * self.channels as f64)
    }
}

/// Closed time interval in fractional seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    pub start: f64,
    pub end: f64,
}

impl TimeInterval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Interval covering whole second `second`, i.e. `[second, second + 1)`.
    pub fn unit_second(second: u64) -> Self {
        Self {
            start: second as f64,
            end: (second + 1) as f64,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub(crate) fn check(&self) -> Result<(), String> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(format!(
                "non-finite bounds ({}, {})",
                self.start, self.end
            ));
        }
        if self.start < 0.0 {
            return Err(format!("negative start {}", self.start));
        }
        if self.start > self.end {
            return Err(format!("start {} is after end {}", self.start, self.end));
        }
        Ok(())
    }
}

/// Ordered, non-overlapping intervals during which speech was detected.
///
/// Immutable once built; every constructor enforces the ordering invariant.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ActivityTimeline {
    intervals: Vec<TimeInterval>,
}

impl ActivityTimeline {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds unit intervals `[s, s + 1)` from whole active seconds.
    pub fn from_active_seconds(seconds: &[u64]) -> Result<Self, SyncError> {
        if let Some(pair) = seconds.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(SyncError::invalid_timeline(format!(
                "active seconds must be strictly increasing, got {} then {}",
                pair[0], pair[1]
            )));
        }
        Ok(Self {
            intervals: seconds.iter().copied().map(TimeInterval::unit_second).collect(),
        })
    }

    /// Validates a precomputed timeline.
    pub fn from_intervals(intervals: Vec<TimeInterval>) -> Result<Self, SyncError> {
        for (idx, interval) in intervals.iter().enumerate() {
            interval
                .check()
                .map_err(|msg| SyncError::invalid_timeline(format!("interval {idx}: {msg}")))?;
        }
        if let Some(idx) = intervals
            .windows(2)
            .position(|pair| pair[1].start < pair[0].end || pair[1].start <= pair[0].start)
        {
            return Err(SyncError::invalid_timeline(format!(
                "interval {} overlaps or precedes interval {idx}",
                idx + 1
            )));
        }
        Ok(Self { intervals })
    }

    pub(crate) fn from_sorted_unchecked(intervals: Vec<TimeInterval>) -> Self {
        debug_assert!(Self::from_intervals(intervals.clone()).is_ok());
        Self { intervals }
    }

    pub fn intervals(&self) -> &[TimeInterval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Sum of interval lengths in seconds; the denominator of every score.
    pub fn total_duration(&self) -> f64 {
        self.intervals.iter().map(TimeInterval::duration).sum()
    }
}

impl<'de> Deserialize<'de> for ActivityTimeline {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            intervals: Vec<TimeInterval>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Self::from_intervals(raw.intervals).map_err(serde::de::Error::custom)
    }
}

/// Dialogue display intervals of one subtitle candidate.
///
/// Lines may overlap; interval validity is checked by the scorer so that a
/// malformed candidate fails alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueSet {
    pub id: String,
    pub intervals: Vec<TimeInterval>,
}

impl DialogueSet {
    pub fn new(id: impl Into<String>, intervals: Vec<TimeInterval>) -> Self {
        Self {
            id: id.into(),
            intervals,
        }
    }

    pub fn from_pairs(id: impl Into<String>, pairs: &[(f64, f64)]) -> Self {
        Self::new(
            id,
            pairs
                .iter()
                .map(|&(start, end)| TimeInterval::new(start, end))
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreRecord {
    pub id: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateFailure {
    pub id: String,
    pub reason: String,
}

/// Scores ordered by descending score; ties keep candidate input order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RankingResult {
    pub ranked: Vec<ScoreRecord>,
    pub failures: Vec<CandidateFailure>,
    /// Total reference duration in seconds used as the score denominator.
    pub reference_secs: f64,
}

impl RankingResult {
    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ranked.iter().map(|record| record.id.as_str())
    }

    pub fn score_of(&self, id: &str) -> Option<f64> {
        self.ranked
            .iter()
            .find(|record| record.id == id)
            .map(|record| record.score)
    }

    pub fn best(&self) -> Option<&ScoreRecord> {
        self.ranked.first()
    }

    /// Fails when nothing scored, the one condition that aborts a workflow.
    pub fn ensure_usable(self) -> Result<Self, SyncError> {
        if self.ranked.is_empty() {
            return Err(SyncError::NoUsableCandidates {
                failed: self.failures.len(),
            });
        }
        Ok(self)
    }
}
