use crate::error::SyncError;
use crate::types::{ActivityTimeline, DialogueSet};

/// Binary speech/non-speech decision for one PCM frame.
///
/// Implementations may keep state between frames of one run; the segmenter
/// calls [`VoiceClassifier::reset`] before every run.
pub trait VoiceClassifier {
    fn is_speech(&mut self, frame: &[i16], sample_rate_hz: u32) -> Result<bool, SyncError>;

    fn supports_frame_duration_ms(&self, _frame_duration_ms: u32) -> bool {
        true
    }

    fn reset(&mut self) {}

    fn label(&self) -> &'static str;
}

pub trait OverlapScorer: Send + Sync {
    fn score(
        &self,
        reference: &ActivityTimeline,
        candidate: &DialogueSet,
    ) -> Result<f64, SyncError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierKind {
    WebRtc,
    Energy,
}

impl ClassifierKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WebRtc => "webrtc",
            Self::Energy => "energy",
        }
    }
}

impl Default for ClassifierKind {
    fn default() -> Self {
        #[cfg(feature = "webrtc")]
        {
            Self::WebRtc
        }

        #[cfg(not(feature = "webrtc"))]
        {
            Self::Energy
        }
    }
}
