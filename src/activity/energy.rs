use crate::error::SyncError;
use crate::pipeline::traits::VoiceClassifier;

const BASELINE_FRAMES: usize = 10;
const NOISE_FLOOR_MULTIPLIER: f32 = 4.0;
const MIN_THRESHOLD: f32 = 0.01;

/// RMS energy gate.
///
/// The first `BASELINE_FRAMES` frames of a run estimate the noise floor; after
/// that a frame is speech when its RMS reaches `max(floor * 4, min_threshold)`.
/// While the baseline is still filling only `min_threshold` applies.
#[derive(Debug, Clone)]
pub struct EnergyClassifier {
    min_threshold: f32,
    baseline_sum: f32,
    baseline_frames: usize,
}

impl EnergyClassifier {
    pub fn new(min_threshold: f32) -> Self {
        Self {
            min_threshold,
            baseline_sum: 0.0,
            baseline_frames: 0,
        }
    }

    fn threshold(&self) -> f32 {
        if self.baseline_frames < BASELINE_FRAMES {
            return self.min_threshold;
        }
        let noise_floor = self.baseline_sum / self.baseline_frames as f32;
        (noise_floor * NOISE_FLOOR_MULTIPLIER).max(self.min_threshold)
    }
}

impl Default for EnergyClassifier {
    fn default() -> Self {
        Self::new(MIN_THRESHOLD)
    }
}

impl VoiceClassifier for EnergyClassifier {
    fn is_speech(&mut self, frame: &[i16], _sample_rate_hz: u32) -> Result<bool, SyncError> {
        if frame.is_empty() {
            return Err(SyncError::classifier("empty frame"));
        }
        let rms = frame_rms(frame);
        let threshold = self.threshold();
        if self.baseline_frames < BASELINE_FRAMES {
            self.baseline_sum += rms;
            self.baseline_frames += 1;
        }
        Ok(rms >= threshold)
    }

    fn reset(&mut self) {
        self.baseline_sum = 0.0;
        self.baseline_frames = 0;
    }

    fn label(&self) -> &'static str {
        "energy"
    }
}

/// RMS of a frame with samples scaled to `[-1, 1]`.
pub(crate) fn frame_rms(frame: &[i16]) -> f32 {
    let mean_sq = frame
        .iter()
        .map(|&x| {
            let v = x as f64 / i16::MAX as f64;
            v * v
        })
        .sum::<f64>()
        / frame.len() as f64;
    mean_sq.sqrt() as f32
}
