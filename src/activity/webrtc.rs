use webrtc_vad::{SampleRate, Vad, VadMode};

use crate::error::SyncError;
use crate::pipeline::traits::VoiceClassifier;

/// WebRTC VAD aggressiveness. Higher modes reject more borderline frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WebRtcMode {
    #[default]
    Quality,
    LowBitrate,
    Aggressive,
    VeryAggressive,
}

impl From<WebRtcMode> for VadMode {
    fn from(mode: WebRtcMode) -> Self {
        match mode {
            WebRtcMode::Quality => VadMode::Quality,
            WebRtcMode::LowBitrate => VadMode::LowBitrate,
            WebRtcMode::Aggressive => VadMode::Aggressive,
            WebRtcMode::VeryAggressive => VadMode::VeryAggressive,
        }
    }
}

/// WebRTC voice activity detector.
///
/// The underlying `Vad` handle is created lazily for the rate of the first
/// frame and rebuilt when the rate changes or the classifier is reset.
pub struct WebRtcClassifier {
    mode: WebRtcMode,
    vad: Option<(u32, Vad)>,
}

impl WebRtcClassifier {
    pub fn new() -> Self {
        Self::with_mode(WebRtcMode::default())
    }

    pub fn with_mode(mode: WebRtcMode) -> Self {
        Self { mode, vad: None }
    }

    fn vad_for_rate(&mut self, sample_rate_hz: u32) -> Result<&mut Vad, SyncError> {
        let needs_new = !matches!(&self.vad, Some((rate, _)) if *rate == sample_rate_hz);
        if needs_new {
            let rate = webrtc_sample_rate(sample_rate_hz)?;
            self.vad = Some((
                sample_rate_hz,
                Vad::new_with_rate_and_mode(rate, self.mode.into()),
            ));
        }
        match self.vad.as_mut() {
            Some((_, vad)) => Ok(vad),
            None => Err(SyncError::classifier("webrtc vad was not initialized")),
        }
    }
}

impl Default for WebRtcClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl VoiceClassifier for WebRtcClassifier {
    fn is_speech(&mut self, frame: &[i16], sample_rate_hz: u32) -> Result<bool, SyncError> {
        let frame_len = frame.len();
        self.vad_for_rate(sample_rate_hz)?
            .is_voice_segment(frame)
            .map_err(|()| {
                SyncError::classifier(format!(
                    "webrtc vad rejected a frame of {frame_len} samples at {sample_rate_hz} Hz"
                ))
            })
    }

    fn supports_frame_duration_ms(&self, frame_duration_ms: u32) -> bool {
        matches!(frame_duration_ms, 10 | 20 | 30)
    }

    fn reset(&mut self) {
        self.vad = None;
    }

    fn label(&self) -> &'static str {
        "webrtc"
    }
}

fn webrtc_sample_rate(sample_rate_hz: u32) -> Result<SampleRate, SyncError> {
    match sample_rate_hz {
        8_000 => Ok(SampleRate::Rate8kHz),
        16_000 => Ok(SampleRate::Rate16kHz),
        32_000 => Ok(SampleRate::Rate32kHz),
        48_000 => Ok(SampleRate::Rate48kHz),
        other => Err(SyncError::classifier(format!(
            "webrtc vad does not support {other} Hz"
        ))),
    }
}
