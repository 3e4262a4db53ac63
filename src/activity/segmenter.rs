use crate::activity::sample_rate::{is_supported_sample_rate, SUPPORTED_SAMPLE_RATES_HZ};
use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::pipeline::traits::VoiceClassifier;
use crate::types::{ActivityTimeline, PcmAudio, TimeInterval};

/// Rejects audio the classifier cannot consume. Runs before any frame is classified.
pub fn validate_pcm(audio: &PcmAudio) -> Result<(), SyncError> {
    if audio.channels != 1 {
        return Err(SyncError::invalid_audio(format!(
            "expected mono audio, got {} channels",
            audio.channels
        )));
    }
    if audio.bits_per_sample != 16 {
        return Err(SyncError::invalid_audio(format!(
            "expected 16-bit samples, got {} bits",
            audio.bits_per_sample
        )));
    }
    validate_sample_rate(audio.sample_rate_hz)
}

fn validate_sample_rate(sample_rate_hz: u32) -> Result<(), SyncError> {
    if !is_supported_sample_rate(sample_rate_hz) {
        return Err(SyncError::invalid_audio(format!(
            "sample rate {sample_rate_hz} Hz is not one of {SUPPORTED_SAMPLE_RATES_HZ:?}"
        )));
    }
    Ok(())
}

/// One-shot segmentation of a fully materialized buffer.
pub fn segment_activity(
    audio: &PcmAudio,
    classifier: &mut dyn VoiceClassifier,
    config: &SyncConfig,
) -> Result<ActivityTimeline, SyncError> {
    validate_pcm(audio)?;
    let mut segmenter = StreamingSegmenter::new(classifier, audio.sample_rate_hz, config)?;
    segmenter.push(&audio.samples)?;
    Ok(segmenter.finish())
}

/// Incremental segmenter; chunk boundaries do not affect the resulting timeline.
pub struct StreamingSegmenter<'c> {
    classifier: &'c mut dyn VoiceClassifier,
    sample_rate_hz: u32,
    frame_len: usize,
    frames_per_window: usize,
    activity_threshold: f64,
    pending: Vec<i16>,
    window_index: u64,
    window_frames: usize,
    window_speech_frames: usize,
    total_frames: u64,
    active_seconds: Vec<u64>,
}

impl<'c> StreamingSegmenter<'c> {
    pub fn new(
        classifier: &'c mut dyn VoiceClassifier,
        sample_rate_hz: u32,
        config: &SyncConfig,
    ) -> Result<Self, SyncError> {
        validate_sample_rate(sample_rate_hz)?;
        config.validate()?;
        let frame_len =
            (sample_rate_hz as u64 * config.frame_duration_ms as u64 / 1000) as usize;
        if frame_len == 0 {
            return Err(SyncError::invalid_config(format!(
                "frame of {} ms holds no samples at {sample_rate_hz} Hz",
                config.frame_duration_ms
            )));
        }
        classifier.reset();

        Ok(Self {
            classifier,
            sample_rate_hz,
            frame_len,
            frames_per_window: config.frames_per_window().max(1),
            activity_threshold: config.activity_threshold,
            pending: Vec::with_capacity(frame_len),
            window_index: 0,
            window_frames: 0,
            window_speech_frames: 0,
            total_frames: 0,
            active_seconds: Vec::new(),
        })
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    pub fn push(&mut self, mut samples: &[i16]) -> Result<(), SyncError> {
        if !self.pending.is_empty() {
            let needed = self.frame_len - self.pending.len();
            let take = needed.min(samples.len());
            self.pending.extend_from_slice(&samples[..take]);
            samples = &samples[take..];
            if self.pending.len() < self.frame_len {
                return Ok(());
            }
            let frame = std::mem::take(&mut self.pending);
            self.classify_frame(&frame)?;
            self.pending = frame;
            self.pending.clear();
        }

        let mut frames = samples.chunks_exact(self.frame_len);
        for frame in &mut frames {
            self.classify_frame(frame)?;
        }
        self.pending.extend_from_slice(frames.remainder());
        Ok(())
    }

    /// Closes the last (possibly short) window and drops any trailing partial frame.
    pub fn finish(mut self) -> ActivityTimeline {
        if self.window_frames > 0 {
            self.close_window();
        }
        tracing::debug!(
            sample_rate_hz = self.sample_rate_hz,
            frames = self.total_frames,
            windows = self.window_index,
            active_seconds = self.active_seconds.len(),
            dropped_samples = self.pending.len(),
            classifier = self.classifier.label(),
            "segmenter: activity timeline built"
        );
        ActivityTimeline::from_sorted_unchecked(
            self.active_seconds
                .into_iter()
                .map(TimeInterval::unit_second)
                .collect(),
        )
    }

    fn classify_frame(&mut self, frame: &[i16]) -> Result<(), SyncError> {
        let is_speech = self.classifier.is_speech(frame, self.sample_rate_hz)?;
        self.total_frames += 1;
        self.window_frames += 1;
        if is_speech {
            self.window_speech_frames += 1;
        }
        if self.window_frames == self.frames_per_window {
            self.close_window();
        }
        Ok(())
    }

    fn close_window(&mut self) {
        // A short trailing window is judged against its own frame count.
        let ratio = self.window_speech_frames as f64 / self.window_frames as f64;
        if ratio > self.activity_threshold {
            self.active_seconds.push(self.window_index);
        }
        self.window_index += 1;
        self.window_frames = 0;
        self.window_speech_frames = 0;
    }
}
