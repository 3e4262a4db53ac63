use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use crate::activity::sample_rate::{normalize_sample_rate, RateDecision};
use crate::error::SyncError;
use crate::types::PcmAudio;

const CHUNK_FRAMES: usize = 1024;

fn sinc_parameters() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    }
}

fn to_i16(sample: f32) -> i16 {
    (sample * 32_768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Band-limited sinc resampling of mono 16-bit samples.
///
/// The output holds `len * to_hz / from_hz` samples, aligned with the input
/// (the filter delay is trimmed).
pub fn resample_sinc(samples: &[i16], from_hz: u32, to_hz: u32) -> Result<Vec<i16>, SyncError> {
    if from_hz == to_hz || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if from_hz == 0 || to_hz == 0 {
        return Err(SyncError::resample(format!(
            "cannot convert {from_hz} Hz to {to_hz} Hz"
        )));
    }

    let mut resampler = SincFixedIn::<f32>::new(
        to_hz as f64 / from_hz as f64,
        2.0,
        sinc_parameters(),
        CHUNK_FRAMES,
        1,
    )
    .map_err(SyncError::resample)?;

    let input: Vec<f32> = samples.iter().map(|&s| s as f32 / 32_768.0).collect();
    let expected_len = (samples.len() as u64 * to_hz as u64 / from_hz as u64) as usize;
    let delay = resampler.output_delay();
    let mut output: Vec<f32> = Vec::with_capacity(expected_len + delay + CHUNK_FRAMES);

    let mut pos = 0;
    while pos + resampler.input_frames_next() <= input.len() {
        let next = resampler.input_frames_next();
        let frames: &[&[f32]] = &[&input[pos..pos + next]];
        let chunk = resampler
            .process(frames, None)
            .map_err(SyncError::resample)?;
        output.extend_from_slice(&chunk[0]);
        pos += next;
    }
    if pos < input.len() {
        let tail: &[&[f32]] = &[&input[pos..]];
        let chunk = resampler
            .process_partial(Some(tail), None)
            .map_err(SyncError::resample)?;
        output.extend_from_slice(&chunk[0]);
    }
    // drain the filter tail
    while output.len() < delay + expected_len {
        let chunk = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(SyncError::resample)?;
        if chunk[0].is_empty() {
            break;
        }
        output.extend_from_slice(&chunk[0]);
    }

    Ok(output
        .into_iter()
        .skip(delay)
        .take(expected_len)
        .map(to_i16)
        .collect())
}

/// Brings mono audio onto the nearest rate the classifier accepts.
pub fn conform_sample_rate(audio: PcmAudio) -> Result<PcmAudio, SyncError> {
    if audio.channels != 1 {
        return Err(SyncError::invalid_audio(format!(
            "cannot resample {} channel audio; downmix to mono first",
            audio.channels
        )));
    }
    if audio.sample_rate_hz == 0 {
        return Err(SyncError::invalid_audio("sample rate is 0 Hz"));
    }

    match normalize_sample_rate(audio.sample_rate_hz) {
        RateDecision::Keep(_) => Ok(audio),
        RateDecision::Resample(target_hz) => {
            tracing::debug!(
                from_hz = audio.sample_rate_hz,
                to_hz = target_hz,
                samples = audio.samples.len(),
                "resample: conforming audio"
            );
            let samples = resample_sinc(&audio.samples, audio.sample_rate_hz, target_hz)?;
            Ok(PcmAudio {
                sample_rate_hz: target_hz,
                samples,
                ..audio
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_hz: f64, rate_hz: u32, len: usize, amplitude: f64) -> Vec<i16> {
        (0..len)
            .map(|n| {
                let t = n as f64 / rate_hz as f64;
                (amplitude * (2.0 * std::f64::consts::PI * freq_hz * t).sin()).round() as i16
            })
            .collect()
    }

    fn rms(samples: &[i16]) -> f64 {
        let sum_sq: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
        (sum_sq / samples.len() as f64).sqrt()
    }

    #[test]
    fn same_rate_is_untouched() {
        let samples = vec![1, 2, 3];
        assert_eq!(resample_sinc(&samples, 16_000, 16_000).unwrap(), samples);
    }

    #[test]
    fn output_length_follows_rate_ratio() {
        assert_eq!(resample_sinc(&[100; 6], 16_000, 8_000).unwrap().len(), 3);
        assert_eq!(resample_sinc(&[0; 44_100], 44_100, 32_000).unwrap().len(), 32_000);
        assert_eq!(resample_sinc(&[0; 4_000], 8_000, 16_000).unwrap().len(), 8_000);
    }

    #[test]
    fn tone_above_target_nyquist_is_filtered_out() {
        let input = sine(12_000.0, 48_000, 48_000, 10_000.0);
        let output = resample_sinc(&input, 48_000, 16_000).unwrap();
        assert_eq!(output.len(), 16_000);
        // a 12 kHz tone would fold onto 4 kHz without the low-pass
        assert!(rms(&output) < rms(&input) * 0.05, "alias rms {}", rms(&output));
    }

    #[test]
    fn in_band_tone_keeps_its_level() {
        let input = sine(1_000.0, 48_000, 48_000, 10_000.0);
        let output = resample_sinc(&input, 48_000, 16_000).unwrap();
        // skip the edges where the filter sees zero padding
        let body = &output[1_000..15_000];
        let ratio = rms(body) / rms(&input);
        assert!((ratio - 1.0).abs() < 0.05, "level ratio {ratio}");
    }

    #[test]
    fn supported_rate_passes_through() {
        let audio = PcmAudio::mono(32_000, vec![7; 64]);
        assert_eq!(conform_sample_rate(audio.clone()).unwrap(), audio);
    }

    #[test]
    fn cd_rate_snaps_down_to_32k() {
        let audio = PcmAudio::mono(44_100, vec![0; 44_100]);
        let conformed = conform_sample_rate(audio).unwrap();
        assert_eq!(conformed.sample_rate_hz, 32_000);
        assert_eq!(conformed.samples.len(), 32_000);
    }

    #[test]
    fn stereo_and_zero_rate_are_refused() {
        let mut stereo = PcmAudio::mono(44_100, vec![0; 4]);
        stereo.channels = 2;
        assert!(matches!(
            conform_sample_rate(stereo),
            Err(SyncError::InvalidAudio { .. })
        ));
        assert!(conform_sample_rate(PcmAudio::mono(0, vec![])).is_err());
    }
}
