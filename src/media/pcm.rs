use std::path::Path;

use claxon::FlacReader;
use hound::{SampleFormat, WavReader};

use crate::error::SyncError;
use crate::types::PcmAudio;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Container {
    Wav,
    Flac,
}

fn container_of(path: &Path) -> Result<Container, SyncError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("wav") => Ok(Container::Wav),
        Some("flac") => Ok(Container::Flac),
        _ => Err(SyncError::decode(
            "audio container",
            format!("'{}' is neither .wav nor .flac", path.display()),
        )),
    }
}

/// Loads mono 16-bit PCM from a `.wav` or `.flac` file.
pub fn load_pcm(path: &Path) -> Result<PcmAudio, SyncError> {
    match container_of(path)? {
        Container::Wav => load_wav(path),
        Container::Flac => load_flac(path),
    }
}

/// Reads only the header. `None` when the file cannot be probed.
pub fn probe_sample_rate(path: &Path) -> Option<u32> {
    match container_of(path).ok()? {
        Container::Wav => WavReader::open(path).ok().map(|r| r.spec().sample_rate),
        Container::Flac => FlacReader::open(path)
            .ok()
            .map(|r| r.streaminfo().sample_rate),
    }
}

pub fn load_wav(path: &Path) -> Result<PcmAudio, SyncError> {
    let mut reader = WavReader::open(path).map_err(|e| SyncError::decode("WAV header", e))?;
    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int {
        return Err(SyncError::invalid_audio(format!(
            "'{}' holds floating point samples; expected 16-bit integer PCM",
            path.display()
        )));
    }
    check_layout(path, spec.channels as u32, spec.bits_per_sample as u32)?;

    let samples = reader
        .samples::<i16>()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| SyncError::decode("WAV samples", e))?;

    Ok(PcmAudio {
        sample_rate_hz: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        samples,
    })
}

pub fn load_flac(path: &Path) -> Result<PcmAudio, SyncError> {
    let mut reader = FlacReader::open(path).map_err(|e| SyncError::decode("FLAC header", e))?;
    let streaminfo = reader.streaminfo();
    check_layout(path, streaminfo.channels, streaminfo.bits_per_sample)?;

    let mut samples = Vec::with_capacity(streaminfo.samples.unwrap_or(0) as usize);
    for sample in reader.samples() {
        let sample = sample.map_err(|e| SyncError::decode("FLAC samples", e))?;
        let sample = i16::try_from(sample).map_err(|_| {
            SyncError::decode("FLAC samples", format!("sample {sample} exceeds 16 bits"))
        })?;
        samples.push(sample);
    }

    Ok(PcmAudio {
        sample_rate_hz: streaminfo.sample_rate,
        channels: 1,
        bits_per_sample: 16,
        samples,
    })
}

fn check_layout(path: &Path, channels: u32, bits_per_sample: u32) -> Result<(), SyncError> {
    if channels != 1 {
        return Err(SyncError::invalid_audio(format!(
            "'{}' has {channels} channels; expected mono",
            path.display()
        )));
    }
    if bits_per_sample != 16 {
        return Err(SyncError::invalid_audio(format!(
            "'{}' has {bits_per_sample}-bit samples; expected 16-bit",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use hound::{WavSpec, WavWriter};

    use super::*;

    fn write_wav(path: &Path, channels: u16, bits: u16, rate: u32, samples: &[i16]) {
        let spec = WavSpec {
            channels,
            sample_rate: rate,
            bits_per_sample: bits,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).expect("create wav");
        for &sample in samples {
            writer.write_sample(sample).expect("write sample");
        }
        writer.finalize().expect("finalize wav");
    }

    #[test]
    fn loads_mono_16_bit_wav() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("speech.wav");
        write_wav(&path, 1, 16, 16_000, &[0, 1, -1, i16::MAX, i16::MIN]);

        let audio = load_pcm(&path).unwrap();
        assert_eq!(audio.sample_rate_hz, 16_000);
        assert_eq!(audio.samples, vec![0, 1, -1, i16::MAX, i16::MIN]);
        assert_eq!(probe_sample_rate(&path), Some(16_000));
    }

    #[test]
    fn rejects_stereo_wav_before_reading_samples() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, 16, 16_000, &[0, 0, 1, 1]);
        let err = load_wav(&path).unwrap_err();
        assert!(matches!(err, SyncError::InvalidAudio { .. }));
    }

    #[test]
    fn rejects_8_bit_wav() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("narrow.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8_000,
            bits_per_sample: 8,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).expect("create wav");
        writer.write_sample(0i8).expect("write sample");
        writer.finalize().expect("finalize wav");
        assert!(matches!(
            load_wav(&path),
            Err(SyncError::InvalidAudio { .. })
        ));
    }

    #[test]
    fn unknown_container_is_rejected() {
        assert!(load_pcm(Path::new("movie.mkv")).is_err());
        assert_eq!(probe_sample_rate(Path::new("movie.mkv")), None);
    }

    #[test]
    fn missing_file_cannot_be_probed() {
        assert_eq!(probe_sample_rate(Path::new("/nonexistent/audio.wav")), None);
    }
}
