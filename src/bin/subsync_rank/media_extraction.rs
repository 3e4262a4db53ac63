use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use subsync_rank::{resolve_sample_rate, RateDecision};

/// Hidden WAV next to the media file, reused by later runs.
///
/// Keyed on the full file name so containers sharing a stem stay apart.
pub fn cached_audio_path(media: &Path) -> PathBuf {
    let name = media
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "media".to_string());
    media.with_file_name(format!(".{name}.subsync.wav"))
}

/// Native audio rate of the first audio stream, via ffprobe.
pub fn probe_media_sample_rate(media: &Path) -> Option<u32> {
    which::which("ffprobe").ok()?;
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "a:0",
            "-show_entries",
            "stream=sample_rate",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(media)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()?
        .trim()
        .parse()
        .ok()
}

/// Extracts mono 16-bit PCM at a supported rate, or returns the cached copy.
pub fn extract_audio(media: &Path, fallback_rate_hz: u32) -> Result<(PathBuf, bool), String> {
    let cached = cached_audio_path(media);
    if cached.is_file() {
        tracing::debug!(path = %cached.display(), "extraction: reusing cached audio");
        return Ok((cached, true));
    }

    which::which("ffmpeg").map_err(|_| "Cannot find ffmpeg on PATH.".to_string())?;
    let decision = resolve_sample_rate(probe_media_sample_rate(media), fallback_rate_hz);
    if let RateDecision::Resample(target_hz) = decision {
        tracing::debug!(target_hz, "extraction: resampling to supported rate");
    }

    let partial = cached.with_extension("partial.wav");
    let output = Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-i"])
        .arg(media)
        .args([
            "-vn",
            "-ac",
            "1",
            "-acodec",
            "pcm_s16le",
            "-ar",
            &decision.target_hz().to_string(),
        ])
        .arg(&partial)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|err| format!("Failed to run ffmpeg: {err}"))?;

    if !output.status.success() {
        let _ = fs::remove_file(&partial);
        return Err(format!(
            "ffmpeg cannot extract audio from '{}': {}",
            media.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    fs::rename(&partial, &cached).map_err(|err| {
        format!(
            "Failed to move extracted audio into '{}': {err}",
            cached.display()
        )
    })?;
    Ok((cached, false))
}
