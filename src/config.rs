use std::path::Path;

use serde::Deserialize;

use crate::activity::sample_rate::SUPPORTED_SAMPLE_RATES_HZ;
use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_frame_duration_ms")]
    pub frame_duration_ms: u32,
    /// A window counts as speech when its speech-frame ratio is strictly above this.
    #[serde(default = "default_activity_threshold")]
    pub activity_threshold: f64,
    /// `None` sizes the scoring pool to the available parallelism.
    #[serde(default)]
    pub worker_threads: Option<usize>,
    /// Rate assumed when the source rate cannot be probed.
    #[serde(default = "default_fallback_sample_rate_hz")]
    pub fallback_sample_rate_hz: u32,
}

impl SyncConfig {
    pub const DEFAULT_FRAME_DURATION_MS: u32 = 20;
    pub const DEFAULT_ACTIVITY_THRESHOLD: f64 = 0.85;
    pub const DEFAULT_FALLBACK_SAMPLE_RATE_HZ: u32 = 16_000;

    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let data =
            std::fs::read_to_string(path).map_err(|e| SyncError::io("read sync config", e))?;
        let config: Self =
            serde_json::from_str(&data).map_err(|e| SyncError::json("parse sync config", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        if self.frame_duration_ms == 0 || self.frame_duration_ms > 1000 {
            return Err(SyncError::invalid_config(format!(
                "frame_duration_ms must be within 1..=1000, got {}",
                self.frame_duration_ms
            )));
        }
        if !self.activity_threshold.is_finite() || !(0.0..=1.0).contains(&self.activity_threshold)
        {
            return Err(SyncError::invalid_config(format!(
                "activity_threshold must be within [0, 1], got {}",
                self.activity_threshold
            )));
        }
        if self.worker_threads == Some(0) {
            return Err(SyncError::invalid_config(
                "worker_threads must be at least 1 when set",
            ));
        }
        if !SUPPORTED_SAMPLE_RATES_HZ.contains(&self.fallback_sample_rate_hz) {
            return Err(SyncError::invalid_config(format!(
                "fallback_sample_rate_hz must be one of {SUPPORTED_SAMPLE_RATES_HZ:?}, got {}",
                self.fallback_sample_rate_hz
            )));
        }
        Ok(())
    }

    /// Frames grouped into one activity window.
    pub fn frames_per_window(&self) -> usize {
        (1000 / self.frame_duration_ms.max(1)) as usize
    }

    pub fn resolved_worker_threads(&self) -> usize {
        self.worker_threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            frame_duration_ms: Self::DEFAULT_FRAME_DURATION_MS,
            activity_threshold: Self::DEFAULT_ACTIVITY_THRESHOLD,
            worker_threads: None,
            fallback_sample_rate_hz: Self::DEFAULT_FALLBACK_SAMPLE_RATE_HZ,
        }
    }
}

fn default_frame_duration_ms() -> u32 {
    SyncConfig::DEFAULT_FRAME_DURATION_MS
}
fn default_activity_threshold() -> f64 {
    SyncConfig::DEFAULT_ACTIVITY_THRESHOLD
}
fn default_fallback_sample_rate_hz() -> u32 {
    SyncConfig::DEFAULT_FALLBACK_SAMPLE_RATE_HZ
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_default() {
        let config = SyncConfig::default();
        assert_eq!(config.frame_duration_ms, 20);
        assert_eq!(config.activity_threshold, 0.85);
        assert_eq!(config.worker_threads, None);
        assert_eq!(config.fallback_sample_rate_hz, 16_000);
        assert_eq!(config.frames_per_window(), 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SyncConfig = serde_json::from_str(r#"{"frame_duration_ms": 30}"#)
            .expect("valid config json");
        assert_eq!(config.frame_duration_ms, 30);
        assert_eq!(config.activity_threshold, SyncConfig::DEFAULT_ACTIVITY_THRESHOLD);
        // 1000 / 30 truncates, the last 10 ms of each second fall into the next window
        assert_eq!(config.frames_per_window(), 33);
    }

    #[test]
    fn validate_rejects_out_of_range_tunables() {
        let bad_frame = SyncConfig {
            frame_duration_ms: 0,
            ..SyncConfig::default()
        };
        assert!(bad_frame.validate().is_err());

        let bad_threshold = SyncConfig {
            activity_threshold: 1.5,
            ..SyncConfig::default()
        };
        assert!(bad_threshold.validate().is_err());

        let nan_threshold = SyncConfig {
            activity_threshold: f64::NAN,
            ..SyncConfig::default()
        };
        assert!(nan_threshold.validate().is_err());

        let zero_workers = SyncConfig {
            worker_threads: Some(0),
            ..SyncConfig::default()
        };
        assert!(zero_workers.validate().is_err());

        let bad_rate = SyncConfig {
            fallback_sample_rate_hz: 44_100,
            ..SyncConfig::default()
        };
        assert!(bad_rate.validate().is_err());
    }

    #[test]
    fn load_reads_and_validates_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sync.json");
        std::fs::write(&path, r#"{"activity_threshold": 0.5, "worker_threads": 2}"#)
            .expect("write config");
        let config = SyncConfig::load(&path).expect("load config");
        assert_eq!(config.activity_threshold, 0.5);
        assert_eq!(config.resolved_worker_threads(), 2);

        std::fs::write(&path, r#"{"activity_threshold": 2.0}"#).expect("write config");
        assert!(matches!(
            SyncConfig::load(&path),
            Err(SyncError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn load_fails_on_missing_file() {
        let result = SyncConfig::load(Path::new("/nonexistent/sync.json"));
        assert!(matches!(result, Err(SyncError::Io { .. })));
    }
}
