use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("JSON error while {context}: {source}")]
    Json {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode {context}: {message}")]
    Decode {
        context: &'static str,
        message: String,
    },
    #[error("invalid audio: {message}")]
    InvalidAudio { message: String },
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
    #[error("invalid dialogue interval: {message}")]
    InvalidDialogue { message: String },
    #[error("invalid activity timeline: {message}")]
    InvalidTimeline { message: String },
    #[error("voice classifier failed: {message}")]
    Classifier { message: String },
    #[error("resampling failed: {message}")]
    Resample { message: String },
    #[error("worker pool unavailable: {message}")]
    WorkerPool { message: String },
    #[error("no usable subtitle candidates ({failed} failed)")]
    NoUsableCandidates { failed: usize },
}

impl SyncError {
    pub(crate) fn io(context: &'static str, source: std::io::Error) -> Self {
        Self::Io { context, source }
    }

    pub(crate) fn json(context: &'static str, source: serde_json::Error) -> Self {
        Self::Json { context, source }
    }

    pub(crate) fn decode(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            context,
            message: err.to_string(),
        }
    }

    pub(crate) fn invalid_audio(message: impl Into<String>) -> Self {
        Self::InvalidAudio {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_dialogue(message: impl Into<String>) -> Self {
        Self::InvalidDialogue {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_timeline(message: impl Into<String>) -> Self {
        Self::InvalidTimeline {
            message: message.into(),
        }
    }

    pub fn classifier(err: impl std::fmt::Display) -> Self {
        Self::Classifier {
            message: err.to_string(),
        }
    }

    pub(crate) fn resample(err: impl std::fmt::Display) -> Self {
        Self::Resample {
            message: err.to_string(),
        }
    }

    pub(crate) fn worker_pool(err: impl std::fmt::Display) -> Self {
        Self::WorkerPool {
            message: err.to_string(),
        }
    }

    /// Validation failures are raised before any segmentation or scoring work.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidAudio { .. }
                | Self::InvalidConfig { .. }
                | Self::InvalidDialogue { .. }
                | Self::InvalidTimeline { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_kinds_are_distinguished() {
        assert!(SyncError::invalid_audio("stereo").is_validation());
        assert!(SyncError::invalid_dialogue("start > end").is_validation());
        assert!(!SyncError::worker_pool("spawn failed").is_validation());
        assert!(!SyncError::NoUsableCandidates { failed: 2 }.is_validation());
    }

    #[test]
    fn messages_carry_context() {
        let err = SyncError::io(
            "read subtitle",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.to_string(), "I/O error while read subtitle: gone");
        let err = SyncError::NoUsableCandidates { failed: 3 };
        assert_eq!(err.to_string(), "no usable subtitle candidates (3 failed)");
    }
}
