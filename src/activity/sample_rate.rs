/// Rates the voice classifier accepts, ascending.
pub const SUPPORTED_SAMPLE_RATES_HZ: [u32; 4] = [8_000, 16_000, 32_000, 48_000];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The native rate is already supported.
    Keep(u32),
    Resample(u32),
}

impl RateDecision {
    pub fn target_hz(self) -> u32 {
        match self {
            Self::Keep(hz) | Self::Resample(hz) => hz,
        }
    }

    pub fn needs_resampling(self) -> bool {
        matches!(self, Self::Resample(_))
    }
}

pub fn is_supported_sample_rate(sample_rate_hz: u32) -> bool {
    SUPPORTED_SAMPLE_RATES_HZ.contains(&sample_rate_hz)
}

pub fn normalize_sample_rate(native_hz: u32) -> RateDecision {
    normalize_against(native_hz, &SUPPORTED_SAMPLE_RATES_HZ)
}

/// Closest supported rate not above `native_hz`; never below the smallest supported rate.
///
/// `supported` must be ascending.
pub fn normalize_against(native_hz: u32, supported: &[u32]) -> RateDecision {
    debug_assert!(supported.windows(2).all(|pair| pair[0] < pair[1]));
    if supported.is_empty() || supported.contains(&native_hz) {
        return RateDecision::Keep(native_hz);
    }
    let idx = supported.partition_point(|&rate| rate <= native_hz);
    if idx == 0 {
        RateDecision::Resample(supported[0])
    } else {
        RateDecision::Resample(supported[idx - 1])
    }
}

/// Like [`normalize_sample_rate`], degrading to `fallback_hz` when the rate could not be probed.
pub fn resolve_sample_rate(probed_hz: Option<u32>, fallback_hz: u32) -> RateDecision {
    match probed_hz {
        Some(native_hz) if native_hz > 0 => normalize_sample_rate(native_hz),
        _ => {
            tracing::warn!(
                fallback_rate_hz = fallback_hz,
                "sample rate could not be determined; falling back"
            );
            RateDecision::Resample(fallback_hz)
        }
    }
}
