pub mod energy;
pub mod sample_rate;
pub mod segmenter;
mod timeline;
#[cfg(feature = "webrtc")]
pub mod webrtc;
