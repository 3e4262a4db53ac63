pub mod pcm;
pub mod resample;
pub mod subtitles;
