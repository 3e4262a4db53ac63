pub mod overlap;
pub mod ranking;
