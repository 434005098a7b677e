//! Audio ingest and output
//!
//! Whole-file WAV reading and writing for the enhancement run.

pub mod io;
pub mod waveform;

pub use io::{read_wav, write_wav};
pub use waveform::Waveform;
