//! Transcription: trait seam plus the remote service adapter.

pub mod remote;
pub mod transcriber;

pub use remote::RemoteTranscriber;
pub use transcriber::{MockTranscriber, Transcriber};
