//! Audio intake: upload validation, normalization to canonical PCM, and
//! request-scoped temporary storage.

pub mod intake;
pub mod temp;
pub mod wav;

pub use intake::{AudioIntake, AudioUpload};
pub use temp::NormalizedAudio;
