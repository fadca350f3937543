//! Request-scoped temporary storage for normalized audio.
//!
//! The normalized waveform is the only filesystem side effect of a request.
//! Deletion rides on `Drop`, so it happens on success, on every error path,
//! and on task cancellation alike.

use crate::error::{AnalyzerError, Result};
use std::path::Path;
use tempfile::TempPath;

/// Scoped handle to the normalized WAV file for one request.
///
/// The file is removed when this handle is dropped.
#[derive(Debug)]
pub struct NormalizedAudio {
    path: TempPath,
    size_bytes: u64,
}

impl NormalizedAudio {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Read the normalized waveform bytes for upload.
    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }

    pub(crate) fn from_temp_path(path: TempPath) -> Result<Self> {
        let size_bytes = std::fs::metadata(&path)?.len();
        Ok(Self { path, size_bytes })
    }
}

/// Create the temp directory if missing and return a fresh scoped WAV path
/// for this request. The file name carries the request id so concurrent
/// requests never collide and stray files are traceable.
pub fn scoped_wav_path(temp_dir: &Path, request_id: &str) -> Result<TempPath> {
    std::fs::create_dir_all(temp_dir).map_err(|e| {
        AnalyzerError::internal(format!(
            "failed to create temp directory {}: {}",
            temp_dir.display(),
            e
        ))
    })?;

    let file = tempfile::Builder::new()
        .prefix(&format!("{}_", request_id))
        .suffix(".wav")
        .tempfile_in(temp_dir)
        .map_err(|e| AnalyzerError::internal(format!("failed to create temp file: {}", e)))?;

    Ok(file.into_temp_path())
}

/// Scoped path for the raw upload while it awaits conversion. Keeps the
/// original extension so the converter can pick the right demuxer.
pub fn scoped_input_path(temp_dir: &Path, request_id: &str, extension: &str) -> Result<TempPath> {
    std::fs::create_dir_all(temp_dir).map_err(|e| {
        AnalyzerError::internal(format!(
            "failed to create temp directory {}: {}",
            temp_dir.display(),
            e
        ))
    })?;

    let file = tempfile::Builder::new()
        .prefix(&format!("{}_input_", request_id))
        .suffix(extension)
        .tempfile_in(temp_dir)
        .map_err(|e| AnalyzerError::internal(format!("failed to create temp file: {}", e)))?;

    Ok(file.into_temp_path())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_path_carries_request_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = scoped_wav_path(dir.path(), "req-123").unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("req-123_"));
        assert!(name.ends_with(".wav"));
    }

    #[test]
    fn test_normalized_audio_deleted_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let temp_path = scoped_wav_path(dir.path(), "req-drop").unwrap();
        let path_buf = temp_path.to_path_buf();
        std::fs::write(&path_buf, b"fake wav").unwrap();

        let audio = NormalizedAudio::from_temp_path(temp_path).unwrap();
        assert!(path_buf.exists());
        assert_eq!(audio.size_bytes(), 8);

        drop(audio);
        assert!(!path_buf.exists());
    }

    #[test]
    fn test_concurrent_requests_get_distinct_paths() {
        let dir = tempfile::tempdir().unwrap();
        let a = scoped_wav_path(dir.path(), "req-a").unwrap();
        let b = scoped_wav_path(dir.path(), "req-a").unwrap();
        assert_ne!(a.to_path_buf(), b.to_path_buf());
    }

    #[test]
    fn test_input_path_keeps_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = scoped_input_path(dir.path(), "req-1", ".mp3").unwrap();
        assert!(path.to_string_lossy().ends_with(".mp3"));
    }
}
