//! Upload validation and normalization to the canonical waveform.
//!
//! Accepted uploads are `.mp3`, `.wav`, or `.m4a` under 25 MiB. WAV files
//! are decoded in-process; compressed containers go through an `ffmpeg`
//! subprocess. Either way the output is a mono 16 kHz 16-bit PCM WAV in a
//! request-scoped temp file.

use crate::audio::temp::{self, NormalizedAudio};
use crate::audio::wav;
use crate::config::IntakeConfig;
use crate::error::{AnalyzerError, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// Raw upload as received from the caller.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl AudioUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Lowercased extension including the dot, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
    }
}

/// Validates uploads and produces normalized, request-scoped waveforms.
#[derive(Debug, Clone)]
pub struct AudioIntake {
    config: IntakeConfig,
    temp_dir: std::path::PathBuf,
}

impl AudioIntake {
    pub fn new(config: IntakeConfig, temp_dir: std::path::PathBuf) -> Self {
        Self { config, temp_dir }
    }

    /// Reject bad uploads before any temp file is created or any external
    /// service is contacted.
    pub fn validate(&self, upload: &AudioUpload) -> Result<()> {
        let ext = upload.extension().ok_or_else(|| {
            AnalyzerError::validation(format!(
                "file '{}' has no extension; allowed formats: {}",
                upload.filename,
                self.config.allowed_extensions.join(", ")
            ))
        })?;

        if !self
            .config
            .allowed_extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&ext))
        {
            return Err(AnalyzerError::validation(format!(
                "invalid file format '{}'; allowed formats: {}",
                ext,
                self.config.allowed_extensions.join(", ")
            )));
        }

        if upload.bytes.is_empty() {
            return Err(AnalyzerError::validation("file is empty"));
        }

        if upload.size_bytes() >= self.config.max_file_size_bytes {
            return Err(AnalyzerError::validation(format!(
                "file size ({:.2} MB) exceeds maximum allowed size ({:.2} MB)",
                upload.size_bytes() as f64 / (1024.0 * 1024.0),
                self.config.max_file_size_bytes as f64 / (1024.0 * 1024.0)
            )));
        }

        Ok(())
    }

    /// Convert a validated upload into the canonical waveform, written to a
    /// scoped temp file owned by the returned handle.
    pub async fn normalize(&self, request_id: &str, upload: &AudioUpload) -> Result<NormalizedAudio> {
        let output = temp::scoped_wav_path(&self.temp_dir, request_id)?;

        match upload.extension().as_deref() {
            Some(".wav") => {
                let samples = wav::decode_to_mono_16k(&upload.bytes)?;
                wav::write_pcm_wav(&output, &samples)?;
            }
            Some(ext) => {
                self.convert_with_ffmpeg(request_id, ext, &upload.bytes, &output)
                    .await?;
            }
            None => {
                // validate() runs first; reaching here is a caller bug.
                return Err(AnalyzerError::validation("file has no extension"));
            }
        }

        debug!(request_id, path = %output.display(), "normalized audio written");
        NormalizedAudio::from_temp_path(output)
    }

    /// Decode a compressed container to canonical PCM via ffmpeg.
    ///
    /// The intermediate input file is Drop-guarded like the output, so a
    /// failed conversion leaves nothing behind.
    async fn convert_with_ffmpeg(
        &self,
        request_id: &str,
        extension: &str,
        bytes: &[u8],
        output: &Path,
    ) -> Result<()> {
        let input = temp::scoped_input_path(&self.temp_dir, request_id, extension)?;
        tokio::fs::write(&input, bytes).await?;

        let result = Command::new("ffmpeg")
            .arg("-y")
            .arg("-i")
            .arg(&input)
            .args(["-ac", "1", "-ar", "16000", "-acodec", "pcm_s16le"])
            .arg(output)
            .output()
            .await;

        let command_output = match result {
            Ok(out) => out,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AnalyzerError::internal(
                    "ffmpeg not found; install ffmpeg to accept .mp3/.m4a uploads",
                ));
            }
            Err(e) => {
                return Err(AnalyzerError::internal(format!(
                    "failed to run ffmpeg: {}",
                    e
                )));
            }
        };

        if !command_output.status.success() {
            let stderr = String::from_utf8_lossy(&command_output.stderr);
            let tail: String = stderr
                .lines()
                .rev()
                .take(3)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join(" | ");
            return Err(AnalyzerError::validation(format!(
                "file is not readable as audio: {}",
                tail
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::SAMPLE_RATE;
    use std::io::Cursor;

    fn intake() -> AudioIntake {
        let dir = tempfile::tempdir().unwrap();
        AudioIntake::new(IntakeConfig::default(), dir.path().to_path_buf())
    }

    fn wav_upload(filename: &str, samples: &[i16], sample_rate: u32) -> AudioUpload {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        AudioUpload::new(filename, cursor.into_inner())
    }

    #[test]
    fn test_extension_lowercased_with_dot() {
        let upload = AudioUpload::new("Call Recording.MP3", vec![1]);
        assert_eq!(upload.extension().as_deref(), Some(".mp3"));
    }

    #[test]
    fn test_validate_accepts_known_extensions() {
        let intake = intake();
        for name in ["a.mp3", "b.wav", "c.m4a", "d.WAV"] {
            let upload = AudioUpload::new(name, vec![0u8; 16]);
            assert!(intake.validate(&upload).is_ok(), "rejected {}", name);
        }
    }

    #[test]
    fn test_validate_rejects_unknown_extension() {
        let intake = intake();
        let upload = AudioUpload::new("notes.txt", vec![0u8; 16]);
        match intake.validate(&upload) {
            Err(AnalyzerError::Validation { message }) => {
                assert!(message.contains(".txt"));
            }
            other => panic!("expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_missing_extension() {
        let intake = intake();
        let upload = AudioUpload::new("recording", vec![0u8; 16]);
        assert!(matches!(
            intake.validate(&upload),
            Err(AnalyzerError::Validation { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_empty_file() {
        let intake = intake();
        let upload = AudioUpload::new("call.wav", Vec::new());
        assert!(matches!(
            intake.validate(&upload),
            Err(AnalyzerError::Validation { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_oversize_file() {
        let intake = intake();
        // Exactly at the 25 MiB bound — the bound is exclusive.
        let upload = AudioUpload::new("big.wav", vec![0u8; 26_214_400]);
        match intake.validate(&upload) {
            Err(AnalyzerError::Validation { message }) => {
                assert!(message.contains("exceeds maximum"));
            }
            other => panic!("expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_accepts_just_under_limit() {
        let intake = intake();
        let upload = AudioUpload::new("big.wav", vec![0u8; 26_214_399]);
        assert!(intake.validate(&upload).is_ok());
    }

    #[tokio::test]
    async fn test_normalize_wav_writes_canonical_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let intake = AudioIntake::new(IntakeConfig::default(), dir.path().to_path_buf());

        // 48kHz input must land at 16kHz mono
        let upload = wav_upload("call.wav", &vec![500i16; 48000], 48000);
        let normalized = intake.normalize("req-norm", &upload).await.unwrap();

        assert!(normalized.path().exists());
        let reader = hound::WavReader::open(normalized.path()).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, SAMPLE_RATE);
        assert_eq!(spec.bits_per_sample, 16);
    }

    #[tokio::test]
    async fn test_normalize_garbage_wav_is_validation_error_and_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let intake = AudioIntake::new(IntakeConfig::default(), dir.path().to_path_buf());

        let upload = AudioUpload::new("bad.wav", b"not audio at all".to_vec());
        let result = intake.normalize("req-bad", &upload).await;

        assert!(matches!(result, Err(AnalyzerError::Validation { .. })));

        // The scoped output must not outlive the failed request.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert!(leftovers.is_empty(), "leftover files: {:?}", leftovers);
    }

    #[tokio::test]
    async fn test_normalized_file_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let intake = AudioIntake::new(IntakeConfig::default(), dir.path().to_path_buf());

        let upload = wav_upload("call.wav", &[1i16, 2, 3], 16000);
        let normalized = intake.normalize("req-drop", &upload).await.unwrap();
        let path = normalized.path().to_path_buf();

        assert!(path.exists());
        drop(normalized);
        assert!(!path.exists());
    }
}
