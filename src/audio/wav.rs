//! WAV decoding and encoding for the canonical waveform format.
//!
//! Canonical format: mono, 16 kHz, 16-bit linear PCM. Arbitrary input
//! sample rates and channel counts are downmixed and resampled here.

use crate::defaults::SAMPLE_RATE;
use crate::error::{AnalyzerError, Result};
use std::io::Cursor;
use std::path::Path;

/// Decode WAV bytes into mono 16 kHz samples.
///
/// Undecodable bytes are a validation failure: the upload claimed to be
/// audio and is not.
pub fn decode_to_mono_16k(bytes: &[u8]) -> Result<Vec<i16>> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes)).map_err(|e| {
        AnalyzerError::validation(format!("file is not readable as WAV audio: {}", e))
    })?;

    let spec = reader.spec();
    let source_rate = spec.sample_rate;
    let source_channels = spec.channels;

    let raw_samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| AnalyzerError::validation(format!("failed to read WAV samples: {}", e)))?;

    // Downmix to mono
    let mono_samples = if source_channels > 1 {
        raw_samples
            .chunks_exact(source_channels as usize)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / source_channels as i32) as i16
            })
            .collect()
    } else {
        raw_samples
    };

    // Resample to 16kHz if needed
    let samples = if source_rate != SAMPLE_RATE {
        resample(&mono_samples, source_rate, SAMPLE_RATE)
    } else {
        mono_samples
    };

    Ok(samples)
}

/// Write mono 16 kHz samples as a 16-bit PCM WAV file.
pub fn write_pcm_wav(path: &Path, samples: &[i16]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .map_err(|e| AnalyzerError::internal(format!("failed to create WAV file: {}", e)))?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .map_err(|e| AnalyzerError::internal(format!("failed to write WAV sample: {}", e)))?;
    }

    writer
        .finalize()
        .map_err(|e| AnalyzerError::internal(format!("failed to finalize WAV file: {}", e)))?;

    Ok(())
}

/// Simple linear interpolation resampling.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let index = source_pos as usize;
            let frac = source_pos - index as f64;

            if index + 1 < samples.len() {
                let a = samples[index] as f64;
                let b = samples[index + 1] as f64;
                (a + (b - a) * frac) as i16
            } else if index < samples.len() {
                samples[index]
            } else {
                0
            }
        })
        .collect()
}
