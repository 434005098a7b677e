//! WAV file I/O
//!
//! The whole file is read into memory in one pass. Integer PCM is scaled to
//! `[-1.0, 1.0)`; float PCM is taken as is. Output is always 32-bit float.

use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use tracing::debug;

use crate::audio::Waveform;
use crate::error::{EnhanceError, Result};

/// Read a mono WAV file
///
/// # Errors
/// * `FileNotFound` - If the file does not exist
/// * `InvalidAudio` - If the file is not a decodable WAV file
/// * `PreconditionFailed` - If the file has more than one channel
pub fn read_wav(path: &Path) -> Result<Waveform> {
    if !path.exists() {
        return Err(EnhanceError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let reader = WavReader::open(path).map_err(|e| invalid_audio(path, "failed to open", e))?;
    let spec = reader.spec();

    if spec.channels != 1 {
        return Err(EnhanceError::PreconditionFailed {
            reason: format!(
                "{} has {} channels, only mono input is supported",
                path.display(),
                spec.channels
            ),
        });
    }

    let samples = read_samples_as_f32(reader, path)?;
    debug!(
        path = %path.display(),
        samples = samples.len(),
        sample_rate = spec.sample_rate,
        bits = spec.bits_per_sample,
        "Read WAV file"
    );

    Ok(Waveform::new(samples, spec.sample_rate))
}

/// Write a waveform as mono 32-bit float WAV at its own sample rate
pub fn write_wav(waveform: &Waveform, path: &Path) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: waveform.sample_rate(),
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let write_error = |source| EnhanceError::AudioWrite {
        path: path.display().to_string(),
        source,
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_error)?;
    for &sample in waveform.samples() {
        writer.write_sample(sample).map_err(write_error)?;
    }
    writer.finalize().map_err(write_error)?;

    debug!(path = %path.display(), samples = waveform.len(), "Wrote WAV file");
    Ok(())
}

fn read_samples_as_f32<R: std::io::Read>(reader: WavReader<R>, path: &Path) -> Result<Vec<f32>> {
    let spec = reader.spec();
    match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<Vec<f32>, _>>()
            .map_err(|e| invalid_audio(path, "failed to read float samples", e)),
        SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            if bits == 0 || bits > 32 {
                return Err(EnhanceError::InvalidAudio {
                    path: path.display().to_string(),
                    reason: format!("unsupported {}-bit integer audio", bits),
                    source: None,
                });
            }
            let scale = 1.0 / (1u64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| invalid_audio(path, "failed to read integer samples", e))
        }
    }
}

fn invalid_audio(path: &Path, reason: &str, source: hound::Error) -> EnhanceError {
    EnhanceError::InvalidAudio {
        path: path.display().to_string(),
        reason: format!("{}: {}", reason, source),
        source: Some(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_int16(path: &Path, samples: &[i16], channels: u16, sample_rate: u32) {
        let spec = WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_round_trip_float() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tone.wav");

        let original = Waveform::sine_wave(440.0, 0.25, 16000);
        write_wav(&original, &path).unwrap();
        let imported = read_wav(&path).unwrap();

        assert_eq!(imported, original);
    }

    #[test]
    fn test_int16_is_scaled() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pcm16.wav");
        write_int16(&path, &[0, 16384, -32768, 32767], 1, 16000);

        let wave = read_wav(&path).unwrap();
        assert_eq!(wave.sample_rate(), 16000);
        assert_eq!(wave.samples()[0], 0.0);
        assert_eq!(wave.samples()[1], 0.5);
        assert_eq!(wave.samples()[2], -1.0);
        assert!(wave.samples()[3] < 1.0);
    }

    #[test]
    fn test_stereo_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_int16(&path, &[0, 0, 100, 100], 2, 16000);

        match read_wav(&path) {
            Err(EnhanceError::PreconditionFailed { reason }) => {
                assert!(reason.contains("2 channels"));
            }
            other => panic!("Expected PreconditionFailed, got: {:?}", other),
        }
    }

    #[test]
    fn test_read_nonexistent_file() {
        match read_wav(Path::new("/nonexistent/path/mix.wav")) {
            Err(EnhanceError::FileNotFound { path }) => assert!(path.contains("nonexistent")),
            other => panic!("Expected FileNotFound error, got: {:?}", other),
        }
    }

    #[test]
    fn test_garbage_is_invalid_audio() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not a riff header").unwrap();

        let err = read_wav(&path).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_AUDIO");
    }

    #[test]
    fn test_write_to_missing_directory_fails() {
        let wave = Waveform::sine_wave(440.0, 0.1, 16000);
        let err = write_wav(&wave, Path::new("/nonexistent/dir/enh.wav")).unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
