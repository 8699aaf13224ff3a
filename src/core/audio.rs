//! Client audio preparation.
//!
//! The Realtime API accepts base64 PCM16 little-endian mono audio at 24kHz.
//! Clients may upload a WAV file (any sample rate, channel count or sample
//! format hound can read) or raw PCM16 that is already in the target format.

use std::io::Cursor;

use base64::prelude::*;
use thiserror::Error;

use crate::core::realtime::openai::OPENAI_REALTIME_SAMPLE_RATE;

/// Errors from audio preparation.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("Audio payload is empty")]
    Empty,

    #[error("Invalid WAV data: {0}")]
    Wav(#[from] hound::Error),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for audio operations.
pub type AudioResult<T> = Result<T, AudioError>;

/// Lowest WAV sample rate accepted for upsampling to 24kHz.
pub const MIN_WAV_SAMPLE_RATE: u32 = 8_000;

/// Upper bound on the length of a resampled clip (30 minutes at 24kHz).
pub const MAX_RESAMPLED_SAMPLES: usize = 30 * 60 * OPENAI_REALTIME_SAMPLE_RATE as usize;

/// Convert a client upload into the base64 payload of `input_audio_buffer.append`.
pub fn encode_pcm16_base64(data: &[u8]) -> AudioResult<String> {
    if data.is_empty() {
        return Err(AudioError::Empty);
    }

    if is_wav(data) {
        let (samples, sample_rate) = decode_wav_mono(data)?;
        let resampled = resample(&samples, sample_rate, OPENAI_REALTIME_SAMPLE_RATE)?;
        return Ok(BASE64_STANDARD.encode(to_pcm16_le(&resampled)));
    }

    if data.len() % 2 != 0 {
        return Err(AudioError::UnsupportedFormat(format!(
            "raw PCM16 payload has odd length {}",
            data.len()
        )));
    }
    Ok(BASE64_STANDARD.encode(data))
}

/// RIFF/WAVE header check.
pub fn is_wav(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WAVE"
}

/// Decode WAV bytes into mono samples in [-1.0, 1.0], with their sample rate.
pub fn decode_wav_mono(data: &[u8]) -> AudioResult<(Vec<f32>, u32)> {
    let reader = hound::WavReader::new(Cursor::new(data))?;
    let spec = reader.spec();

    if spec.channels == 0 {
        return Err(AudioError::UnsupportedFormat(
            "WAV header declares zero channels".to_string(),
        ));
    }
    if spec.sample_rate < MIN_WAV_SAMPLE_RATE {
        return Err(AudioError::UnsupportedFormat(format!(
            "WAV sample rate {} Hz is below {} Hz",
            spec.sample_rate, MIN_WAV_SAMPLE_RATE
        )));
    }

    tracing::debug!(
        "WAV format: {} Hz, {} channels, {} bits",
        spec.sample_rate,
        spec.channels,
        spec.bits_per_sample
    );

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_val))
                .collect::<Result<_, _>>()?
        }
        hound::SampleFormat::Float => reader.into_samples::<f32>().collect::<Result<_, _>>()?,
    };

    let channels = spec.channels as usize;
    let mono = if channels == 1 {
        samples
    } else {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    };

    Ok((mono, spec.sample_rate))
}

/// Resample with linear interpolation.
///
/// Fails when either rate is zero or the output would exceed
/// [`MAX_RESAMPLED_SAMPLES`].
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> AudioResult<Vec<f32>> {
    if from_rate == 0 || to_rate == 0 {
        return Err(AudioError::UnsupportedFormat(format!(
            "cannot resample from {from_rate} Hz to {to_rate} Hz"
        )));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let new_len = samples.len() as u64 * to_rate as u64 / from_rate as u64;
    if new_len > MAX_RESAMPLED_SAMPLES as u64 {
        return Err(AudioError::UnsupportedFormat(format!(
            "resampled clip of {new_len} samples exceeds {MAX_RESAMPLED_SAMPLES}"
        )));
    }
    let new_len = new_len as usize;
    let ratio = from_rate as f64 / to_rate as f64;
    let last = samples.len() - 1;

    let mut resampled = Vec::with_capacity(new_len);
    for i in 0..new_len {
        let src_idx = i as f64 * ratio;
        let idx0 = (src_idx.floor() as usize).min(last);
        let idx1 = (idx0 + 1).min(last);
        let frac = src_idx - idx0 as f64;

        let sample = samples[idx0] as f64 * (1.0 - frac) + samples[idx1] as f64 * frac;
        resampled.push(sample as f32);
    }
    Ok(resampled)
}

/// Encode samples in [-1.0, 1.0] as PCM16 little-endian bytes. Out of range
/// samples are clipped.
pub fn to_pcm16_le(samples: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}
