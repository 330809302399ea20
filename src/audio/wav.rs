//! WAV container encoding.
//!
//! Produces the canonical 44-byte-header, mono, 16-bit little-endian PCM
//! layout that standard audio tooling reads.

use crate::error::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

/// Suggested file name for exported audio.
pub const DEFAULT_EXPORT_FILENAME: &str = "additive_synth_output.wav";

/// MIME type of the encoded container.
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// Size of the RIFF/fmt/data header preceding the sample payload.
pub const WAV_HEADER_LEN: usize = 44;

/// Converts a float sample to 16-bit PCM.
///
/// The value is clamped to `[-1, 1]`; negative values scale by 0x8000 and
/// non-negative values by 0x7FFF, truncating toward zero.
#[inline]
pub fn sample_to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0) as i16
    } else {
        (s * 32767.0) as i16
    }
}

/// Encodes mono float samples into WAV bytes.
///
/// # Arguments
///
/// * `samples` - Finite samples, nominally in `[-1, 1]`
/// * `sample_rate` - Sample rate written to the header
///
/// # Returns
///
/// `44 + 2 * samples.len()` bytes
pub fn encode(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(WAV_HEADER_LEN + samples.len() * 2));
    {
        let mut writer = WavWriter::new(&mut cursor, spec)?;
        for &sample in samples {
            writer.write_sample(sample_to_i16(sample))?;
        }
        writer.finalize()?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::WavReader;

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes([
            bytes[offset],
            bytes[offset + 1],
            bytes[offset + 2],
            bytes[offset + 3],
        ])
    }

    #[test]
    fn test_sample_conversion() {
        assert_eq!(sample_to_i16(0.0), 0);
        assert_eq!(sample_to_i16(1.0), 32767);
        assert_eq!(sample_to_i16(-1.0), -32768);
        assert_eq!(sample_to_i16(2.5), 32767);
        assert_eq!(sample_to_i16(-3.0), -32768);
        assert_eq!(sample_to_i16(0.5), 16383);
        assert_eq!(sample_to_i16(-0.5), -16384);
    }

    #[test]
    fn test_header_layout() {
        let samples = vec![0.0f32; 100];
        let bytes = encode(&samples, 44100).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_LEN + 200);

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32_at(&bytes, 4), 36 + 200);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32_at(&bytes, 16), 16);
        assert_eq!(u16_at(&bytes, 20), 1); // PCM
        assert_eq!(u16_at(&bytes, 22), 1); // mono
        assert_eq!(u32_at(&bytes, 24), 44100);
        assert_eq!(u32_at(&bytes, 28), 88200);
        assert_eq!(u16_at(&bytes, 32), 2);
        assert_eq!(u16_at(&bytes, 34), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32_at(&bytes, 40), 200);
    }

    #[test]
    fn test_decodes_with_standard_reader() {
        let samples = vec![0.25f32, -0.25, 1.0, -1.0, 0.0];
        let bytes = encode(&samples, 22050).unwrap();
        let reader = WavReader::new(Cursor::new(&bytes)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22050);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(reader.len(), 5);

        let decoded: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, vec![8191, -8192, 32767, -32768, 0]);
    }

    #[test]
    fn test_empty_payload() {
        let bytes = encode(&[], 8000).unwrap();
        assert_eq!(bytes.len(), WAV_HEADER_LEN);
        assert_eq!(u32_at(&bytes, 40), 0);
    }
}
