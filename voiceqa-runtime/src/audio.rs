/// Simple WAV (RIFF) writer: 32-bit float PCM, mono.
/// Enough for server-side re-transcription uploads.
pub fn encode_wav_mono_f32le(samples: &[f32], sample_rate_hz: u32) -> Vec<u8> {
    let num_channels: u16 = 1;
    let bits_per_sample: u16 = 32;
    let audio_format: u16 = 3; // IEEE float

    let byte_rate = sample_rate_hz * num_channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = num_channels * (bits_per_sample / 8);

    let data_bytes_len = samples.len() as u32 * 4;

    let mut out = Vec::with_capacity((44 + data_bytes_len) as usize);

    // RIFF header
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_bytes_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    // fmt chunk
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&audio_format.to_le_bytes());
    out.extend_from_slice(&num_channels.to_le_bytes());
    out.extend_from_slice(&sample_rate_hz.to_le_bytes());
    out.extend_from_slice(&byte_rate.to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_bytes_len.to_le_bytes());

    for s in samples {
        out.extend_from_slice(&s.to_le_bytes());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_declares_float_mono() {
        let wav = encode_wav_mono_f32le(&[0.0, 0.5, -0.5], 16_000);

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");

        // format = 3 (IEEE float), channels = 1
        assert_eq!(u16::from_le_bytes([wav[20], wav[21]]), 3);
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 1);

        // sample rate
        assert_eq!(
            u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]),
            16_000
        );
    }

    #[test]
    fn data_length_matches_sample_count() {
        let samples = vec![0.1f32; 160];
        let wav = encode_wav_mono_f32le(&samples, 16_000);
        assert_eq!(wav.len(), 44 + samples.len() * 4);

        let declared = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(declared as usize, samples.len() * 4);
    }
}
