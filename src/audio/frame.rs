//! Per-recipient gain applied to container-wrapped PCM frames
//!
//! A recognized frame is `preamble || samples`, where the preamble is an
//! opaque fixed-length header starting with the container signature and the
//! samples are 16-bit signed little-endian PCM.

use bytes::{BufMut, Bytes, BytesMut};

/// Expected frame layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameFormat {
    /// Bytes copied through untouched before the samples
    pub preamble_len: usize,
    /// Leading bytes a frame must carry to be rewritten
    pub signature: Vec<u8>,
}

impl Default for FrameFormat {
    fn default() -> Self {
        Self {
            preamble_len: 50,
            signature: b"OggS".to_vec(),
        }
    }
}

impl FrameFormat {
    pub fn recognizes(&self, frame: &[u8]) -> bool {
        frame.len() >= self.preamble_len && frame.starts_with(&self.signature)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame does not carry the expected container signature")]
    UnrecognizedContainer,
}

/// Scale every sample after the preamble by `volume`, rounding to nearest and
/// saturating at the i16 range. A trailing odd byte is kept as-is.
pub fn rewrite_volume(frame: &[u8], volume: f64, format: &FrameFormat) -> Result<Bytes, FrameError> {
    if !format.recognizes(frame) {
        return Err(FrameError::UnrecognizedContainer);
    }

    let gain = if volume.is_finite() { volume.max(0.0) } else { 0.0 };
    let (preamble, body) = frame.split_at(format.preamble_len);
    let samples = body.chunks_exact(2);
    let tail = samples.remainder();

    let mut out = BytesMut::with_capacity(frame.len());
    out.put_slice(preamble);
    for pair in samples {
        let sample = i16::from_le_bytes([pair[0], pair[1]]);
        let scaled = (f64::from(sample) * gain)
            .round()
            .clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16;
        out.put_i16_le(scaled);
    }
    out.put_slice(tail);

    Ok(out.freeze())
}
