//! PCM codec — interleaved signed 16-bit little-endian frames.
//!
//! A frame holds one sample per channel in channel order, so a frame is
//! `channels * 2` bytes. This is the only byte format the crate reads or
//! writes.

use tracing::debug;

use crate::error::{FragmentError, Result};
use crate::fragment::Fragment;

/// The only supported sample width, in bytes.
pub const SAMPLE_WIDTH: usize = 2;

/// Full-scale divisor applied when importing integer samples.
const DECODE_SCALE: f64 = 32768.0;
/// Full-scale multiplier applied when exporting, symmetric around zero.
///
/// With the two scales differing, an encode/decode round trip of `z` is off
/// by at most `(|z| + 0.5) / 32768`, so up to `1.5 / 32768` near full scale.
const ENCODE_SCALE: f64 = 32767.0;

/// Encode the whole fragment as interleaved 16-bit PCM.
///
/// Values below -1.0 or above 1.0 are clamped to -32767 / 32767.
pub fn encode(frag: &Fragment, sample_width: usize) -> Result<Vec<u8>> {
    check_width(sample_width)?;
    Ok(encode_pcm16(frag))
}

pub(crate) fn encode_pcm16(frag: &Fragment) -> Vec<u8> {
    let mut buf = Vec::with_capacity(frag.len() * frag.channels() * SAMPLE_WIDTH);
    for frame in frag.frames() {
        for &z in frame.iter() {
            buf.extend_from_slice(&to_i16(z).to_le_bytes());
        }
    }
    buf
}

/// Decode interleaved 16-bit PCM into `frag`, starting at frame `offset`.
///
/// `sample_rate` and `channels` describe the byte stream and must match the
/// fragment. The fragment grows when `offset + frame_count` goes past its
/// end; samples already there are overwritten.
pub fn decode_into(
    frag: &mut Fragment,
    offset: usize,
    bytes: &[u8],
    sample_width: usize,
    sample_rate: u32,
    channels: usize,
) -> Result<()> {
    check_width(sample_width)?;

    if channels != frag.channels() {
        return Err(FragmentError::FormatMismatch(format!(
            "wrong number of channels: {channels}, fragment has {}",
            frag.channels()
        )));
    }
    if sample_rate != frag.sample_rate() {
        return Err(FragmentError::FormatMismatch(format!(
            "wrong sample rate: {sample_rate}, fragment has {}",
            frag.sample_rate()
        )));
    }

    let frame_size = channels * sample_width;
    if bytes.len() % frame_size != 0 {
        return Err(FragmentError::InvalidLength {
            length: bytes.len(),
            frame_size,
        });
    }

    let n_frames = bytes.len() / frame_size;
    frag.resize_past(offset, n_frames)?;

    for (c, chan) in frag.channel_slices_mut().enumerate() {
        let out = &mut chan[offset..offset + n_frames];
        for (s, frame) in out.iter_mut().zip(bytes.chunks_exact(frame_size)) {
            let at = c * sample_width;
            *s = i16::from_le_bytes([frame[at], frame[at + 1]]) as f64 / DECODE_SCALE;
        }
    }

    debug!(offset, frames = n_frames, channels, "decoded pcm16");
    Ok(())
}

#[inline]
fn to_i16(z: f64) -> i16 {
    if z < -1.0 {
        -32767
    } else if z > 1.0 {
        32767
    } else {
        (z * ENCODE_SCALE).round() as i16
    }
}

fn check_width(sample_width: usize) -> Result<()> {
    if sample_width != SAMPLE_WIDTH {
        return Err(FragmentError::UnsupportedFormat { sample_width });
    }
    Ok(())
}
