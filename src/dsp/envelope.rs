//! Decreasing envelope.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FragmentError, Result};
use crate::fragment::Fragment;

/// Shape of the decreasing envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeParams {
    /// Time constant in samples. Must not be zero.
    pub k: f64,
    /// Exponent.
    pub p: f64,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        EnvelopeParams { k: 1.0, p: 1.0 }
    }
}

/// Divide the sample at index `i` by `(1 + i / k) ^ p` on every channel.
///
/// The first sample is never changed.
pub fn decreasing_envelope(frag: &mut Fragment, params: EnvelopeParams) -> Result<()> {
    let EnvelopeParams { k, p } = params;
    if k == 0.0 {
        return Err(FragmentError::InvalidArgument("k must not be 0".to_string()));
    }

    for chan in frag.channel_slices_mut() {
        for (i, s) in chan.iter_mut().enumerate() {
            *s /= (1.0 + i as f64 / k).powf(p);
        }
    }

    debug!(k, p, length = frag.len(), "decreasing envelope applied");
    Ok(())
}
