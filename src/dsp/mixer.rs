//! Mixer — sums one fragment into another at a time offset.

use tracing::debug;

use crate::error::{FragmentError, Result};
use crate::fragment::Fragment;

impl Fragment {
    /// Add `other` into this fragment, starting `start` seconds in.
    ///
    /// Both fragments must have the same channel count and sample rate.
    /// This fragment grows to fit the whole of `other`; `other` is left
    /// untouched.
    pub fn mix(&mut self, other: &Fragment, start: f64) -> Result<()> {
        if other.channels() != self.channels() {
            return Err(FragmentError::ChannelMismatch {
                expected: self.channels(),
                found: other.channels(),
            });
        }
        if other.sample_rate() != self.sample_rate() {
            return Err(FragmentError::RateMismatch {
                expected: self.sample_rate(),
                found: other.sample_rate(),
            });
        }
        if !(start >= 0.0) {
            return Err(FragmentError::InvalidArgument(format!(
                "negative mix start: {start}"
            )));
        }

        let start_sample = (start * self.sample_rate() as f64).round() as usize;
        self.resize_past(start_sample, other.len())?;

        for (dst, src) in self.channel_slices_mut().zip(other.channel_slices()) {
            for (d, &s) in dst[start_sample..].iter_mut().zip(src) {
                *d += s;
            }
        }

        debug!(start_sample, samples = other.len(), "fragment mixed");
        Ok(())
    }
}
