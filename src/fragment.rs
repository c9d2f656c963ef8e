//! Fragment — the multi-channel sample buffer every operation works on.
//!
//! A fragment owns one `f64` array per channel, all of the same length.
//! Its length only ever grows: growing zero-fills the new tail and nothing
//! in the crate truncates a fragment.

use std::ops::Deref;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::dsp::codec;
use crate::error::{FragmentError, Result};

/// Hard cap on the number of channels in a fragment.
pub const MAX_CHANNELS: usize = 16;

/// A fragment of multi-channel audio data.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    channels: Vec<Vec<f64>>,
    sample_rate: u32,
    length: usize,
}

/// One sample value per channel at a single index, in channel order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    values: [f64; MAX_CHANNELS],
    len: usize,
}

impl Frame {
    fn new(len: usize) -> Self {
        Frame {
            values: [0.0; MAX_CHANNELS],
            len,
        }
    }
}

impl Deref for Frame {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.values[..self.len]
    }
}

impl Fragment {
    /// Create a silent fragment lasting `duration` seconds.
    ///
    /// The length is `floor(duration * sample_rate)` samples per channel.
    pub fn new(channels: usize, sample_rate: u32, duration: f64) -> Result<Self> {
        // NaN must fail as well, hence the negated comparison.
        if !(duration >= 0.0) {
            return Err(FragmentError::InvalidArgument(format!(
                "negative duration: {duration}"
            )));
        }
        let length = (duration * sample_rate as f64).floor() as usize;
        Self::with_length(channels, sample_rate, length)
    }

    /// Create a silent fragment holding `length` samples per channel.
    pub fn with_length(channels: usize, sample_rate: u32, length: usize) -> Result<Self> {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(FragmentError::InvalidArgument(format!(
                "channel count must be in 1..={MAX_CHANNELS}, got {channels}"
            )));
        }
        if sample_rate == 0 {
            return Err(FragmentError::InvalidArgument(
                "sample rate must be positive".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(channels);
        for _ in 0..channels {
            let mut chan = Vec::new();
            chan.try_reserve_exact(length)
                .map_err(|_| FragmentError::OutOfMemory { requested: length })?;
            chan.resize(length, 0.0);
            data.push(chan);
        }

        debug!(channels, sample_rate, length, "fragment created");

        Ok(Fragment {
            channels: data,
            sample_rate,
            length,
        })
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels.len()
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples per channel.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        self.length as f64 / self.sample_rate as f64
    }

    /// Convert a sample index into a time in seconds.
    pub fn samples_to_seconds(&self, n: usize) -> f64 {
        n as f64 / self.sample_rate as f64
    }

    /// Convert a time in seconds into a sample index (truncated).
    pub fn seconds_to_samples(&self, s: f64) -> usize {
        (s * self.sample_rate as f64) as usize
    }

    /// Read-only view of one channel's samples.
    pub fn channel(&self, c: usize) -> Option<&[f64]> {
        self.channels.get(c).map(Vec::as_slice)
    }

    /// Mutable view of one channel's samples. The length can't be changed
    /// through it.
    pub fn channel_mut(&mut self, c: usize) -> Option<&mut [f64]> {
        self.channels.get_mut(c).map(Vec::as_mut_slice)
    }

    pub(crate) fn channel_slices(&self) -> impl Iterator<Item = &[f64]> {
        self.channels.iter().map(Vec::as_slice)
    }

    pub(crate) fn channel_slices_mut(&mut self) -> impl Iterator<Item = &mut [f64]> {
        self.channels.iter_mut().map(Vec::as_mut_slice)
    }

    /// Grow every channel to `new_length`, zero-filling the new tail.
    ///
    /// Does nothing when `new_length <= len()`. Capacity is reserved for
    /// every channel before any length changes, so an allocation failure
    /// leaves the fragment as it was.
    pub fn resize(&mut self, new_length: usize) -> Result<()> {
        if new_length <= self.length {
            return Ok(());
        }

        let additional = new_length - self.length;
        for chan in &mut self.channels {
            chan.try_reserve_exact(additional)
                .map_err(|_| FragmentError::OutOfMemory {
                    requested: new_length,
                })?;
        }
        for chan in &mut self.channels {
            chan.resize(new_length, 0.0);
        }

        debug!(from = self.length, to = new_length, "fragment grown");
        self.length = new_length;
        Ok(())
    }

    /// Grow to hold `base + extra` samples. A sum past `usize::MAX` can
    /// never be allocated and fails the same way.
    pub(crate) fn resize_past(&mut self, base: usize, extra: usize) -> Result<()> {
        let new_length = base
            .checked_add(extra)
            .ok_or(FragmentError::OutOfMemory {
                requested: usize::MAX,
            })?;
        self.resize(new_length)
    }

    /// Sample values of every channel at `index`.
    pub fn get(&self, index: usize) -> Result<Frame> {
        self.check_index(index)?;
        let mut frame = Frame::new(self.channels.len());
        for (value, chan) in frame.values.iter_mut().zip(&self.channels) {
            *value = chan[index];
        }
        Ok(frame)
    }

    /// Write one value per channel at `index`.
    pub fn set(&mut self, index: usize, values: &[f64]) -> Result<()> {
        if values.len() != self.channels.len() {
            return Err(FragmentError::ChannelMismatch {
                expected: self.channels.len(),
                found: values.len(),
            });
        }
        self.check_index(index)?;
        for (chan, &value) in self.channels.iter_mut().zip(values) {
            chan[index] = value;
        }
        Ok(())
    }

    /// Iterate over every frame in index order.
    pub fn frames(&self) -> impl Iterator<Item = Frame> + '_ {
        (0..self.length).map(move |i| {
            let mut frame = Frame::new(self.channels.len());
            for (value, chan) in frame.values.iter_mut().zip(&self.channels) {
                *value = chan[i];
            }
            frame
        })
    }

    /// Hex SHA-256 of the fragment's 16-bit PCM encoding.
    pub fn checksum(&self) -> String {
        let digest = Sha256::digest(codec::encode_pcm16(self));
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.length {
            return Err(FragmentError::IndexOutOfRange {
                index,
                length: self.length,
            });
        }
        Ok(())
    }
}
