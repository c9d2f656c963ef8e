//! Additive synthesis — pure tones and overtone stacks.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::level::{db2lin, lin2db};
use crate::error::{FragmentError, Result};
use crate::fragment::Fragment;

/// One partial of an overtone stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overtone {
    /// Multiplied by the fundamental frequency to get this partial's frequency.
    pub ratio: f64,
    /// Level offset in dB for each channel, relative to the fundamental level.
    pub levels: Vec<f64>,
}

impl Overtone {
    pub fn new(ratio: f64, levels: Vec<f64>) -> Self {
        Overtone { ratio, levels }
    }
}

/// Overwrite every sample with a sine wave at `frequency`.
///
/// `levels` holds one level in dB per channel.
pub fn sine(frag: &mut Fragment, frequency: f64, levels: &[f64]) -> Result<()> {
    check_levels(frag, levels)?;

    let gains: Vec<f64> = levels.iter().map(|&l| db2lin(l)).collect();
    let rate = frag.sample_rate() as f64;

    for (chan, gain) in frag.channel_slices_mut().zip(gains) {
        for (i, s) in chan.iter_mut().enumerate() {
            *s = (2.0 * PI * frequency * i as f64 / rate).sin() * gain;
        }
    }

    debug!(frequency, length = frag.len(), "sine rendered");
    Ok(())
}

/// Add a stack of sine partials over the whole fragment.
///
/// Each partial plays at `overtone.ratio * frequency` with a per-channel
/// gain of `levels[c] + overtone.levels[c]` dB. Partials at or above half
/// the sample rate are silenced. The result is added to what the fragment
/// already holds.
pub fn overtones(
    frag: &mut Fragment,
    frequency: f64,
    levels: &[f64],
    overtones: &[Overtone],
) -> Result<()> {
    check_levels(frag, levels)?;
    for ot in overtones {
        check_levels(frag, &ot.levels)?;
    }

    let nyquist = (frag.sample_rate() / 2) as f64;
    let partials: Vec<(f64, Vec<f64>)> = overtones
        .iter()
        .map(|ot| {
            let gains = if ot.ratio * frequency >= nyquist {
                vec![0.0; levels.len()]
            } else {
                levels
                    .iter()
                    .zip(&ot.levels)
                    .map(|(&l, &o)| db2lin(l) * db2lin(o))
                    .collect()
            };
            (ot.ratio, gains)
        })
        .collect();

    let k = 2.0 * PI * frequency / frag.sample_rate() as f64;

    for (c, chan) in frag.channel_slices_mut().enumerate() {
        for (i, s) in chan.iter_mut().enumerate() {
            let m = k * i as f64;
            for (ratio, gains) in &partials {
                *s += (m * ratio).sin() * gains[c];
            }
        }
    }

    debug!(frequency, partials = partials.len(), "overtones rendered");
    Ok(())
}

/// Harmonic overtones with levels following a decreasing exponential.
///
/// Harmonic `i` in `1..=n` gets `exp((1 - i) / k)` as its linear amplitude
/// on every channel, so the fundamental is always at 0 dB. A smaller `k`
/// falls off faster.
pub fn decexp_overtones(k: f64, n: usize, channels: usize) -> Vec<Overtone> {
    (0..n)
        .map(|j| {
            let level = lin2db((-(j as f64) / k).exp());
            Overtone::new(j as f64 + 1.0, vec![level; channels])
        })
        .collect()
}

fn check_levels(frag: &Fragment, levels: &[f64]) -> Result<()> {
    if levels.len() != frag.channels() {
        return Err(FragmentError::ChannelMismatch {
            expected: frag.channels(),
            found: levels.len(),
        });
    }
    Ok(())
}
