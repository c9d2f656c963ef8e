//! Reverb — randomized multi-tap delay applied in place.
//!
//! Every tap repeats the whole fragment once, shifted by the tap's delay
//! and scaled by its gain. Delay and gain get a random jitter that is drawn
//! independently for each channel, which spreads the reflections and
//! decorrelates the channels. With a few regularly spaced taps this is a
//! plain echo.
//!
//! The fragment is both source and destination. Each channel is walked
//! from its last original sample down to the first, and every write lands
//! at or after the index being read, so each read still sees the dry
//! sample. Walking forward would feed echoes back into later taps.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::level::db2lin;
use crate::error::{FragmentError, Result};
use crate::fragment::Fragment;

/// A delay tap as given by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayTap {
    /// Delay in seconds, must not be negative.
    pub time: f64,
    /// Gain in dB.
    pub gain: f64,
}

impl DelayTap {
    pub fn new(time: f64, gain: f64) -> Self {
        DelayTap { time, gain }
    }
}

/// Jitter and seeding parameters for [`reverb`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReverbParams {
    /// Each delay is picked between 1.0 and `1.0 + time_factor` times its
    /// nominal value.
    pub time_factor: f64,
    /// Each gain is picked within +/- `gain_factor` dB of its nominal value.
    pub gain_factor: f64,
    /// Seed for the jitter. 0 derives one from the current time.
    pub seed: u64,
}

impl Default for ReverbParams {
    fn default() -> Self {
        ReverbParams {
            time_factor: 0.2,
            gain_factor: 6.0,
            seed: 0,
        }
    }
}

/// A tap after jitter, in samples and linear gain.
#[derive(Debug, Clone, Copy)]
struct Tap {
    time: usize,
    gain: f64,
}

/// Mix delayed copies of the fragment into itself.
///
/// The fragment grows by the longest jittered delay so no echo is cut off.
/// The same seed and inputs always give the same output.
pub fn reverb(frag: &mut Fragment, delays: &[DelayTap], params: ReverbParams) -> Result<()> {
    if let Some(bad) = delays.iter().find(|d| !(d.time >= 0.0)) {
        return Err(FragmentError::InvalidArgument(format!(
            "delay time must be >= 0, got {}",
            bad.time
        )));
    }

    let seed = if params.seed == 0 {
        seed_from_clock()
    } else {
        params.seed
    };
    let mut rng = StdRng::seed_from_u64(seed);

    let taps = expand_taps(&mut rng, delays, frag.channels(), frag.sample_rate(), params);
    let max_delay = taps.iter().flatten().map(|t| t.time).max().unwrap_or(0);

    let old_length = frag.len();
    frag.resize_past(old_length, max_delay)?;

    for (chan, chan_taps) in frag.channel_slices_mut().zip(&taps) {
        for i in (0..old_length).rev() {
            let s = chan[i];
            for tap in chan_taps {
                chan[i + tap.time] += s * tap.gain;
            }
        }
    }

    debug!(
        seed,
        taps = delays.len(),
        max_delay,
        length = frag.len(),
        "reverb applied"
    );
    Ok(())
}

/// Draw the jittered taps, one list per channel.
///
/// Random values are drawn tap by tap: first the delay of every channel,
/// then the gain of every channel.
fn expand_taps(
    rng: &mut StdRng,
    delays: &[DelayTap],
    channels: usize,
    sample_rate: u32,
    params: ReverbParams,
) -> Vec<Vec<Tap>> {
    let mut taps = vec![Vec::with_capacity(delays.len()); channels];
    let rate = sample_rate as f64;

    for delay in delays {
        let times: Vec<usize> = (0..channels)
            .map(|_| {
                let time = delay.time * (1.0 + rng.random::<f64>() * params.time_factor);
                (time * rate).round() as usize
            })
            .collect();

        for (c, (chan_taps, time)) in taps.iter_mut().zip(times).enumerate() {
            let gain = delay.gain - params.gain_factor
                + rng.random::<f64>() * params.gain_factor * 2.0;
            trace!(channel = c, time, gain, "reverb tap");
            chan_taps.push(Tap {
                time,
                gain: db2lin(gain),
            });
        }
    }

    taps
}

#[cfg(not(target_arch = "wasm32"))]
fn seed_from_clock() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1);
    nanos.max(1)
}

#[cfg(target_arch = "wasm32")]
fn seed_from_clock() -> u64 {
    (js_sys::Date::now() as u64).max(1)
}
