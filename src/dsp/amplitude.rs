//! Amplitude filters — normalization and gain.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::level::db2lin;
use crate::error::{FragmentError, Result};
use crate::fragment::{Fragment, MAX_CHANNELS};

/// Gain in dB, either shared by all channels or given per channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GainSpec {
    Uniform(f64),
    PerChannel(Vec<f64>),
}

impl GainSpec {
    /// Linear gain for each of `channels` channels.
    pub fn resolve(&self, channels: usize) -> Result<Vec<f64>> {
        match self {
            GainSpec::Uniform(db) => Ok(vec![db2lin(*db); channels]),
            GainSpec::PerChannel(dbs) => {
                if dbs.len() != channels {
                    return Err(FragmentError::ChannelMismatch {
                        expected: channels,
                        found: dbs.len(),
                    });
                }
                Ok(dbs.iter().map(|&db| db2lin(db)).collect())
            }
        }
    }
}

impl From<f64> for GainSpec {
    fn from(db: f64) -> Self {
        GainSpec::Uniform(db)
    }
}

impl From<Vec<f64>> for GainSpec {
    fn from(dbs: Vec<f64>) -> Self {
        GainSpec::PerChannel(dbs)
    }
}

impl Fragment {
    /// Remove the DC offset of every channel and scale all channels by a
    /// single gain so the loudest one peaks at `level` dB.
    ///
    /// A channel's peak is its largest excursion from its own mean, on
    /// either side. The max tracker starts at -1.0 and the min tracker at
    /// 1.0.
    pub fn normalize(&mut self, level: f64) -> Result<()> {
        if self.channels() > MAX_CHANNELS {
            return Err(FragmentError::InvalidArgument(format!(
                "too many channels: {}",
                self.channels()
            )));
        }

        let level = db2lin(level);
        let length = self.len();
        let mut averages = Vec::with_capacity(self.channels());
        let mut peak = 0.0_f64;

        for chan in self.channel_slices() {
            let avg = if length == 0 {
                0.0
            } else {
                chan.iter().sum::<f64>() / length as f64
            };
            let (neg, pos) = chan
                .iter()
                .fold((1.0_f64, -1.0_f64), |(neg, pos), &s| (neg.min(s), pos.max(s)));
            let chan_peak = (neg - avg).abs().max((pos - avg).abs());
            peak = peak.max(chan_peak);
            averages.push(avg);
        }

        let gain = if peak > 0.0 {
            level / peak
        } else {
            warn!("normalizing a fragment with no excursion, only removing DC offset");
            1.0
        };

        for (chan, avg) in self.channel_slices_mut().zip(averages) {
            for s in chan.iter_mut() {
                *s = (*s - avg) * gain;
            }
        }

        debug!(peak, gain, "fragment normalized");
        Ok(())
    }

    /// Multiply every channel by its linear gain.
    pub fn amp(&mut self, gain: &GainSpec) -> Result<()> {
        let gains = gain.resolve(self.channels())?;

        for (chan, g) in self.channel_slices_mut().zip(gains) {
            for s in chan.iter_mut() {
                *s *= g;
            }
        }

        debug!(?gain, "fragment amplified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mean(chan: &[f64]) -> f64 {
        chan.iter().sum::<f64>() / chan.len() as f64
    }

    fn peak_dev(chan: &[f64]) -> f64 {
        let avg = mean(chan);
        chan.iter().fold(0.0_f64, |m, &s| m.max((s - avg).abs()))
    }

    fn fill(frag: &mut Fragment, f: impl Fn(usize, usize) -> f64) {
        for c in 0..frag.channels() {
            let chan = frag.channel_mut(c).unwrap();
            for (i, s) in chan.iter_mut().enumerate() {
                *s = f(c, i);
            }
        }
    }

    #[test]
    fn normalize_removes_dc_and_scales_loudest_channel() {
        let mut frag = Fragment::with_length(2, 8000, 400).unwrap();
        fill(&mut frag, |c, i| {
            let t = (2.0 * std::f64::consts::PI * i as f64 / 40.0).sin();
            if c == 0 { 0.2 + 0.3 * t } else { -0.1 + 0.1 * t }
        });

        frag.normalize(-6.0).unwrap();

        let target = db2lin(-6.0);
        let left = frag.channel(0).unwrap();
        let right = frag.channel(1).unwrap();
        assert!(mean(left).abs() < 1e-9, "left mean {}", mean(left));
        assert!(mean(right).abs() < 1e-9, "right mean {}", mean(right));
        assert!(
            (peak_dev(left) - target).abs() < 1e-9,
            "loudest channel should peak at target, got {}",
            peak_dev(left)
        );
        // the quieter channel keeps its relative level
        assert!((peak_dev(right) - target / 3.0).abs() < 1e-9);
    }

    #[test]
    fn normalize_uses_larger_excursion() {
        let mut frag = Fragment::with_length(1, 8000, 4).unwrap();
        fill(&mut frag, |_, i| [0.0, 0.0, 0.0, -0.8][i]);
        frag.normalize(0.0).unwrap();

        // mean is -0.2, most negative excursion is 0.6 away
        let chan = frag.channel(0).unwrap();
        assert!((chan[3] + 1.0).abs() < 1e-12);
        assert!((chan[0] - 0.2 / 0.6).abs() < 1e-12);
    }

    #[test]
    fn normalize_silent_fragment_stays_silent() {
        let mut frag = Fragment::with_length(2, 8000, 16).unwrap();
        frag.normalize(0.0).unwrap();
        assert!(frag.frames().all(|f| f.iter().all(|&s| s == 0.0)));
    }

    #[test]
    fn normalize_empty_fragment() {
        let mut frag = Fragment::new(2, 8000, 0.0).unwrap();
        frag.normalize(-3.0).unwrap();
        assert!(frag.is_empty());
    }

    #[test]
    fn amp_uniform() {
        let mut frag = Fragment::with_length(2, 8000, 3).unwrap();
        fill(&mut frag, |_, _| 0.5);
        frag.amp(&GainSpec::Uniform(20.0)).unwrap();
        assert!(frag.frames().all(|f| f.iter().all(|&s| (s - 5.0).abs() < 1e-12)));
    }

    #[test]
    fn amp_per_channel() {
        let mut frag = Fragment::with_length(2, 8000, 3).unwrap();
        fill(&mut frag, |_, _| 1.0);
        frag.amp(&vec![0.0, -20.0].into()).unwrap();
        for frame in frag.frames() {
            assert_eq!(frame[0], 1.0);
            assert!((frame[1] - 0.1).abs() < 1e-12);
        }
    }

    #[test]
    fn amp_channel_mismatch_leaves_fragment() {
        let mut frag = Fragment::with_length(2, 8000, 3).unwrap();
        fill(&mut frag, |_, _| 1.0);
        let err = frag.amp(&GainSpec::PerChannel(vec![0.0, 0.0, 0.0])).unwrap_err();
        assert_eq!(err, FragmentError::ChannelMismatch { expected: 2, found: 3 });
        assert!(frag.frames().all(|f| f.iter().all(|&s| s == 1.0)));
    }

    #[test]
    fn gain_spec_from_json() {
        let g: GainSpec = serde_json::from_str(r#"{"uniform": -3.0}"#).unwrap();
        assert_eq!(g, GainSpec::Uniform(-3.0));
        let g: GainSpec = serde_json::from_str(r#"{"per_channel": [0.0, 6.0]}"#).unwrap();
        assert_eq!(g, GainSpec::PerChannel(vec![0.0, 6.0]));
    }
}
