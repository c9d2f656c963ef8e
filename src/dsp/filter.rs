//! In-place filters and filter chains.
//!
//! A [`FilterChain`] is an ordered list of [`Filter`] descriptions applied
//! one after the other to a fragment. Chains deserialize from JSON, e.g.:
//!
//! ```json
//! [
//!   { "type": "dec_envelope", "k": 2000.0, "p": 1.5 },
//!   { "type": "reverb", "delays": [{ "time": 0.05, "gain": -9.0 }], "seed": 3 },
//!   { "type": "normalize", "level": -0.5 }
//! ]
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::amplitude::GainSpec;
use super::envelope::{EnvelopeParams, decreasing_envelope};
use super::reverb::{DelayTap, ReverbParams, reverb};
use crate::error::Result;
use crate::fragment::Fragment;

/// Reverse the order of all the samples on every channel.
///
/// Applying it twice restores the fragment exactly.
pub fn reverse(frag: &mut Fragment) {
    for chan in frag.channel_slices_mut() {
        chan.reverse();
    }
    debug!(length = frag.len(), "fragment reversed");
}

/// One in-place filter with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    DecEnvelope {
        #[serde(flatten)]
        params: EnvelopeParams,
    },
    Reverse,
    Reverb {
        delays: Vec<DelayTap>,
        #[serde(flatten)]
        params: ReverbParams,
    },
    Normalize {
        level: f64,
    },
    Amp {
        gain: GainSpec,
    },
}

impl Filter {
    pub fn apply(&self, frag: &mut Fragment) -> Result<()> {
        match self {
            Filter::DecEnvelope { params } => decreasing_envelope(frag, *params),
            Filter::Reverse => {
                reverse(frag);
                Ok(())
            }
            Filter::Reverb { delays, params } => reverb(frag, delays, *params),
            Filter::Normalize { level } => frag.normalize(*level),
            Filter::Amp { gain } => frag.amp(gain),
        }
    }
}

/// An ordered list of filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterChain {
    filters: Vec<Filter>,
}

impl FilterChain {
    pub fn new(filters: Vec<Filter>) -> Self {
        FilterChain { filters }
    }

    /// Parse a chain from a JSON array of filters.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply every filter in order, stopping at the first failure.
    pub fn run(&self, frag: &mut Fragment) -> Result<()> {
        for filter in &self.filters {
            filter.apply(frag)?;
        }
        Ok(())
    }
}

impl From<Vec<Filter>> for FilterChain {
    fn from(filters: Vec<Filter>) -> Self {
        FilterChain::new(filters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FragmentError;

    fn ramp(channels: usize, length: usize) -> Fragment {
        let mut frag = Fragment::with_length(channels, 8000, length).unwrap();
        for c in 0..channels {
            for (i, s) in frag.channel_mut(c).unwrap().iter_mut().enumerate() {
                *s = (i * (c + 1)) as f64 / 10.0;
            }
        }
        frag
    }

    #[test]
    fn reverse_swaps_ends() {
        let mut frag = ramp(2, 5);
        reverse(&mut frag);
        assert_eq!(frag.channel(0).unwrap(), &[0.4, 0.3, 0.2, 0.1, 0.0]);
        assert_eq!(frag.channel(1).unwrap(), &[0.8, 0.6, 0.4, 0.2, 0.0]);
    }

    #[test]
    fn reverse_is_an_involution() {
        for length in [0, 1, 2, 7, 64] {
            let mut frag = ramp(3, length);
            let before = frag.clone();
            reverse(&mut frag);
            reverse(&mut frag);
            assert_eq!(frag, before, "length {length}");
        }
    }

    #[test]
    fn chain_runs_in_order() {
        let chain = FilterChain::new(vec![
            Filter::Amp { gain: GainSpec::Uniform(20.0) },
            Filter::Reverse,
        ]);
        let mut frag = ramp(1, 3);
        chain.run(&mut frag).unwrap();
        let chan = frag.channel(0).unwrap();
        assert!((chan[0] - 2.0).abs() < 1e-12);
        assert!((chan[1] - 1.0).abs() < 1e-12);
        assert_eq!(chan[2], 0.0);
    }

    #[test]
    fn chain_stops_at_first_error() {
        let chain = FilterChain::new(vec![
            Filter::DecEnvelope { params: EnvelopeParams { k: 0.0, p: 1.0 } },
            Filter::Reverse,
        ]);
        let mut frag = ramp(1, 4);
        let before = frag.clone();
        let err = chain.run(&mut frag).unwrap_err();
        assert!(matches!(err, FragmentError::InvalidArgument(_)));
        assert_eq!(frag, before);
    }

    #[test]
    fn chain_from_json() {
        let chain = FilterChain::from_json(
            r#"[
                {"type": "dec_envelope", "k": 2000.0},
                {"type": "reverse"},
                {"type": "reverb", "delays": [{"time": 0.05, "gain": -9.0}], "seed": 3},
                {"type": "normalize", "level": -0.5},
                {"type": "amp", "gain": {"per_channel": [0.0, -3.0]}}
            ]"#,
        )
        .unwrap();

        assert_eq!(chain.len(), 5);
        assert_eq!(
            chain.filters()[0],
            Filter::DecEnvelope { params: EnvelopeParams { k: 2000.0, p: 1.0 } }
        );
        assert_eq!(
            chain.filters()[2],
            Filter::Reverb {
                delays: vec![DelayTap::new(0.05, -9.0)],
                params: ReverbParams { seed: 3, ..ReverbParams::default() },
            }
        );
        assert_eq!(
            chain.filters()[4],
            Filter::Amp { gain: GainSpec::PerChannel(vec![0.0, -3.0]) }
        );
    }

    #[test]
    fn bad_json_is_a_config_error() {
        let err = FilterChain::from_json(r#"[{"type": "flanger"}]"#).unwrap_err();
        assert!(matches!(err, FragmentError::Config(_)));
    }
}
