//! Generators — place synthesized notes on a destination fragment.
//!
//! A generator renders each note into a scratch fragment sized to the
//! note, runs its filter chain over it, then mixes it into the destination
//! at the note's start time.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dsp::filter::FilterChain;
use crate::dsp::oscillator::{self, Overtone};
use crate::error::{FragmentError, Result};
use crate::fragment::Fragment;

/// The sound rendered for each note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Source {
    Sine {
        frequency: f64,
    },
    Overtones {
        frequency: f64,
        overtones: Vec<Overtone>,
    },
}

impl Source {
    fn render(&self, frag: &mut Fragment, levels: &[f64]) -> Result<()> {
        match self {
            Source::Sine { frequency } => oscillator::sine(frag, *frequency, levels),
            Source::Overtones {
                frequency,
                overtones,
            } => oscillator::overtones(frag, *frequency, levels, overtones),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Generator {
    frag: Fragment,
    levels: Vec<f64>,
    time_stretch: f64,
    filters: FilterChain,
}

impl Generator {
    /// Levels default to 0 dB on every channel.
    pub fn new(frag: Fragment) -> Self {
        let levels = vec![0.0; frag.channels()];
        Generator {
            frag,
            levels,
            time_stretch: 1.0,
            filters: FilterChain::default(),
        }
    }

    pub fn with_filters(frag: Fragment, filters: FilterChain) -> Self {
        Generator {
            filters,
            ..Self::new(frag)
        }
    }

    /// The destination fragment.
    pub fn fragment(&self) -> &Fragment {
        &self.frag
    }

    pub fn into_fragment(self) -> Fragment {
        self.frag
    }

    pub fn channels(&self) -> usize {
        self.frag.channels()
    }

    pub fn sample_rate(&self) -> u32 {
        self.frag.sample_rate()
    }

    /// Default per-channel levels in dB.
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn set_levels(&mut self, levels: Vec<f64>) -> Result<()> {
        if levels.len() != self.frag.channels() {
            return Err(FragmentError::ChannelMismatch {
                expected: self.frag.channels(),
                found: levels.len(),
            });
        }
        self.levels = levels;
        Ok(())
    }

    /// All start and end times are multiplied by this factor.
    pub fn time_stretch(&self) -> f64 {
        self.time_stretch
    }

    pub fn set_time_stretch(&mut self, factor: f64) {
        self.time_stretch = factor;
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    pub fn set_filters(&mut self, filters: FilterChain) {
        self.filters = filters;
    }

    /// Render `source` between `start` and `end` seconds and mix it in.
    ///
    /// `levels` overrides the generator's default levels for this note.
    pub fn run(
        &mut self,
        source: &Source,
        start: f64,
        end: f64,
        levels: Option<&[f64]>,
    ) -> Result<()> {
        let start = start * self.time_stretch;
        let end = end * self.time_stretch;
        let levels = levels.unwrap_or(self.levels.as_slice());

        let mut note = Fragment::new(self.frag.channels(), self.frag.sample_rate(), end - start)?;
        source.render(&mut note, levels)?;
        self.filters.run(&mut note)?;
        self.frag.mix(&note, start)?;

        debug!(start, end, length = note.len(), "note generated");
        Ok(())
    }

    /// Run a pure sine note at the default levels.
    pub fn sine(&mut self, frequency: f64, start: f64, end: f64) -> Result<()> {
        self.run(&Source::Sine { frequency }, start, end, None)
    }

    /// Run an overtones note at the default levels.
    pub fn overtones(
        &mut self,
        frequency: f64,
        overtones: Vec<Overtone>,
        start: f64,
        end: f64,
    ) -> Result<()> {
        let source = Source::Overtones {
            frequency,
            overtones,
        };
        self.run(&source, start, end, None)
    }
}
