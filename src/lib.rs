pub mod dsp;
pub mod error;
pub mod fragment;
pub mod generator;

pub use dsp::amplitude::GainSpec;
pub use dsp::envelope::EnvelopeParams;
pub use dsp::filter::{Filter, FilterChain};
pub use dsp::level::{db2lin, lin2db};
pub use dsp::oscillator::Overtone;
pub use dsp::reverb::{DelayTap, ReverbParams};
pub use error::FragmentError;
pub use fragment::{Fragment, Frame, MAX_CHANNELS};
pub use generator::{Generator, Source};

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the splat-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

/// WASM-exposed: convert a linear amplitude to dB.
#[wasm_bindgen(js_name = lin2dB)]
pub fn lin2db_js(value: f64) -> f64 {
    lin2db(value)
}

/// WASM-exposed: convert dB to a linear amplitude.
#[wasm_bindgen(js_name = dB2lin)]
pub fn db2lin_js(value: f64) -> f64 {
    db2lin(value)
}

fn js_err(e: FragmentError) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed handle on a [`Fragment`].
///
/// Sample frames cross the boundary as plain `Float64Array`s, one value per
/// channel; PCM data as `Uint8Array`.
#[wasm_bindgen]
pub struct WasmFragment {
    inner: Fragment,
}

#[wasm_bindgen]
impl WasmFragment {
    #[wasm_bindgen(constructor)]
    pub fn new(channels: usize, sample_rate: u32, duration: f64) -> Result<WasmFragment, JsValue> {
        let inner = Fragment::new(channels, sample_rate, duration).map_err(js_err)?;
        Ok(WasmFragment { inner })
    }

    #[wasm_bindgen(getter)]
    pub fn length(&self) -> usize {
        self.inner.len()
    }

    #[wasm_bindgen(getter)]
    pub fn channels(&self) -> usize {
        self.inner.channels()
    }

    #[wasm_bindgen(getter, js_name = sampleRate)]
    pub fn sample_rate(&self) -> u32 {
        self.inner.sample_rate()
    }

    #[wasm_bindgen(getter)]
    pub fn duration(&self) -> f64 {
        self.inner.duration()
    }

    pub fn get(&self, index: usize) -> Result<Vec<f64>, JsValue> {
        let frame = self.inner.get(index).map_err(js_err)?;
        Ok(frame.to_vec())
    }

    pub fn set(&mut self, index: usize, values: Vec<f64>) -> Result<(), JsValue> {
        self.inner.set(index, &values).map_err(js_err)
    }

    pub fn resize(&mut self, length: usize) -> Result<(), JsValue> {
        self.inner.resize(length).map_err(js_err)
    }

    pub fn mix(&mut self, other: &WasmFragment, start: f64) -> Result<(), JsValue> {
        self.inner.mix(&other.inner, start).map_err(js_err)
    }

    pub fn sine(&mut self, frequency: f64, levels: Vec<f64>) -> Result<(), JsValue> {
        dsp::oscillator::sine(&mut self.inner, frequency, &levels).map_err(js_err)
    }

    /// `overtones` is an array of `{ ratio, levels }` objects.
    pub fn overtones(
        &mut self,
        frequency: f64,
        levels: Vec<f64>,
        overtones: JsValue,
    ) -> Result<(), JsValue> {
        let overtones: Vec<Overtone> = serde_wasm_bindgen::from_value(overtones)?;
        dsp::oscillator::overtones(&mut self.inner, frequency, &levels, &overtones).map_err(js_err)
    }

    pub fn normalize(&mut self, level: f64) -> Result<(), JsValue> {
        self.inner.normalize(level).map_err(js_err)
    }

    /// `gain` is either a number (all channels) or an array with one value
    /// per channel, in dB.
    pub fn amp(&mut self, gain: JsValue) -> Result<(), JsValue> {
        let gain = match gain.as_f64() {
            Some(db) => GainSpec::Uniform(db),
            None => GainSpec::PerChannel(serde_wasm_bindgen::from_value(gain)?),
        };
        self.inner.amp(&gain).map_err(js_err)
    }

    #[wasm_bindgen(js_name = decEnvelope)]
    pub fn dec_envelope(&mut self, k: f64, p: f64) -> Result<(), JsValue> {
        dsp::envelope::decreasing_envelope(&mut self.inner, EnvelopeParams { k, p })
            .map_err(js_err)
    }

    pub fn reverse(&mut self) {
        dsp::filter::reverse(&mut self.inner);
    }

    /// `delays` is an array of `{ time, gain }` objects.
    pub fn reverb(
        &mut self,
        delays: JsValue,
        time_factor: f64,
        gain_factor: f64,
        seed: u32,
    ) -> Result<(), JsValue> {
        let delays: Vec<DelayTap> = serde_wasm_bindgen::from_value(delays)?;
        let params = ReverbParams {
            time_factor,
            gain_factor,
            seed: seed as u64,
        };
        dsp::reverb::reverb(&mut self.inner, &delays, params).map_err(js_err)
    }

    /// Apply a filter chain given as an array of filter objects.
    #[wasm_bindgen(js_name = applyFilters)]
    pub fn apply_filters(&mut self, filters: JsValue) -> Result<(), JsValue> {
        let chain: FilterChain = serde_wasm_bindgen::from_value(filters)?;
        chain.run(&mut self.inner).map_err(js_err)
    }

    #[wasm_bindgen(js_name = toPcm16)]
    pub fn to_pcm16(&self) -> Vec<u8> {
        dsp::codec::encode_pcm16(&self.inner)
    }

    /// Import 16-bit PCM in this fragment's own channel layout and rate.
    #[wasm_bindgen(js_name = fromPcm16)]
    pub fn from_pcm16(&mut self, bytes: &[u8], offset: usize) -> Result<(), JsValue> {
        let rate = self.inner.sample_rate();
        let channels = self.inner.channels();
        dsp::codec::decode_into(&mut self.inner, offset, bytes, 2, rate, channels).map_err(js_err)
    }

    pub fn checksum(&self) -> String {
        self.inner.checksum()
    }
}
