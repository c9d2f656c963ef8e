//! Level conversion between linear amplitude and decibels.

/// Convert a linear amplitude to dB. `x` must be positive.
#[inline]
pub fn lin2db(x: f64) -> f64 {
    20.0 * x.log10()
}

/// Convert a level in dB to a linear amplitude.
#[inline]
pub fn db2lin(x: f64) -> f64 {
    10.0_f64.powf(x / 20.0)
}
