//! DSP — in-place operations on fragments.
//!
//! Everything here works on a whole [`Fragment`](crate::fragment::Fragment)
//! at once, synchronously, and never allocates per sample. Operations that
//! need more room grow the fragment; nothing shrinks it.

pub mod amplitude;
pub mod codec;
pub mod envelope;
pub mod filter;
pub mod level;
pub mod mixer;
pub mod oscillator;
pub mod reverb;
