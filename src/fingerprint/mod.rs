//! Landmark-based streaming audio fingerprinting.
//!
//! See [`Fingerprinter`] for the streaming entry point and the crate-level
//! design notes for the constellation-hashing algorithm it implements.

mod algorithm;
mod cache;

pub use algorithm::Fingerprinter;
pub use cache::{load_cache, save_cache};

use serde::{Deserialize, Serialize};

/// A single landmark fingerprint: an anchor time and a packed constellation hash.
///
/// `hash` packs three integers: `f_past + (NFFT/2) * (f_anchor + (NFFT/2) * dt)`.
///
/// `time_ms` is a double, not an integer: `t · STEP · 1000 / SAMPLING_RATE`
/// is almost never a whole number of milliseconds (e.g. 0.7256 ms per frame
/// at the default STEP=32, SAMPLING_RATE=44100), and the matcher's
/// `binSize_ms = 0.05` sub-millisecond binning depends on that precision
/// surviving to the join.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fingerprint {
    /// Anchor frame time, in milliseconds.
    #[serde(rename = "time")]
    pub time_ms: f64,
    /// Packed landmark-pair hash.
    pub hash: u32,
}
