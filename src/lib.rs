//! # landmarkprint
//!
//! A streaming landmark audio fingerprinter and offset-histogram matcher,
//! in the style of Shazam's constellation hashing. This library locates
//! where a short query clip occurs inside a longer reference clip.
//!
//! ## Pipeline
//!
//! 1. An external `ffmpeg` process decodes a file to mono 16-bit PCM
//!    ([`audio::Decoder`]).
//! 2. A [`fingerprint::Fingerprinter`] turns the PCM stream into a list of
//!    `(time_ms, hash)` fingerprints.
//! 3. [`matcher::match_fingerprints`] joins two fingerprint lists on hash
//!    equality and reports the dominant time offset between them.
//!
//! ## Example
//!
//! ```rust,no_run
//! use landmarkprint::{Config, fingerprint::Fingerprinter, matcher};
//!
//! let config = Config::default();
//! let mut query = Fingerprinter::new(config.clone());
//! let mut reference = Fingerprinter::new(config.clone());
//!
//! // Feed PCM bytes incrementally, e.g. from a decoder...
//! let query_fp = query.finish();
//! let reference_fp = reference.finish();
//!
//! let options = matcher::MatchOptions::from(&config);
//! let report = matcher::match_fingerprints(&query_fp, &reference_fp, &options);
//! println!("offset: {} ms, confidence: {}", report.offset_ms, report.confidence);
//! ```

pub mod audio;
pub mod config;
pub mod fingerprint;
pub mod matcher;
pub mod output;
mod util;

pub use config::Config;
pub use fingerprint::Fingerprint;
pub use matcher::MatchReport;
pub use output::{MatchOutput, OutputFormat};

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Error types for the library
#[derive(Debug)]
pub enum LandmarkError {
    /// The decoder binary, an input audio file, or a cache file could not be read.
    InputUnavailable(String),
    /// The external decoder process exited with an error.
    DecoderFailure(String),
    /// A fingerprint cache file existed but failed to parse.
    MalformedCache(String),
}

impl std::fmt::Display for LandmarkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LandmarkError::InputUnavailable(msg) => write!(f, "input unavailable: {}", msg),
            LandmarkError::DecoderFailure(msg) => write!(f, "decoder failure: {}", msg),
            LandmarkError::MalformedCache(msg) => write!(f, "malformed cache: {}", msg),
        }
    }
}

impl std::error::Error for LandmarkError {}

/// Result type for the library
pub type Result<T> = std::result::Result<T, LandmarkError>;
