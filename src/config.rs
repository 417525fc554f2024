use serde::{Deserialize, Serialize};

/// Tunables for the fingerprinter, the matcher, and the surrounding ambient
/// machinery (decoding, caching, verbosity).
///
/// Mirrors the constants table in the fingerprinter design: every field here
/// has a sane default matching the reference parameters, and every field can
/// be overridden independently via the `with_*` builders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Input PCM sample rate in Hz. The caller (decoder) is responsible for
    /// resampling to this rate.
    pub sampling_rate: u32,

    /// Bytes per PCM sample (16-bit signed LE => 2).
    pub bytes_per_sample: u32,

    /// FFT window length.
    pub nfft: usize,

    /// Hop size between consecutive frames (NFFT/2 by default).
    pub step: usize,

    /// Maximum number of peaks kept per frame.
    pub mnlm: usize,

    /// Maximum number of fingerprints emitted per anchor peak.
    pub mppp: usize,

    /// Lower bound (inclusive) of the frequency bin range used for peaks
    /// and pairing.
    pub if_min: usize,

    /// Upper bound (exclusive) of the frequency bin range used for peaks
    /// and pairing.
    pub if_max: usize,

    /// Maximum |Δbin| between paired peaks.
    pub window_df: usize,

    /// Maximum Δframe (past) a pair may span.
    pub window_dt: i64,

    /// Frames of latency before a frame's peaks are finalized.
    pub pruning_dt: i64,

    /// Gaussian mask width scale on the frequency axis.
    pub mask_df: f32,

    /// Per-frame log decrement of the adaptive threshold (should be negative).
    pub mask_decay_log: f32,

    /// Soft cap, in bytes, before the internal sample buffer is compacted.
    pub buffer_soft_cap_bytes: usize,

    /// Matcher offset bin width, in milliseconds.
    pub bin_size_ms: f64,

    /// Matcher confidence threshold below which a match is flagged low-confidence.
    pub confidence_threshold: usize,

    /// Whether to read/write the `<audio_path>.fingerprints.json` cache.
    pub use_cache: bool,

    /// Whether to suppress verbose debug output.
    pub quiet_mode: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sampling_rate: 44_100,
            bytes_per_sample: 2,
            nfft: 64,
            step: 32,
            mnlm: 10,
            mppp: 10,
            if_min: 0,
            if_max: 32,
            window_df: 80,
            window_dt: 120,
            pruning_dt: 32,
            mask_df: 3.0,
            mask_decay_log: 0.99_f32.ln(),
            buffer_soft_cap_bytes: 1_000_000,
            bin_size_ms: 0.05,
            confidence_threshold: 5,
            use_cache: true,
            quiet_mode: true, // Default to quiet mode for clean output
        }
    }
}

impl Config {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sampling rate
    pub fn with_sampling_rate(mut self, sampling_rate: u32) -> Self {
        self.sampling_rate = sampling_rate;
        self
    }

    /// Set the FFT window length
    pub fn with_nfft(mut self, nfft: usize) -> Self {
        self.nfft = nfft;
        self.step = nfft / 2;
        self.if_max = nfft / 2;
        self
    }

    /// Set the max peaks kept per frame
    pub fn with_mnlm(mut self, mnlm: usize) -> Self {
        self.mnlm = mnlm;
        self
    }

    /// Set the max fingerprints emitted per anchor peak
    pub fn with_mppp(mut self, mppp: usize) -> Self {
        self.mppp = mppp;
        self
    }

    /// Set the frequency bin range (exclusive upper bound) used for peaks
    /// and pairing
    pub fn with_if_range(mut self, if_min: usize, if_max: usize) -> Self {
        self.if_min = if_min;
        self.if_max = if_max;
        self
    }

    /// Set the max |Δbin| between paired peaks
    pub fn with_window_df(mut self, window_df: usize) -> Self {
        self.window_df = window_df;
        self
    }

    /// Set the max Δframe a pair may span
    pub fn with_window_dt(mut self, window_dt: i64) -> Self {
        self.window_dt = window_dt;
        self
    }

    /// Set the pruning latency, in frames
    pub fn with_pruning_dt(mut self, pruning_dt: i64) -> Self {
        self.pruning_dt = pruning_dt;
        self
    }

    /// Set the buffer soft cap, in bytes
    pub fn with_buffer_soft_cap_bytes(mut self, cap: usize) -> Self {
        self.buffer_soft_cap_bytes = cap;
        self
    }

    /// Set the matcher's offset bin width, in milliseconds
    pub fn with_bin_size_ms(mut self, bin_size_ms: f64) -> Self {
        self.bin_size_ms = bin_size_ms;
        self
    }

    /// Set the matcher's low-confidence warning threshold
    pub fn with_confidence_threshold(mut self, confidence_threshold: usize) -> Self {
        self.confidence_threshold = confidence_threshold;
        self
    }

    /// Enable or disable the on-disk fingerprint cache
    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Enable or disable quiet mode (suppress verbose output)
    pub fn with_quiet_mode(mut self, quiet: bool) -> Self {
        self.quiet_mode = quiet;
        self
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_spec_constants() {
        let config = Config::default();
        assert_eq!(config.sampling_rate, 44_100);
        assert_eq!(config.nfft, 64);
        assert_eq!(config.step, 32);
        assert_eq!(config.if_min, 0);
        assert_eq!(config.if_max, 32);
        assert_eq!(config.window_dt, 120);
        assert_eq!(config.pruning_dt, 32);
    }

    #[test]
    fn with_nfft_keeps_step_and_if_max_in_sync() {
        let config = Config::default().with_nfft(128);
        assert_eq!(config.step, 64);
        assert_eq!(config.if_max, 64);
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        let config = Config::default().with_confidence_threshold(8);
        config.to_file(path_str).unwrap();

        let loaded = Config::from_file(path_str).unwrap();
        assert_eq!(loaded.confidence_threshold, 8);
    }
}
