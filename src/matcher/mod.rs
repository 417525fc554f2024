//! Offset-histogram matching between two fingerprint lists.
//!
//! Joins two [`Fingerprint`] lists on hash equality, bins the resulting time
//! offsets, and reports the dominant offset between them — grounded on
//! `aksiksi-needle`'s `Comparator`, adapted from a longest-common-subsequence
//! frame match to a hash-equality offset histogram.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::fingerprint::Fingerprint;
use crate::util::round_half_away_from_zero;

/// Tunables for [`match_fingerprints`].
#[derive(Debug, Clone, Copy)]
pub struct MatchOptions {
    /// Width of an offset histogram bin, in milliseconds.
    pub bin_size_ms: f64,
    /// Confidence below which a match is flagged low-confidence.
    pub confidence_threshold: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        MatchOptions {
            bin_size_ms: 0.05,
            confidence_threshold: 5,
        }
    }
}

impl From<&Config> for MatchOptions {
    fn from(config: &Config) -> Self {
        MatchOptions {
            bin_size_ms: config.bin_size_ms,
            confidence_threshold: config.confidence_threshold,
        }
    }
}

/// One piece of join evidence supporting the winning offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchDetail {
    pub hash: u32,
    pub time_a_ms: f64,
    pub time_b_ms: f64,
    pub offset_ms: f64,
}

/// Result of matching one fingerprint list against another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// The dominant time offset, in milliseconds: `time_b - time_a`.
    pub offset_ms: f64,
    /// Number of join entries within tolerance of `offset_ms`.
    pub match_count: usize,
    /// `match_count / |A|`, or 0 when `A` is empty.
    pub match_rate: f64,
    /// Histogram count at the winning bin.
    pub confidence: usize,
    /// Evidence entries within tolerance of the winning bin.
    pub matches: Vec<MatchDetail>,
}

/// Matches fingerprint list `a` against `b`, returning the dominant offset
/// between them and the evidence supporting it.
///
/// `a` is typically the short query clip and `b` the longer reference clip;
/// a positive `offset_ms` means `a`'s content appears `offset_ms` later in `b`.
pub fn match_fingerprints(
    a: &[Fingerprint],
    b: &[Fingerprint],
    options: &MatchOptions,
) -> MatchReport {
    if a.is_empty() {
        return MatchReport {
            offset_ms: 0.0,
            match_count: 0,
            match_rate: 0.0,
            confidence: 0,
            matches: Vec::new(),
        };
    }

    // 1. Index B.
    let mut index: HashMap<u32, Vec<f64>> = HashMap::new();
    for fp in b {
        index.entry(fp.hash).or_default().push(fp.time_ms);
    }

    // 2. Join and bin.
    let mut counts: HashMap<i64, usize> = HashMap::new();
    let mut evidence: Vec<(i64, MatchDetail)> = Vec::new();
    for fp_a in a {
        if let Some(times_b) = index.get(&fp_a.hash) {
            for &time_b in times_b {
                let offset = time_b - fp_a.time_ms;
                let bin_index =
                    round_half_away_from_zero(offset / options.bin_size_ms) as i64;
                *counts.entry(bin_index).or_insert(0) += 1;
                evidence.push((
                    bin_index,
                    MatchDetail {
                        hash: fp_a.hash,
                        time_a_ms: fp_a.time_ms,
                        time_b_ms: time_b,
                        offset_ms: offset,
                    },
                ));
            }
        }
    }

    // 3. Peak pick: largest count, ties broken by smallest bin value.
    let mut best_bin: Option<i64> = None;
    let mut best_count = 0usize;
    for (&bin_index, &count) in counts.iter() {
        if count > best_count || (count == best_count && Some(bin_index) < best_bin) {
            best_count = count;
            best_bin = Some(bin_index);
        }
    }
    let best_bin = best_bin.unwrap_or(0);
    let offset_ms = best_bin as f64 * options.bin_size_ms;

    // 4. Evidence selection within tolerance.
    let tolerance = 2.0 * options.bin_size_ms;
    let matches: Vec<MatchDetail> = evidence
        .into_iter()
        .filter(|(_, detail)| (detail.offset_ms - offset_ms).abs() <= tolerance)
        .map(|(_, detail)| detail)
        .collect();
    let match_count = matches.len();

    // 5. Rates.
    let match_rate = match_count as f64 / a.len() as f64;

    MatchReport {
        offset_ms,
        match_count,
        match_rate,
        confidence: best_count,
        matches,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(time_ms: f64, hash: u32) -> Fingerprint {
        Fingerprint { time_ms, hash }
    }

    #[test]
    fn empty_a_short_circuits() {
        let b = vec![fp(0.0, 1), fp(32.0, 2)];
        let report = match_fingerprints(&[], &b, &MatchOptions::default());
        assert_eq!(report.offset_ms, 0.0);
        assert_eq!(report.match_count, 0);
        assert_eq!(report.match_rate, 0.0);
        assert_eq!(report.confidence, 0);
        assert!(report.matches.is_empty());
    }

    #[test]
    fn self_match_has_zero_offset_and_full_confidence() {
        let fps = vec![fp(0.0, 1), fp(32.0, 2), fp(64.0, 3), fp(96.0, 1)];
        let report = match_fingerprints(&fps, &fps, &MatchOptions::default());
        assert_eq!(report.offset_ms, 0.0);
        assert_eq!(report.confidence, fps.len());
        assert_eq!(report.match_count, fps.len());
    }

    #[test]
    fn shifted_reference_recovers_offset() {
        let a = vec![fp(0.0, 1), fp(32.0, 2), fp(64.0, 3), fp(96.0, 4)];
        let shift_ms = 1000.0;
        let b: Vec<Fingerprint> = a
            .iter()
            .map(|f| fp(f.time_ms + shift_ms, f.hash))
            .collect();

        let report = match_fingerprints(&a, &b, &MatchOptions::default());
        assert_eq!(report.offset_ms, shift_ms);
        assert_eq!(report.confidence, a.len());
        assert_eq!(report.match_rate, 1.0);
    }

    #[test]
    fn unrelated_inputs_yield_low_confidence() {
        let a = vec![fp(0.0, 1), fp(32.0, 2), fp(64.0, 3)];
        let b = vec![fp(0.0, 101), fp(32.0, 202), fp(64.0, 303)];
        let options = MatchOptions {
            confidence_threshold: 5,
            ..MatchOptions::default()
        };
        let report = match_fingerprints(&a, &b, &options);
        assert!(report.confidence < options.confidence_threshold);
        assert_eq!(report.match_count, 0);
    }

    #[test]
    fn tie_breaks_to_smallest_bin() {
        let a = vec![fp(0.0, 1)];
        let b = vec![fp(10.0, 1), fp(-10.0, 1)];
        let report = match_fingerprints(&a, &b, &MatchOptions::default());
        assert_eq!(report.offset_ms, -10.0);
    }

    #[test]
    fn sub_millisecond_offsets_survive_the_join() {
        // At STEP=32, SAMPLING_RATE=44100, consecutive frame times differ by
        // 32_000/44100 ms ~= 0.7256 ms: a value that only round-trips through
        // the histogram if time_ms keeps full double precision end-to-end.
        let a = vec![fp(0.725_623_5, 1)];
        let b = vec![fp(1.451_247, 1)];
        let options = MatchOptions {
            bin_size_ms: 0.05,
            ..MatchOptions::default()
        };
        let report = match_fingerprints(&a, &b, &options);
        assert!((report.offset_ms - 0.725_623_5).abs() < 0.05);
    }
}
