/// Rounds half away from zero, matching the matcher's determinism requirement
/// (Rust's `f64::round` already rounds half away from zero, but we spell it
/// out since that behavior is load-bearing here rather than incidental).
pub fn round_half_away_from_zero(x: f64) -> f64 {
    if x >= 0.0 {
        (x + 0.5).floor()
    } else {
        (x - 0.5).ceil()
    }
}

/// Formats a millisecond offset as `H:MM:SS.mmm`, for the CLI summary.
pub fn format_offset_ms(offset_ms: i64) -> String {
    let sign = if offset_ms < 0 { "-" } else { "" };
    let total_ms = offset_ms.unsigned_abs();
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let seconds = (total_ms / 1_000) % 60;
    let millis = total_ms % 1_000;
    format!("{}{}:{:02}:{:02}.{:03}", sign, hours, minutes, seconds, millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_half_away_from_zero(2.5), 3.0);
        assert_eq!(round_half_away_from_zero(-2.5), -3.0);
        assert_eq!(round_half_away_from_zero(2.4), 2.0);
        assert_eq!(round_half_away_from_zero(-2.4), -2.0);
    }

    #[test]
    fn formats_offset_as_h_mm_ss_mmm() {
        assert_eq!(format_offset_ms(0), "0:00:00.000");
        assert_eq!(format_offset_ms(1_000), "0:00:01.000");
        assert_eq!(format_offset_ms(3_661_234), "1:01:01.234");
        assert_eq!(format_offset_ms(-1_500), "-0:00:01.500");
    }
}
