//! Number formatting for labels, bars and summaries.
//!
//! These helpers never run `format!` on a float: the wasm build formats through
//! integers only. `NaN` and infinities are spelled out explicitly.

/// Fixed-point rendering with `decimals` digits after the point, like `toFixed`.
pub fn fixed(v: f64, decimals: usize) -> String {
    if v.is_nan() {
        return "NaN".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "Inf" } else { "-Inf" }.to_string();
    }

    let decimals = decimals.min(9);
    let scale = 10_i64.pow(decimals as u32);
    let scaled = (v * scale as f64).round();
    if !scaled.is_finite() || scaled.abs() >= i64::MAX as f64 {
        return if v < 0.0 { "-Inf" } else { "Inf" }.to_string();
    }

    let scaled = scaled as i64;
    let mut out = String::new();
    if scaled < 0 {
        out.push('-');
    }
    let abs = scaled.unsigned_abs();
    out.push_str(&(abs / scale as u64).to_string());
    if decimals > 0 {
        out.push('.');
        let frac = (abs % scale as u64).to_string();
        out.extend(std::iter::repeat('0').take(decimals - frac.len()));
        out.push_str(&frac);
    }
    out
}

/// Whole percent (0..=100) for a fill fraction, as used in bar widths and heights.
pub fn percent(fill: f64) -> u32 {
    if !fill.is_finite() {
        return 0;
    }
    (fill.clamp(0.0, 1.0) * 100.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_matches_to_fixed() {
        assert_eq!(fixed(0.9, 4), "0.9000");
        assert_eq!(fixed(-1.23456, 2), "-1.23");
        assert_eq!(fixed(12.0, 0), "12");
        assert_eq!(fixed(0.00006, 4), "0.0001");
    }

    #[test]
    fn fixed_spells_out_non_finite() {
        assert_eq!(fixed(f64::NAN, 4), "NaN");
        assert_eq!(fixed(f64::INFINITY, 4), "Inf");
        assert_eq!(fixed(f64::NEG_INFINITY, 2), "-Inf");
    }

    #[test]
    fn tiny_negatives_do_not_keep_a_sign() {
        assert_eq!(fixed(-0.00001, 2), "0.00");
    }

    #[test]
    fn percent_clamps() {
        assert_eq!(percent(0.456), 46);
        assert_eq!(percent(1.7), 100);
        assert_eq!(percent(-0.2), 0);
        assert_eq!(percent(f64::NAN), 0);
    }
}
