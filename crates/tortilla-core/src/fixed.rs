//! Fixed-point decimal text helpers shared by `Money` and `Quantity`.
//!
//! Both types store an integer count of their smallest unit. These helpers
//! convert between that integer and a plain decimal string without ever
//! going through a float.

/// Parses `"-12.5"` into `-1250` when `places` is 2.
///
/// Accepts an optional sign, digits, and at most `places` fractional digits.
/// Surrounding whitespace is ignored.
pub(crate) fn parse_scaled(input: &str, places: u32) -> Result<i64, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("empty value".to_string());
    }

    let (negative, unsigned) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (whole, frac) = match unsigned.split_once('.') {
        Some((w, f)) => (w, f),
        None => (unsigned, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err("no digits".to_string());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err("not a decimal number".to_string());
    }
    if frac.len() > places as usize {
        return Err(format!("more than {places} decimal places"));
    }

    let scale = 10_i64.pow(places);
    let whole_value: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| "value too large".to_string())?
    };
    let frac_value: i64 = if frac.is_empty() {
        0
    } else {
        // "5" with 3 places means 500
        let padded = format!("{frac:0<width$}", width = places as usize);
        padded.parse().map_err(|_| "not a decimal number".to_string())?
    };

    let magnitude = whole_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac_value))
        .ok_or_else(|| "value too large".to_string())?;

    Ok(if negative { -magnitude } else { magnitude })
}

/// Renders `value` (scaled by `10^places`) with exactly `decimals` fractional
/// digits, rounding half away from zero when `decimals < places`.
pub(crate) fn format_scaled(value: i64, places: u32, decimals: u32) -> String {
    let decimals = decimals.min(places);
    let drop = 10_i64.pow(places - decimals);
    let rounded = round_div(value as i128, drop as i128) as i64;

    let sign = if rounded < 0 { "-" } else { "" };
    let magnitude = rounded.unsigned_abs();
    if decimals == 0 {
        return format!("{sign}{magnitude}");
    }
    let keep = 10_u64.pow(decimals);
    format!(
        "{sign}{}.{:0width$}",
        magnitude / keep,
        magnitude % keep,
        width = decimals as usize
    )
}

/// Integer division rounding half away from zero.
pub(crate) fn round_div(numerator: i128, denominator: i128) -> i128 {
    debug_assert!(denominator > 0);
    let half = denominator / 2;
    if numerator >= 0 {
        (numerator + half) / denominator
    } else {
        (numerator - half) / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scaled() {
        assert_eq!(parse_scaled("37.5", 2), Ok(3750));
        assert_eq!(parse_scaled("37.50", 2), Ok(3750));
        assert_eq!(parse_scaled("40", 2), Ok(4000));
        assert_eq!(parse_scaled(" 2.5 ", 3), Ok(2500));
        assert_eq!(parse_scaled(".5", 3), Ok(500));
        assert_eq!(parse_scaled("-1.25", 2), Ok(-125));
        assert!(parse_scaled("1.234", 2).is_err());
        assert!(parse_scaled("abc", 2).is_err());
        assert!(parse_scaled("1e3", 2).is_err());
        assert!(parse_scaled("", 2).is_err());
        assert!(parse_scaled("-", 2).is_err());
    }

    #[test]
    fn test_format_scaled() {
        assert_eq!(format_scaled(2500, 3, 1), "2.5");
        assert_eq!(format_scaled(3000, 3, 1), "3.0");
        assert_eq!(format_scaled(3000, 3, 0), "3");
        assert_eq!(format_scaled(-125, 2, 2), "-1.25");
        assert_eq!(format_scaled(5, 2, 2), "0.05");
    }

    #[test]
    fn test_round_div_half_away_from_zero() {
        assert_eq!(round_div(5, 10), 1);
        assert_eq!(round_div(4, 10), 0);
        assert_eq!(round_div(-5, 10), -1);
        assert_eq!(round_div(-4, 10), 0);
    }
}
