// 🔢 Identifier Normalization - fixed-width codes from loosely typed cells
//
// Every reference table arrives with codes that may have lost their leading
// zeros or picked up a float artefact ("1000.0"). These helpers rebuild the
// fixed-width numeric strings every join key is made of. Malformed input
// never fails: it normalizes to an empty string.

// ============================================================================
// FIELD WIDTHS
// ============================================================================

pub const STATE_WIDTH: usize = 2;
pub const COUNTY_WIDTH: usize = 3;
pub const STATE_COUNTY_WIDTH: usize = 5;
/// CBSA, metropolitan division and CSA codes
pub const CBSA_WIDTH: usize = 5;
pub const PLACE_WIDTH: usize = 5;
pub const STATE_PLACE_WIDTH: usize = 7;
pub const TRACT_SUFFIX_WIDTH: usize = 6;
pub const TRACT_ID_WIDTH: usize = 11;

/// Place code GEOCORR uses for territory outside any place
pub const NOT_A_PLACE: &str = "99999";

// ============================================================================
// HEADERS
// ============================================================================

/// Normalize a column header: uppercase, spaces/hyphens/slashes to `_`,
/// parentheses removed.
///
/// Applied to every input table before any column lookup, so
/// "tract-to-place allocation factor" and "TRACT_TO_PLACE_ALLOCATION_FACTOR"
/// name the same column.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| *c != '(' && *c != ')')
        .map(|c| match c {
            ' ' | '-' | '/' => '_',
            other => other,
        })
        .collect()
}

// ============================================================================
// CODES
// ============================================================================

/// Drop a trailing ".0" left behind by a float-typed export
fn strip_float_suffix(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed.strip_suffix(".0").unwrap_or(trimmed)
}

/// Left-pad with zeros to `width` (never truncates)
pub fn zero_pad(code: &str, width: usize) -> String {
    format!("{:0>width$}", code, width = width)
}

/// Normalize a numeric code to `width` digits, or "" if it is not numeric
pub fn normalize_code(raw: &str, width: usize) -> String {
    let code = strip_float_suffix(raw);
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
        return String::new();
    }
    zero_pad(code, width)
}

/// Normalize a code written with dot separators ("36.51000"): dots removed,
/// zero-padded, then cut to exactly `width` digits.
pub fn normalize_dotted_code(raw: &str, width: usize) -> String {
    let code: String = strip_float_suffix(raw).chars().filter(|c| *c != '.').collect();
    if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
        return String::new();
    }
    zero_pad(&code, width).chars().take(width).collect()
}

/// Rebuild the 6-digit tract suffix from GEOCORR's "tract.fraction" encoding
///
/// `12.34` → `"001234"`, `1.5` → `"000150"`. Anything that is not a finite
/// non-negative number becomes "".
pub fn format_tract(raw: &str) -> String {
    let value = match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => return String::new(),
    };

    let mut whole = value.floor() as u64;
    let mut frac = ((value - value.floor()) * 100.0).round() as u64;
    // 12.999 rounds up into the next whole tract number
    if frac >= 100 {
        whole += 1;
        frac = 0;
    }

    format!("{:04}{:02}", whole, frac)
}

/// Parse a numeric cell; empty, non-numeric and NaN cells become None
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replace(',', "").parse::<f64>().ok().filter(|v| !v.is_nan())
}

/// First `n` characters of a key, or the whole key if shorter
pub fn prefix(key: &str, n: usize) -> &str {
    match key.char_indices().nth(n) {
        Some((idx, _)) => &key[..idx],
        None => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(
            normalize_header("tract-to-place allocation factor"),
            "TRACT_TO_PLACE_ALLOCATION_FACTOR"
        );
        assert_eq!(
            normalize_header("County/County Equivalent"),
            "COUNTY_COUNTY_EQUIVALENT"
        );
        assert_eq!(
            normalize_header(" Total population (2020 Census) "),
            "TOTAL_POPULATION_2020_CENSUS"
        );
    }

    #[test]
    fn test_format_tract_reconstructs_suffix() {
        assert_eq!(format_tract("12.34"), "001234");
        assert_eq!(format_tract("1.5"), "000150");
        assert_eq!(format_tract("9501"), "950100");
        assert_eq!(format_tract("4.07"), "000407");
    }

    #[test]
    fn test_format_tract_malformed_is_empty() {
        assert_eq!(format_tract(""), "");
        assert_eq!(format_tract("tract"), "");
        assert_eq!(format_tract("-1.5"), "");
        assert_eq!(format_tract("NaN"), "");
    }

    #[test]
    fn test_format_tract_carries_rounded_fraction() {
        assert_eq!(format_tract("12.999"), "001300");
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("1000.0", PLACE_WIDTH), "01000");
        assert_eq!(normalize_code("6037", STATE_COUNTY_WIDTH), "06037");
        assert_eq!(normalize_code(" 9 ", STATE_WIDTH), "09");
        assert_eq!(normalize_code("", PLACE_WIDTH), "");
        assert_eq!(normalize_code("nan", PLACE_WIDTH), "");
    }

    #[test]
    fn test_normalize_dotted_code() {
        assert_eq!(normalize_dotted_code("3651000", STATE_PLACE_WIDTH), "3651000");
        assert_eq!(normalize_dotted_code("651000.0", STATE_PLACE_WIDTH), "0651000");
        assert_eq!(normalize_dotted_code("36.51000", STATE_PLACE_WIDTH), "3651000");
        assert_eq!(normalize_dotted_code("36510001", STATE_PLACE_WIDTH), "3651000");
        assert_eq!(normalize_dotted_code("1001020100", TRACT_ID_WIDTH), "01001020100");
        assert_eq!(normalize_dotted_code("n/a", STATE_PLACE_WIDTH), "");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0.75"), Some(0.75));
        assert_eq!(parse_number("1,234"), Some(1234.0));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("n/a"), None);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(prefix("09001010100", 5), "09001");
        assert_eq!(prefix("09", 5), "09");
    }
}
