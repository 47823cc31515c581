//! Numeric literal parsing, including scientific notation.
//!
//! Accepted forms:
//!
//! ```text
//! 12        3.5        1e16       1.5E-3
//! 10^16     10^-3      10^{16}
//! 2.5 x 10^19          2.5×10^19  2.5*10^19
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

static DECIMAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("valid decimal regex")
});

static EXPONENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{?([+-]?\d+)\}?$").expect("valid exponent regex"));

/// Parse a numeric literal. Returns `None` for garbled or non-finite input.
pub fn parse_number(text: &str) -> Option<f64> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }

    let literal = match compact.split_once('^') {
        Some((base, exponent)) => {
            let exponent = EXPONENT.captures(exponent)?.get(1)?.as_str();
            let mantissa = match base.strip_suffix("10")? {
                "" => "1",
                prefix => prefix.strip_suffix(|c: char| matches!(c, 'x' | 'X' | '*' | '×'))?,
            };
            format!("{}e{}", mantissa, exponent)
        }
        None => compact,
    };

    if !DECIMAL.is_match(&literal) {
        return None;
    }
    literal.parse::<f64>().ok().filter(|v| v.is_finite())
}
