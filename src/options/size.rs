//! Size Normalization Module
//!
//! Turns byte counts and shorthand size strings ("256M", "1G", "-1") into
//! plain byte counts.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::{OptionsError, Result};
use crate::options::MEMORY_LIMIT;

/// ASCII digits with an optional sign, then an optional unit suffix.
static SHORTHAND_REGEX: LazyLock<Regex> =
    LazyLock::new(|| compile_regex(r"^(-?[0-9]+)[ \t]*([A-Za-z]*)$"));

fn compile_regex(pattern: &str) -> Regex {
    match Regex::new(pattern) {
        Ok(regex) => regex,
        // Covered by `test_shorthand_regex_compiles`
        Err(err) => panic!("invalid regex pattern `{pattern}`: {err}"),
    }
}

// == Size Value ==
/// Input accepted by [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub enum SizeValue {
    /// Already a byte count
    Bytes(i64),
    /// Numeric but not integral; truncated toward zero
    Float(f64),
    /// Numeric string or shorthand size string
    Text(String),
}

impl fmt::Display for SizeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeValue::Bytes(n) => write!(f, "{n}"),
            SizeValue::Float(v) => write!(f, "{v}"),
            SizeValue::Text(s) => write!(f, "{s}"),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for SizeValue {
                fn from(value: $ty) -> Self {
                    SizeValue::Bytes(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for SizeValue {
    fn from(value: f64) -> Self {
        SizeValue::Float(value)
    }
}

impl From<&str> for SizeValue {
    fn from(value: &str) -> Self {
        SizeValue::Text(value.to_string())
    }
}

impl From<String> for SizeValue {
    fn from(value: String) -> Self {
        SizeValue::Text(value)
    }
}

impl TryFrom<&Value> for SizeValue {
    type Error = OptionsError;

    /// Accepts JSON numbers and strings, reporting failures against
    /// `memory_limit`. Other options should use [`SizeValue::from_option_value`].
    fn try_from(value: &Value) -> Result<Self> {
        Self::from_option_value(MEMORY_LIMIT, value)
    }
}

impl SizeValue {
    /// Converts a configuration value into a size, naming `option` on failure.
    pub fn from_option_value(option: &str, value: &Value) -> Result<Self> {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(SizeValue::Bytes(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(SizeValue::Float(f))
                } else {
                    Err(OptionsError::InvalidValue {
                        option: option.to_string(),
                        reason: format!("number {n} is out of range"),
                    })
                }
            }
            Value::String(s) => Ok(SizeValue::Text(s.clone())),
            other => Err(OptionsError::InvalidValue {
                option: option.to_string(),
                reason: format!("expected a number or size string, got {other}"),
            }),
        }
    }
}

// == Unit Exponent ==
/// Power of 1024 applied for a unit suffix: `K` = 1, `M` = 2, `G` = 3.
///
/// Matching is case-insensitive on the whole suffix; anything else, including
/// an empty suffix, means the value is already in bytes.
pub fn unit_exponent(suffix: &str) -> u32 {
    match suffix.to_ascii_uppercase().as_str() {
        "G" => 3,
        "M" => 2,
        "K" => 1,
        _ => 0,
    }
}

// == Normalize ==
/// Normalizes a size into a byte count.
///
/// Numbers pass through unchanged (floats are truncated), so negative and
/// zero byte counts survive. Shorthand strings with a non-positive magnitude
/// collapse to `0` regardless of their suffix.
///
/// # Errors
/// `InvalidArgument` when a string is neither numeric nor
/// digits-plus-suffix, or when the byte count does not fit in an `i64`.
pub fn normalize(value: impl Into<SizeValue>) -> Result<i64> {
    match value.into() {
        SizeValue::Bytes(n) => Ok(n),
        SizeValue::Float(f) => Ok(truncate(f)),
        SizeValue::Text(s) => normalize_str(&s),
    }
}

fn truncate(f: f64) -> i64 {
    // `as` saturates at the i64 bounds and maps NaN to 0
    f.trunc() as i64
}

fn normalize_str(raw: &str) -> Result<i64> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(n);
    }

    // Digit runs never reach the float path, so an oversized one is an error
    if let Some(captures) = SHORTHAND_REGEX.captures(trimmed) {
        return expand_shorthand(raw, &captures[1], &captures[2]);
    }

    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(truncate(f)),
        _ => Err(OptionsError::InvalidArgument(format!(
            "invalid memory limit '{raw}'"
        ))),
    }
}

fn expand_shorthand(raw: &str, digits: &str, suffix: &str) -> Result<i64> {
    let out_of_range =
        || OptionsError::InvalidArgument(format!("memory limit '{raw}' is out of range"));

    let n: i64 = digits.parse().map_err(|_| out_of_range())?;
    if n <= 0 {
        return Ok(0);
    }

    1024_i64
        .checked_pow(unit_exponent(suffix))
        .and_then(|multiplier| n.checked_mul(multiplier))
        .ok_or_else(out_of_range)
}
