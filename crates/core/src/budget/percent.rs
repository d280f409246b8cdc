//! Percentage math: clamping, tolerant parsing and percent-of-amount rounding.
//!
//! Free-form admin input and remote documents never fail here. Anything that
//! does not parse becomes 0, anything out of range is clamped into [0, 100].

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Fractional digits kept when parsing free-form percentages.
const MAX_FRACTION_DIGITS: usize = 10;

/// Integer digits beyond which a parsed percentage is treated as "huge".
const MAX_INTEGER_DIGITS: usize = 20;

/// A percentage share, always within [0, 100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Percent(Decimal);

impl Percent {
    /// 0%.
    pub const ZERO: Self = Self(Decimal::ZERO);
    /// 100%.
    pub const HUNDRED: Self = Self(Decimal::ONE_HUNDRED);

    /// Creates a percentage, clamping into [0, 100].
    #[must_use]
    pub fn new(value: Decimal) -> Self {
        clamp_percent(value)
    }

    /// Returns the underlying decimal value.
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }

    /// Returns `100 - self`.
    #[must_use]
    pub fn complement(self) -> Self {
        Self(Decimal::ONE_HUNDRED - self.0)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Serialize for Percent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value = self.0.normalize();
        if value.fract().is_zero() {
            serializer.serialize_u64(value.to_u64().unwrap_or_default())
        } else {
            serializer.serialize_f64(value.to_f64().unwrap_or_default())
        }
    }
}

impl<'de> Deserialize<'de> for Percent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Ok(percent_from_json(&raw))
    }
}

/// Anything carrying a percentage share of its parent.
pub trait Weighted {
    /// The node's share of its parent.
    fn percent(&self) -> Percent;
}

/// Bounds `value` to [0, 100].
#[must_use]
pub fn clamp_percent(value: Decimal) -> Percent {
    Percent(value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED))
}

/// Parses free-form percentage input.
///
/// The first comma is read as a decimal separator, every character other than
/// digits and `.` is dropped, and the longest leading `digits[.digits]` run is
/// used. Unparseable input is 0.
#[must_use]
pub fn parse_percent(raw: &str) -> Percent {
    clamp_percent(parse_decimal_prefix(raw))
}

/// Reads a percentage out of an arbitrary JSON value.
///
/// Numbers are used as-is (then clamped), strings go through [`parse_percent`],
/// everything else is 0.
#[must_use]
pub fn percent_from_json(value: &Value) -> Percent {
    match value {
        Value::Number(n) => clamp_percent(number_to_decimal(n)),
        Value::String(s) => parse_percent(s),
        _ => Percent::ZERO,
    }
}

/// Parses a free-form currency total: non-digits are stripped, failure is 0.
#[must_use]
pub fn parse_amount(raw: &str) -> u64 {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse().unwrap_or(0)
}

/// Reads a currency total out of an arbitrary JSON value.
///
/// Negative numbers are 0 and fractional ones round half-up; strings go
/// through [`parse_amount`].
#[must_use]
pub fn amount_from_json(value: &Value) -> u64 {
    match value {
        Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                return v;
            }
            let exact = number_to_decimal(n);
            if exact.is_sign_negative() {
                return 0;
            }
            exact
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_u64()
                .unwrap_or(0)
        }
        Value::String(s) => parse_amount(s),
        _ => 0,
    }
}

/// Share of `total` owned by `pct`, rounded half-up to whole currency units.
///
/// Never exceeds `total`.
#[must_use]
pub fn amount_of(total: u64, pct: Percent) -> u64 {
    let exact = Decimal::from(total)
        .checked_mul(pct.value())
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO);

    exact
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .unwrap_or(0)
        .min(total)
}

/// Sum of the (already clamped) percentages of `items`. Diagnostic only.
#[must_use]
pub fn sum_percent<'a, T, I>(items: I) -> Decimal
where
    T: Weighted + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items.into_iter().map(|item| item.percent().value()).sum()
}

/// Share not yet handed out: `max(0, 100 - sum)`.
#[must_use]
pub fn unallocated_percent(sum: Decimal) -> Decimal {
    (Decimal::ONE_HUNDRED - sum).max(Decimal::ZERO)
}

fn number_to_decimal(n: &serde_json::Number) -> Decimal {
    if let Some(v) = n.as_i64() {
        return Decimal::from(v);
    }
    if let Some(v) = n.as_u64() {
        return Decimal::from(v);
    }
    n.as_f64().and_then(Decimal::from_f64).unwrap_or_else(|| {
        // Only magnitudes beyond Decimal's range land here.
        if n.as_f64().is_some_and(f64::is_sign_negative) {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}

fn parse_decimal_prefix(raw: &str) -> Decimal {
    let normalized = raw.replacen(',', ".", 1);

    let mut integer = String::new();
    let mut fraction = String::new();
    let mut seen_dot = false;

    for c in normalized
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
    {
        match (c, seen_dot) {
            ('.', false) => seen_dot = true,
            ('.', true) => break,
            (d, false) => integer.push(d),
            (d, true) => fraction.push(d),
        }
    }

    let integer = integer.trim_start_matches('0');
    if integer.len() > MAX_INTEGER_DIGITS {
        return Decimal::MAX;
    }
    if integer.is_empty() && fraction.is_empty() {
        return Decimal::ZERO;
    }

    fraction.truncate(MAX_FRACTION_DIGITS);
    let integer = if integer.is_empty() { "0" } else { integer };
    let text = if fraction.is_empty() {
        integer.to_string()
    } else {
        format!("{integer}.{fraction}")
    };

    Decimal::from_str(&text).unwrap_or(Decimal::ZERO)
}
