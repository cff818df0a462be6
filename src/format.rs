//! en-US / USD presentation of asset figures.
//!
//! Currency strings follow the `Intl.NumberFormat("en-US", { style: "currency",
//! currency: "USD" })` conventions, with and without `notation: "compact"`.
//! Rounding works on the shortest decimal representation of the `f64`, half
//! away from zero.

use crate::types::{Asset, DisplayAsset};
use chrono::{DateTime, Utc};

const COMPACT_SUFFIXES: [&str; 5] = ["", "K", "M", "B", "T"];

/// Derives the display record for `asset`. The formatted fields depend only on
/// the raw price, market cap and volume strings.
pub fn format_asset(asset: Asset, fetched_at: DateTime<Utc>) -> DisplayAsset {
    let formatted_price = format_usd(parse_number(asset.price_usd.as_deref()));
    let formatted_market = format_usd_compact(parse_number(asset.market_cap_usd.as_deref()));
    let formatted_volume = format_usd_compact(parse_number(asset.volume_usd24_hr.as_deref()));

    DisplayAsset {
        asset,
        formatted_price,
        formatted_market,
        formatted_volume,
        fetched_at,
    }
}

/// Parses an upstream numeric string the way the web client's `Number()`
/// did: blank is zero, garbage and missing values are NaN.
pub fn parse_number(raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        return f64::NAN;
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    let (negative, unsigned) = match trimmed.as_bytes()[0] {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    if unsigned == "Infinity" {
        return if negative {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    // Rust also accepts "inf" and "nan" spellings, which Number() does not.
    let literal = unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    if !literal {
        return f64::NAN;
    }
    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}

/// Full-precision currency: `$43,250.55`.
pub fn format_usd(value: f64) -> String {
    if let Some(special) = non_finite(value) {
        return special;
    }
    let rounded = Decimal::from_f64(value).round_to_fraction(2);
    let integer = group_thousands(&rounded.integer_digits(), 4);
    let fraction = rounded.fraction_digits(2, 2);
    format!("{}${}.{}", sign(value), integer, fraction)
}

/// Compact currency: `$1.2K`, `$123M`, `$850B`.
pub fn format_usd_compact(value: f64) -> String {
    if let Some(special) = non_finite(value) {
        return special;
    }

    let decimal = Decimal::from_f64(value);
    let mut tier = compact_tier(decimal.magnitude());
    let mut rounded = decimal.shift(-3 * tier as i32).round_compact();
    if rounded.magnitude() >= 3 && tier + 1 < COMPACT_SUFFIXES.len() {
        // 999.95K rounds up into the next suffix.
        tier += 1;
        rounded = decimal.shift(-3 * tier as i32).round_compact();
    }

    let integer = group_thousands(&rounded.integer_digits(), 5);
    let fraction = rounded.fraction_digits(0, usize::MAX);
    let number = if fraction.is_empty() {
        integer
    } else {
        format!("{integer}.{fraction}")
    };
    format!("{}${}{}", sign(value), number, COMPACT_SUFFIXES[tier])
}

/// 24h change rendered with exactly four decimals, like `toFixed(4)`.
pub fn format_change(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        let text = if value > 0.0 { "Infinity" } else { "-Infinity" };
        return text.to_string();
    }
    // toFixed never prints a sign for negative zero.
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{value:.4}")
}

fn non_finite(value: f64) -> Option<String> {
    if value.is_nan() {
        Some("$NaN".to_string())
    } else if value.is_infinite() {
        Some(format!("{}$∞", sign(value)))
    } else {
        None
    }
}

fn sign(value: f64) -> &'static str {
    if value.is_sign_negative() {
        "-"
    } else {
        ""
    }
}

fn compact_tier(magnitude: i32) -> usize {
    if magnitude < 3 {
        0
    } else {
        ((magnitude / 3) as usize).min(COMPACT_SUFFIXES.len() - 1)
    }
}

/// Inserts `,` every three digits once the number has at least `min_digits`
/// integer digits.
fn group_thousands(digits: &str, min_digits: usize) -> String {
    if digits.len() < min_digits {
        return digits.to_string();
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Unsigned decimal `d0.d1d2... × 10^exponent`. No digits means zero.
#[derive(Debug, Clone, PartialEq)]
struct Decimal {
    digits: Vec<u8>,
    exponent: i32,
}

impl Decimal {
    fn from_f64(value: f64) -> Self {
        // `{:e}` yields the shortest round-tripping digits, e.g. "4.325055e4".
        let repr = format!("{:e}", value.abs());
        let (mantissa, exponent) = repr.split_once('e').unwrap_or((repr.as_str(), "0"));
        let digits = mantissa
            .bytes()
            .filter(u8::is_ascii_digit)
            .map(|b| b - b'0')
            .collect();
        Self {
            digits,
            exponent: exponent.parse().unwrap_or(0),
        }
        .normalized()
    }

    fn zero() -> Self {
        Self {
            digits: Vec::new(),
            exponent: 0,
        }
    }

    fn is_zero(&self) -> bool {
        self.digits.is_empty()
    }

    fn normalized(mut self) -> Self {
        while self.digits.last() == Some(&0) {
            self.digits.pop();
        }
        let leading = self.digits.iter().take_while(|&&d| d == 0).count();
        if leading == self.digits.len() {
            return Self::zero();
        }
        self.digits.drain(..leading);
        self.exponent -= leading as i32;
        self
    }

    /// Power of ten of the leading digit; zero counts as magnitude 0.
    fn magnitude(&self) -> i32 {
        if self.is_zero() {
            0
        } else {
            self.exponent
        }
    }

    fn shift(&self, places: i32) -> Self {
        Self {
            digits: self.digits.clone(),
            exponent: self.exponent + places,
        }
    }

    fn round_to_fraction(&self, fraction_digits: i32) -> Self {
        self.round_keeping(self.exponent + 1 + fraction_digits)
    }

    fn round_to_significant(&self, significant: i32) -> Self {
        self.round_keeping(significant)
    }

    /// Two significant digits below ten, whole numbers otherwise.
    fn round_compact(&self) -> Self {
        if self.magnitude() < 1 {
            self.round_to_significant(2)
        } else {
            self.round_to_fraction(0)
        }
    }

    /// Keeps the first `keep` digits, rounding half away from zero.
    fn round_keeping(&self, keep: i32) -> Self {
        if self.is_zero() || keep < 0 {
            return Self::zero();
        }
        let keep = keep as usize;
        if keep >= self.digits.len() {
            return self.clone();
        }

        let round_up = self.digits[keep] >= 5;
        let mut digits = self.digits[..keep].to_vec();
        let mut exponent = self.exponent;
        if round_up {
            let mut i = keep;
            loop {
                if i == 0 {
                    digits.insert(0, 1);
                    exponent += 1;
                    break;
                }
                i -= 1;
                if digits[i] == 9 {
                    digits[i] = 0;
                } else {
                    digits[i] += 1;
                    break;
                }
            }
        }
        Self { digits, exponent }.normalized()
    }

    fn digit_at(&self, power: i32) -> u8 {
        let index = self.exponent - power;
        if index < 0 {
            return 0;
        }
        self.digits.get(index as usize).copied().unwrap_or(0)
    }

    fn integer_digits(&self) -> String {
        if self.is_zero() || self.exponent < 0 {
            return "0".to_string();
        }
        (0..=self.exponent)
            .rev()
            .map(|power| char::from(b'0' + self.digit_at(power)))
            .collect()
    }

    /// Fraction digits padded to `min` and cut at the last significant digit
    /// or `max`, whichever comes first.
    fn fraction_digits(&self, min: usize, max: usize) -> String {
        let significant = if self.is_zero() {
            0
        } else {
            let last_power = self.exponent - (self.digits.len() as i32 - 1);
            (-last_power).max(0) as usize
        };
        let len = significant.clamp(min, max.max(min));
        (1..=len as i32)
            .map(|place| char::from(b'0' + self.digit_at(-place)))
            .collect()
    }
}
