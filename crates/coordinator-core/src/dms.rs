//! Decimal ⇄ degree-minute-second conversion.
//!
//! Conversions work on the absolute value and carry the sign separately, which keeps the
//! floor/modulo steps away from negative-number rounding surprises.

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Latitude,
    Longitude,
}

impl Axis {
    pub fn bounds(self) -> (f64, f64) {
        match self {
            Axis::Latitude => (-90.0, 90.0),
            Axis::Longitude => (-180.0, 180.0),
        }
    }

    pub fn contains(self, value: f64) -> bool {
        let (min, max) = self.bounds();
        (min..=max).contains(&value)
    }

    pub fn hemisphere(self, sign: Sign) -> Hemisphere {
        match (self, sign) {
            (Axis::Latitude, Sign::Positive) => Hemisphere::North,
            (Axis::Latitude, Sign::Negative) => Hemisphere::South,
            (Axis::Longitude, Sign::Positive) => Hemisphere::East,
            (Axis::Longitude, Sign::Negative) => Hemisphere::West,
        }
    }
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::Latitude => f.write_str("latitude"),
            Axis::Longitude => f.write_str("longitude"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Sign {
    #[default]
    Positive,
    Negative,
}

impl Sign {
    /// Zero (including `-0.0`) counts as positive.
    pub fn of(value: f64) -> Self {
        if value < 0.0 {
            Sign::Negative
        } else {
            Sign::Positive
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            Sign::Positive => 1.0,
            Sign::Negative => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hemisphere {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "W")]
    West,
}

impl Hemisphere {
    pub fn letter(self) -> &'static str {
        match self {
            Hemisphere::North => "N",
            Hemisphere::South => "S",
            Hemisphere::East => "E",
            Hemisphere::West => "W",
        }
    }

    /// Parses a cardinal letter, case-insensitively. Surrounding whitespace is ignored.
    pub fn from_letter(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "N" => Some(Hemisphere::North),
            "S" => Some(Hemisphere::South),
            "E" => Some(Hemisphere::East),
            "W" => Some(Hemisphere::West),
            _ => None,
        }
    }

    pub fn axis(self) -> Axis {
        match self {
            Hemisphere::North | Hemisphere::South => Axis::Latitude,
            Hemisphere::East | Hemisphere::West => Axis::Longitude,
        }
    }

    pub fn sign(self) -> Sign {
        match self {
            Hemisphere::North | Hemisphere::East => Sign::Positive,
            Hemisphere::South | Hemisphere::West => Sign::Negative,
        }
    }
}

impl std::fmt::Display for Hemisphere {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.letter())
    }
}

/// A sign-degree-minute-second angle. Components are non-negative; `sign` carries the direction.
///
/// Components are `f64` so user-entered fractional seconds (`21.5″`) survive unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dms {
    pub sign: Sign,
    pub degrees: f64,
    pub minutes: f64,
    pub seconds: f64,
}

impl Dms {
    pub fn new(sign: Sign, degrees: f64, minutes: f64, seconds: f64) -> Self {
        Self {
            sign,
            degrees,
            minutes,
            seconds,
        }
    }

    /// Signed decimal degrees. Full precision, no rounding.
    pub fn to_decimal(&self) -> f64 {
        self.sign.factor() * to_decimal(self.degrees, self.minutes, self.seconds)
    }

    pub fn hemisphere(&self, axis: Axis) -> Hemisphere {
        axis.hemisphere(self.sign)
    }
}

/// Converts decimal degrees to sign-degree-minute-second form.
///
/// Degrees and minutes are floored, seconds are rounded to the nearest integer. A rounded
/// value of 60 seconds carries into the minutes (and 60 minutes into the degrees), which keeps
/// the represented angle identical while never displaying `60″`.
///
/// Returns `None` when the input is NaN or infinite.
pub fn to_dms(decimal: f64) -> Option<Dms> {
    if !decimal.is_finite() {
        return None;
    }

    let sign = Sign::of(decimal);
    let abs = decimal.abs();
    let mut degrees = abs.floor();
    let minutes_full = (abs - degrees) * 60.0;
    let mut minutes = minutes_full.floor();
    let mut seconds = ((minutes_full - minutes) * 60.0).round();

    if seconds >= 60.0 {
        seconds -= 60.0;
        minutes += 1.0;
    }
    if minutes >= 60.0 {
        minutes -= 60.0;
        degrees += 1.0;
    }

    Some(Dms {
        sign,
        degrees,
        minutes,
        seconds,
    })
}

/// `degrees + minutes / 60 + seconds / 3600`, unsigned and unrounded.
pub fn to_decimal(degrees: f64, minutes: f64, seconds: f64) -> f64 {
    degrees + (minutes / 60.0) + (seconds / 3600.0)
}

fn digits_only_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\d]").expect("valid regex"))
}

fn digits_and_dot_regex() -> &'static Regex {
    static RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\d.]").expect("valid regex"))
}

/// Strips everything except ASCII digits (and `.` when `allow_decimal`).
///
/// Tolerates symbols typed into the same field, e.g. `"40°"` or `"21.5″N"`.
pub fn extract_number(text: &str, allow_decimal: bool) -> String {
    let re = if allow_decimal {
        digits_and_dot_regex()
    } else {
        digits_only_regex()
    };
    re.replace_all(text, "").into_owned()
}

/// Parses a DMS component field. An empty field reads as `0`; garbage such as `1.2.3` is `None`.
pub fn parse_component(text: &str, allow_decimal: bool) -> Option<f64> {
    let digits = extract_number(text, allow_decimal);
    if digits.is_empty() {
        return Some(0.0);
    }
    digits.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a decimal-degree text field (`-37.7891`). Empty reads as `0`.
pub fn parse_decimal_field(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Fractional digits in the exact decimal expansion of the smallest subnormal `f64`.
const EXACT_FRACTION_DIGITS: usize = 1074;

/// Formats a decimal-degree value with a fixed number of fractional digits, like JavaScript's
/// `Number.prototype.toFixed`: exact ties round away from zero (`0.015625` → `0.01563`).
///
/// Negative zero prints without a sign.
pub fn format_fixed(value: f64, digits: usize) -> String {
    let value = if value == 0.0 { 0.0 } else { value };
    if !value.is_finite() {
        return format!("{value}");
    }

    // `{:.N}` is exact once N covers the whole binary fraction, so ties are visible as a `5`
    // followed by zeros.
    let precision = EXACT_FRACTION_DIGITS.max(digits + 1);
    let exact = format!("{:.precision$}", value.abs());
    let Some((int_part, fraction)) = exact.split_once('.') else {
        return format!("{value:.digits$}");
    };
    let rest = &fraction[digits..];
    let is_tie = rest.starts_with('5') && rest[1..].bytes().all(|b| b == b'0');
    if !is_tie {
        return format!("{value:.digits$}");
    }

    let mut kept: Vec<u8> = int_part
        .bytes()
        .chain(fraction[..digits].bytes())
        .collect();
    round_up_last_digit(&mut kept);
    let split = kept.len() - digits;

    let mut out = String::with_capacity(kept.len() + 2);
    if value < 0.0 {
        out.push('-');
    }
    out.extend(kept[..split].iter().map(|&b| char::from(b)));
    if digits > 0 {
        out.push('.');
        out.extend(kept[split..].iter().map(|&b| char::from(b)));
    }
    out
}

/// Adds one to a string of ASCII digits, carrying leftwards.
fn round_up_last_digit(digits: &mut Vec<u8>) {
    for d in digits.iter_mut().rev() {
        if *d == b'9' {
            *d = b'0';
        } else {
            *d += 1;
            return;
        }
    }
    digits.insert(0, b'1');
}

/// Formats a number the way JavaScript's `String(number)` does (`40`, `21.5`).
pub fn format_js_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    let mut buf = ryu_js::Buffer::new();
    buf.format(value).to_string()
}
