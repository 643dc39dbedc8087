//! Fixed-point decimal type.
//!
//! All money amounts, quantities, prices and rates in the ledger use a 1e-6
//! (micros) fixed-point representation stored as `i64`.
//!
//! # Scale
//!
//! `Micros::UNIT` (`1_000_000`) is `1.0`. A price of `0.95` (95% of nominal)
//! is `Micros::new(950_000)`.
//!
//! # Arithmetic
//!
//! - `Add`, `Sub`, `Neg` and their assigning forms behave like `i64`.
//! - `Mul` composes like real multiplication: the raw product is divided by
//!   `UNIT`. The product is computed in `i64` when it fits and in `i128`
//!   otherwise; the operator panics only if the final result is outside `i64`.
//!   [`Micros::checked_mul`] returns `None` instead.
//! - [`Micros::frac`] computes `self * numer / denom` with the same
//!   two-path discipline.

use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// A fixed-point decimal at 1e-6 scale.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Micros(i64);

const UNIT_RAW: i64 = 1_000_000;
const FRAC_DIGITS: usize = 6;

impl Micros {
    pub const ZERO: Micros = Micros(0);
    /// `1.0`
    pub const UNIT: Micros = Micros(UNIT_RAW);
    pub const MAX: Micros = Micros(i64::MAX);
    pub const MIN: Micros = Micros(i64::MIN);

    /// Construct from a raw value already scaled by 1e6.
    #[inline]
    pub const fn new(raw: i64) -> Self {
        Micros(raw)
    }

    /// Construct from a whole number of units (`from_units(3)` is `3.0`).
    ///
    /// # Panics
    /// If `units * 1e6` does not fit in `i64`.
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        match units.checked_mul(UNIT_RAW) {
            Some(raw) => Micros(raw),
            None => panic!("Micros::from_units overflow"),
        }
    }

    #[inline]
    pub const fn raw(self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Absolute value. `Micros::MIN.abs()` saturates to `Micros::MAX`.
    #[inline]
    pub fn abs(self) -> Micros {
        Micros(self.0.saturating_abs())
    }

    #[inline]
    pub fn signum(self) -> i64 {
        self.0.signum()
    }

    #[inline]
    pub fn saturating_add(self, rhs: Micros) -> Micros {
        Micros(self.0.saturating_add(rhs.0))
    }

    #[inline]
    pub fn saturating_sub(self, rhs: Micros) -> Micros {
        Micros(self.0.saturating_sub(rhs.0))
    }

    /// `self * rhs`, or `None` if the result does not fit in 64 bits.
    pub fn checked_mul(self, rhs: Micros) -> Option<Micros> {
        if let Some(p) = self.0.checked_mul(rhs.0) {
            return Some(Micros(p / UNIT_RAW));
        }
        let wide = (self.0 as i128) * (rhs.0 as i128) / (UNIT_RAW as i128);
        i64::try_from(wide).ok().map(Micros)
    }

    /// `self * numer / denom`, or `None` if `denom` is zero or the result
    /// does not fit in 64 bits.
    pub fn checked_frac(self, numer: Micros, denom: Micros) -> Option<Micros> {
        if denom.0 == 0 {
            return None;
        }
        if let Some(p) = self.0.checked_mul(numer.0) {
            // i64::MIN / -1 is the only overflowing quotient.
            return p.checked_div(denom.0).map(Micros);
        }
        let wide = (self.0 as i128) * (numer.0 as i128) / (denom.0 as i128);
        i64::try_from(wide).ok().map(Micros)
    }

    /// `self * numer / denom`.
    ///
    /// # Panics
    /// If `denom` is zero or the result does not fit in 64 bits.
    pub fn frac(self, numer: Micros, denom: Micros) -> Micros {
        assert!(denom.0 != 0, "Micros::frac: zero denominator");
        match self.checked_frac(numer, denom) {
            Some(m) => m,
            None => panic!("Micros::frac overflow: {self} * {numer} / {denom}"),
        }
    }

    /// `self / rhs` in real terms.
    ///
    /// # Panics
    /// If `rhs` is zero or the result does not fit in 64 bits.
    pub fn div(self, rhs: Micros) -> Micros {
        self.frac(Micros::UNIT, rhs)
    }

    /// Integer and fractional parts, both carrying the sign of `self`.
    ///
    /// `Micros::new(-1_500_000).split_frac()` is `(-1, -500_000)`.
    pub fn split_frac(self) -> (i64, i64) {
        (self.0 / UNIT_RAW, self.0 % UNIT_RAW)
    }

    pub fn to_f64(self) -> f64 {
        self.0 as f64 / UNIT_RAW as f64
    }

    /// Round `f` to the nearest micro. Values outside the representable
    /// range saturate; NaN maps to zero.
    pub fn from_f64(f: f64) -> Micros {
        Micros((f * UNIT_RAW as f64).round() as i64)
    }

    /// Format according to a compact spec:
    ///
    /// | Spec     | Meaning                                                   |
    /// |----------|-----------------------------------------------------------|
    /// | `,`/`'`  | group thousands with `,` or `'`                           |
    /// | `.N`     | exactly N decimals (N ≤ 6), rounded half away from zero   |
    /// | `.N-M`   | at least N, at most M decimals                            |
    /// | `%`      | scale by 100 and append `%`                               |
    /// | `()`     | wrap negative values in brackets instead of a minus sign  |
    ///
    /// Without a decimals spec the output uses as many decimals as needed
    /// (0 to 6). Unknown characters are ignored.
    ///
    /// ```
    /// use kto_ledger::Micros;
    /// let m: Micros = "-1234.5".parse().unwrap();
    /// assert_eq!(m.format(",.2()"), "(1,234.50)");
    /// assert_eq!(Micros::new(41_250).format(".2%"), "4.13%");
    /// ```
    pub fn format(self, spec: &str) -> String {
        let opts = FormatOptions::parse(spec);
        opts.render(self)
    }
}

#[derive(Debug, Clone, Copy)]
struct FormatOptions {
    separator: Option<char>,
    min_decimals: usize,
    max_decimals: usize,
    percent: bool,
    brackets: bool,
}

impl FormatOptions {
    fn parse(spec: &str) -> Self {
        let mut opts = FormatOptions {
            separator: None,
            min_decimals: 0,
            max_decimals: FRAC_DIGITS,
            percent: false,
            brackets: false,
        };
        let chars: Vec<char> = spec.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            match chars[i] {
                ',' | '\'' => opts.separator = Some(chars[i]),
                '%' => opts.percent = true,
                '(' | ')' => opts.brackets = true,
                '.' => {
                    let (min, used) = read_digit(&chars, i + 1);
                    i += used;
                    let min = min.unwrap_or(0);
                    opts.min_decimals = min;
                    opts.max_decimals = min;
                    if chars.get(i + 1) == Some(&'-') {
                        let (max, used) = read_digit(&chars, i + 2);
                        if let Some(max) = max {
                            opts.max_decimals = max.max(min);
                            i += 1 + used;
                        }
                    }
                }
                _ => {}
            }
            i += 1;
        }
        opts
    }

    fn render(&self, m: Micros) -> String {
        // Percent scaling keeps micro precision of the scaled value: 10^4
        // raw units per percent point.
        let mut raw = m.0 as i128;
        if self.percent {
            raw *= 100;
        }
        let negative = raw < 0;
        let abs = raw.unsigned_abs();

        let drop = (FRAC_DIGITS - self.max_decimals) as u32;
        let step = 10u128.pow(drop);
        let rounded = (abs + step / 2) / step;
        let scale = 10u128.pow(self.max_decimals as u32);
        let int_part = rounded / scale;
        let mut frac = if self.max_decimals > 0 {
            format!("{:0width$}", rounded % scale, width = self.max_decimals)
        } else {
            String::new()
        };
        while frac.len() > self.min_decimals && frac.ends_with('0') {
            frac.pop();
        }

        let mut digits = group_thousands(&int_part.to_string(), self.separator);
        if !frac.is_empty() {
            digits.push('.');
            digits.push_str(&frac);
        }
        if self.percent {
            digits.push('%');
        }
        let is_zero = int_part == 0 && frac.bytes().all(|b| b == b'0');
        match (negative && !is_zero, self.brackets) {
            (true, true) => format!("({digits})"),
            (true, false) => format!("-{digits}"),
            _ => digits,
        }
    }
}

fn read_digit(chars: &[char], at: usize) -> (Option<usize>, usize) {
    match chars.get(at).and_then(|c| c.to_digit(10)) {
        Some(d) => (Some((d as usize).min(FRAC_DIGITS)), 1),
        None => (None, 0),
    }
}

fn group_thousands(digits: &str, sep: Option<char>) -> String {
    let Some(sep) = sep else {
        return digits.to_string();
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let first = digits.len() % 3;
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - first) % 3 == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

impl Add for Micros {
    type Output = Micros;
    #[inline]
    fn add(self, rhs: Micros) -> Micros {
        Micros(self.0 + rhs.0)
    }
}

impl Sub for Micros {
    type Output = Micros;
    #[inline]
    fn sub(self, rhs: Micros) -> Micros {
        Micros(self.0 - rhs.0)
    }
}

impl Neg for Micros {
    type Output = Micros;
    #[inline]
    fn neg(self) -> Micros {
        Micros(-self.0)
    }
}

impl AddAssign for Micros {
    #[inline]
    fn add_assign(&mut self, rhs: Micros) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Micros {
    #[inline]
    fn sub_assign(&mut self, rhs: Micros) {
        self.0 -= rhs.0;
    }
}

impl Mul for Micros {
    type Output = Micros;

    /// # Panics
    /// If the product does not fit in 64 bits.
    fn mul(self, rhs: Micros) -> Micros {
        match self.checked_mul(rhs) {
            Some(m) => m,
            None => panic!("Micros multiplication overflow: {self} * {rhs}"),
        }
    }
}

impl std::iter::Sum for Micros {
    fn sum<I: Iterator<Item = Micros>>(iter: I) -> Micros {
        iter.fold(Micros::ZERO, |acc, m| acc + m)
    }
}

// ---------------------------------------------------------------------------
// Display / parse
// ---------------------------------------------------------------------------

/// Minimal decimal form: integers without decimals, anything else with two to
/// six decimals (`"1"`, `"20.50"`, `"2.000001"`).
impl fmt::Display for Micros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.unsigned_abs();
        let int_part = abs / UNIT_RAW as u64;
        let frac = abs % UNIT_RAW as u64;
        let sign = if self.0 < 0 { "-" } else { "" };
        if frac == 0 {
            return write!(f, "{sign}{int_part}");
        }
        let mut digits = format!("{frac:06}");
        while digits.len() > 2 && digits.ends_with('0') {
            digits.pop();
        }
        write!(f, "{sign}{int_part}.{digits}")
    }
}

/// Errors from parsing a decimal string into [`Micros`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MicrosParseError {
    #[error("empty decimal string")]
    Empty,
    #[error("invalid decimal: {0:?}")]
    Invalid(String),
    #[error("more than 6 decimal places: {0:?}")]
    TooManyDecimals(String),
    #[error("decimal out of range: {0:?}")]
    OutOfRange(String),
}

impl FromStr for Micros {
    type Err = MicrosParseError;

    /// Accepts an optional sign, integer digits and up to six fractional
    /// digits. No floating point is involved.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(MicrosParseError::Empty);
        }
        let invalid = || MicrosParseError::Invalid(s.to_string());

        let (negative, digits) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };
        let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        let all_digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(int_part) || !all_digits(frac_part) {
            return Err(invalid());
        }
        if frac_part.len() > FRAC_DIGITS {
            return Err(MicrosParseError::TooManyDecimals(s.to_string()));
        }

        // Accumulate in i128 so that i64::MIN round-trips.
        let mut acc: i128 = 0;
        for b in int_part.bytes() {
            acc = acc * 10 + (b - b'0') as i128;
            if acc > (i64::MAX as i128 + 1) {
                return Err(MicrosParseError::OutOfRange(s.to_string()));
            }
        }
        let mut frac: i128 = 0;
        for b in frac_part.bytes() {
            frac = frac * 10 + (b - b'0') as i128;
        }
        frac *= 10i128.pow((FRAC_DIGITS - frac_part.len()) as u32);

        let mut value = acc * UNIT_RAW as i128 + frac;
        if negative {
            value = -value;
        }
        i64::try_from(value)
            .map(Micros)
            .map_err(|_| MicrosParseError::OutOfRange(s.to_string()))
    }
}

impl Serialize for Micros {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Micros {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn m(s: &str) -> Micros {
        s.parse().unwrap()
    }

    #[test]
    fn display_is_minimal() {
        assert_eq!(Micros::from_units(1).to_string(), "1");
        assert_eq!(m("20.5").to_string(), "20.50");
        assert_eq!(m("2.000001").to_string(), "2.000001");
        assert_eq!(m("-0.25").to_string(), "-0.25");
        assert_eq!(Micros::ZERO.to_string(), "0");
    }

    #[test]
    fn display_min_value() {
        assert_eq!(Micros::MIN.to_string(), "-9223372036854.775808");
        assert_eq!(m("-9223372036854.775808"), Micros::MIN);
    }

    #[test]
    fn parse_rejects_malformed() {
        assert_eq!("".parse::<Micros>(), Err(MicrosParseError::Empty));
        assert!(matches!(".".parse::<Micros>(), Err(MicrosParseError::Invalid(_))));
        assert!(matches!("-".parse::<Micros>(), Err(MicrosParseError::Invalid(_))));
        assert!(matches!("1.2.3".parse::<Micros>(), Err(MicrosParseError::Invalid(_))));
        assert!(matches!("1e5".parse::<Micros>(), Err(MicrosParseError::Invalid(_))));
        assert!(matches!(
            "1.0000001".parse::<Micros>(),
            Err(MicrosParseError::TooManyDecimals(_))
        ));
        assert!(matches!(
            "9223372036855".parse::<Micros>(),
            Err(MicrosParseError::OutOfRange(_))
        ));
        assert!(matches!(
            "99999999999999999999999".parse::<Micros>(),
            Err(MicrosParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn parse_accepts_sign_and_partial_forms() {
        assert_eq!(m("+3"), Micros::from_units(3));
        assert_eq!(m(".5"), Micros::new(500_000));
        assert_eq!(m("7."), Micros::from_units(7));
        assert_eq!(m(" 1.25 "), Micros::new(1_250_000));
    }

    #[test]
    fn mul_fast_path() {
        assert_eq!(m("1.5") * m("2"), m("3"));
        assert_eq!(m("10000") * m("0.95"), m("9500"));
        assert_eq!(m("-2") * m("0.5"), m("-1"));
    }

    #[test]
    fn mul_slow_path_when_raw_product_overflows() {
        // raw product 1e13 * 1e9 overflows i64, the scaled result does not.
        let a = Micros::from_units(10_000_000);
        let b = Micros::from_units(1_000);
        assert_eq!(a.checked_mul(b), Some(Micros::from_units(10_000_000_000)));
        assert_eq!(b * a, a * b);
        assert_eq!(a * m("0.001"), Micros::from_units(10_000));
    }

    #[test]
    fn mul_overflow_is_detected() {
        assert_eq!(Micros::MAX.checked_mul(m("2")), None);
    }

    #[test]
    #[should_panic(expected = "overflow")]
    fn mul_operator_panics_on_overflow() {
        let _ = Micros::MAX * m("2");
    }

    #[test]
    fn frac_scales_and_rejects_zero_denominator() {
        assert_eq!(m("90").frac(m("1"), m("3")), m("30"));
        assert_eq!(m("100").checked_frac(m("1"), Micros::ZERO), None);
        assert_eq!(Micros::MAX.frac(m("3"), m("3")), Micros::MAX);
        assert_eq!(m("150").div(m("1.5")), m("100"));
    }

    #[test]
    fn split_frac_keeps_sign() {
        assert_eq!(m("3.25").split_frac(), (3, 250_000));
        assert_eq!(m("-3.25").split_frac(), (-3, -250_000));
        assert_eq!(m("-0.5").split_frac(), (0, -500_000));
        assert_eq!(Micros::MIN.split_frac(), (-9_223_372_036_854, -775_808));
    }

    #[test]
    fn format_fixed_and_grouped() {
        assert_eq!(m("1234567.891").format(",.2"), "1,234,567.89");
        assert_eq!(m("1234567.891").format("'.0"), "1'234'568");
        assert_eq!(m("999.995").format(".2"), "1000.00");
        assert_eq!(m("12").format(".2"), "12.00");
    }

    #[test]
    fn format_range_of_decimals() {
        assert_eq!(m("1.5").format(".2-4"), "1.50");
        assert_eq!(m("1.23456").format(".2-4"), "1.2346");
        assert_eq!(m("1.2").format(""), "1.2");
    }

    #[test]
    fn format_percent_and_brackets() {
        assert_eq!(m("0.04").format(".2%"), "4.00%");
        assert_eq!(m("-0.066344").format(".2%()"), "(6.63%)");
        assert_eq!(m("-1000").format(",.0()"), "(1,000)");
        assert_eq!(m("-0.001").format(".2"), "0.00");
    }

    #[test]
    fn serde_uses_quoted_strings() {
        let json = serde_json::to_string(&m("20.5")).unwrap();
        assert_eq!(json, "\"20.50\"");
        let back: Micros = serde_json::from_str("\"-3.000001\"").unwrap();
        assert_eq!(back, m("-3.000001"));
        assert!(serde_json::from_str::<Micros>("\"abc\"").is_err());
    }

    #[test]
    fn float_conversion_rounds() {
        assert_eq!(Micros::from_f64(0.0663437), Micros::new(66_344));
        assert_eq!(m("2.5").to_f64(), 2.5);
    }
}
