//! Number and sentence rendering for the text and JSON reports.
//!
//! All rounding here is presentational: half-up to a bounded number of
//! decimals, with an `≈` prefix whenever the rendered form lost information,
//! plus a complementary one-digit log10 form for values far outside the
//! everyday range.

use bdayprob::CalcMethod;
use rug::{Float, Integer};

/// Decimals shown by default in rendered numbers.
pub const OUTPUT_PRECISION: u32 = 10;

const INDENT: usize = 10;

/// Mantissas are compared in units of 1e-13; ten units make the 1e-12
/// epsilon under which a rounded representation counts as exact.
const ERR_UNITS: u64 = 10;
const MANTISSA_ONE: u64 = 10_000_000_000_000;
const MANTISSA_TEN: u64 = 100_000_000_000_000;

pub fn parenthesize(text: &str) -> String {
    if text.is_empty() {
        String::new()
    } else {
        format!(" ({text})")
    }
}

pub fn indented(text: &str) -> String {
    format!("{:INDENT$}{text}", "")
}

/// `v` scaled by `10^k`, with the power taken as a float at working
/// precision: its rounding error is relative, so the mantissa grid below is
/// unaffected, and exponents in the millions stay cheap.
fn shift_pow10(v: &Float, k: i64, prec: u32) -> Float {
    let exp = u32::try_from(k.unsigned_abs()).unwrap_or(u32::MAX);
    let pow = Float::with_val(prec, Float::u_pow_u(10, exp));
    if k >= 0 {
        Float::with_val(prec, v * &pow)
    } else {
        Float::with_val(prec, v / &pow)
    }
}

/// 14-digit decimal mantissa of `v > 0` in units of 1e-13, and the decimal
/// exponent, normalized so the mantissa stays in [1, 10).
fn decimal_mantissa(v: &Float) -> (u64, i64) {
    let prec = v.prec().max(128);
    let lg = Float::with_val(prec, v.log10_ref()).floor();
    let mut exp10 = lg
        .to_integer()
        .and_then(|i| i.to_i64())
        .unwrap_or_default();
    loop {
        let scaled = shift_pow10(v, -exp10, prec);
        let units = Float::with_val(prec, &scaled * &Integer::from(MANTISSA_ONE));
        let u = Float::with_val(prec, &units + 0.5f64)
            .floor()
            .to_integer()
            .and_then(|i| i.to_u64())
            .unwrap_or_default();
        if u >= MANTISSA_TEN {
            exp10 += 1;
        } else if u < MANTISSA_ONE {
            exp10 -= 1;
        } else {
            return (u, exp10);
        }
    }
}

/// Complementary `=10^9` / `≈6*10^36` form, or empty when `v` sits inside
/// the plainly readable range [1e-2, 1e5] (or is not positive).
pub fn log10_repr_or_empty(v: &Float) -> String {
    if !v.is_finite() || !(*v > 0u32) {
        return String::new();
    }
    let (u, exp10) = decimal_mantissa(v);
    let plainly_readable = (-2..=4).contains(&exp10) || (exp10 == 5 && u == MANTISSA_ONE);
    if plainly_readable {
        return String::new();
    }
    let m = (u + ERR_UNITS + MANTISSA_ONE / 2) / MANTISSA_ONE;
    let (m, exp, equal) = if m == 10 {
        (1, exp10 + 1, u > MANTISSA_TEN - ERR_UNITS)
    } else {
        let diff = (u as i64 - m as i64 * MANTISSA_ONE as i64).unsigned_abs();
        (m, exp10, diff < ERR_UNITS)
    };
    let sign = if equal { "=" } else { "≈" };
    let mantissa = if m != 1 {
        format!("{m}*")
    } else {
        String::new()
    };
    format!("{sign}{mantissa}10^{exp}")
}

/// `f` rendered with at most `prec` decimals (half-up, trailing zeros
/// trimmed), split into an `≈`-or-empty prefix and the number itself.
pub fn float_rounded_parts(f: &Float, prec: u32) -> (&'static str, String) {
    let scale = Integer::from(Integer::u_pow_u(10, prec));
    let work = f.prec() + 64;
    let scaled = Float::with_val(work, f * &scale);
    let exact = scaled.is_integer();
    let rounded = Float::with_val(work, &scaled + 0.5f64)
        .floor()
        .to_integer()
        .unwrap_or_default();
    (if exact { "" } else { "≈" }, decimal_string(&rounded, prec))
}

/// `f` rendered as a half-up rounded integer, `≈`-prefixed when the rounding
/// moved it.
pub fn integral_rounded_parts(f: &Float) -> (&'static str, String) {
    let work = f.prec() + 64;
    let rounded = Float::with_val(work, f + 0.5f64)
        .floor()
        .to_integer()
        .unwrap_or_default();
    let prefix = if *f == rounded { "" } else { "≈" };
    (prefix, rounded.to_string())
}

/// `f` rendered as a ceiling-rounded integer, with no exactness marker;
/// "at least this many" quantities round this way.
pub fn integral_ceil(f: &Float) -> String {
    f.clone()
        .ceil()
        .to_integer()
        .unwrap_or_default()
        .to_string()
}

/// `value / 10^prec` written in plain decimal with trailing zeros trimmed.
fn decimal_string(value: &Integer, prec: u32) -> String {
    let mut digits = value.to_string();
    if prec == 0 {
        return digits;
    }
    let prec = prec as usize;
    if digits.len() <= prec {
        digits = format!("{digits:0>width$}", width = prec + 1);
    }
    let point = digits.len() - prec;
    let (int_part, frac) = digits.split_at(point);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        int_part.to_string()
    } else {
        format!("{int_part}.{frac}")
    }
}

/// A probability literal (`0.d+` or `1.0+`) turned into its percentage,
/// exactly, by moving the decimal point.
fn shift_point_right2(literal: &str) -> String {
    let (int_part, frac) = literal.split_once('.').unwrap_or((literal, ""));
    let mut frac = frac.to_string();
    while frac.len() < 2 {
        frac.push('0');
    }
    let (moved, rest) = frac.split_at(2);
    let int_new = format!("{int_part}{moved}");
    let int_new = int_new.trim_start_matches('0');
    let int_new = if int_new.is_empty() { "0" } else { int_new };
    let rest = rest.trim_end_matches('0');
    if rest.is_empty() {
        int_new.to_string()
    } else {
        format!("{int_new}.{rest}")
    }
}

/// Half-up rounding of a decimal literal to `prec` decimals, staying in
/// decimal arithmetic throughout. Returns whether anything was lost.
fn round_decimal_literal(literal: &str, prec: usize) -> (bool, String) {
    let (int_part, frac) = literal.split_once('.').unwrap_or((literal, ""));
    if frac.len() <= prec {
        let frac = frac.trim_end_matches('0');
        let rendered = if frac.is_empty() {
            int_part.to_string()
        } else {
            format!("{int_part}.{frac}")
        };
        return (false, rendered);
    }
    let (keep, cut) = frac.split_at(prec);
    let mut combined: Integer = format!("{int_part}{keep}").parse().unwrap_or_default();
    if cut.as_bytes()[0] >= b'5' {
        combined += 1;
    }
    let approx = cut.bytes().any(|b| b != b'0');
    (approx, decimal_string(&combined, prec as u32))
}

/// Percentage text for a probability given as a decimal literal, with the
/// exactness judged on the literal rather than on any binary image of it.
pub fn percent_from_literal(p_literal: &str, prec: u32) -> String {
    let (approx, percent) = round_decimal_literal(&shift_point_right2(p_literal), prec as usize);
    let prefix = if approx { "≈" } else { "" };
    format!("{prefix}{percent}%")
}

pub fn method_description(method: CalcMethod, inverse: bool) -> &'static str {
    match method {
        CalcMethod::Exact => "Exact method",
        CalcMethod::TaylorApprox if inverse => {
            "Taylor series approximation used in main calculation"
        }
        CalcMethod::TaylorApprox => {
            "Taylor series approximation used in main calculation \
             (removes need for factorial calculation)"
        }
        CalcMethod::StirlingApprox => "Stirling's approximation used in factorial calculation",
        CalcMethod::Trivial => "Trivial solution",
    }
}

/// Short form used when naming a method inside a failure message.
pub fn method_short_description(method: CalcMethod) -> &'static str {
    match method {
        CalcMethod::Exact => "Exact method",
        CalcMethod::TaylorApprox => "Taylor approximation",
        CalcMethod::StirlingApprox => "Exact method with Stirling's approximation",
        CalcMethod::Trivial => "Trivial solution",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(s: &str) -> Float {
        Float::with_val(3400, Float::parse(s).unwrap())
    }

    fn float_rounded(v: &Float, prec: u32) -> String {
        let (prefix, number) = float_rounded_parts(v, prec);
        format!("{prefix}{number}")
    }

    #[test]
    fn log10_repr_skips_the_readable_range() {
        assert_eq!(log10_repr_or_empty(&f("0.5")), "");
        assert_eq!(log10_repr_or_empty(&f("366")), "");
        assert_eq!(log10_repr_or_empty(&f("0.01")), "");
        assert_eq!(log10_repr_or_empty(&f("100000")), "");
        assert_eq!(log10_repr_or_empty(&f("0")), "");
    }

    #[test]
    fn log10_repr_of_round_powers_uses_the_equality_sign() {
        assert_eq!(log10_repr_or_empty(&f("1000000000")), "=10^9");
        assert_eq!(log10_repr_or_empty(&f("0.0000001")), "=10^-7");
        assert_eq!(log10_repr_or_empty(&f("10000000000000000000")), "=10^19");
    }

    #[test]
    fn log10_repr_rounds_the_mantissa_to_one_digit() {
        assert_eq!(
            log10_repr_or_empty(&f("6274264876827642864872634872364782634")),
            "≈6*10^36"
        );
        assert_eq!(log10_repr_or_empty(&f("20922789888000")), "≈2*10^13");
        assert_eq!(log10_repr_or_empty(&f("262144")), "≈3*10^5");
        assert_eq!(log10_repr_or_empty(&f("0.001649423866")), "≈2*10^-3");
        // a mantissa of one is omitted
        assert_eq!(
            log10_repr_or_empty(&f("10565837726592754214318243269428637")),
            "≈10^34"
        );
    }

    #[test]
    fn log10_repr_handles_extreme_magnitudes() {
        assert_eq!(log10_repr_or_empty(&f("1e1000000")), "=10^1000000");
        assert_eq!(log10_repr_or_empty(&f("2e-2000000")), "=2*10^-2000000");
    }

    #[test]
    fn rounding_marks_lost_information() {
        assert_eq!(float_rounded(&f("50"), 10), "50");
        assert_eq!(float_rounded(&f("0.50632301181949"), 10), "≈0.5063230118");
        assert_eq!(float_rounded(&f("0.5"), 0), "≈1");
    }

    #[test]
    fn rounding_trims_trailing_zeros() {
        assert_eq!(float_rounded(&f("0.25"), 10), "0.25");
        assert_eq!(float_rounded(&f("128"), 10), "128");
    }

    #[test]
    fn integral_rounding_flavours() {
        let (prefix, text) = integral_rounded_parts(&f("366"));
        assert_eq!((prefix, text.as_str()), ("", "366"));
        let (prefix, text) = integral_rounded_parts(&f("366.4"));
        assert_eq!((prefix, text.as_str()), ("≈", "366"));
        assert_eq!(integral_ceil(&f("22.49")), "23");
        assert_eq!(integral_ceil(&f("2")), "2");
    }

    #[test]
    fn percentages_come_from_the_literal_not_its_binary_image() {
        assert_eq!(percent_from_literal("0.1", 10), "10%");
        assert_eq!(percent_from_literal("0.5", 10), "50%");
        assert_eq!(percent_from_literal("1.0", 10), "100%");
        assert_eq!(percent_from_literal("0.0000001", 10), "0.00001%");
        assert_eq!(percent_from_literal("0.123456789012345", 10), "≈12.3456789012%");
    }

    #[test]
    fn indentation_and_parentheses() {
        assert_eq!(indented("x"), "          x");
        assert_eq!(parenthesize(""), "");
        assert_eq!(parenthesize("=10^9"), " (=10^9)");
    }
}
