use rug::{float::Constant, Float};

use crate::context::{digits_to_bits, MAX_PRECISION};

/// Logarithm constants shared by a solver run.
///
/// Computed once per run at the maximum precision; every later narrowing of
/// the budget rounds them down implicitly when they enter an operation.
#[derive(Debug, Clone)]
pub struct Consts {
    /// ln(2)
    pub ln_2: Float,
    /// ln(pi)
    pub ln_pi: Float,
    /// log2(e) = 1 / ln(2)
    pub log2_e: Float,
    /// log2(pi) = ln(pi) / ln(2)
    pub log2_pi: Float,
}

impl Consts {
    pub fn new() -> Self {
        let bits = digits_to_bits(MAX_PRECISION);
        let ln_2 = Float::with_val(bits, Constant::Log2);
        let ln_pi = Float::with_val(bits, Constant::Pi).ln();
        let log2_e = ln_2.clone().recip();
        let log2_pi = Float::with_val(bits, &ln_pi / &ln_2);
        Self {
            ln_2,
            ln_pi,
            log2_e,
            log2_pi,
        }
    }
}

impl Default for Consts {
    fn default() -> Self {
        Self::new()
    }
}

/// A probability as a percentage, at the probability's own precision.
pub fn to_percent(p: &Float) -> Float {
    Float::with_val(p.prec(), 100u32 * p)
}

/// Number of digits in the integer part of `x`, or 0 when |x| < 1 or `x` is
/// not finite.
pub fn integer_part_digits(x: &Float) -> u32 {
    if !x.is_finite() || x.is_zero() {
        return 0;
    }
    let prec = x.prec().max(64);
    let mag = Float::with_val(prec, x.abs_ref());
    if mag < 1u32 {
        return 0;
    }
    let lg = Float::with_val(prec, mag.log10_ref()).floor();
    lg.to_u32_saturating().map_or(0, |v| v + 1)
}
