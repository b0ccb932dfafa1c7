use rug::{Assign, Float};

/// Maximum precision, in significant decimal digits, any calculation may
/// request.
pub const MAX_PRECISION: u32 = 1000;

/// Working margin of decimal digits kept to the right of the decimal point.
pub const DECIMAL_PRECISION: u32 = 100;

/// Decimal-digit precision budget for a single solver run.
///
/// A fresh context starts at [`MAX_PRECISION`] digits and is narrowed with
/// [`PrecisionCtx::adjust`] once the magnitudes involved are known. It is
/// created at the top of every solve and threaded explicitly through the
/// arithmetic; no global state is involved.
#[derive(Debug, Clone)]
pub struct PrecisionCtx {
    digits: u32,
}

impl PrecisionCtx {
    pub fn new() -> Self {
        Self {
            digits: MAX_PRECISION,
        }
    }

    /// Narrow the budget to what a number with `integer_digits` digits in its
    /// integer part needs: those digits plus the decimal margin.
    pub fn adjust(&mut self, integer_digits: u32) {
        self.digits = integer_digits.max(1) + DECIMAL_PRECISION;
    }

    /// Whether the current budget exceeds the cap, meaning the pending
    /// calculation must be refused.
    pub fn is_too_precise(&self) -> bool {
        self.digits > MAX_PRECISION
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    /// MPFR bit width equivalent to the current decimal budget.
    pub fn bits(&self) -> u32 {
        digits_to_bits(self.digits)
    }

    /// A new `Float` carrying the context's current precision.
    pub fn float<T>(&self, val: T) -> Float
    where
        Float: Assign<T>,
    {
        Float::with_val(self.bits(), val)
    }
}

impl Default for PrecisionCtx {
    fn default() -> Self {
        Self::new()
    }
}

/// ceil(digits * log2(10)), with log2(10) over-approximated by a rational so
/// the bit width never comes up short.
pub fn digits_to_bits(digits: u32) -> u32 {
    ((u64::from(digits) * 3_321_928_095 + 999_999_999) / 1_000_000_000) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_context_is_at_the_cap() {
        let ctx = PrecisionCtx::new();
        assert_eq!(ctx.digits(), MAX_PRECISION);
        assert!(!ctx.is_too_precise());
    }

    #[test]
    fn adjust_adds_the_decimal_margin() {
        let mut ctx = PrecisionCtx::new();
        ctx.adjust(3);
        assert_eq!(ctx.digits(), 103);
        ctx.adjust(0);
        assert_eq!(ctx.digits(), 101);
    }

    #[test]
    fn too_precise_boundary() {
        let mut ctx = PrecisionCtx::new();
        ctx.adjust(MAX_PRECISION - DECIMAL_PRECISION);
        assert!(!ctx.is_too_precise());
        ctx.adjust(MAX_PRECISION - DECIMAL_PRECISION + 1);
        assert!(ctx.is_too_precise());
    }

    #[test]
    fn digit_to_bit_conversion_rounds_up() {
        // log2(10) ~ 3.3219...
        assert_eq!(digits_to_bits(1), 4);
        assert_eq!(digits_to_bits(10), 34);
        assert_eq!(digits_to_bits(1000), 3322);
    }
}
