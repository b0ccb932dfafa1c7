//! Log-space factorial and falling-factorial building blocks.
//!
//! Everything here works on logarithms: the quantities involved (`d!`,
//! `d!/(d-n)!`, `d^n`) overflow any fixed representation long before the
//! problem sizes of interest are reached.

use rug::{Float, Integer};

use crate::context::PrecisionCtx;
use crate::decimal::Consts;

/// ln(n! / (n - m)!) by direct summation of ln over the falling factorial's
/// terms.
///
/// `n` and `m` must be integer-valued with `0 <= m <= n`. Cost grows linearly
/// with `m`, which is why only the exact method uses this.
pub fn falling_factorial_ln_naive(ctx: &PrecisionCtx, n: &Float, m: &Float) -> Float {
    let mut acc = ctx.float(0);
    let mut i: Integer = n.clone().trunc().to_integer().unwrap_or_default();
    let stop = i.clone() - m.clone().trunc().to_integer().unwrap_or_default();
    while i > stop {
        acc += ctx.float(&i).ln();
        i -= 1;
    }
    acc
}

/// ln(n! / (n - m)!) with both factorials taken through Stirling's formula.
pub fn falling_factorial_ln(
    ctx: &PrecisionCtx,
    consts: &Consts,
    n: &Float,
    n_ln: &Float,
    m: &Float,
) -> Float {
    let n_fac = log_factorial(ctx, consts, n, n_ln, false);
    let rest = ctx.float(n - m);
    let rest_ln = rest.clone().ln();
    let rest_fac = log_factorial(ctx, consts, &rest, &rest_ln, false);
    ctx.float(&n_fac - &rest_fac)
}

/// lg(n! / (n - m)!) with both factorials taken through Stirling's formula.
pub fn falling_factorial_log2(
    ctx: &PrecisionCtx,
    consts: &Consts,
    n: &Float,
    n_log2: &Float,
    m: &Float,
) -> Float {
    let n_fac = log_factorial(ctx, consts, n, n_log2, true);
    let rest = ctx.float(n - m);
    let rest_ln = rest.clone().ln();
    let rest_fac_ln = log_factorial(ctx, consts, &rest, &rest_ln, false);
    let rest_fac = ctx.float(&rest_fac_ln / &consts.ln_2);
    ctx.float(&n_fac - &rest_fac)
}

/// log(n!) via Stirling's formula, in base 2 when `base2` is set and base e
/// otherwise. `n_log` must be the log of `n` in the chosen base.
///
/// `n == 0` short-circuits to the multiplicative identity.
pub fn log_factorial(
    ctx: &PrecisionCtx,
    consts: &Consts,
    n: &Float,
    n_log: &Float,
    base2: bool,
) -> Float {
    if n.is_zero() {
        return ctx.float(1);
    }
    if base2 {
        stirling_log2(ctx, consts, n, n_log)
    } else {
        stirling_ln(ctx, consts, n, n_log)
    }
}

/// ln(n!) ~ n(ln n - 1) + (ln 2 + ln pi + ln n) / 2
fn stirling_ln(ctx: &PrecisionCtx, consts: &Consts, n: &Float, n_ln: &Float) -> Float {
    let shifted = ctx.float(n_ln - 1u32);
    let linear = ctx.float(n * &shifted);
    let half = ctx.float(&consts.ln_2 + &consts.ln_pi);
    let half = ctx.float(&half + n_ln);
    let half = ctx.float(0.5f64 * &half);
    ctx.float(&linear + &half)
}

/// lg(n!) ~ n(lg n - lg e) + (1 + lg pi + lg n) / 2
fn stirling_log2(ctx: &PrecisionCtx, consts: &Consts, n: &Float, n_log2: &Float) -> Float {
    let shifted = ctx.float(n_log2 - &consts.log2_e);
    let linear = ctx.float(n * &shifted);
    let half = ctx.float(1u32 + &consts.log2_pi);
    let half = ctx.float(&half + n_log2);
    let half = ctx.float(0.5f64 * &half);
    ctx.float(&linear + &half)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (PrecisionCtx, Consts) {
        let mut ctx = PrecisionCtx::new();
        ctx.adjust(20);
        (ctx, Consts::new())
    }

    #[test]
    fn naive_falling_factorial_matches_direct_product() {
        let (ctx, _) = setup();
        // ln(10 * 9 * 8) = ln(720)
        let got = falling_factorial_ln_naive(&ctx, &ctx.float(10), &ctx.float(3));
        assert!((got.to_f64() - 720f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn naive_falling_factorial_of_zero_terms_is_zero() {
        let (ctx, _) = setup();
        let got = falling_factorial_ln_naive(&ctx, &ctx.float(10), &ctx.float(0));
        assert!(got.is_zero());
    }

    #[test]
    fn stirling_approximates_small_factorials_closely() {
        let (ctx, consts) = setup();
        // 16! = 20922789888000
        let n = ctx.float(16);
        let n_log2 = ctx.float(4);
        let got = log_factorial(&ctx, &consts, &n, &n_log2, true);
        assert!((got.to_f64() - 44.2426).abs() < 1e-2);

        let n_ln = ctx.float(16).ln();
        let got = log_factorial(&ctx, &consts, &n, &n_ln, false);
        assert!((got.to_f64() - 20922789888000f64.ln()).abs() < 1e-2);
    }

    #[test]
    fn zero_factorial_short_circuits_to_one() {
        let (ctx, consts) = setup();
        let zero = ctx.float(0);
        let minus_inf = ctx.float(0).ln();
        let got = log_factorial(&ctx, &consts, &zero, &minus_inf, false);
        assert_eq!(got.to_f64(), 1.0);
    }

    #[test]
    fn stirling_falling_factorial_tracks_the_naive_sum() {
        let (ctx, consts) = setup();
        let n = ctx.float(366);
        let n_ln = ctx.float(366).ln();
        let m = ctx.float(23);
        let naive = falling_factorial_ln_naive(&ctx, &n, &m);
        let stirling = falling_factorial_ln(&ctx, &consts, &n, &n_ln, &m);
        assert!((naive.to_f64() - stirling.to_f64()).abs() < 1e-4);
    }
}
