//! Argument checks and normalization of raw inputs into log-space form.

use rug::Float;
use tracing::debug;

use crate::context::{PrecisionCtx, MAX_PRECISION};
use crate::decimal::{integer_part_digits, Consts};
use crate::error::SolverError;
use crate::factorial::log_factorial;

/// Population half of a normalized problem instance.
///
/// `log` is always available (the solver works in log space); the plain size
/// is `None` when it cannot be represented at the precision cap.
#[derive(Debug, Clone)]
pub struct Population {
    pub d: Option<Float>,
    /// lg(d) in binary mode, ln(d) otherwise.
    pub log: Float,
}

/// Sample-count half of a normalized problem instance, same conventions as
/// [`Population`].
#[derive(Debug, Clone)]
pub struct Samples {
    pub n: Option<Float>,
    pub log: Float,
}

fn illegal(var: &str, detail: &str) -> SolverError {
    SolverError::BadInput(format!("Illegal input for '{var}': {detail}"))
}

/// Check the raw population argument before any derivation happens.
pub fn check_population(
    d_or_dlog: &Float,
    is_binary: bool,
    is_combinations: bool,
) -> Result<(), SolverError> {
    if !d_or_dlog.is_finite() || !d_or_dlog.is_integer() {
        return Err(illegal("D", "please provide an integer"));
    }
    if *d_or_dlog < 0u32 {
        return Err(illegal("D", "please provide a non-negative integer"));
    }
    if d_or_dlog.is_zero() && !is_binary && !is_combinations {
        return Err(illegal(
            "D",
            "please provide a value that results in a non-empty set of unique items to sample from",
        ));
    }
    Ok(())
}

/// Check the raw sample-count argument.
pub fn check_samples(n_or_nlog: &Float) -> Result<(), SolverError> {
    if !n_or_nlog.is_finite() || !n_or_nlog.is_integer() {
        return Err(illegal("N", "please provide an integer"));
    }
    if *n_or_nlog < 0u32 {
        return Err(illegal("N", "please provide a non-negative integer"));
    }
    Ok(())
}

/// Check the raw probability argument.
pub fn check_probability(p: &Float) -> Result<(), SolverError> {
    if !p.is_finite() || *p < 0u32 || *p > 1u32 {
        return Err(illegal(
            "P",
            "please provide a non-negative decimal number in the range [0.0, 1.0]",
        ));
    }
    Ok(())
}

fn finite_or_none(f: Float) -> Option<Float> {
    f.is_finite().then_some(f)
}

/// Derive the population and its log from the raw argument.
///
/// In combinations mode the population is `s!` for the given set size `s`,
/// with the factorial taken through Stirling's formula; composing with binary
/// mode makes the raw argument `lg(s)` and the resulting log base 2.
///
/// Losing `d` to overflow is survivable (methods that need it fail later,
/// individually); losing the log is not, since every calculation starts from
/// it.
pub fn normalize_population(
    ctx: &PrecisionCtx,
    consts: &Consts,
    d_or_dlog: &Float,
    is_binary: bool,
    is_combinations: bool,
) -> Result<Population, SolverError> {
    let (d, log) = if is_combinations {
        if is_binary {
            let s = ctx.float(d_or_dlog.exp2_ref());
            if !s.is_finite() {
                return Err(SolverError::DLogNotCalculated);
            }
            let log = log_factorial(ctx, consts, &s, d_or_dlog, true);
            let d = ctx.float(log.exp2_ref());
            (finite_or_none(d), log)
        } else {
            if d_or_dlog.is_zero() {
                // an empty permutation set has no meaningful log
                return Err(SolverError::DLogNotCalculated);
            }
            let s_ln = ctx.float(d_or_dlog.ln_ref());
            let log = log_factorial(ctx, consts, d_or_dlog, &s_ln, false);
            let d = ctx.float(log.exp_ref());
            (finite_or_none(d), log)
        }
    } else if is_binary {
        let d = ctx.float(d_or_dlog.exp2_ref());
        (finite_or_none(d), ctx.float(d_or_dlog))
    } else {
        let log = ctx.float(d_or_dlog.ln_ref());
        (Some(ctx.float(d_or_dlog)), log)
    };

    if !log.is_finite() || integer_part_digits(&log) > MAX_PRECISION {
        return Err(SolverError::DLogNotCalculated);
    }
    debug!(
        log_digits = integer_part_digits(&log),
        has_plain = d.is_some(),
        "population normalized"
    );
    Ok(Population { d, log })
}

/// Derive the sample count and its log from the raw argument.
pub fn normalize_samples(ctx: &PrecisionCtx, n_or_nlog: &Float, is_binary: bool) -> Samples {
    if is_binary {
        let n = ctx.float(n_or_nlog.exp2_ref());
        Samples {
            n: finite_or_none(n),
            log: ctx.float(n_or_nlog),
        }
    } else {
        // sampling 0 times trivially behaves like sampling once
        let log = if *n_or_nlog > 0u32 {
            ctx.float(n_or_nlog.ln_ref())
        } else {
            ctx.float(0)
        };
        Samples {
            n: Some(ctx.float(n_or_nlog)),
            log,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (PrecisionCtx, Consts) {
        (PrecisionCtx::new(), Consts::new())
    }

    #[test]
    fn rejects_fractional_and_negative_sizes() {
        let ctx = PrecisionCtx::new();
        assert!(matches!(
            check_population(&ctx.float(1.5f64), false, false),
            Err(SolverError::BadInput(_))
        ));
        assert!(matches!(
            check_population(&ctx.float(-3), false, false),
            Err(SolverError::BadInput(_))
        ));
        assert!(matches!(
            check_population(&ctx.float(0), false, false),
            Err(SolverError::BadInput(_))
        ));
        // 0 is acceptable as an exponent: 2^0 is a one-item set
        assert!(check_population(&ctx.float(0), true, false).is_ok());
    }

    #[test]
    fn rejects_out_of_range_probabilities() {
        let ctx = PrecisionCtx::new();
        assert!(check_probability(&ctx.float(0)).is_ok());
        assert!(check_probability(&ctx.float(1)).is_ok());
        assert!(check_probability(&ctx.float(2)).is_err());
        assert!(check_probability(&ctx.float(-0.5f64)).is_err());
    }

    #[test]
    fn plain_population_keeps_both_forms() {
        let (ctx, consts) = setup();
        let pop = normalize_population(&ctx, &consts, &ctx.float(366), false, false).unwrap();
        assert_eq!(pop.d.unwrap().to_f64(), 366.0);
        assert!((pop.log.to_f64() - 366f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn binary_population_exponentiates() {
        let (ctx, consts) = setup();
        let pop = normalize_population(&ctx, &consts, &ctx.float(128), true, false).unwrap();
        assert_eq!(pop.log.to_f64(), 128.0);
        assert!((pop.d.unwrap().to_f64().log2() - 128.0).abs() < 1e-9);
    }

    #[test]
    fn combinations_population_is_the_stirling_factorial() {
        let (ctx, consts) = setup();
        let pop = normalize_population(&ctx, &consts, &ctx.float(16), false, true).unwrap();
        // 16! = 20922789888000; Stirling lands close but not exactly on it
        let d = pop.d.unwrap().to_f64();
        assert!((d / 20922789888000.0 - 1.0).abs() < 1e-2);
    }

    #[test]
    fn combinations_of_empty_set_is_a_hard_failure() {
        let (ctx, consts) = setup();
        assert_eq!(
            normalize_population(&ctx, &consts, &ctx.float(0), false, true).unwrap_err(),
            SolverError::DLogNotCalculated
        );
    }

    #[test]
    fn oversized_binary_combinations_population_loses_its_plain_form() {
        let (ctx, consts) = setup();
        let pop = normalize_population(&ctx, &consts, &ctx.float(128), true, true).unwrap();
        assert!(pop.d.is_none());
        // lg(2^128!) ~ 4.3e40
        assert!(pop.log.to_f64() > 4e40);
    }

    #[test]
    fn zero_samples_collapse_to_one_sample() {
        let ctx = PrecisionCtx::new();
        let s = normalize_samples(&ctx, &ctx.float(0), false);
        assert!(s.log.is_zero());
        assert!(s.n.unwrap().is_zero());
    }
}
