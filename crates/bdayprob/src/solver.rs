//! Forward and inverse drivers for the generalized birthday problem.
//!
//! The forward direction answers "what is the probability of at least one
//! collision among n samples drawn uniformly from d items"; the inverse
//! direction answers "how many samples are needed to reach probability p".
//! All heavy lifting happens in log space at a decimal precision budget
//! derived from the magnitudes involved.

use std::fmt;

use rug::Float;
use tracing::debug;

use crate::context::PrecisionCtx;
use crate::decimal::{integer_part_digits, Consts};
use crate::error::SolverError;
use crate::factorial::{falling_factorial_ln, falling_factorial_ln_naive, falling_factorial_log2};
use crate::input::{self, Population, Samples};

/// Calculation strategies, ordered from most to least exact.
///
/// `Trivial` is an outcome, not a strategy: the drivers return it when the
/// answer needs no calculation, and reject it as an explicit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcMethod {
    Exact,
    StirlingApprox,
    TaylorApprox,
    Trivial,
}

impl CalcMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            CalcMethod::Exact => "Exact",
            CalcMethod::StirlingApprox => "Stirling",
            CalcMethod::TaylorApprox => "Taylor",
            CalcMethod::Trivial => "Trivial",
        }
    }

    /// Lower-case key used in machine-readable reports.
    pub fn key(self) -> &'static str {
        match self {
            CalcMethod::Exact => "exact",
            CalcMethod::StirlingApprox => "stirling",
            CalcMethod::TaylorApprox => "taylor",
            CalcMethod::Trivial => "trivial",
        }
    }
}

impl fmt::Display for CalcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A solved instance: the numeric answer plus the strategy that produced it,
/// which may be [`CalcMethod::Trivial`] regardless of what was asked for.
#[derive(Debug, Clone)]
pub struct Solution {
    pub value: Float,
    pub method: CalcMethod,
}

/// Probability of at least one collision, from raw inputs.
///
/// `d_or_dlog` and `n_or_nlog` are plain sizes, or their base-2 logs when
/// `is_binary` is set; `is_combinations` turns the population into `d!`.
pub fn solve_for_p(
    d_or_dlog: &Float,
    n_or_nlog: &Float,
    is_binary: bool,
    is_combinations: bool,
    method: CalcMethod,
) -> Result<Solution, SolverError> {
    reject_trivial_request(method)?;
    input::check_population(d_or_dlog, is_binary, is_combinations)?;
    input::check_samples(n_or_nlog)?;
    let mut ctx = PrecisionCtx::new();
    let consts = Consts::new();
    let pop = input::normalize_population(&ctx, &consts, d_or_dlog, is_binary, is_combinations)?;
    let samples = input::normalize_samples(&ctx, n_or_nlog, is_binary);
    probability_normalized(&mut ctx, &consts, &pop, &samples, is_binary, method)
}

/// Number of samples needed to reach collision probability `p`, from raw
/// inputs. Beyond the trivial cases this is always the Taylor approximation.
pub fn solve_for_n(
    d_or_dlog: &Float,
    p: &Float,
    is_binary: bool,
    is_combinations: bool,
) -> Result<Solution, SolverError> {
    input::check_population(d_or_dlog, is_binary, is_combinations)?;
    input::check_probability(p)?;
    let mut ctx = PrecisionCtx::new();
    let consts = Consts::new();
    let pop = input::normalize_population(&ctx, &consts, d_or_dlog, is_binary, is_combinations)?;
    sample_count_normalized(&mut ctx, &consts, &pop, p, is_binary)
}

/// Forward driver over an already-normalized instance.
pub fn probability(
    pop: &Population,
    samples: &Samples,
    is_binary: bool,
    method: CalcMethod,
) -> Result<Solution, SolverError> {
    reject_trivial_request(method)?;
    let mut ctx = PrecisionCtx::new();
    let consts = Consts::new();
    probability_normalized(&mut ctx, &consts, pop, samples, is_binary, method)
}

/// Inverse driver over an already-normalized population.
pub fn sample_count(pop: &Population, p: &Float, is_binary: bool) -> Result<Solution, SolverError> {
    input::check_probability(p)?;
    let mut ctx = PrecisionCtx::new();
    let consts = Consts::new();
    sample_count_normalized(&mut ctx, &consts, pop, p, is_binary)
}

fn reject_trivial_request(method: CalcMethod) -> Result<(), SolverError> {
    if method == CalcMethod::Trivial {
        return Err(SolverError::BadInput(
            "Illegal input: the trivial method applies only when the answer needs no \
             calculation and cannot be requested explicitly"
                .into(),
        ));
    }
    Ok(())
}

fn probability_normalized(
    ctx: &mut PrecisionCtx,
    consts: &Consts,
    pop: &Population,
    samples: &Samples,
    is_binary: bool,
    method: CalcMethod,
) -> Result<Solution, SolverError> {
    let fewer_than_two = if is_binary {
        samples.log < 1u32
    } else {
        samples.log < consts.ln_2
    };
    if fewer_than_two {
        // fewer than two samples can never collide
        return Ok(Solution {
            value: ctx.float(0),
            method: CalcMethod::Trivial,
        });
    }
    if samples.log > pop.log {
        // more samples than unique items forces a collision
        return Ok(Solution {
            value: ctx.float(1),
            method: CalcMethod::Trivial,
        });
    }

    ctx.adjust(integer_part_digits(pop.d.as_ref().unwrap_or(&pop.log)));
    debug!(%method, digits = ctx.digits(), "dispatching calculation");

    match method {
        CalcMethod::Exact => {
            let d = pop.d.as_ref().ok_or(SolverError::DNeededForMethod)?;
            let n = samples.n.as_ref().ok_or(SolverError::NNeededForMethod)?;
            if ctx.is_too_precise() {
                return Err(SolverError::TooHighPrecision);
            }
            let d_ln = if is_binary {
                ctx.float(&pop.log / &consts.log2_e)
            } else {
                pop.log.clone()
            };
            let value = probability_exact(ctx, d, &d_ln, n);
            finite(Solution { value, method })
        }
        CalcMethod::StirlingApprox => {
            let d = pop.d.as_ref().ok_or(SolverError::DNeededForMethod)?;
            let n = samples.n.as_ref().ok_or(SolverError::NNeededForMethod)?;
            if ctx.is_too_precise() {
                return Err(SolverError::TooHighPrecision);
            }
            let value = if is_binary {
                probability_stirling_log2(ctx, consts, d, &pop.log, n)
            } else {
                probability_stirling_ln(ctx, consts, d, &pop.log, n)
            };
            finite(Solution { value, method })
        }
        CalcMethod::TaylorApprox => {
            if ctx.is_too_precise() {
                // the log is all this method needs, so retry the budget on it
                ctx.adjust(integer_part_digits(&pop.log));
                debug!(digits = ctx.digits(), "re-adjusted budget from the log");
                if ctx.is_too_precise() {
                    return Err(SolverError::TooHighPrecision);
                }
            }
            let value = if is_binary {
                probability_taylor_log2(ctx, consts, &pop.log, &samples.log)
            } else {
                probability_taylor_ln(ctx, consts, &pop.log, &samples.log)
            };
            finite(Solution { value, method })
        }
        CalcMethod::Trivial => unreachable!("rejected before dispatch"),
    }
}

fn sample_count_normalized(
    ctx: &mut PrecisionCtx,
    consts: &Consts,
    pop: &Population,
    p: &Float,
    is_binary: bool,
) -> Result<Solution, SolverError> {
    if p.is_zero() {
        // a single sample (2^0 in binary form) can never collide
        return Ok(Solution {
            value: if is_binary { ctx.float(0) } else { ctx.float(1) },
            method: CalcMethod::Trivial,
        });
    }
    if *p >= 1u32 {
        // certainty requires exhausting the full set plus one
        let value = match (&pop.d, is_binary) {
            (Some(d), true) => {
                let ln = ctx.float(d + 1u32).ln();
                ctx.float(&ln / &consts.ln_2)
            }
            (Some(d), false) => ctx.float(d + 1u32),
            // adding one to an unrepresentable size changes nothing visible
            (None, _) => pop.log.clone(),
        };
        return Ok(Solution {
            value,
            method: CalcMethod::Trivial,
        });
    }

    ctx.adjust(integer_part_digits(pop.d.as_ref().unwrap_or(&pop.log)));
    if ctx.is_too_precise() {
        ctx.adjust(integer_part_digits(&pop.log));
        if ctx.is_too_precise() {
            return Err(SolverError::TooHighPrecision);
        }
    }
    debug!(digits = ctx.digits(), "dispatching inverse calculation");

    let value = if is_binary {
        let d_ln = ctx.float(&pop.log / &consts.log2_e);
        let n_ln = sample_count_taylor_ln(ctx, consts, &d_ln, p);
        ctx.float(&n_ln / &consts.ln_2)
    } else {
        sample_count_taylor_ln(ctx, consts, &pop.log, p).exp()
    };
    finite(Solution {
        value,
        method: CalcMethod::TaylorApprox,
    })
}

fn finite(sol: Solution) -> Result<Solution, SolverError> {
    if sol.value.is_finite() {
        Ok(sol)
    } else {
        Err(SolverError::Overflow)
    }
}

/// P = 1 - exp(ln(d!/(d-n)!) - n ln d), with the falling factorial summed
/// term by term.
fn probability_exact(ctx: &PrecisionCtx, d: &Float, d_ln: &Float, n: &Float) -> Float {
    let favourable = falling_factorial_ln_naive(ctx, d, n);
    let possible = ctx.float(d_ln * n);
    let compl = ctx.float(&favourable - &possible).exp();
    ctx.float(1u32 - &compl)
}

fn probability_stirling_ln(
    ctx: &PrecisionCtx,
    consts: &Consts,
    d: &Float,
    d_ln: &Float,
    n: &Float,
) -> Float {
    let favourable = falling_factorial_ln(ctx, consts, d, d_ln, n);
    let possible = ctx.float(d_ln * n);
    let compl = ctx.float(&favourable - &possible).exp();
    let prob = ctx.float(1u32 - &compl);
    // the two Stirling terms can cancel into slightly negative territory
    if prob < 0u32 {
        ctx.float(0)
    } else {
        prob
    }
}

fn probability_stirling_log2(
    ctx: &PrecisionCtx,
    consts: &Consts,
    d: &Float,
    d_log2: &Float,
    n: &Float,
) -> Float {
    let favourable = falling_factorial_log2(ctx, consts, d, d_log2, n);
    let possible = ctx.float(d_log2 * n);
    let compl = ctx.float(&favourable - &possible).exp2();
    let prob = ctx.float(1u32 - &compl);
    if prob < 0u32 {
        ctx.float(0)
    } else {
        prob
    }
}

/// P ~ 1 - exp(-e^x) with x = 2 ln n - (ln d + ln 2), the first-order Taylor
/// cut of the falling factorial. Works entirely from logs.
fn probability_taylor_ln(
    ctx: &PrecisionCtx,
    consts: &Consts,
    d_ln: &Float,
    n_ln: &Float,
) -> Float {
    let doubled = ctx.float(2u32 * n_ln);
    let offset = ctx.float(d_ln + &consts.ln_2);
    let neg_compl_ln = ctx.float(&doubled - &offset).exp();
    let compl = ctx.float(-&neg_compl_ln).exp();
    ctx.float(1u32 - &compl)
}

fn probability_taylor_log2(
    ctx: &PrecisionCtx,
    consts: &Consts,
    d_log2: &Float,
    n_log2: &Float,
) -> Float {
    let doubled = ctx.float(2u32 * n_log2);
    let offset = ctx.float(d_log2 + 1u32);
    let neg_compl_ln = ctx.float(&doubled - &offset).exp2();
    let compl = ctx.float(-&neg_compl_ln).exp();
    ctx.float(1u32 - &compl)
}

/// ln n = (ln(-ln(1 - p)) + ln 2 + ln d) / 2, the Taylor cut solved for n.
fn sample_count_taylor_ln(ctx: &PrecisionCtx, consts: &Consts, d_ln: &Float, p: &Float) -> Float {
    let compl_ln = ctx.float(1u32 - p).ln();
    let outer = ctx.float(-&compl_ln).ln();
    let sum = ctx.float(&outer + &consts.ln_2);
    let sum = ctx.float(&sum + d_ln);
    ctx.float(0.5f64 * &sum)
}
