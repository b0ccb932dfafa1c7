//! `bdayprob` — command-line front end for the generalized birthday problem.

mod format;

use std::collections::BTreeMap;

use clap::Parser;
use miette::{bail, miette, IntoDiagnostic, Result};
use rug::Float;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use bdayprob::{
    normalize_population, normalize_samples, input, CalcMethod, Consts, Population, PrecisionCtx,
    Samples, Solution, SolverError,
};

use crate::format::{
    float_rounded_parts, indented, integral_ceil, integral_rounded_parts, log10_repr_or_empty,
    method_description, method_short_description, parenthesize, percent_from_literal,
    OUTPUT_PRECISION,
};

const LONG_ABOUT: &str = "\
Calculates the generalized birthday problem for arbitrary sizes: either the
probability of at least one non-unique sample among N samples drawn uniformly
at random from a set of D unique items, or the number of samples needed to
reach a given such probability P.

D may also be given as a base-2 exponent (-b), or as the size of a set whose
permutations form the sampled set (-c); the flags compose. All calculations
run at a precision of up to 1000 significant decimal digits.

Examples:
  bdayprob 366 -n 23 -a
  bdayprob 128 -n 64 -b -s -t
  bdayprob 52 -p 0.5 -c";

#[derive(Debug, Parser)]
#[command(
    name = "bdayprob",
    version,
    about = "Generalized birthday problem calculator for arbitrary sizes",
    long_about = LONG_ABOUT
)]
struct Cli {
    /// Input number D: the size of the set we sample from, or a number from
    /// which it is derived (see -b and -c)
    d: String,

    /// Input number N: the number of samples taken; requires at least one of
    /// -e, -s, -t or -a
    #[arg(short = 'n', long = "samples")]
    samples: Option<String>,

    /// Input number P in [0.0, 1.0]: the sought probability of at least one
    /// non-unique sample; the needed number of samples is then approximated
    /// with Taylor series
    #[arg(short = 'p', long = "probability")]
    probability: Option<String>,

    /// Treat inputs D and N as base-2 exponents
    #[arg(short = 'b', long)]
    binary: bool,

    /// Treat input D as the size of a set whose permutations form the set we
    /// sample from (the factorial is approximated with Stirling's formula)
    #[arg(short = 'c', long)]
    combinations: bool,

    /// Calculate the probability with Taylor approximation (only with -n;
    /// suited for extremely large inputs)
    #[arg(short = 't', long)]
    taylor: bool,

    /// Calculate the probability exactly but approximate the factorials with
    /// Stirling's formula (only with -n)
    #[arg(short = 's', long)]
    stirling: bool,

    /// Calculate the probability exactly (only with -n; slow for large N)
    #[arg(short = 'e', long)]
    exact: bool,

    /// Use all methods (equivalent to -e -s -t with -n)
    #[arg(short = 'a', long)]
    all: bool,

    /// Render the results as a JSON object
    #[arg(short = 'j', long)]
    json: bool,

    /// Number of decimals (at most) shown in rendered numbers
    #[arg(long, default_value_t = OUTPUT_PRECISION)]
    prec: u32,
}

#[derive(Debug, Serialize)]
struct Report {
    d: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    n: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    p: Option<String>,
    results: BTreeMap<&'static str, MethodOutcome>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MethodOutcome {
    Value { result: String },
    Failed { error: String },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    validate(&cli)?;
    run(&cli)
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn valid_probability(s: &str) -> bool {
    if let Some(frac) = s.strip_prefix("1.") {
        !frac.is_empty() && frac.bytes().all(|b| b == b'0')
    } else if let Some(frac) = s.strip_prefix("0.") {
        !frac.is_empty() && frac.bytes().all(|b| b.is_ascii_digit())
    } else {
        false
    }
}

fn validate(cli: &Cli) -> Result<()> {
    let any_method = cli.stirling || cli.taylor || cli.exact;
    match (&cli.samples, &cli.probability) {
        (None, None) => bail!("Please provide one of flags -n or -p with corresponding argument."),
        (Some(_), Some(_)) => bail!("Please provide either flag -n or -p, not both."),
        (Some(_), None) if !any_method && !cli.all => {
            bail!("Please set at least one of flags -s, -t, -e or -a together with -n.")
        }
        (None, Some(_)) if any_method => bail!(
            "Flags -s, -t and -e can only be used with flag -n \
             (with flag -p, Taylor approximation is always used)."
        ),
        _ => {}
    }
    if cli.all && any_method {
        bail!("Flag -a implicitly includes -s, -t and -e, which should then not be given.");
    }
    if !all_digits(&cli.d) {
        bail!("Illegal input for D: please provide a non-negative integer with digits only");
    }
    if let Some(n) = &cli.samples {
        if !all_digits(n) {
            bail!("Illegal input for N: please provide a non-negative integer with digits only");
        }
    }
    if let Some(p) = &cli.probability {
        if !valid_probability(p) {
            bail!(
                "Illegal input for P: please provide a non-negative decimal number \
                 in the range [0.0, 1.0]"
            );
        }
    }
    if cli.prec > OUTPUT_PRECISION {
        bail!("Illegal input for prec: please provide an integer number in the range [0, 10]");
    }
    Ok(())
}

fn parse_number(ctx: &PrecisionCtx, s: &str) -> Result<Float> {
    let parsed = Float::parse(s).map_err(|e| miette!("Illegal input '{s}': {e}"))?;
    Ok(ctx.float(parsed))
}

fn run(cli: &Cli) -> Result<()> {
    let ctx = PrecisionCtx::new();
    let consts = Consts::new();

    let d_in = parse_number(&ctx, &cli.d)?;
    input::check_population(&d_in, cli.binary, cli.combinations).map_err(|e| miette!("{e}"))?;
    let pop =
        normalize_population(&ctx, &consts, &d_in, cli.binary, cli.combinations)
            .map_err(|e| miette!("{e}"))?;

    if let Some(p_literal) = &cli.probability {
        let p = parse_number(&ctx, p_literal)?;
        input::check_probability(&p).map_err(|e| miette!("{e}"))?;
        run_inverse(cli, &pop, &p, p_literal)
    } else {
        // validated: -p absent implies -n present
        let n_literal = cli.samples.as_deref().unwrap_or_default();
        let n_in = parse_number(&ctx, n_literal)?;
        input::check_samples(&n_in).map_err(|e| miette!("{e}"))?;
        let samples = normalize_samples(&ctx, &n_in, cli.binary);
        run_forward(cli, &pop, &samples, n_literal)
    }
}

/// The population rendered for a header: `2^...` in binary mode, otherwise
/// the rounded integer with its log10 companion.
fn population_text(cli: &Cli, pop: &Population) -> Result<String> {
    if cli.binary {
        let (prefix, number) = float_rounded_parts(&pop.log, cli.prec);
        Ok(format!("{prefix}2^{number}"))
    } else {
        let d = pop
            .d
            .as_ref()
            .ok_or_else(|| miette!("{}", SolverError::DNeededForMethod))?;
        let (prefix, number) = integral_rounded_parts(d);
        Ok(format!(
            "{prefix}{number}{}",
            parenthesize(&log10_repr_or_empty(d))
        ))
    }
}

/// Percentage text plus log10 companion for a probability result.
fn probability_text(p: &Float, prec: u32) -> (String, String) {
    let percent = bdayprob::decimal::to_percent(p);
    let (prefix, number) = float_rounded_parts(&percent, prec);
    (
        format!("{prefix}{number}%"),
        parenthesize(&log10_repr_or_empty(p)),
    )
}

fn run_forward(cli: &Cli, pop: &Population, samples: &Samples, n_literal: &str) -> Result<()> {
    let d_text = population_text(cli, pop)?;
    let n_text = if cli.binary {
        format!("2^{n_literal}")
    } else {
        let companion = samples
            .n
            .as_ref()
            .map(|n| parenthesize(&log10_repr_or_empty(n)))
            .unwrap_or_default();
        format!("{n_literal}{companion}")
    };

    let requested = [
        (CalcMethod::Exact, cli.exact),
        (CalcMethod::StirlingApprox, cli.stirling),
        (CalcMethod::TaylorApprox, cli.taylor),
    ];
    let mut outcomes: Vec<(CalcMethod, Result<Solution, SolverError>)> = Vec::new();
    for (method, included) in requested {
        if !included && !cli.all {
            continue;
        }
        let res = bdayprob::probability(pop, samples, cli.binary, method);
        let trivial = matches!(&res, Ok(sol) if sol.method == CalcMethod::Trivial);
        outcomes.push((method, res));
        if trivial {
            // a trivial answer is the answer; further methods add nothing
            debug!(%method, "answer is trivial, skipping remaining methods");
            break;
        }
    }

    if cli.json {
        let mut results = BTreeMap::new();
        for (method, res) in &outcomes {
            match res {
                Ok(sol) => {
                    let (percent, companion) = probability_text(&sol.value, cli.prec);
                    results.insert(
                        sol.method.key(),
                        MethodOutcome::Value {
                            result: format!("{percent}{companion}"),
                        },
                    );
                }
                Err(e) => {
                    results.insert(
                        method.key(),
                        MethodOutcome::Failed {
                            error: e.to_string(),
                        },
                    );
                }
            }
        }
        let report = Report {
            d: d_text,
            n: Some(n_text),
            p: None,
            results,
        };
        println!("{}", serde_json::to_string(&report).into_diagnostic()?);
    } else {
        println!(
            "The probability of finding at least one non-unique sample among {n_text} samples, \
             sampled uniformly at random from a set of {d_text} items, is:"
        );
        let mut rows: Vec<(String, String, String)> = Vec::new();
        for (method, res) in &outcomes {
            match res {
                Ok(sol) => {
                    let (percent, companion) = probability_text(&sol.value, cli.prec);
                    let description = parenthesize(method_description(sol.method, false));
                    rows.push((percent, companion, description));
                }
                Err(e) => rows.push((
                    "N/A".into(),
                    String::new(),
                    format!(
                        " (Calculation failed: {e}{})",
                        parenthesize(method_short_description(*method))
                    ),
                )),
            }
        }
        let result_width = rows.iter().map(|r| r.0.chars().count()).max().unwrap_or(0);
        let companion_width = rows.iter().map(|r| r.1.chars().count()).max().unwrap_or(0);
        for (result, companion, trailer) in &rows {
            println!(
                "{}",
                indented(&format!(
                    "{result:<result_width$}{companion:<companion_width$}{trailer}"
                ))
            );
        }
    }
    Ok(())
}

fn run_inverse(cli: &Cli, pop: &Population, p: &Float, p_literal: &str) -> Result<()> {
    let d_text = population_text(cli, pop)?;
    let p_text = format!(
        "{}{}",
        percent_from_literal(p_literal, cli.prec),
        parenthesize(&log10_repr_or_empty(p))
    );

    let res = bdayprob::sample_count(pop, p, cli.binary);

    if cli.json {
        let mut results = BTreeMap::new();
        match &res {
            Ok(sol) => {
                results.insert(
                    sol.method.key(),
                    MethodOutcome::Value {
                        result: sample_count_text(sol, cli),
                    },
                );
            }
            Err(e) => {
                results.insert(
                    CalcMethod::TaylorApprox.key(),
                    MethodOutcome::Failed {
                        error: e.to_string(),
                    },
                );
            }
        }
        let report = Report {
            d: d_text,
            n: None,
            p: Some(p_text),
            results,
        };
        println!("{}", serde_json::to_string(&report).into_diagnostic()?);
    } else {
        println!(
            "The number of samples, sampled uniformly at random from a set of {d_text} items, \
             needed to have at least a {p_text} chance of a non-unique sample is:"
        );
        match &res {
            Ok(sol) => println!(
                "{}",
                indented(&format!(
                    "{}{}",
                    sample_count_text(sol, cli),
                    parenthesize(method_description(sol.method, true))
                ))
            ),
            Err(e) => println!(
                "{}",
                indented(&format!(
                    "N/A (Calculation failed: {e}{})",
                    parenthesize(method_short_description(CalcMethod::TaylorApprox))
                ))
            ),
        }
    }
    Ok(())
}

/// The needed sample count: `2^x` in binary mode, otherwise the ceiling
/// integer (an "at least" count) with its log10 companion.
fn sample_count_text(sol: &Solution, cli: &Cli) -> String {
    if cli.binary {
        let (prefix, number) = float_rounded_parts(&sol.value, cli.prec);
        format!("{prefix}2^{number}")
    } else {
        format!(
            "{}{}",
            integral_ceil(&sol.value),
            parenthesize(&log10_repr_or_empty(&sol.value))
        )
    }
}
