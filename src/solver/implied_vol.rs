//! Implied-volatility extraction
//!
//! The Black-Scholes price is strictly increasing in σ, so a quote has at most one
//! implied volatility. The solve runs in three stages:
//!
//! 1. model-free no-arbitrage bounds on the observed price,
//! 2. an achievability check on the configured bracket `[vol_lower, vol_upper]`,
//! 3. a bounded 1-D root find (Brent, or Newton-Raphson with a Brent fallback).
//!
//! Every failure is reported as an [`OptionsError`]; the solver never hands back a
//! guess.

use roots::{find_root_brent, find_root_newton_raphson, Convergency};
use std::io::Read;
use tracing::{debug, warn};

use super::config::{SolverConfig, SolverMethod};
use crate::error::{OptionsError, OptionsResult};
use crate::models::bs::{bs_price_raw, d1_d2};
use crate::models::types::{ImpliedVolResult, MarketQuote, OptionType};

/// Convergence criterion shared by both root finders: stop when the pricing error
/// or the step falls under `tolerance`, give up after `max_iterations`.
struct PriceConvergency {
    tolerance: f64,
    max_iterations: usize,
    iterations: usize,
}

impl PriceConvergency {
    fn new(config: &SolverConfig) -> Self {
        Self {
            tolerance: config.tolerance,
            max_iterations: config.max_iterations,
            iterations: 0,
        }
    }
}

impl Convergency<f64> for PriceConvergency {
    fn is_root_found(&mut self, y: f64) -> bool {
        y.abs() < self.tolerance
    }

    fn is_converged(&mut self, x1: f64, x2: f64) -> bool {
        (x1 - x2).abs() < self.tolerance
    }

    fn is_iteration_limit_reached(&mut self, iter: usize) -> bool {
        self.iterations = iter;
        iter >= self.max_iterations
    }
}

/// Model-free price bounds `[lower, upper)` for a European option.
///
/// Call: `max(S - K e^(-rT), 0) <= C < S`. Put: `max(K e^(-rT) - S, 0) <= P < K e^(-rT)`.
pub fn arbitrage_bounds(quote: &MarketQuote) -> (f64, f64) {
    let discounted_strike = quote.strike * quote.discount_factor();
    match quote.option_type {
        OptionType::Call => ((quote.spot - discounted_strike).max(0.0), quote.spot),
        OptionType::Put => ((discounted_strike - quote.spot).max(0.0), discounted_strike),
    }
}

/// Solve for the implied volatility only.
pub fn implied_volatility(quote: &MarketQuote, config: &SolverConfig) -> OptionsResult<f64> {
    solve_implied_vol(quote, config).map(|result| result.implied_vol)
}

/// Solve for the implied volatility and report the repricing error.
pub fn solve_implied_vol(
    quote: &MarketQuote,
    config: &SolverConfig,
) -> OptionsResult<ImpliedVolResult> {
    config.validate()?;
    quote.validate()?;

    let (lower, upper) = arbitrage_bounds(quote);
    if quote.market_price < lower || quote.market_price >= upper {
        return Err(OptionsError::ArbitrageViolation {
            price: quote.market_price,
            lower,
            upper,
        });
    }

    let price_at = |sigma: f64| -> f64 {
        bs_price_raw(
            quote.option_type,
            quote.spot,
            quote.strike,
            quote.rate,
            quote.years_to_exp,
            sigma,
        )
    };
    let objective = |sigma: f64| -> f64 { price_at(sigma) - quote.market_price };

    let f_lower = objective(config.vol_lower);
    let f_upper = objective(config.vol_upper);
    debug!(
        option_type = %quote.option_type,
        strike = quote.strike,
        market_price = quote.market_price,
        f_lower,
        f_upper,
        "implied vol bracket"
    );

    let implied_vol = if f_lower.abs() < config.tolerance {
        config.vol_lower
    } else if f_upper.abs() < config.tolerance {
        config.vol_upper
    } else if f_lower > 0.0 || f_upper < 0.0 {
        let reason = if f_lower > 0.0 {
            format!(
                "observed price {} is below the minimum achievable price {}",
                quote.market_price,
                price_at(config.vol_lower)
            )
        } else {
            format!(
                "observed price {} is above the maximum achievable price {}",
                quote.market_price,
                price_at(config.vol_upper)
            )
        };
        return Err(OptionsError::NoSolution {
            vol_lower: config.vol_lower,
            vol_upper: config.vol_upper,
            reason,
        });
    } else {
        match config.method {
            SolverMethod::Brent => solve_brent(&objective, config)?,
            SolverMethod::Newton => match solve_newton(quote, &objective, config) {
                Some(sigma) => sigma,
                None => {
                    debug!("newton iteration failed, falling back to brent");
                    solve_brent(&objective, config)?
                }
            },
        }
    };

    let theoretical_price = price_at(implied_vol);
    Ok(ImpliedVolResult {
        implied_vol,
        theoretical_price,
        price_difference: (quote.market_price - theoretical_price).abs(),
    })
}

fn solve_brent(objective: &impl Fn(f64) -> f64, config: &SolverConfig) -> OptionsResult<f64> {
    let mut convergency = PriceConvergency::new(config);
    match find_root_brent(config.vol_lower, config.vol_upper, objective, &mut convergency) {
        Ok(sigma) => {
            debug!(sigma, iterations = convergency.iterations, "brent converged");
            Ok(sigma)
        }
        Err(e) => Err(OptionsError::NoConvergence(format!(
            "Brent search failed after {} iterations: {:?}",
            convergency.iterations, e
        ))),
    }
}

/// Newton-Raphson from the Brenner-Subrahmanyam ATM guess. Returns `None` when the
/// iteration fails or an iterate leaves the bracket so the caller can fall back to Brent.
fn solve_newton(
    quote: &MarketQuote,
    objective: &impl Fn(f64) -> f64,
    config: &SolverConfig,
) -> Option<f64> {
    // Zero slope outside the bracket stops the iteration with ZeroDerivative
    let vega = |sigma: f64| -> f64 {
        if sigma < config.vol_lower || sigma > config.vol_upper {
            return 0.0;
        }
        let (d1, _) = d1_d2(
            quote.spot,
            quote.strike,
            quote.rate,
            quote.years_to_exp,
            sigma,
        );
        let pdf_d1 = (-0.5 * d1 * d1).exp() / (2.0 * std::f64::consts::PI).sqrt();
        quote.spot * pdf_d1 * quote.years_to_exp.sqrt()
    };

    let guess = ((2.0 * std::f64::consts::PI / quote.years_to_exp).sqrt() * quote.market_price
        / quote.spot)
        .clamp(config.vol_lower, config.vol_upper);

    let mut convergency = PriceConvergency::new(config);
    match find_root_newton_raphson(guess, objective, vega, &mut convergency) {
        Ok(sigma)
            if sigma >= config.vol_lower
                && sigma <= config.vol_upper
                && objective(sigma).abs() < config.tolerance.max(1e-8) =>
        {
            debug!(sigma, iterations = convergency.iterations, "newton converged");
            Some(sigma)
        }
        Ok(sigma) => {
            debug!(sigma, "newton converged outside the bracket");
            None
        }
        Err(e) => {
            debug!(error = ?e, "newton search failed");
            None
        }
    }
}

/// Solve a batch of quotes independently. Failures are logged and returned in place.
pub fn batch_implied_vol(
    quotes: &[MarketQuote],
    config: &SolverConfig,
) -> Vec<OptionsResult<ImpliedVolResult>> {
    quotes
        .iter()
        .map(|quote| {
            let result = solve_implied_vol(quote, config);
            if let Err(ref e) = result {
                warn!(
                    strike = quote.strike,
                    option_type = %quote.option_type,
                    "implied vol failed: {}",
                    e
                );
            }
            result
        })
        .collect()
}

/// Read quotes from CSV with the header
/// `option_type,spot,strike,years_to_exp,rate,market_price`.
///
/// A row that cannot be parsed becomes an `InvalidQuote` error in its slot; the
/// remaining rows are still read.
pub fn read_quotes_csv<R: Read>(reader: R) -> Vec<OptionsResult<MarketQuote>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    reader
        .deserialize::<MarketQuote>()
        .enumerate()
        .map(|(i, row)| {
            row.map_err(|e| {
                let line = e.position().map_or(i as u64 + 2, |p| p.line());
                warn!(line, "unreadable quote row: {}", e);
                OptionsError::invalid_quote(format!("line {}: {}", line, e))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::bs::bs_call_price;

    fn reference_quote(price: f64) -> MarketQuote {
        MarketQuote::new(OptionType::Call, 100.0, 100.0, 1.0, 0.05, price)
    }

    #[test]
    fn test_reference_example() {
        let iv = implied_volatility(&reference_quote(10.45), &SolverConfig::default()).unwrap();
        assert!((iv - 0.20).abs() < 1e-3, "iv {}", iv);
    }

    #[test]
    fn test_round_trip_brent_and_newton() {
        let price = bs_call_price(100.0, 100.0, 0.05, 1.0, 0.2);
        for config in [SolverConfig::default(), SolverConfig::fast()] {
            let result = solve_implied_vol(&reference_quote(price), &config).unwrap();
            assert!((result.implied_vol - 0.2).abs() < 1e-4);
            assert!(result.price_difference < 1e-6);
        }
    }

    #[test]
    fn test_arbitrage_bounds() {
        let (lower, upper) = arbitrage_bounds(&reference_quote(1.0));
        assert!((lower - (100.0 - 100.0 * (-0.05f64).exp())).abs() < 1e-12);
        assert_eq!(upper, 100.0);

        let put = MarketQuote::new(OptionType::Put, 80.0, 100.0, 1.0, 0.0, 25.0);
        let (lower, upper) = arbitrage_bounds(&put);
        assert!((lower - 20.0).abs() < 1e-12);
        assert!((upper - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_price_above_spot_is_arbitrage() {
        let err =
            implied_volatility(&reference_quote(150.0), &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, OptionsError::ArbitrageViolation { .. }));
    }

    #[test]
    fn test_price_below_intrinsic_is_arbitrage() {
        let quote = MarketQuote::new(OptionType::Call, 150.0, 100.0, 1.0, 0.05, 40.0);
        let err = implied_volatility(&quote, &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, OptionsError::ArbitrageViolation { .. }));
    }

    #[test]
    fn test_price_outside_bracket_is_no_solution() {
        // Needs a volatility far above the 5.0 cap
        let price = bs_call_price(100.0, 100.0, 0.05, 1.0, 8.0);
        let err =
            implied_volatility(&reference_quote(price), &SolverConfig::default()).unwrap_err();
        assert!(matches!(err, OptionsError::NoSolution { .. }), "{:?}", err);

        // Same quote solves once the bracket is widened
        let wide = SolverConfig {
            vol_upper: 10.0,
            ..SolverConfig::default()
        };
        let iv = implied_volatility(&reference_quote(price), &wide).unwrap();
        assert!((iv - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_iteration_cap_reports_no_convergence() {
        let config = SolverConfig {
            tolerance: 1e-15,
            max_iterations: 1,
            ..SolverConfig::default()
        };
        let err = implied_volatility(&reference_quote(10.45), &config).unwrap_err();
        assert!(matches!(err, OptionsError::NoConvergence(_)), "{:?}", err);
    }

    #[test]
    fn test_batch_keeps_order_and_failures() {
        let quotes = vec![
            reference_quote(10.45),
            reference_quote(200.0),
            reference_quote(bs_call_price(100.0, 100.0, 0.05, 1.0, 0.35)),
        ];
        let results = batch_implied_vol(&quotes, &SolverConfig::default());
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!((results[2].as_ref().unwrap().implied_vol - 0.35).abs() < 1e-4);
    }

    #[test]
    fn test_newton_leaving_bracket_falls_back_to_brent() {
        // Deep OTM: the first Newton step from the lower edge lands near 0.37
        let price = bs_price_raw(OptionType::Call, 100.0, 150.0, 0.05, 0.25, 0.3);
        let quote = MarketQuote::new(OptionType::Call, 100.0, 150.0, 0.25, 0.05, price);
        let config = SolverConfig {
            method: SolverMethod::Newton,
            vol_lower: 0.25,
            vol_upper: 0.35,
            ..SolverConfig::default()
        };

        let objective =
            |sigma: f64| bs_price_raw(OptionType::Call, 100.0, 150.0, 0.05, 0.25, sigma) - price;
        assert_eq!(solve_newton(&quote, &objective, &config), None);

        let result = solve_implied_vol(&quote, &config).unwrap();
        assert!((result.implied_vol - 0.3).abs() < 1e-8, "{}", result.implied_vol);
        assert!(result.price_difference < 1e-9);
    }

    #[test]
    fn test_newton_iteration_cap_gives_up() {
        let price = bs_call_price(100.0, 100.0, 0.05, 1.0, 0.2);
        let quote = reference_quote(price);
        let config = SolverConfig {
            method: SolverMethod::Newton,
            max_iterations: 1,
            tolerance: 1e-12,
            ..SolverConfig::default()
        };
        let objective = |sigma: f64| bs_call_price(100.0, 100.0, 0.05, 1.0, sigma) - price;
        assert_eq!(solve_newton(&quote, &objective, &config), None);
    }

    #[test]
    fn test_read_quotes_csv_keeps_bad_rows() {
        let csv = "option_type,spot,strike,years_to_exp,rate,market_price\n\
                   Call,100,100,1,0.05,10.45\n\
                   straddle,100,100,1,0.05,10.45\n\
                   P,100,100,1,0.05,5.57\n";
        let rows = read_quotes_csv(csv.as_bytes());
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].as_ref().unwrap().option_type, OptionType::Call);
        assert!(matches!(rows[1], Err(OptionsError::InvalidQuote(_))));
        assert_eq!(rows[2].as_ref().unwrap().option_type, OptionType::Put);
    }
}
