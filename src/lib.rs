//! # Options-Dashboard: Black-Scholes Pricing, Implied Volatility and Surface Charts
//!
//! `options-dashboard` prices European options with the Black-Scholes closed form,
//! backs implied volatility out of observed prices and renders illustrative
//! volatility and price surfaces as SVG charts.
//!
//! ## Core Features
//!
//! - **Pricing**: Black-Scholes call/put prices with delta, gamma, theta (per day) and vega
//!   (per vol point)
//! - **Implied Volatility**: Brent or Newton root-finding with arbitrage-bound and bracket checks
//! - **Surfaces**: Parametric smile, flat-vol and price grids with CSV export
//! - **Charts**: 3D surface and 2D smile charts written as SVG
//! - **Market Data**: Spot prices and daily history from Yahoo Finance
//!
//! ## Quick Start
//!
//! ```rust
//! use options_dashboard::{default_configs, price_option, solve_implied_vol};
//! use options_dashboard::{MarketQuote, OptionContract, OptionType};
//!
//! let contract = OptionContract::new(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.20)?;
//! let priced = price_option(&contract)?;
//! println!("price {:.4} delta {:.4}", priced.price, priced.greeks.delta);
//!
//! let quote = MarketQuote::new(OptionType::Call, 100.0, 100.0, 1.0, 0.05, priced.price);
//! let iv = solve_implied_vol(&quote, &default_configs::production())?;
//! assert!((iv.implied_vol - 0.20).abs() < 1e-6);
//! # Ok::<(), options_dashboard::OptionsError>(())
//! ```
//!
//! ## Solver Presets
//!
//! The library provides several solver configuration presets:
//! - `production()`: Tight tolerance on the default bracket
//! - `fast()`: Newton iteration for interactive use
//! - `research()`: Maximum precision with a wider bracket
//! - `minimal()`: Quick validation settings

// ================================================================================================
// MODULES
// ================================================================================================

pub mod chart;
pub mod config;
pub mod error;
pub mod market_data;
pub mod models;
pub mod solver;
pub mod surface;

// ================================================================================================
// PUBLIC RE-EXPORTS
// ================================================================================================

// Errors
pub use error::{OptionsError, OptionsResult};

// Contract, quote and result types
pub use models::types::{
    Greeks, ImpliedVolResult, MarketQuote, OptionContract, OptionType, PricingResult,
};

// Black-Scholes pricing
pub use models::bs::{bs_call_price, bs_greeks, bs_price, bs_put_price, price_option};

// Implied volatility
pub use solver::{
    arbitrage_bounds, batch_implied_vol, implied_volatility, read_quotes_csv, solve_implied_vol,
    SolverConfig, SolverMethod,
};

// Surfaces and charts
pub use chart::{render_smile_svg, render_surface_svg, ChartOptions};
pub use surface::{
    build_flat_vol_surface, build_price_surface, build_vol_surface, PriceSurfaceConfig,
    SmileParams, SurfaceConfig, SurfaceGrid, SurfaceKind,
};

// Market data
pub use market_data::{
    realized_volatility, resolve_spot, MarketDataConfig, MarketDataProvider, YahooClient,
};

// Application configuration
pub use config::DashboardConfig;

// ================================================================================================
// DEFAULT CONFIGURATIONS
// ================================================================================================

/// Pre-configured implied-volatility solver settings.
///
/// # Available Configurations
///
/// - [`production()`]: Tight tolerance for reporting
/// - [`fast()`]: Newton iteration for interactive use
/// - [`research()`]: High precision with a wide bracket
/// - [`minimal()`]: Quick validation settings
pub mod default_configs {
    use crate::solver::SolverConfig;

    /// Brent on [0.001, 5.0] with tolerance 1e-11 and up to 200 iterations.
    ///
    /// # Example
    ///
    /// ```rust
    /// use options_dashboard::default_configs;
    ///
    /// let config = default_configs::production();
    /// assert_eq!(config.max_iterations, 200);
    /// ```
    pub fn production() -> SolverConfig {
        SolverConfig::production()
    }

    /// Newton-Raphson from the Brenner-Subrahmanyam guess, tolerance 1e-8, 50 iterations.
    ///
    /// Falls back to Brent if Newton leaves the bracket or stalls.
    pub fn fast() -> SolverConfig {
        SolverConfig::fast()
    }

    /// Brent on [1e-4, 10.0] with tolerance 1e-12 and up to 1,000 iterations.
    ///
    /// Use for deep in- or out-of-the-money quotes whose volatility sits above
    /// the default bracket.
    pub fn research() -> SolverConfig {
        SolverConfig::research()
    }

    /// Tolerance 1e-6 and 30 iterations. Good enough for charts and smoke tests.
    pub fn minimal() -> SolverConfig {
        SolverConfig::minimal()
    }
}

/// Price a set of contracts, sorted by option type then strike.
///
/// Contracts that fail validation are returned with their error so the caller
/// can report them alongside the priced rows.
pub fn price_contracts(
    contracts: Vec<OptionContract>,
) -> Vec<(OptionContract, OptionsResult<PricingResult>)> {
    let mut results: Vec<_> = contracts
        .into_iter()
        .map(|contract| {
            let priced = price_option(&contract);
            (contract, priced)
        })
        .collect();

    results.sort_by(|(a, _), (b, _)| {
        a.option_type
            .is_call()
            .cmp(&b.option_type.is_call())
            .reverse()
            .then(a.strike.total_cmp(&b.strike))
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_contracts_order_and_errors() {
        let contracts = vec![
            OptionContract {
                spot: 100.0,
                strike: 110.0,
                years_to_exp: 0.5,
                rate: 0.03,
                volatility: 0.25,
                option_type: OptionType::Put,
            },
            OptionContract {
                spot: 100.0,
                strike: 105.0,
                years_to_exp: 0.5,
                rate: 0.03,
                volatility: 0.25,
                option_type: OptionType::Call,
            },
            OptionContract {
                spot: 100.0,
                strike: 95.0,
                years_to_exp: 0.0,
                rate: 0.03,
                volatility: 0.25,
                option_type: OptionType::Call,
            },
        ];

        let results = price_contracts(contracts);
        let keys: Vec<(OptionType, f64)> = results
            .iter()
            .map(|(c, _)| (c.option_type, c.strike))
            .collect();
        assert_eq!(
            keys,
            vec![
                (OptionType::Call, 95.0),
                (OptionType::Call, 105.0),
                (OptionType::Put, 110.0)
            ]
        );
        assert!(results[0].1.is_err());
        assert!(results[1].1.is_ok());
        assert!(results[2].1.as_ref().unwrap().price > 8.0);
    }
}
