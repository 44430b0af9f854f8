//! Error types shared by the pricer, the implied-volatility solver, the surface
//! generator and the market-data layer.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Invalid contract: {0}")]
    InvalidContract(String),

    #[error("Invalid quote: {0}")]
    InvalidQuote(String),

    #[error("Arbitrage violation: observed price {price} outside [{lower}, {upper})")]
    ArbitrageViolation { price: f64, lower: f64, upper: f64 },

    #[error("No solution found within bounds [{vol_lower}, {vol_upper}]: {reason}")]
    NoSolution {
        vol_lower: f64,
        vol_upper: f64,
        reason: String,
    },

    #[error("Solver did not converge: {0}")]
    NoConvergence(String),

    #[error("Invalid surface: {0}")]
    InvalidSurface(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Chart error: {0}")]
    Chart(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type OptionsResult<T> = Result<T, OptionsError>;

impl OptionsError {
    pub fn invalid_contract(msg: impl Into<String>) -> Self {
        Self::InvalidContract(msg.into())
    }

    pub fn invalid_quote(msg: impl Into<String>) -> Self {
        Self::InvalidQuote(msg.into())
    }

    pub fn invalid_surface(msg: impl Into<String>) -> Self {
        Self::InvalidSurface(msg.into())
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn market_data(msg: impl Into<String>) -> Self {
        Self::MarketData(msg.into())
    }

    pub fn chart(msg: impl Into<String>) -> Self {
        Self::Chart(msg.into())
    }
}
