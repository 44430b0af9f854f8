//! Market data access
//!
//! [`MarketDataProvider`] is the seam between the pricer and whatever service
//! supplies spot prices. [`yahoo::YahooClient`] is the bundled implementation.
//! Fetches are single-shot: a failure is returned to the caller, never retried.

pub mod yahoo;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OptionsError, OptionsResult};

pub use yahoo::YahooClient;

/// Last traded price of an underlying
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotQuote {
    pub symbol: String,
    pub price: f64,
    pub currency: Option<String>,
    /// Time of the last trade, when the provider reports one
    pub timestamp: Option<DateTime<Utc>>,
}

/// Daily closing price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub close: f64,
}

/// Read-only source of underlying prices
pub trait MarketDataProvider {
    /// Latest price for `symbol`
    fn spot(&self, symbol: &str) -> OptionsResult<SpotQuote>;

    /// Daily closes over `range` (e.g. "5d", "1mo", "1y"), oldest first
    fn history(&self, symbol: &str, range: &str) -> OptionsResult<Vec<PriceBar>>;
}

/// HTTP settings for the market-data provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketDataConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Default history window for realized volatility
    pub history_range: String,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36"
                .to_string(),
            history_range: "3mo".to_string(),
        }
    }
}

/// Latest price of `symbol` from `provider`, checked to be usable as a spot input.
pub fn resolve_spot<P: MarketDataProvider + ?Sized>(
    provider: &P,
    symbol: &str,
) -> OptionsResult<f64> {
    let quote = provider.spot(symbol)?;
    if !(quote.price.is_finite() && quote.price > 0.0) {
        return Err(OptionsError::market_data(format!(
            "{} returned an unusable price: {}",
            symbol, quote.price
        )));
    }
    debug!(symbol, price = quote.price, "spot resolved");
    Ok(quote.price)
}

/// Annualised close-to-close volatility from daily bars.
///
/// Uses the sample standard deviation of log returns scaled by
/// `sqrt(periods_per_year)`. Needs at least three bars with positive closes.
pub fn realized_volatility(bars: &[PriceBar], periods_per_year: f64) -> OptionsResult<f64> {
    if !(periods_per_year.is_finite() && periods_per_year > 0.0) {
        return Err(OptionsError::invalid_config(format!(
            "Periods per year must be positive, got: {}",
            periods_per_year
        )));
    }
    if bars.len() < 3 {
        return Err(OptionsError::market_data(format!(
            "Need at least 3 price bars for realized volatility, got {}",
            bars.len()
        )));
    }
    if let Some(bad) = bars.iter().find(|b| !(b.close.is_finite() && b.close > 0.0)) {
        return Err(OptionsError::market_data(format!(
            "Non-positive close {} on {}",
            bad.close, bad.date
        )));
    }

    let returns: Vec<f64> = bars
        .windows(2)
        .map(|w| (w[1].close / w[0].close).ln())
        .collect();
    let n = returns.len() as f64;
    let mean = returns.iter().sum::<f64>() / n;
    let variance = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);

    Ok((variance * periods_per_year).sqrt())
}
