//! Yahoo Finance chart endpoint
//!
//! `GET {base_url}/v8/finance/chart/{symbol}?range={range}&interval=1d` returns the
//! regular market price in `meta` and daily closes under `indicators.quote[0]`.
//! Unknown symbols come back as an `error` object, usually with a 404 status.

use chrono::DateTime;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{MarketDataConfig, MarketDataProvider, PriceBar, SpotQuote};
use crate::error::{OptionsError, OptionsResult};

/// Blocking Yahoo Finance client
pub struct YahooClient {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(config: &MarketDataConfig) -> OptionsResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OptionsError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn fetch_chart(&self, symbol: &str, range: &str) -> OptionsResult<ChartData> {
        let url = format!(
            "{}/v8/finance/chart/{}?range={}&interval=1d",
            self.base_url, symbol, range
        );
        debug!(%url, "fetching chart");

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| OptionsError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .map_err(|e| OptionsError::Network(e.to_string()))?;

        match parse_chart_response(symbol, &body) {
            Ok(chart) => Ok(chart),
            // The body carried no usable payload; the status is the more useful message
            Err(OptionsError::MarketData(msg))
                if !status.is_success() && !body.contains("\"error\"") =>
            {
                Err(OptionsError::Network(format!(
                    "HTTP {} for {}: {}",
                    status, symbol, msg
                )))
            }
            Err(e) => Err(e),
        }
    }
}

impl MarketDataProvider for YahooClient {
    fn spot(&self, symbol: &str) -> OptionsResult<SpotQuote> {
        Ok(self.fetch_chart(symbol, "1d")?.quote)
    }

    fn history(&self, symbol: &str, range: &str) -> OptionsResult<Vec<PriceBar>> {
        Ok(self.fetch_chart(symbol, range)?.bars)
    }
}

/// Spot quote and daily bars parsed from one chart response
#[derive(Debug, Clone)]
pub struct ChartData {
    pub quote: SpotQuote,
    pub bars: Vec<PriceBar>,
}

/// Parse a chart payload. Bars with a null close are skipped.
pub fn parse_chart_response(symbol: &str, body: &str) -> OptionsResult<ChartData> {
    let response: YahooChartResponse = serde_json::from_str(body).map_err(|e| {
        OptionsError::market_data(format!("Failed to parse chart for {}: {}", symbol, e))
    })?;

    if let Some(error) = response.chart.error {
        return Err(OptionsError::market_data(format!(
            "{}: {} ({})",
            symbol,
            error.description.unwrap_or_else(|| "no description".to_string()),
            error.code.unwrap_or_else(|| "unknown".to_string())
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| {
            OptionsError::market_data(format!("No chart data returned for {}", symbol))
        })?;

    let price = result.meta.regular_market_price.ok_or_else(|| {
        OptionsError::market_data(format!("No regular market price for {}", symbol))
    })?;

    let timestamp = result
        .meta
        .regular_market_time
        .and_then(|ts| DateTime::from_timestamp(ts, 0));

    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|q| q.close)
        .unwrap_or_default();
    let timestamps = result.timestamp.unwrap_or_default();

    let mut bars = Vec::with_capacity(timestamps.len());
    let mut skipped = 0usize;
    for (ts, close) in timestamps.iter().zip(closes.iter()) {
        match (DateTime::from_timestamp(*ts, 0), close) {
            (Some(dt), Some(close)) if close.is_finite() => bars.push(PriceBar {
                date: dt.date_naive(),
                close: *close,
            }),
            _ => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(symbol, skipped, "skipped bars without a close");
    }

    Ok(ChartData {
        quote: SpotQuote {
            symbol: result.meta.symbol.unwrap_or_else(|| symbol.to_string()),
            price,
            currency: result.meta.currency,
            timestamp,
        },
        bars,
    })
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChart,
}

#[derive(Debug, Deserialize)]
struct YahooChart {
    result: Option<Vec<YahooChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    meta: YahooMeta,
    timestamp: Option<Vec<i64>>,
    indicators: YahooIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooMeta {
    symbol: Option<String>,
    currency: Option<String>,
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    #[serde(rename = "regularMarketTime")]
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct YahooIndicators {
    #[serde(default)]
    quote: Vec<YahooQuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
