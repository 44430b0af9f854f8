use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{OptionsError, OptionsResult};
use crate::models::traits::VolatilityModel;
use crate::models::utils::linspace;

/// Parametric smile: σ(m) = base_vol + skew·m + smile·m², with m = ln(K/S).
///
/// Illustrative only; not calibrated to any market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmileParams {
    /// ATM volatility (decimal)
    pub base_vol: f64,
    /// Linear coefficient in log-moneyness (negative = put skew)
    pub skew: f64,
    /// Quadratic coefficient in log-moneyness (smile curvature)
    pub smile: f64,
}

impl Default for SmileParams {
    fn default() -> Self {
        Self {
            base_vol: 0.20,
            skew: -0.02,
            smile: 0.02,
        }
    }
}

impl SmileParams {
    pub fn validate(&self) -> OptionsResult<()> {
        if !(self.base_vol.is_finite() && self.base_vol > 0.0) {
            return Err(OptionsError::invalid_surface(format!(
                "Base volatility must be positive, got: {}",
                self.base_vol
            )));
        }
        if !self.skew.is_finite() || !self.smile.is_finite() {
            return Err(OptionsError::invalid_surface(format!(
                "Skew and smile must be finite, got: skew={}, smile={}",
                self.skew, self.smile
            )));
        }
        Ok(())
    }
}

impl VolatilityModel for SmileParams {
    fn name(&self) -> &str {
        "smile"
    }

    fn implied_vol(&self, k: f64, _t: f64) -> f64 {
        self.base_vol + self.skew * k + self.smile * k * k
    }
}

/// Constant volatility, as assumed by Black-Scholes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatVol(pub f64);

impl VolatilityModel for FlatVol {
    fn name(&self) -> &str {
        "flat"
    }

    fn implied_vol(&self, _k: f64, _t: f64) -> f64 {
        self.0
    }
}

/// Strike/expiry axes of a grid. Strikes are given as percentages of spot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridAxes {
    pub strike_min_pct: f64,
    pub strike_max_pct: f64,
    pub strike_steps: usize,
    pub days_min: f64,
    pub days_max: f64,
    pub expiry_steps: usize,
}

impl GridAxes {
    pub fn validate(&self) -> OptionsResult<()> {
        if !(self.strike_min_pct > 0.0 && self.strike_min_pct <= self.strike_max_pct)
            || !self.strike_max_pct.is_finite()
        {
            return Err(OptionsError::invalid_surface(format!(
                "Strike range must satisfy 0 < min <= max, got: [{}%, {}%]",
                self.strike_min_pct, self.strike_max_pct
            )));
        }
        if !(self.days_min > 0.0 && self.days_min <= self.days_max) || !self.days_max.is_finite()
        {
            return Err(OptionsError::invalid_surface(format!(
                "Expiry range must satisfy 0 < min <= max, got: [{}, {}] days",
                self.days_min, self.days_max
            )));
        }
        if self.strike_steps < 2 || self.expiry_steps < 2 {
            return Err(OptionsError::invalid_surface(format!(
                "Grid needs at least 2 points per axis, got: {} strikes x {} expiries",
                self.strike_steps, self.expiry_steps
            )));
        }
        Ok(())
    }

    pub fn strikes(&self, spot: f64) -> Vec<f64> {
        linspace(
            spot * self.strike_min_pct / 100.0,
            spot * self.strike_max_pct / 100.0,
            self.strike_steps,
        )
    }

    pub fn days(&self) -> Vec<f64> {
        linspace(self.days_min, self.days_max, self.expiry_steps)
    }
}

/// Implied-volatility surface settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub strike_min_pct: f64,
    pub strike_max_pct: f64,
    pub strike_steps: usize,
    pub days_min: f64,
    pub days_max: f64,
    pub expiry_steps: usize,
    pub smile: SmileParams,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            strike_min_pct: 80.0,
            strike_max_pct: 120.0,
            strike_steps: 20,
            days_min: 7.0,
            days_max: 365.0,
            expiry_steps: 15,
            smile: SmileParams::default(),
        }
    }
}

impl SurfaceConfig {
    pub fn axes(&self) -> GridAxes {
        GridAxes {
            strike_min_pct: self.strike_min_pct,
            strike_max_pct: self.strike_max_pct,
            strike_steps: self.strike_steps,
            days_min: self.days_min,
            days_max: self.days_max,
            expiry_steps: self.expiry_steps,
        }
    }
}

/// Price surface settings (strike x days grid of Black-Scholes prices)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceSurfaceConfig {
    pub strike_min_pct: f64,
    pub strike_max_pct: f64,
    pub strike_steps: usize,
    pub days_min: f64,
    pub days_max: f64,
    pub expiry_steps: usize,
}

impl Default for PriceSurfaceConfig {
    fn default() -> Self {
        Self {
            strike_min_pct: 80.0,
            strike_max_pct: 120.0,
            strike_steps: 25,
            days_min: 7.0,
            days_max: 90.0,
            expiry_steps: 20,
        }
    }
}

impl PriceSurfaceConfig {
    pub fn axes(&self) -> GridAxes {
        GridAxes {
            strike_min_pct: self.strike_min_pct,
            strike_max_pct: self.strike_max_pct,
            strike_steps: self.strike_steps,
            days_min: self.days_min,
            days_max: self.days_max,
            expiry_steps: self.expiry_steps,
        }
    }
}

/// What the values of a grid represent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceKind {
    ImpliedVol,
    FlatVol,
    Price,
}

impl SurfaceKind {
    pub fn z_label(self) -> &'static str {
        match self {
            SurfaceKind::ImpliedVol => "Implied Volatility (%)",
            SurfaceKind::FlatVol => "Volatility (%)",
            SurfaceKind::Price => "Option Price ($)",
        }
    }

    /// Value as shown on charts: vols in percent, prices as-is.
    pub fn display(self, value: f64) -> f64 {
        match self {
            SurfaceKind::ImpliedVol | SurfaceKind::FlatVol => value * 100.0,
            SurfaceKind::Price => value,
        }
    }
}

/// Strike x expiry grid. `values[i][j]` is the value at `days[i]`, `strikes[j]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceGrid {
    pub kind: SurfaceKind,
    pub title: String,
    pub spot: f64,
    pub strikes: Vec<f64>,
    pub days: Vec<f64>,
    pub values: Vec<Vec<f64>>,
}

#[derive(Serialize)]
struct CsvRow {
    days: f64,
    strike: f64,
    value: f64,
}

impl SurfaceGrid {
    /// (rows, columns) = (expiries, strikes)
    pub fn shape(&self) -> (usize, usize) {
        (self.days.len(), self.strikes.len())
    }

    pub fn value(&self, expiry_index: usize, strike_index: usize) -> Option<f64> {
        self.values
            .get(expiry_index)
            .and_then(|row| row.get(strike_index))
            .copied()
    }

    /// (strike, value) pairs for a single expiry
    pub fn smile_at(&self, expiry_index: usize) -> Option<Vec<(f64, f64)>> {
        let row = self.values.get(expiry_index)?;
        Some(
            self.strikes
                .iter()
                .copied()
                .zip(row.iter().copied())
                .collect(),
        )
    }

    /// (min, max) over all grid values
    pub fn value_range(&self) -> (f64, f64) {
        self.values
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
    }

    /// Write the grid in long format: `days,strike,value`.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> OptionsResult<()> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)?;
        for (days, row) in self.days.iter().zip(&self.values) {
            for (strike, value) in self.strikes.iter().zip(row) {
                writer.serialize(CsvRow {
                    days: *days,
                    strike: *strike,
                    value: *value,
                })?;
            }
        }
        writer.flush()?;
        info!(
            path = %path.display(),
            rows = self.days.len() * self.strikes.len(),
            "surface written to csv"
        );
        Ok(())
    }
}
