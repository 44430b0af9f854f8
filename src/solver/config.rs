use serde::{Deserialize, Serialize};

use crate::error::{OptionsError, OptionsResult};

/// Root-finding algorithm used for the implied-volatility solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverMethod {
    /// Brent's method on the bracket [vol_lower, vol_upper]
    #[default]
    Brent,
    /// Newton-Raphson with analytic vega, falling back to Brent on failure
    Newton,
}

/// Main configuration struct for the implied-volatility solver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub method: SolverMethod,

    /// Price / bracket-width tolerance
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Hard cap on root-finder iterations
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Lower edge of the volatility bracket
    #[serde(default = "default_vol_lower")]
    pub vol_lower: f64,

    /// Upper edge of the volatility bracket
    #[serde(default = "default_vol_upper")]
    pub vol_upper: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            method: SolverMethod::default(),
            tolerance: default_tolerance(),
            max_iterations: default_max_iterations(),
            vol_lower: default_vol_lower(),
            vol_upper: default_vol_upper(),
        }
    }
}

impl SolverConfig {
    /// Tight tolerance on the full bracket
    pub fn production() -> Self {
        Self {
            tolerance: 1e-11,
            max_iterations: 200,
            ..Self::default()
        }
    }

    /// Newton iteration with a looser tolerance for interactive use
    pub fn fast() -> Self {
        Self {
            method: SolverMethod::Newton,
            tolerance: 1e-8,
            max_iterations: 50,
            ..Self::default()
        }
    }

    /// Maximum precision and a wider bracket for extreme quotes
    pub fn research() -> Self {
        Self {
            tolerance: 1e-12,
            max_iterations: 1000,
            vol_lower: 1e-4,
            vol_upper: 10.0,
            ..Self::default()
        }
    }

    /// Quick validation settings
    pub fn minimal() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 30,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> OptionsResult<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(OptionsError::invalid_config(format!(
                "Solver tolerance must be positive, got: {}",
                self.tolerance
            )));
        }
        if self.max_iterations == 0 {
            return Err(OptionsError::invalid_config(
                "Solver max_iterations must be at least 1",
            ));
        }
        if !(self.vol_lower > 0.0 && self.vol_upper.is_finite() && self.vol_lower < self.vol_upper)
        {
            return Err(OptionsError::invalid_config(format!(
                "Volatility bracket must satisfy 0 < lower < upper, got: [{}, {}]",
                self.vol_lower, self.vol_upper
            )));
        }
        Ok(())
    }
}

fn default_tolerance() -> f64 {
    1e-10
}

fn default_max_iterations() -> usize {
    100
}

fn default_vol_lower() -> f64 {
    0.001
}

fn default_vol_upper() -> f64 {
    5.0
}
