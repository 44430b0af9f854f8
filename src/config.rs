//! Application configuration loaded from TOML.
//!
//! Every section and field is optional; anything missing falls back to the same
//! defaults the library uses.
//!
//! ```toml
//! [solver]
//! method = "newton"
//! tolerance = 1e-10
//!
//! [surface]
//! days_max = 180
//! [surface.smile]
//! skew = -0.05
//!
//! [market_data]
//! timeout_secs = 5
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::chart::ChartOptions;
use crate::market_data::MarketDataConfig;
use crate::solver::SolverConfig;
use crate::surface::{PriceSurfaceConfig, SurfaceConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub solver: SolverConfig,
    pub surface: SurfaceConfig,
    pub price_surface: PriceSurfaceConfig,
    pub market_data: MarketDataConfig,
    pub chart: ChartOptions,
}

impl DashboardConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).context("Failed to parse dashboard configuration")?;
        config
            .solver
            .validate()
            .context("Invalid [solver] section")?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Load `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::SolverMethod;

    #[test]
    fn test_empty_config_is_default() {
        let config = DashboardConfig::from_toml_str("").unwrap();
        assert_eq!(config.solver.method, SolverMethod::Brent);
        assert_eq!(config.surface.strike_steps, 20);
        assert_eq!(config.price_surface.strike_steps, 25);
        assert_eq!(config.market_data.timeout_secs, 10);
        assert_eq!(config.chart.width, 1280);
    }

    #[test]
    fn test_partial_overrides() {
        let text = r#"
            [solver]
            method = "newton"
            max_iterations = 40

            [surface]
            days_max = 180.0

            [surface.smile]
            skew = -0.05

            [price_surface]
            days_max = 30.0

            [market_data]
            timeout_secs = 3
        "#;
        let config = DashboardConfig::from_toml_str(text).unwrap();
        assert_eq!(config.solver.method, SolverMethod::Newton);
        assert_eq!(config.solver.max_iterations, 40);
        assert_eq!(config.solver.vol_upper, 5.0);
        assert_eq!(config.surface.days_max, 180.0);
        assert_eq!(config.surface.days_min, 7.0);
        assert_eq!(config.surface.smile.skew, -0.05);
        assert_eq!(config.surface.smile.base_vol, 0.20);
        assert_eq!(config.price_surface.days_max, 30.0);
        assert_eq!(config.price_surface.strike_steps, 25);
        assert_eq!(config.market_data.timeout_secs, 3);
    }

    #[test]
    fn test_invalid_solver_section_rejected() {
        let text = "[solver]\nvol_lower = 3.0\nvol_upper = 1.0\n";
        assert!(DashboardConfig::from_toml_str(text).is_err());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config =
            DashboardConfig::load_or_default("definitely/not/a/real/options-dashboard.toml")
                .unwrap();
        assert_eq!(config.solver.max_iterations, 100);
    }
}
