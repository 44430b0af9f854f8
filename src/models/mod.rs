pub mod bs;
pub mod types;

/// Common traits used by volatility models
pub mod traits {
    /// A volatility model that can be sampled on a (log-moneyness, time) grid
    pub trait VolatilityModel {
        /// Short identifier used in chart titles and logs
        fn name(&self) -> &str;

        /// Implied volatility (decimal) at log-moneyness `k = ln(K/S)` and time `t` in years.
        fn implied_vol(&self, k: f64, t: f64) -> f64;
    }
}

/// Utility functions shared by the pricer and the surface generator
pub mod utils {
    /// Calculate log-moneyness: ln(K/S)
    pub fn log_moneyness(strike: f64, spot: f64) -> f64 {
        (strike / spot).ln()
    }

    /// `n` evenly spaced points from `start` to `end` inclusive.
    pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
        match n {
            0 => Vec::new(),
            1 => vec![start],
            _ => {
                let step = (end - start) / (n - 1) as f64;
                (0..n)
                    .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                    .collect()
            }
        }
    }

}
