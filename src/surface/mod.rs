//! Volatility and price surface grids for visualisation
//!
//! The implied-volatility surface is parametric (base level, linear skew and
//! quadratic smile in log-moneyness). It is a visual aid and does not calibrate
//! anything or enforce absence of arbitrage across strikes or expiries.

pub mod generator;
pub mod types;

pub use generator::*;
pub use types::*;
