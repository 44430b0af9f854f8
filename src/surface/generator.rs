use tracing::debug;

use super::types::*;
use crate::error::{OptionsError, OptionsResult};
use crate::models::bs::bs_price;
use crate::models::traits::VolatilityModel;
use crate::models::types::OptionContract;
use crate::models::utils::log_moneyness;

const DAYS_PER_YEAR: f64 = 365.0;

/// Sample any volatility model on the strike x expiry grid.
///
/// Fails if a sampled volatility is non-finite or non-positive. A smile with
/// steep wings can do that on a wide strike range.
pub fn build_surface<M: VolatilityModel>(
    spot: f64,
    axes: &GridAxes,
    model: &M,
    kind: SurfaceKind,
) -> OptionsResult<SurfaceGrid> {
    if !(spot.is_finite() && spot > 0.0) {
        return Err(OptionsError::invalid_surface(format!(
            "Spot must be positive, got: {}",
            spot
        )));
    }
    axes.validate()?;

    let strikes = axes.strikes(spot);
    let days = axes.days();

    let mut values = Vec::with_capacity(days.len());
    for &day in &days {
        let t = day / DAYS_PER_YEAR;
        let mut row = Vec::with_capacity(strikes.len());
        for &strike in &strikes {
            let vol = model.implied_vol(log_moneyness(strike, spot), t);
            if !(vol.is_finite() && vol > 0.0) {
                return Err(OptionsError::invalid_surface(format!(
                    "Model '{}' produced non-positive volatility {} at strike {:.2}, {:.0} days",
                    model.name(),
                    vol,
                    strike,
                    day
                )));
            }
            row.push(vol);
        }
        values.push(row);
    }

    debug!(
        model = model.name(),
        strikes = strikes.len(),
        expiries = days.len(),
        "volatility surface built"
    );

    Ok(SurfaceGrid {
        kind,
        title: String::new(),
        spot,
        strikes,
        days,
        values,
    })
}

/// Illustrative implied-volatility surface from the configured smile parameters.
pub fn build_vol_surface(spot: f64, config: &SurfaceConfig) -> OptionsResult<SurfaceGrid> {
    config.smile.validate()?;
    let mut grid = build_surface(spot, &config.axes(), &config.smile, SurfaceKind::ImpliedVol)?;
    grid.title = "Implied Volatility Surface".to_string();
    Ok(grid)
}

/// Constant-σ surface on the same axes.
pub fn build_flat_vol_surface(
    spot: f64,
    sigma: f64,
    config: &SurfaceConfig,
) -> OptionsResult<SurfaceGrid> {
    let mut grid = build_surface(spot, &config.axes(), &FlatVol(sigma), SurfaceKind::FlatVol)?;
    grid.title = format!(
        "Black-Scholes Volatility Surface (Constant σ = {:.1}%)",
        sigma * 100.0
    );
    Ok(grid)
}

/// Black-Scholes prices across strikes and expiries for the contract's spot, rate,
/// volatility and option type. The contract's own strike and expiry are ignored.
pub fn build_price_surface(
    contract: &OptionContract,
    config: &PriceSurfaceConfig,
) -> OptionsResult<SurfaceGrid> {
    contract.validate()?;
    let axes = config.axes();
    axes.validate()?;

    let strikes = axes.strikes(contract.spot);
    let days = axes.days();

    let values = days
        .iter()
        .map(|&day| {
            strikes
                .iter()
                .map(|&strike| {
                    bs_price(&OptionContract {
                        strike,
                        years_to_exp: day / DAYS_PER_YEAR,
                        ..*contract
                    })
                })
                .collect::<OptionsResult<Vec<f64>>>()
        })
        .collect::<OptionsResult<Vec<Vec<f64>>>>()?;

    Ok(SurfaceGrid {
        kind: SurfaceKind::Price,
        title: format!(
            "Black-Scholes {} Option Price Surface",
            contract.option_type.label()
        ),
        spot: contract.spot,
        strikes,
        days,
        values,
    })
}
