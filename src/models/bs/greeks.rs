use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use super::d1_d2;
use crate::error::{OptionsError, OptionsResult};
use crate::models::types::{Greeks, OptionContract, OptionType};

const DAYS_PER_YEAR: f64 = 365.0;

/// Black-Scholes delta, gamma, theta (per day) and vega (per vol point).
pub fn bs_greeks(contract: &OptionContract) -> OptionsResult<Greeks> {
    contract.validate()?;

    let s = contract.spot;
    let k = contract.strike;
    let r = contract.rate;
    let t = contract.years_to_exp;
    let sigma = contract.volatility;

    let (d1, d2) = d1_d2(s, k, r, t, sigma);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| OptionsError::invalid_contract(format!("Normal distribution: {}", e)))?;

    let sqrt_t = t.sqrt();
    let pdf_d1 = normal.pdf(d1);
    let df = (-r * t).exp();

    let delta = match contract.option_type {
        OptionType::Call => normal.cdf(d1),
        OptionType::Put => normal.cdf(d1) - 1.0,
    };

    // Gamma (same for call and put)
    let gamma = pdf_d1 / (s * sigma * sqrt_t);

    let decay = -s * pdf_d1 * sigma / (2.0 * sqrt_t);
    let theta = match contract.option_type {
        OptionType::Call => decay - r * k * df * normal.cdf(d2),
        OptionType::Put => decay + r * k * df * normal.cdf(-d2),
    } / DAYS_PER_YEAR;

    let vega = s * pdf_d1 * sqrt_t / 100.0;

    let greeks = Greeks {
        delta,
        gamma,
        theta,
        vega,
    };

    if [delta, gamma, theta, vega].iter().any(|g| !g.is_finite()) {
        return Err(OptionsError::invalid_contract(format!(
            "Non-finite Greeks {:?} for contract {:?}",
            greeks, contract
        )));
    }

    Ok(greeks)
}
