// Closed-form Black-Scholes pricing for European calls and puts. The raw helpers
// work on plain floats so the implied-volatility objective can call them in a tight
// loop; the contract-level functions validate first and never return NaN/Inf.

pub mod greeks;

pub use greeks::bs_greeks;

use crate::error::{OptionsError, OptionsResult};
use crate::models::types::{OptionContract, OptionType, PricingResult};

pub(crate) fn norm_cdf(x: f64) -> f64 {
    // 0.5 * [1 + erf(x / sqrt(2))]
    0.5 * (1.0 + libm::erf(x / (2.0_f64).sqrt()))
}

/// Black-Scholes d1 and d2 for strictly positive inputs.
#[allow(non_snake_case)]
pub fn d1_d2(S: f64, K: f64, r: f64, T: f64, sigma: f64) -> (f64, f64) {
    let sqrt_t = T.sqrt();
    let d1 = ((S / K).ln() + (r + 0.5 * sigma.powi(2)) * T) / (sigma * sqrt_t);
    (d1, d1 - sigma * sqrt_t)
}

/// Price of a European call option under Black-Scholes assumptions.
#[allow(non_snake_case)]
pub fn bs_call_price(S: f64, K: f64, r: f64, T: f64, sigma: f64) -> f64 {
    if T <= 0.0 || sigma <= 0.0 {
        return (S - K * (-r * T).exp()).max(0.0);
    }
    let (d1, d2) = d1_d2(S, K, r, T, sigma);
    S * norm_cdf(d1) - K * (-r * T).exp() * norm_cdf(d2)
}

/// Price of a European put option under Black-Scholes assumptions.
#[allow(non_snake_case)]
pub fn bs_put_price(S: f64, K: f64, r: f64, T: f64, sigma: f64) -> f64 {
    if T <= 0.0 || sigma <= 0.0 {
        return (K * (-r * T).exp() - S).max(0.0);
    }
    let (d1, d2) = d1_d2(S, K, r, T, sigma);
    K * (-r * T).exp() * norm_cdf(-d2) - S * norm_cdf(-d1)
}

/// Dispatch on option type without validation.
#[allow(non_snake_case)]
pub fn bs_price_raw(option_type: OptionType, S: f64, K: f64, r: f64, T: f64, sigma: f64) -> f64 {
    match option_type {
        OptionType::Call => bs_call_price(S, K, r, T, sigma),
        OptionType::Put => bs_put_price(S, K, r, T, sigma),
    }
}

/// Theoretical price of a validated contract.
pub fn bs_price(contract: &OptionContract) -> OptionsResult<f64> {
    contract.validate()?;
    let price = bs_price_raw(
        contract.option_type,
        contract.spot,
        contract.strike,
        contract.rate,
        contract.years_to_exp,
        contract.volatility,
    );
    if !price.is_finite() {
        return Err(OptionsError::invalid_contract(format!(
            "Non-finite price for contract {:?}",
            contract
        )));
    }
    // Rounding can push deep OTM prices a hair below zero
    Ok(price.max(0.0))
}

/// Price plus Greeks for a single contract.
pub fn price_option(contract: &OptionContract) -> OptionsResult<PricingResult> {
    let price = bs_price(contract)?;
    let greeks = bs_greeks(contract)?;
    Ok(PricingResult { price, greeks })
}
