use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{OptionsError, OptionsResult};

/// European option right.
///
/// Serializes as `"call"` / `"put"`. Deserializes through [`FromStr`], so quote
/// files may use any case and the `c` / `p` shorthands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn is_call(self) -> bool {
        matches!(self, OptionType::Call)
    }

    /// Capitalised name for titles and tables
    pub fn label(self) -> &'static str {
        match self {
            OptionType::Call => "Call",
            OptionType::Put => "Put",
        }
    }

    /// Payoff at expiry for the given spot and strike.
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        match self {
            OptionType::Call => (spot - strike).max(0.0),
            OptionType::Put => (strike - spot).max(0.0),
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionType::Call => write!(f, "call"),
            OptionType::Put => write!(f, "put"),
        }
    }
}

impl FromStr for OptionType {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "call" | "c" => Ok(OptionType::Call),
            "put" | "p" => Ok(OptionType::Put),
            other => Err(OptionsError::invalid_contract(format!(
                "Invalid option type: {}",
                other
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for OptionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Full set of Black-Scholes inputs for a single European option.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    /// Underlying price S
    pub spot: f64,
    /// Strike price K
    pub strike: f64,
    /// Time to expiration T in years
    pub years_to_exp: f64,
    /// Continuously compounded risk-free rate (decimal)
    pub rate: f64,
    /// Volatility σ (decimal, e.g. 0.20 for 20%)
    pub volatility: f64,
    pub option_type: OptionType,
}

impl OptionContract {
    pub fn new(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        years_to_exp: f64,
        rate: f64,
        volatility: f64,
    ) -> OptionsResult<Self> {
        let contract = Self {
            spot,
            strike,
            years_to_exp,
            rate,
            volatility,
            option_type,
        };
        contract.validate()?;
        Ok(contract)
    }

    /// Rejects inputs for which the closed-form expressions are undefined.
    pub fn validate(&self) -> OptionsResult<()> {
        validate_market_inputs(self.spot, self.strike, self.years_to_exp, self.rate)?;
        if !self.volatility.is_finite() || self.volatility <= 0.0 {
            return Err(OptionsError::invalid_contract(format!(
                "Volatility must be positive and finite, got: {}",
                self.volatility
            )));
        }
        Ok(())
    }

    /// Discount factor e^(-rT).
    pub fn discount_factor(&self) -> f64 {
        (-self.rate * self.years_to_exp).exp()
    }

    /// Copy of this contract with a different volatility.
    pub fn with_volatility(&self, volatility: f64) -> Self {
        Self {
            volatility,
            ..*self
        }
    }
}

/// Shared checks for S, K, T and r.
pub(crate) fn validate_market_inputs(
    spot: f64,
    strike: f64,
    years_to_exp: f64,
    rate: f64,
) -> OptionsResult<()> {
    if !spot.is_finite() || spot <= 0.0 {
        return Err(OptionsError::invalid_contract(format!(
            "Underlying price must be positive and finite, got: {}",
            spot
        )));
    }
    if !strike.is_finite() || strike <= 0.0 {
        return Err(OptionsError::invalid_contract(format!(
            "Strike must be positive and finite, got: {}",
            strike
        )));
    }
    if !years_to_exp.is_finite() || years_to_exp <= 0.0 {
        return Err(OptionsError::invalid_contract(format!(
            "Time to expiration must be positive and finite, got: {}",
            years_to_exp
        )));
    }
    if !rate.is_finite() {
        return Err(OptionsError::invalid_contract(format!(
            "Risk-free rate must be finite, got: {}",
            rate
        )));
    }
    Ok(())
}

/// An observed option price together with the contract terms it was quoted for.
/// Volatility is the unknown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    pub option_type: OptionType,
    pub spot: f64,
    pub strike: f64,
    pub years_to_exp: f64,
    pub rate: f64,
    /// Observed market price of the option
    pub market_price: f64,
}

impl MarketQuote {
    pub fn new(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        years_to_exp: f64,
        rate: f64,
        market_price: f64,
    ) -> Self {
        Self {
            option_type,
            spot,
            strike,
            years_to_exp,
            rate,
            market_price,
        }
    }

    pub fn validate(&self) -> OptionsResult<()> {
        validate_market_inputs(self.spot, self.strike, self.years_to_exp, self.rate)?;
        if !self.market_price.is_finite() || self.market_price <= 0.0 {
            return Err(OptionsError::invalid_quote(format!(
                "Observed price must be positive and finite, got: {}",
                self.market_price
            )));
        }
        Ok(())
    }

    /// The contract this quote refers to, priced at `volatility`.
    pub fn with_volatility(&self, volatility: f64) -> OptionContract {
        OptionContract {
            spot: self.spot,
            strike: self.strike,
            years_to_exp: self.years_to_exp,
            rate: self.rate,
            volatility,
            option_type: self.option_type,
        }
    }

    pub fn discount_factor(&self) -> f64 {
        (-self.rate * self.years_to_exp).exp()
    }
}

/// First-order and second-order sensitivities.
///
/// Theta is per calendar day and vega is per one volatility point (1%).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Greeks {
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
}

/// Theoretical price and Greeks for one contract
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub price: f64,
    pub greeks: Greeks,
}

/// Outcome of an implied-volatility solve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpliedVolResult {
    /// Implied volatility (decimal)
    pub implied_vol: f64,
    /// Black-Scholes price at the implied volatility
    pub theoretical_price: f64,
    /// |market price - theoretical price|
    pub price_difference: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_type_parsing() {
        assert_eq!("call".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!("Put".parse::<OptionType>().unwrap(), OptionType::Put);
        assert_eq!(" C ".parse::<OptionType>().unwrap(), OptionType::Call);
        assert_eq!("p".parse::<OptionType>().unwrap(), OptionType::Put);
        assert!("straddle".parse::<OptionType>().is_err());
        assert_eq!(OptionType::Put.to_string(), "put");
    }

    #[test]
    fn test_option_type_deserialize_any_case() {
        #[derive(Deserialize)]
        struct Row {
            option_type: OptionType,
        }
        for (text, expected) in [
            ("call", OptionType::Call),
            ("Call", OptionType::Call),
            ("C", OptionType::Call),
            ("PUT", OptionType::Put),
            ("p", OptionType::Put),
        ] {
            let row: Row = toml::from_str(&format!("option_type = \"{}\"", text)).unwrap();
            assert_eq!(row.option_type, expected, "{}", text);
        }
        assert!(toml::from_str::<Row>("option_type = \"straddle\"").is_err());
        assert_eq!(serde_json::to_string(&OptionType::Call).unwrap(), "\"call\"");
    }

    #[test]
    fn test_contract_validation() {
        assert!(OptionContract::new(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.2).is_ok());
        // Zero rate and negative rate are allowed
        assert!(OptionContract::new(OptionType::Put, 100.0, 90.0, 0.5, 0.0, 0.3).is_ok());
        assert!(OptionContract::new(OptionType::Put, 100.0, 90.0, 0.5, -0.01, 0.3).is_ok());

        // T = 0, σ = 0, K < 0, S = 0
        assert!(OptionContract::new(OptionType::Call, 100.0, 100.0, 0.0, 0.05, 0.2).is_err());
        assert!(OptionContract::new(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 0.0).is_err());
        assert!(OptionContract::new(OptionType::Call, 100.0, -5.0, 1.0, 0.05, 0.2).is_err());
        assert!(OptionContract::new(OptionType::Call, 0.0, 100.0, 1.0, 0.05, 0.2).is_err());
        assert!(OptionContract::new(OptionType::Call, 100.0, 100.0, 1.0, f64::NAN, 0.2).is_err());
        assert!(
            OptionContract::new(OptionType::Call, 100.0, 100.0, f64::INFINITY, 0.05, 0.2).is_err()
        );
    }

    #[test]
    fn test_quote_validation() {
        let quote = MarketQuote::new(OptionType::Call, 100.0, 100.0, 1.0, 0.05, 10.45);
        assert!(quote.validate().is_ok());

        let zero_price = MarketQuote {
            market_price: 0.0,
            ..quote
        };
        assert!(matches!(
            zero_price.validate(),
            Err(OptionsError::InvalidQuote(_))
        ));

        let expired = MarketQuote {
            years_to_exp: 0.0,
            ..quote
        };
        assert!(matches!(
            expired.validate(),
            Err(OptionsError::InvalidContract(_))
        ));
    }

    #[test]
    fn test_intrinsic() {
        assert_eq!(OptionType::Call.intrinsic(110.0, 100.0), 10.0);
        assert_eq!(OptionType::Call.intrinsic(90.0, 100.0), 0.0);
        assert_eq!(OptionType::Put.intrinsic(90.0, 100.0), 10.0);
        assert_eq!(OptionType::Put.intrinsic(110.0, 100.0), 0.0);
    }
}
