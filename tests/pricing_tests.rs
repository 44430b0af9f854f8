use approx::assert_abs_diff_eq;
use chrono::Utc;
use options_dashboard::market_data::{PriceBar, SpotQuote};
use options_dashboard::models::bs::d1_d2;
use options_dashboard::{
    bs_call_price, bs_greeks, bs_price, bs_put_price, price_option, resolve_spot,
    MarketDataProvider, OptionContract, OptionType, OptionsError, OptionsResult,
};

// Helper function to create OptionContract more concisely
fn contract(option_type: OptionType, strike: f64, years: f64, vol: f64) -> OptionContract {
    OptionContract {
        spot: 100.0,
        strike,
        years_to_exp: years,
        rate: 0.05,
        volatility: vol,
        option_type,
    }
}

/// Textbook reference values for S=100, K=100, T=1, r=5%, σ=20%.
#[test]
fn test_reference_call_and_put() {
    let call = price_option(&contract(OptionType::Call, 100.0, 1.0, 0.2)).unwrap();
    assert_abs_diff_eq!(call.price, 10.4506, epsilon = 1e-4);
    assert_abs_diff_eq!(call.greeks.delta, 0.6368, epsilon = 1e-4);
    assert_abs_diff_eq!(call.greeks.gamma, 0.018762, epsilon = 1e-5);
    assert_abs_diff_eq!(call.greeks.vega, 0.37524, epsilon = 1e-4);
    assert!(call.greeks.theta < 0.0);

    let put = price_option(&contract(OptionType::Put, 100.0, 1.0, 0.2)).unwrap();
    assert_abs_diff_eq!(put.price, 5.5735, epsilon = 1e-4);
    assert_abs_diff_eq!(put.greeks.delta, call.greeks.delta - 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(put.greeks.gamma, call.greeks.gamma, epsilon = 1e-12);
    assert_abs_diff_eq!(put.greeks.vega, call.greeks.vega, epsilon = 1e-12);
}

/// C - P = S - K e^(-rT) across moneyness and maturities.
#[test]
fn test_put_call_parity_grid() {
    for &strike in &[60.0, 85.0, 100.0, 120.0, 180.0] {
        for &years in &[0.02, 0.25, 1.0, 3.0] {
            for &vol in &[0.05, 0.3, 0.9] {
                let call = bs_price(&contract(OptionType::Call, strike, years, vol)).unwrap();
                let put = bs_price(&contract(OptionType::Put, strike, years, vol)).unwrap();
                let parity = 100.0 - strike * (-0.05 * years).exp();
                assert!(
                    (call - put - parity).abs() < 1e-9,
                    "parity broken at K={} T={} σ={}: {} vs {}",
                    strike,
                    years,
                    vol,
                    call - put,
                    parity
                );
            }
        }
    }
}

/// Prices stay inside the no-arbitrage band.
#[test]
fn test_price_bounds() {
    for &strike in &[50.0, 100.0, 150.0] {
        let c = contract(OptionType::Call, strike, 0.5, 0.4);
        let call = bs_price(&c).unwrap();
        let lower = (100.0 - strike * c.discount_factor()).max(0.0);
        assert!(call >= lower - 1e-12 && call < 100.0);

        let p = contract(OptionType::Put, strike, 0.5, 0.4);
        let put = bs_price(&p).unwrap();
        let lower = (strike * p.discount_factor() - 100.0).max(0.0);
        assert!(put >= lower - 1e-12 && put < strike * p.discount_factor());
    }
}

/// Call price increases with volatility and time; put price increases with strike.
#[test]
fn test_monotonicity() {
    let vols: Vec<f64> = (1..=20).map(|i| i as f64 * 0.05).collect();
    let prices: Vec<f64> = vols
        .iter()
        .map(|&v| bs_price(&contract(OptionType::Call, 105.0, 0.5, v)).unwrap())
        .collect();
    assert!(prices.windows(2).all(|w| w[1] > w[0]));

    let short = bs_price(&contract(OptionType::Call, 105.0, 0.1, 0.2)).unwrap();
    let long = bs_price(&contract(OptionType::Call, 105.0, 1.0, 0.2)).unwrap();
    assert!(long > short);

    let low = bs_price(&contract(OptionType::Put, 90.0, 0.5, 0.2)).unwrap();
    let high = bs_price(&contract(OptionType::Put, 110.0, 0.5, 0.2)).unwrap();
    assert!(high > low);
}

/// Raw helpers agree with the validated entry point.
#[test]
fn test_raw_helpers_match() {
    let c = contract(OptionType::Call, 95.0, 0.75, 0.3);
    assert_abs_diff_eq!(
        bs_call_price(c.spot, c.strike, c.rate, c.years_to_exp, c.volatility),
        bs_price(&c).unwrap(),
        epsilon = 1e-12
    );
    let p = contract(OptionType::Put, 95.0, 0.75, 0.3);
    assert_abs_diff_eq!(
        bs_put_price(p.spot, p.strike, p.rate, p.years_to_exp, p.volatility),
        bs_price(&p).unwrap(),
        epsilon = 1e-12
    );

    let (d1, d2) = d1_d2(100.0, 100.0, 0.05, 1.0, 0.2);
    assert_abs_diff_eq!(d1, 0.35, epsilon = 1e-12);
    assert_abs_diff_eq!(d2, 0.15, epsilon = 1e-12);
}

/// Expired or zero-vol contracts never reach the formulas.
#[test]
fn test_degenerate_inputs_rejected() {
    let cases = [
        contract(OptionType::Call, 100.0, 0.0, 0.2),
        contract(OptionType::Put, 100.0, 1.0, 0.0),
        contract(OptionType::Call, -10.0, 1.0, 0.2),
        contract(OptionType::Put, 100.0, -1.0, 0.2),
        contract(OptionType::Call, f64::NAN, 1.0, 0.2),
    ];
    for c in &cases {
        assert!(
            matches!(price_option(c), Err(OptionsError::InvalidContract(_))),
            "expected rejection for {:?}",
            c
        );
        assert!(bs_greeks(c).is_err());
    }
}

/// Deep in the money a call behaves like a forward: delta near 1, gamma and vega near 0.
#[test]
fn test_deep_itm_greeks() {
    let g = bs_greeks(&contract(OptionType::Call, 40.0, 0.25, 0.2)).unwrap();
    assert!(g.delta > 0.999);
    assert!(g.gamma < 1e-6);
    assert!(g.vega < 1e-6);

    let g = bs_greeks(&contract(OptionType::Put, 40.0, 0.25, 0.2)).unwrap();
    assert!(g.delta > -1e-3 && g.delta <= 0.0);
}

// In-memory provider standing in for the HTTP client
struct FixedSpot(f64);

impl MarketDataProvider for FixedSpot {
    fn spot(&self, symbol: &str) -> OptionsResult<SpotQuote> {
        Ok(SpotQuote {
            symbol: symbol.to_string(),
            price: self.0,
            currency: Some("USD".to_string()),
            timestamp: Some(Utc::now()),
        })
    }

    fn history(&self, _symbol: &str, _range: &str) -> OptionsResult<Vec<PriceBar>> {
        Ok(Vec::new())
    }
}

/// A fetched spot flows into the contract that gets priced.
#[test]
fn test_price_from_provider_spot() {
    let spot = resolve_spot(&FixedSpot(250.0), "SPY").unwrap();
    let contract = OptionContract::new(OptionType::Call, spot, 250.0, 1.0, 0.05, 0.2).unwrap();
    let priced = price_option(&contract).unwrap();
    // Price scales linearly with (S, K)
    assert_abs_diff_eq!(priced.price, 2.5 * 10.450583572185565, epsilon = 1e-8);

    assert!(matches!(
        resolve_spot(&FixedSpot(f64::NAN), "SPY"),
        Err(OptionsError::MarketData(_))
    ));
}
