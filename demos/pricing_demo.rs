// demos/pricing_demo.rs

//! Demonstration of Black-Scholes pricing and implied volatility
//!
//! This example shows how to:
//! 1. Price a strip of calls and puts with Greeks
//! 2. Check put-call parity on the priced strip
//! 3. Recover the volatility from the model prices with both solvers
//! 4. Handle quotes that violate no-arbitrage bounds

use anyhow::Result;
use options_dashboard::{
    arbitrage_bounds, default_configs, price_contracts, solve_implied_vol, MarketQuote,
    OptionContract, OptionType, OptionsError,
};

fn main() -> Result<()> {
    println!("Black-Scholes Pricing and Implied Volatility Demo");
    println!("=================================================");

    let spot = 100.0;
    let rate = 0.05;
    let years = 0.5;
    let vol = 0.25;

    let contracts = create_demo_contracts(spot, rate, years, vol)?;
    println!(
        "Contracts: {}  (S = ${:.0}, T = {:.2}y, r = {:.1}%, σ = {:.0}%)",
        contracts.len(),
        spot,
        years,
        rate * 100.0,
        vol * 100.0
    );

    println!("\nStep 1: Pricing with Greeks...");
    println!(
        "{:<6} {:>8} {:>10} {:>8} {:>8} {:>9} {:>8}",
        "Type", "Strike", "Price", "Delta", "Gamma", "Theta/d", "Vega"
    );
    println!("{}", "-".repeat(64));

    let priced = price_contracts(contracts);
    for (contract, result) in &priced {
        let result = result.as_ref().map_err(|e| anyhow::anyhow!("{}", e))?;
        println!(
            "{:<6} {:>8.1} {:>10.4} {:>8.4} {:>8.4} {:>9.4} {:>8.4}",
            contract.option_type.label(),
            contract.strike,
            result.price,
            result.greeks.delta,
            result.greeks.gamma,
            result.greeks.theta,
            result.greeks.vega
        );
    }

    println!("\nStep 2: Put-call parity (C - P vs S - K·e^(-rT))...");
    for strike in [90.0, 100.0, 110.0] {
        let call = find_price(&priced, OptionType::Call, strike);
        let put = find_price(&priced, OptionType::Put, strike);
        let forward_gap = spot - strike * (-rate * years).exp();
        println!(
            "  K = {:>5.1}: C - P = {:>8.4}, S - K·e^(-rT) = {:>8.4}",
            strike,
            call - put,
            forward_gap
        );
    }

    println!("\nStep 3: Recovering σ from model prices...");
    for (name, config) in [
        ("brent", default_configs::production()),
        ("newton", default_configs::fast()),
    ] {
        let mut worst: f64 = 0.0;
        for (contract, result) in &priced {
            let Ok(result) = result else { continue };
            let quote = MarketQuote::new(
                contract.option_type,
                contract.spot,
                contract.strike,
                contract.years_to_exp,
                contract.rate,
                result.price,
            );
            let iv = solve_implied_vol(&quote, &config)?;
            worst = worst.max((iv.implied_vol - vol).abs());
        }
        println!("  {:<6} max |σ_implied - σ| = {:.2e}", name, worst);
    }

    println!("\nStep 4: Quotes outside no-arbitrage bounds...");
    let bad_quotes = [
        MarketQuote::new(OptionType::Call, spot, 100.0, years, rate, 101.0),
        MarketQuote::new(OptionType::Put, spot, 120.0, years, rate, 5.0),
    ];
    for quote in &bad_quotes {
        let (lower, upper) = arbitrage_bounds(quote);
        match solve_implied_vol(quote, &default_configs::production()) {
            Err(OptionsError::ArbitrageViolation { price, .. }) => println!(
                "  {} K = {:.0} at ${:.2}: rejected, bounds [{:.4}, {:.4})",
                quote.option_type.label(),
                quote.strike,
                price,
                lower,
                upper
            ),
            other => println!("  unexpected outcome: {:?}", other),
        }
    }

    println!("\nDemo completed successfully!");
    Ok(())
}

fn create_demo_contracts(
    spot: f64,
    rate: f64,
    years: f64,
    vol: f64,
) -> Result<Vec<OptionContract>> {
    let mut contracts = Vec::new();
    for option_type in [OptionType::Put, OptionType::Call] {
        for strike in [80.0, 90.0, 100.0, 110.0, 120.0] {
            contracts.push(OptionContract::new(option_type, spot, strike, years, rate, vol)?);
        }
    }
    Ok(contracts)
}

fn find_price(
    priced: &[(OptionContract, options_dashboard::OptionsResult<options_dashboard::PricingResult>)],
    option_type: OptionType,
    strike: f64,
) -> f64 {
    priced
        .iter()
        .find(|(c, _)| c.option_type == option_type && c.strike == strike)
        .and_then(|(_, r)| r.as_ref().ok())
        .map(|r| r.price)
        .unwrap_or(f64::NAN)
}
