//! Options Dashboard CLI
//!
//! # Commands
//!
//! - `options-dashboard price` - Black-Scholes price and Greeks for one contract
//! - `options-dashboard iv` - Implied volatility from an observed price, or a CSV batch
//! - `options-dashboard surface` - Implied-volatility surface chart
//! - `options-dashboard price-surface` - Option price surface chart
//! - `options-dashboard quote` - Spot price and realized volatility for a symbol

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use options_dashboard::market_data::{
    realized_volatility, resolve_spot, MarketDataConfig, MarketDataProvider, YahooClient,
};
use options_dashboard::surface::{
    build_flat_vol_surface, build_price_surface, build_vol_surface, SurfaceGrid,
};
use options_dashboard::{
    price_option, read_quotes_csv, render_smile_svg, render_surface_svg, solve_implied_vol,
    ChartOptions, DashboardConfig, MarketQuote, OptionContract, OptionType, SolverConfig,
    SolverMethod,
};

const DEFAULT_CONFIG_FILE: &str = "options-dashboard.toml";
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Black-Scholes pricing, implied volatility and surface charts
#[derive(Parser)]
#[command(name = "options-dashboard")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path (defaults to ./options-dashboard.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Right {
    Call,
    Put,
}

impl From<Right> for OptionType {
    fn from(right: Right) -> Self {
        match right {
            Right::Call => OptionType::Call,
            Right::Put => OptionType::Put,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    Brent,
    Newton,
}

impl From<Method> for SolverMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Brent => SolverMethod::Brent,
            Method::Newton => SolverMethod::Newton,
        }
    }
}

/// Underlying price, typed in or fetched for a ticker
#[derive(clap::Args)]
struct SpotArgs {
    /// Underlying price
    #[arg(long, default_value_t = 100.0, conflicts_with = "symbol")]
    spot: f64,

    /// Fetch the underlying price for this ticker instead of using --spot
    #[arg(long)]
    symbol: Option<String>,
}

impl SpotArgs {
    fn resolve(&self, market: &MarketDataConfig) -> Result<f64> {
        match &self.symbol {
            Some(symbol) => {
                let client = YahooClient::new(market)?;
                let spot = resolve_spot(&client, symbol)
                    .with_context(|| format!("Failed to fetch spot for {}", symbol))?;
                info!(symbol = %symbol, spot, "using market spot");
                Ok(spot)
            }
            None => Ok(self.spot),
        }
    }
}

/// Contract terms shared by `price` and `price-surface`
#[derive(clap::Args)]
struct ContractArgs {
    #[command(flatten)]
    spot: SpotArgs,

    /// Strike price
    #[arg(long, default_value_t = 100.0)]
    strike: f64,

    /// Time to expiration in years
    #[arg(long, default_value_t = 0.25)]
    expiry_years: f64,

    /// Risk-free rate (decimal)
    #[arg(long, default_value_t = 0.05)]
    rate: f64,

    /// Volatility (decimal)
    #[arg(long, default_value_t = 0.20)]
    vol: f64,

    /// Option type
    #[arg(short = 't', long = "type", value_enum, default_value = "call")]
    option_type: Right,
}

impl ContractArgs {
    fn contract(&self, market: &MarketDataConfig) -> Result<OptionContract> {
        Ok(OptionContract::new(
            self.option_type.into(),
            self.spot.resolve(market)?,
            self.strike,
            self.expiry_years,
            self.rate,
            self.vol,
        )?)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Price a European option and print its Greeks
    Price {
        #[command(flatten)]
        contract: ContractArgs,
    },

    /// Back implied volatility out of an observed option price
    Iv {
        /// Observed option price
        #[arg(long, required_unless_present = "quotes")]
        price: Option<f64>,

        #[command(flatten)]
        spot: SpotArgs,

        /// Strike price
        #[arg(long, default_value_t = 100.0)]
        strike: f64,

        /// Time to expiration in years
        #[arg(long, default_value_t = 0.25)]
        expiry_years: f64,

        /// Risk-free rate (decimal)
        #[arg(long, default_value_t = 0.05)]
        rate: f64,

        /// Option type
        #[arg(short = 't', long = "type", value_enum, default_value = "call")]
        option_type: Right,

        /// Root-finding method (overrides the config file)
        #[arg(short, long, value_enum)]
        method: Option<Method>,

        /// CSV of quotes: option_type,spot,strike,years_to_exp,rate,market_price
        #[arg(long, conflicts_with = "price")]
        quotes: Option<PathBuf>,
    },

    /// Render the implied-volatility surface
    Surface {
        #[command(flatten)]
        spot: SpotArgs,

        #[arg(long)]
        strike_min_pct: Option<f64>,

        #[arg(long)]
        strike_max_pct: Option<f64>,

        #[arg(long)]
        days_min: Option<f64>,

        #[arg(long)]
        days_max: Option<f64>,

        /// ATM volatility (decimal)
        #[arg(long)]
        base_vol: Option<f64>,

        /// Linear log-moneyness coefficient
        #[arg(long, allow_negative_numbers = true)]
        skew: Option<f64>,

        /// Quadratic log-moneyness coefficient
        #[arg(long, allow_negative_numbers = true)]
        smile: Option<f64>,

        /// Constant-volatility surface at --base-vol instead of the smile
        #[arg(long)]
        flat: bool,

        /// Output SVG
        #[arg(short, long, default_value = "vol_surface.svg")]
        out: PathBuf,

        /// Also write the middle expiry slice as a 2D chart
        #[arg(long)]
        smile_out: Option<PathBuf>,

        /// Also write the grid as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Render the Black-Scholes price surface for a contract
    PriceSurface {
        #[command(flatten)]
        contract: ContractArgs,

        /// Output SVG
        #[arg(short, long, default_value = "price_surface.svg")]
        out: PathBuf,

        /// Also write the grid as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// Fetch spot price and realized volatility for a symbol
    Quote {
        /// Ticker symbol, e.g. SPY
        #[arg(short, long)]
        symbol: String,

        /// History window (overrides the config file)
        #[arg(short, long)]
        range: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = match &cli.config {
        Some(path) => DashboardConfig::from_file(path)?,
        None => DashboardConfig::load_or_default(DEFAULT_CONFIG_FILE)?,
    };
    debug!(?config, "effective configuration");

    match cli.command {
        Commands::Price { contract } => run_price(&contract.contract(&config.market_data)?),
        Commands::Iv {
            price,
            spot,
            strike,
            expiry_years,
            rate,
            option_type,
            method,
            quotes,
        } => {
            let mut solver = config.solver.clone();
            if let Some(method) = method {
                solver.method = method.into();
            }
            match (quotes, price) {
                (Some(path), _) => run_iv_batch(&path, &solver),
                (None, Some(price)) => {
                    let quote = MarketQuote::new(
                        option_type.into(),
                        spot.resolve(&config.market_data)?,
                        strike,
                        expiry_years,
                        rate,
                        price,
                    );
                    run_iv(&quote, &solver)
                }
                (None, None) => anyhow::bail!("Either --price or --quotes is required"),
            }
        }
        Commands::Surface {
            spot,
            strike_min_pct,
            strike_max_pct,
            days_min,
            days_max,
            base_vol,
            skew,
            smile,
            flat,
            out,
            smile_out,
            csv,
        } => {
            let spot = spot.resolve(&config.market_data)?;
            let mut surface = config.surface.clone();
            if let Some(v) = strike_min_pct {
                surface.strike_min_pct = v;
            }
            if let Some(v) = strike_max_pct {
                surface.strike_max_pct = v;
            }
            if let Some(v) = days_min {
                surface.days_min = v;
            }
            if let Some(v) = days_max {
                surface.days_max = v;
            }
            if let Some(v) = base_vol {
                surface.smile.base_vol = v;
            }
            if let Some(v) = skew {
                surface.smile.skew = v;
            }
            if let Some(v) = smile {
                surface.smile.smile = v;
            }

            let grid = if flat {
                build_flat_vol_surface(spot, surface.smile.base_vol, &surface)?
            } else {
                build_vol_surface(spot, &surface)?
            };
            let options = ChartOptions {
                subtitle: Some(format!("Spot: ${:.2}", spot)),
                ..config.chart.clone()
            };
            write_outputs(&grid, &out, csv.as_deref(), &options)?;
            if let Some(path) = smile_out {
                render_smile_svg(&grid, grid.days.len() / 2, &path, &options)
                    .with_context(|| format!("Failed to render {}", path.display()))?;
            }
            Ok(())
        }
        Commands::PriceSurface { contract, out, csv } => {
            let contract = contract.contract(&config.market_data)?;
            let grid = build_price_surface(&contract, &config.price_surface)?;
            let current = price_option(&contract)?;
            let options = ChartOptions {
                subtitle: Some(format!(
                    "Spot: ${:.2}, Vol: {:.1}%, Rate: {:.1}%",
                    contract.spot,
                    contract.volatility * 100.0,
                    contract.rate * 100.0
                )),
                highlight: Some((
                    contract.strike,
                    contract.years_to_exp * 365.0,
                    current.price,
                )),
                ..config.chart.clone()
            };
            write_outputs(&grid, &out, csv.as_deref(), &options)
        }
        Commands::Quote { symbol, range } => {
            let range = range.unwrap_or_else(|| config.market_data.history_range.clone());
            run_quote(&symbol, &range, &config)
        }
    }
}

fn run_price(contract: &OptionContract) -> Result<()> {
    let result = price_option(&contract)?;

    println!(
        "{} option  S={:.2} K={:.2} T={:.4}y r={:.2}% σ={:.2}%",
        contract.option_type.label(),
        contract.spot,
        contract.strike,
        contract.years_to_exp,
        contract.rate * 100.0,
        contract.volatility * 100.0
    );
    println!("  Price: ${:.4}", result.price);
    println!("  Delta: {:.4}", result.greeks.delta);
    println!("  Gamma: {:.4}", result.greeks.gamma);
    println!("  Theta: {:.4} per day", result.greeks.theta);
    println!("  Vega:  {:.4} per vol point", result.greeks.vega);
    Ok(())
}

fn run_iv(quote: &MarketQuote, solver: &SolverConfig) -> Result<()> {
    let result = solve_implied_vol(quote, solver).with_context(|| {
        format!(
            "Could not solve implied volatility for {} K={} at price {}",
            quote.option_type, quote.strike, quote.market_price
        )
    })?;

    println!("  Implied Volatility: {:.2}%", result.implied_vol * 100.0);
    println!("  Theoretical Price:  ${:.4}", result.theoretical_price);
    println!("  Price Difference:   ${:.6}", result.price_difference);
    Ok(())
}

fn run_iv_batch(path: &Path, solver: &SolverConfig) -> Result<()> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open quotes file {}", path.display()))?;
    let rows = read_quotes_csv(file);
    info!(count = rows.len(), "solving quotes");

    let mut failures = 0usize;
    println!(
        "{:<5} {:>10} {:>10} {:>8} {:>10} {:>10}  result",
        "type", "spot", "strike", "T", "price", "iv"
    );
    for row in &rows {
        let quote = match row {
            Ok(quote) => quote,
            Err(e) => {
                failures += 1;
                println!("{:<5} {:>10}  {}", "-", "-", e);
                continue;
            }
        };
        let outcome = match solve_implied_vol(quote, solver) {
            Ok(iv) => format!("{:>9.2}%  ok", iv.implied_vol * 100.0),
            Err(e) => {
                failures += 1;
                format!("{:>10}  {}", "-", e)
            }
        };
        println!(
            "{:<5} {:>10.2} {:>10.2} {:>8.4} {:>10.4} {}",
            quote.option_type,
            quote.spot,
            quote.strike,
            quote.years_to_exp,
            quote.market_price,
            outcome
        );
    }
    println!("{} solved, {} failed", rows.len() - failures, failures);
    Ok(())
}

fn write_outputs(
    grid: &SurfaceGrid,
    out: &Path,
    csv: Option<&Path>,
    options: &ChartOptions,
) -> Result<()> {
    render_surface_svg(grid, out, options)
        .with_context(|| format!("Failed to render {}", out.display()))?;
    println!("Chart written to {}", out.display());

    if let Some(path) = csv {
        grid.write_csv(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Grid written to {}", path.display());
    }
    Ok(())
}

fn run_quote(symbol: &str, range: &str, config: &DashboardConfig) -> Result<()> {
    let client = YahooClient::new(&config.market_data)?;

    let spot = client
        .spot(symbol)
        .with_context(|| format!("Failed to fetch spot for {}", symbol))?;
    let as_of = spot
        .timestamp
        .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "time not reported".to_string());
    println!(
        "{}: {:.2} {} (as of {})",
        spot.symbol,
        spot.price,
        spot.currency.as_deref().unwrap_or(""),
        as_of
    );

    let bars = client
        .history(symbol, range)
        .with_context(|| format!("Failed to fetch {} history for {}", range, symbol))?;
    let vol = realized_volatility(&bars, TRADING_DAYS_PER_YEAR)
        .with_context(|| format!("Not enough history for {}", symbol))?;
    println!(
        "Realized volatility ({}, {} closes): {:.2}%",
        range,
        bars.len(),
        vol * 100.0
    );
    Ok(())
}
