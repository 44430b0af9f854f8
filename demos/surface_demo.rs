// demos/surface_demo.rs

//! Generates the implied-volatility, flat-volatility and price surfaces and
//! writes them as SVG charts and CSV grids.
//!
//! Usage:
//!     cargo run --example surface_demo -- [output_dir]
//!
//! Files are written to `output_dir` (default: the current directory).

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use options_dashboard::surface::{
    build_flat_vol_surface, build_price_surface, build_vol_surface, SmileParams, SurfaceConfig,
};
use options_dashboard::{
    price_option, render_smile_svg, render_surface_svg, ChartOptions, OptionContract, OptionType,
    PriceSurfaceConfig,
};

fn main() -> Result<()> {
    let out_dir = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let spot = 100.0;

    // Steeper skew than the default to make the asymmetry visible
    let config = SurfaceConfig {
        smile: SmileParams {
            base_vol: 0.22,
            skew: -0.08,
            smile: 0.05,
        },
        ..SurfaceConfig::default()
    };

    let vol_grid = build_vol_surface(spot, &config)?;
    let (lo, hi) = vol_grid.value_range();
    println!(
        "Vol surface: {:?} grid, σ in [{:.2}%, {:.2}%]",
        vol_grid.shape(),
        lo * 100.0,
        hi * 100.0
    );
    let options = ChartOptions {
        subtitle: Some(format!("Spot: ${:.2}", spot)),
        ..ChartOptions::default()
    };
    render_surface_svg(&vol_grid, out_dir.join("vol_surface.svg"), &options)?;
    render_smile_svg(&vol_grid, 0, out_dir.join("vol_smile_front.svg"), &options)?;
    vol_grid.write_csv(out_dir.join("vol_surface.csv"))?;

    let flat_grid = build_flat_vol_surface(spot, 0.20, &SurfaceConfig::default())?;
    render_surface_svg(&flat_grid, out_dir.join("flat_vol_surface.svg"), &options)?;

    let contract = OptionContract::new(OptionType::Put, spot, 95.0, 30.0 / 365.0, 0.05, 0.20)?;
    let price_grid = build_price_surface(&contract, &PriceSurfaceConfig::default())?;
    let current = price_option(&contract)?;
    let price_options = ChartOptions {
        subtitle: Some("Spot: $100.00, Vol: 20.0%, Rate: 5.0%".to_string()),
        highlight: Some((contract.strike, 30.0, current.price)),
        ..ChartOptions::default()
    };
    render_surface_svg(&price_grid, out_dir.join("put_price_surface.svg"), &price_options)?;
    price_grid.write_csv(out_dir.join("put_price_surface.csv"))?;

    println!("Charts written to {}", out_dir.display());
    Ok(())
}
