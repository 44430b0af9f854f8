pub mod config;
pub mod implied_vol;

pub use config::{SolverConfig, SolverMethod};
pub use implied_vol::{
    arbitrage_bounds, batch_implied_vol, implied_volatility, read_quotes_csv, solve_implied_vol,
};
