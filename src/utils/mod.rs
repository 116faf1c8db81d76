pub mod env;
pub mod forecast_config;
pub mod progress_bars;
