pub mod config;
pub mod error;
pub mod market;
pub mod time;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use market::MarketDataClient;
pub use types::*;
