pub mod binance;
pub mod ingestor;

pub use binance::BinanceClient;
pub use ingestor::Ingestor;
