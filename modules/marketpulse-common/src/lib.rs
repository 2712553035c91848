pub mod config;
pub mod error;
pub mod queries;
pub mod types;

pub use config::Config;
pub use error::MarketError;
pub use queries::*;
pub use types::*;
