use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Scraping error: {0}")]
    Scraping(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
