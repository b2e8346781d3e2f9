//! Custom error types for the bot

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("HTTP request failed: {context}")]
    Http {
        context: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Ledger error: {context}")]
    Ledger {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type BotResult<T> = Result<T, BotError>;
