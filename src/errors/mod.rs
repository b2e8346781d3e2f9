//! Error handling for the bot

pub mod bot_error;

pub use bot_error::*;
