use thiserror::Error;

use crate::minecraft::address::AddressError;

use super::store::StoreError;

/// Per-event failures. None of these stop the bot.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
    #[error(transparent)]
    Address(#[from] AddressError),
}
