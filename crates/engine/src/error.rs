//! The module contains the error the engine can throw.
//!
//! Validation errors are raised before anything is written:
//!
//! - [`InvalidAmount`] thrown when a debt amount is not a positive, integral
//!   number of minor units.
//! - [`SelfDebt`] thrown when a transfer or deal points a person at
//!   themselves.
//!
//! Store errors ([`StoreUnavailable`]) leave the ledger untouched: every
//! mutation runs inside one database transaction.
//!
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`SelfDebt`]: EngineError::SelfDebt
//!  [`StoreUnavailable`]: EngineError::StoreUnavailable
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Self debt: {0}")]
    SelfDebt(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<DbErr> for EngineError {
    fn from(value: DbErr) -> Self {
        Self::StoreUnavailable(value.to_string())
    }
}

impl EngineError {
    /// `true` for errors caused by the caller's input rather than the store.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::StoreUnavailable(_))
    }
}
