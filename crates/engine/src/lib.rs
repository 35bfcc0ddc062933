//! Debt ledger and netting engine.
//!
//! Transfers and deals generate raw pairwise debts; [`Engine::optimized_debts`]
//! nets them per account into the smallest settlement set.

pub use accounts::Account;
pub use commands::{DealCmd, TransferCmd};
pub use deals::Deal;
pub use debts::{DebtSource, RawDebt, SourceKind};
pub use enrichment::{DebtSummary, PersonDebts};
pub use error::EngineError;
pub use money::Money;
pub use netting::OptimizedDebt;
pub use ops::{Engine, EngineBuilder};
pub use persons::Person;
pub use transfers::Transfer;

mod accounts;
mod commands;
mod deals;
mod debts;
mod enrichment;
mod error;
pub mod generator;
mod locks;
mod money;
pub mod netting;
mod ops;
mod persons;
mod transfers;

type ResultEngine<T> = Result<T, EngineError>;
