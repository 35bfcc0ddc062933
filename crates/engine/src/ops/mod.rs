use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::{EngineError, ResultEngine, locks::AccountLocks};

mod accounts;
mod deals;
mod ledger;
mod persons;
mod transfers;

/// Default deadline for the store work of one operation.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    locks: AccountLocks,
    store_timeout: Duration,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Drive `work` to completion or fail with `StoreUnavailable` once the
    /// store deadline passes. One public operation wraps all of its store
    /// work in a single call. A future dropped mid-transaction rolls back.
    async fn bounded<T>(
        &self,
        operation: &str,
        work: impl Future<Output = ResultEngine<T>>,
    ) -> ResultEngine<T> {
        match tokio::time::timeout(self.store_timeout, work).await {
            Ok(result) => {
                if let Err(EngineError::StoreUnavailable(reason)) = &result {
                    tracing::error!(operation, %reason, "store failure");
                }
                result
            }
            Err(_) => {
                tracing::error!(operation, timeout = ?self.store_timeout, "store timed out");
                Err(EngineError::StoreUnavailable(format!(
                    "{operation} timed out after {:?}",
                    self.store_timeout
                )))
            }
        }
    }
}

fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidName(format!(
            "{label} name must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    store_timeout: Duration,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Upper bound for every store interaction of one operation.
    pub fn store_timeout(mut self, timeout: Duration) -> EngineBuilder {
        self.store_timeout = timeout;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.store_timeout.is_zero() {
            return Err(EngineError::StoreUnavailable(
                "store timeout must be greater than zero".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            locks: AccountLocks::default(),
            store_timeout: self.store_timeout,
        })
    }
}
