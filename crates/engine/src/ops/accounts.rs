use sea_orm::{ActiveValue, ConnectionTrait, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Account, EngineError, ResultEngine, accounts};

use super::{Engine, normalize_required_name, with_tx};

impl Engine {
    /// Create a new, empty account.
    pub async fn new_account(&self, name: &str) -> ResultEngine<Account> {
        let name = normalize_required_name(name, "account")?;
        self.bounded("new_account", async {
            with_tx!(self, |db_tx| {
                let account = Account::new(name);
                accounts::ActiveModel::from(&account).insert(&db_tx).await?;
                tracing::info!(account_id = %account.id, "account created");
                Ok(account)
            })
        })
        .await
    }

    /// Return an account.
    pub async fn account(&self, account_id: Uuid) -> ResultEngine<Account> {
        self.bounded("account", async {
            let model = require_account(&self.database, account_id).await?;
            Ok(Account::from(model))
        })
        .await
    }

    /// Rename an account.
    pub async fn update_account(&self, account_id: Uuid, name: &str) -> ResultEngine<Account> {
        let name = normalize_required_name(name, "account")?;
        self.bounded("update_account", async {
            with_tx!(self, |db_tx| {
                let model = require_account(&db_tx, account_id).await?;
                let mut active: accounts::ActiveModel = model.into();
                active.name = ActiveValue::Set(name);
                let model = active.update(&db_tx).await?;
                Ok(Account::from(model))
            })
        })
        .await
    }
}

pub(super) async fn require_account<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
) -> ResultEngine<accounts::Model> {
    accounts::Entity::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("account {account_id}")))
}
