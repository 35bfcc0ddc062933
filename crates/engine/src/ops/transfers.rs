use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{
    DebtSource, EngineError, ResultEngine, Transfer, TransferCmd, debts, generator, transfers,
};

use super::{Engine, normalize_optional_text, persons::require_members, with_tx};

impl Engine {
    /// Record a transfer and the debt it creates.
    ///
    /// Both persons must belong to the transfer's account, which defaults to
    /// the sender's.
    pub async fn new_transfer(&self, cmd: TransferCmd) -> ResultEngine<Transfer> {
        generator::validate(cmd.sender, cmd.receiver, cmd.amount)?;

        self.bounded("new_transfer", async {
            let account_id = self.resolve_account(cmd.account_id, cmd.sender).await?;
            let transfer = normalized(cmd).into_transfer(Uuid::new_v4(), account_id);
            let planned = generator::plan_transfer(&transfer)?;

            let _guards = self.locks.write([account_id]).await;
            with_tx!(self, |db_tx| {
                require_members(&db_tx, account_id, &[transfer.sender, transfer.receiver])
                    .await?;
                debts::ensure_nettable(&db_tx, account_id, &planned).await?;
                transfers::ActiveModel::from(&transfer).insert(&db_tx).await?;
                debts::insert_all(&db_tx, &planned).await?;
                tracing::info!(
                    transfer_id = %transfer.id,
                    %account_id,
                    amount = %transfer.amount,
                    "transfer created"
                );
                Ok(transfer)
            })
        })
        .await
    }

    /// Return a transfer.
    pub async fn transfer(&self, transfer_id: Uuid) -> ResultEngine<Transfer> {
        self.bounded("transfer", async {
            let model = require_transfer(&self.database, transfer_id).await?;
            Ok(Transfer::from(model))
        })
        .await
    }

    /// Overwrite a transfer and regenerate its debt. On any failure the old
    /// transfer and its debt stay as they were.
    pub async fn update_transfer(
        &self,
        transfer_id: Uuid,
        cmd: TransferCmd,
    ) -> ResultEngine<Transfer> {
        generator::validate(cmd.sender, cmd.receiver, cmd.amount)?;
        let source = DebtSource::transfer(transfer_id);

        self.bounded("update_transfer", async {
            let current = require_transfer(&self.database, transfer_id).await?;
            let account_id = cmd.account_id.unwrap_or(current.account_id);
            let transfer = normalized(cmd).into_transfer(transfer_id, account_id);
            let planned = generator::plan_transfer(&transfer)?;

            let _guards = self
                .lock_source(source, [current.account_id, account_id])
                .await?;
            with_tx!(self, |db_tx| {
                require_transfer(&db_tx, transfer_id).await?;
                require_members(&db_tx, account_id, &[transfer.sender, transfer.receiver])
                    .await?;
                transfers::ActiveModel::from(&transfer).update(&db_tx).await?;
                let retracted = debts::delete_by_source(&db_tx, source).await?;
                debts::ensure_nettable(&db_tx, account_id, &planned).await?;
                debts::insert_all(&db_tx, &planned).await?;
                tracing::info!(
                    %transfer_id,
                    retracted,
                    amount = %transfer.amount,
                    "transfer updated"
                );
                Ok(transfer)
            })
        })
        .await
    }

    /// Delete a transfer and its debt. Deleting an unknown transfer is a no-op.
    pub async fn delete_transfer(&self, transfer_id: Uuid) -> ResultEngine<()> {
        let source = DebtSource::transfer(transfer_id);
        self.bounded("delete_transfer", async {
            let Some(current) = transfers::Entity::find_by_id(transfer_id)
                .one(&self.database)
                .await?
            else {
                tracing::debug!(%transfer_id, "transfer already gone");
                return Ok(());
            };

            let _guards = self.lock_source(source, [current.account_id]).await?;
            with_tx!(self, |db_tx| {
                transfers::Entity::delete_by_id(transfer_id)
                    .exec(&db_tx)
                    .await?;
                let retracted = debts::delete_by_source(&db_tx, source).await?;
                tracing::info!(%transfer_id, retracted, "transfer deleted");
                Ok(())
            })
        })
        .await
    }

    /// Transfers of an account, oldest first.
    pub async fn transfers_for_account(&self, account_id: Uuid) -> ResultEngine<Vec<Transfer>> {
        self.bounded("transfers_for_account", async {
            let models = transfers::Entity::find()
                .filter(transfers::Column::AccountId.eq(account_id))
                .order_by_asc(transfers::Column::OccurredAt)
                .order_by_asc(transfers::Column::Id)
                .all(&self.database)
                .await?;
            Ok(models.into_iter().map(Transfer::from).collect())
        })
        .await
    }
}

fn normalized(mut cmd: TransferCmd) -> TransferCmd {
    cmd.note = normalize_optional_text(cmd.note.as_deref());
    cmd
}

async fn require_transfer<C: ConnectionTrait>(
    db: &C,
    transfer_id: Uuid,
) -> ResultEngine<transfers::Model> {
    transfers::Entity::find_by_id(transfer_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("transfer {transfer_id}")))
}
