use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Deal, DealCmd, DebtSource, EngineError, ResultEngine, deals, debts, generator};

use super::{Engine, normalize_required_name, persons::require_members, with_tx};

impl Engine {
    /// Record a deal and the debt it creates.
    ///
    /// Both persons must belong to the deal's account, which defaults to
    /// the sender's.
    pub async fn new_deal(&self, cmd: DealCmd) -> ResultEngine<Deal> {
        generator::validate(cmd.sender, cmd.receiver, cmd.amount)?;
        let cmd = normalized(cmd)?;

        self.bounded("new_deal", async {
            let account_id = self.resolve_account(cmd.account_id, cmd.sender).await?;
            let deal = cmd.into_deal(Uuid::new_v4(), account_id);
            let planned = generator::plan_deal(&deal)?;

            let _guards = self.locks.write([account_id]).await;
            with_tx!(self, |db_tx| {
                require_members(&db_tx, account_id, &[deal.sender, deal.receiver]).await?;
                debts::ensure_nettable(&db_tx, account_id, &planned).await?;
                deals::ActiveModel::from(&deal).insert(&db_tx).await?;
                debts::insert_all(&db_tx, &planned).await?;
                tracing::info!(
                    deal_id = %deal.id,
                    %account_id,
                    amount = %deal.amount,
                    "deal created"
                );
                Ok(deal)
            })
        })
        .await
    }

    /// Return a deal.
    pub async fn deal(&self, deal_id: Uuid) -> ResultEngine<Deal> {
        self.bounded("deal", async {
            let model = require_deal(&self.database, deal_id).await?;
            Ok(Deal::from(model))
        })
        .await
    }

    /// Overwrite a deal and regenerate its debt. On any failure the old
    /// deal and its debt stay as they were.
    pub async fn update_deal(&self, deal_id: Uuid, cmd: DealCmd) -> ResultEngine<Deal> {
        generator::validate(cmd.sender, cmd.receiver, cmd.amount)?;
        let cmd = normalized(cmd)?;
        let source = DebtSource::deal(deal_id);

        self.bounded("update_deal", async {
            let current = require_deal(&self.database, deal_id).await?;
            let account_id = cmd.account_id.unwrap_or(current.account_id);
            let deal = cmd.into_deal(deal_id, account_id);
            let planned = generator::plan_deal(&deal)?;

            let _guards = self
                .lock_source(source, [current.account_id, account_id])
                .await?;
            with_tx!(self, |db_tx| {
                require_deal(&db_tx, deal_id).await?;
                require_members(&db_tx, account_id, &[deal.sender, deal.receiver]).await?;
                deals::ActiveModel::from(&deal).update(&db_tx).await?;
                let retracted = debts::delete_by_source(&db_tx, source).await?;
                debts::ensure_nettable(&db_tx, account_id, &planned).await?;
                debts::insert_all(&db_tx, &planned).await?;
                tracing::info!(%deal_id, retracted, amount = %deal.amount, "deal updated");
                Ok(deal)
            })
        })
        .await
    }

    /// Delete a deal and its debt. Deleting an unknown deal is a no-op.
    pub async fn delete_deal(&self, deal_id: Uuid) -> ResultEngine<()> {
        let source = DebtSource::deal(deal_id);
        self.bounded("delete_deal", async {
            let Some(current) = deals::Entity::find_by_id(deal_id)
                .one(&self.database)
                .await?
            else {
                tracing::debug!(%deal_id, "deal already gone");
                return Ok(());
            };

            let _guards = self.lock_source(source, [current.account_id]).await?;
            with_tx!(self, |db_tx| {
                deals::Entity::delete_by_id(deal_id).exec(&db_tx).await?;
                let retracted = debts::delete_by_source(&db_tx, source).await?;
                tracing::info!(%deal_id, retracted, "deal deleted");
                Ok(())
            })
        })
        .await
    }

    /// Deals of an account, oldest first.
    pub async fn deals_for_account(&self, account_id: Uuid) -> ResultEngine<Vec<Deal>> {
        self.bounded("deals_for_account", async {
            let models = deals::Entity::find()
                .filter(deals::Column::AccountId.eq(account_id))
                .order_by_asc(deals::Column::OccurredAt)
                .order_by_asc(deals::Column::Id)
                .all(&self.database)
                .await?;
            Ok(models.into_iter().map(Deal::from).collect())
        })
        .await
    }
}

fn normalized(mut cmd: DealCmd) -> ResultEngine<DealCmd> {
    cmd.title = normalize_required_name(&cmd.title, "deal")?;
    Ok(cmd)
}

async fn require_deal<C: ConnectionTrait>(db: &C, deal_id: Uuid) -> ResultEngine<deals::Model> {
    deals::Entity::find_by_id(deal_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("deal {deal_id}")))
}
