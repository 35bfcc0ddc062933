//! Ledger facade: keeps raw debts in step with their sources and serves the
//! netted view.
//!
//! Every mutation holds the write lock of each account it touches and runs
//! retract-then-generate in one database transaction, so a reader holding the
//! account's read lock sees either the old debts or the new ones.

use std::collections::{BTreeMap, BTreeSet};

use sea_orm::{ConnectionTrait, TransactionTrait};
use tokio::sync::OwnedRwLockWriteGuard;
use uuid::Uuid;

use crate::{
    Deal, DealCmd, DebtSource, Money, OptimizedDebt, RawDebt, ResultEngine, Transfer, TransferCmd,
    debts, generator, netting,
};

use super::{
    Engine,
    accounts::require_account,
    persons::{require_members, require_person},
    with_tx,
};

impl Engine {
    /// Generate the debts of a transfer.
    pub async fn add_from_transfer(&self, transfer: &Transfer) -> ResultEngine<()> {
        let planned = generator::plan_transfer(transfer)?;
        let source = DebtSource::transfer(transfer.id);
        self.bounded(
            "add_from_transfer",
            self.replace_source(source, transfer.account_id, planned),
        )
        .await
    }

    /// Replace the debts of transfer `transfer_id` with those of `cmd`. A
    /// transfer without debts simply gets new ones.
    pub async fn update_from_transfer(
        &self,
        transfer_id: Uuid,
        cmd: &TransferCmd,
    ) -> ResultEngine<()> {
        generator::validate(cmd.sender, cmd.receiver, cmd.amount)?;
        self.bounded("update_from_transfer", async {
            let account_id = self.resolve_account(cmd.account_id, cmd.sender).await?;
            let transfer = cmd.clone().into_transfer(transfer_id, account_id);
            let planned = generator::plan_transfer(&transfer)?;
            self.replace_source(DebtSource::transfer(transfer_id), account_id, planned)
                .await
        })
        .await
    }

    /// Drop the debts of a transfer. Unknown transfers are a no-op.
    pub async fn delete_from_transfer(&self, transfer_id: Uuid) -> ResultEngine<()> {
        self.retract(DebtSource::transfer(transfer_id)).await
    }

    /// Generate the debts of a deal.
    pub async fn add_from_deal(&self, deal: &Deal) -> ResultEngine<()> {
        let planned = generator::plan_deal(deal)?;
        let source = DebtSource::deal(deal.id);
        self.bounded(
            "add_from_deal",
            self.replace_source(source, deal.account_id, planned),
        )
        .await
    }

    pub async fn update_from_deal(&self, deal_id: Uuid, cmd: &DealCmd) -> ResultEngine<()> {
        generator::validate(cmd.sender, cmd.receiver, cmd.amount)?;
        self.bounded("update_from_deal", async {
            let account_id = self.resolve_account(cmd.account_id, cmd.sender).await?;
            let deal = cmd.clone().into_deal(deal_id, account_id);
            let planned = generator::plan_deal(&deal)?;
            self.replace_source(DebtSource::deal(deal_id), account_id, planned)
                .await
        })
        .await
    }

    pub async fn delete_from_deal(&self, deal_id: Uuid) -> ResultEngine<()> {
        self.retract(DebtSource::deal(deal_id)).await
    }

    /// Remove every raw debt generated by `source`. Idempotent.
    pub async fn retract(&self, source: DebtSource) -> ResultEngine<()> {
        self.bounded("retract", async {
            let _guards = self.lock_source(source, []).await?;
            with_tx!(self, |db_tx| {
                let retracted = debts::delete_by_source(&db_tx, source).await?;
                tracing::info!(%source, retracted, "debts retracted");
                Ok(())
            })
        })
        .await
    }

    /// The minimal settlement set of an account, largest amount first.
    pub async fn optimized_debts(&self, account_id: Uuid) -> ResultEngine<Vec<OptimizedDebt>> {
        self.bounded("optimized_debts", self.netted(account_id))
            .await
    }

    /// Raw debts touching an account, ordered by id.
    pub async fn raw_debts(&self, account_id: Uuid) -> ResultEngine<Vec<RawDebt>> {
        self.bounded("raw_debts", async {
            let _guard = self.locks.read(account_id).await;
            debts::list_for_account(&self.database, account_id).await
        })
        .await
    }

    /// Net balance of every person with debts in the account. Positive means
    /// the person is owed money.
    pub async fn balances(&self, account_id: Uuid) -> ResultEngine<BTreeMap<Uuid, Money>> {
        self.bounded("balances", async {
            let _guard = self.locks.read(account_id).await;
            let raw = debts::list_for_account(&self.database, account_id).await?;
            netting::net_balances(&raw)
        })
        .await
    }

    /// Unbounded body of [`Engine::optimized_debts`].
    pub(super) async fn netted(&self, account_id: Uuid) -> ResultEngine<Vec<OptimizedDebt>> {
        let _guard = self.locks.read(account_id).await;
        let raw = debts::list_for_account(&self.database, account_id).await?;
        netting::optimize(&raw)
    }

    /// Retract the debts of `source` and install `planned` atomically. Every
    /// person in `planned` must belong to `account_id`. Callers bound it.
    async fn replace_source(
        &self,
        source: DebtSource,
        account_id: Uuid,
        planned: Vec<RawDebt>,
    ) -> ResultEngine<()> {
        let members: Vec<Uuid> = planned
            .iter()
            .flat_map(|debt| [debt.sender, debt.receiver])
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let _guards = self.lock_source(source, [account_id]).await?;
        with_tx!(self, |db_tx| {
            require_members(&db_tx, account_id, &members).await?;
            let retracted = debts::delete_by_source(&db_tx, source).await?;
            debts::ensure_nettable(&db_tx, account_id, &planned).await?;
            debts::insert_all(&db_tx, &planned).await?;
            tracing::info!(%source, retracted, generated = planned.len(), "debts replaced");
            Ok(())
        })
    }

    /// Write-lock `extra` plus every account currently holding debts of
    /// `source`. The debts may move while we wait, so the set is re-read once
    /// the locks are held and the locking repeated until it is stable.
    pub(super) async fn lock_source<const N: usize>(
        &self,
        source: DebtSource,
        extra: [Uuid; N],
    ) -> ResultEngine<Vec<OwnedRwLockWriteGuard<()>>> {
        let mut wanted = source_accounts(&self.database, source).await?;
        wanted.extend(extra);
        loop {
            let guards = self.locks.write(wanted.iter().copied()).await;
            let current = source_accounts(&self.database, source).await?;
            if current.is_subset(&wanted) {
                return Ok(guards);
            }
            drop(guards);
            wanted.extend(current);
        }
    }

    /// The account a body lands in: the explicit one, or the sender's.
    /// Runs inside the caller's bound.
    pub(super) async fn resolve_account(
        &self,
        explicit: Option<Uuid>,
        sender: Uuid,
    ) -> ResultEngine<Uuid> {
        match explicit {
            Some(account_id) => Ok(require_account(&self.database, account_id).await?.id),
            None => Ok(require_person(&self.database, sender).await?.account_id),
        }
    }
}

async fn source_accounts<C: ConnectionTrait>(
    db: &C,
    source: DebtSource,
) -> ResultEngine<BTreeSet<Uuid>> {
    let existing = debts::find_by_source(db, source).await?;
    Ok(existing.into_iter().map(|debt| debt.account_id).collect())
}
