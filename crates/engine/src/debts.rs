//! Raw debts and the debt record store.
//!
//! A [`RawDebt`] is a single pairwise obligation ("`sender` owes `receiver`
//! `amount`") generated by exactly one [`DebtSource`]. Raw debts are never
//! edited in place: a changed source retracts its debts and installs new ones
//! inside the same database transaction.
//!
//! The store functions are generic over [`ConnectionTrait`] so the callers
//! decide the transaction boundary.

use std::fmt;

use sea_orm::{
    ActiveValue, Condition, ConnectionTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait,
    entity::prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, persons};

/// The kind of record a raw debt was generated from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Transfer,
    Deal,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transfer => "transfer",
            Self::Deal => "deal",
        }
    }
}

impl TryFrom<&str> for SourceKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "transfer" => Ok(Self::Transfer),
            "deal" => Ok(Self::Deal),
            other => Err(EngineError::StoreUnavailable(format!(
                "invalid debt source kind: {other}"
            ))),
        }
    }
}

/// Retraction key of a raw debt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DebtSource {
    pub kind: SourceKind,
    pub id: Uuid,
}

impl DebtSource {
    pub fn transfer(id: Uuid) -> Self {
        Self {
            kind: SourceKind::Transfer,
            id,
        }
    }

    pub fn deal(id: Uuid) -> Self {
        Self {
            kind: SourceKind::Deal,
            id,
        }
    }
}

impl fmt::Display for DebtSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind.as_str(), self.id)
    }
}

/// "`sender` owes `receiver` `amount`", generated by `source`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDebt {
    pub id: Uuid,
    pub account_id: Uuid,
    pub sender: Uuid,
    pub receiver: Uuid,
    pub amount: Money,
    pub source: DebtSource,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "debts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub sender: Uuid,
    pub receiver: Uuid,
    pub amount_minor: i64,
    pub source_kind: String,
    pub source_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&RawDebt> for ActiveModel {
    fn from(debt: &RawDebt) -> Self {
        Self {
            id: ActiveValue::Set(debt.id),
            account_id: ActiveValue::Set(debt.account_id),
            sender: ActiveValue::Set(debt.sender),
            receiver: ActiveValue::Set(debt.receiver),
            amount_minor: ActiveValue::Set(debt.amount.minor()),
            source_kind: ActiveValue::Set(debt.source.kind.as_str().to_string()),
            source_id: ActiveValue::Set(debt.source.id),
        }
    }
}

impl TryFrom<Model> for RawDebt {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            account_id: model.account_id,
            sender: model.sender,
            receiver: model.receiver,
            amount: Money::new(model.amount_minor),
            source: DebtSource {
                kind: SourceKind::try_from(model.source_kind.as_str())?,
                id: model.source_id,
            },
        })
    }
}

fn by_source(source: DebtSource) -> Condition {
    Condition::all()
        .add(Column::SourceKind.eq(source.kind.as_str()))
        .add(Column::SourceId.eq(source.id))
}

fn into_debts(models: Vec<Model>) -> ResultEngine<Vec<RawDebt>> {
    models.into_iter().map(RawDebt::try_from).collect()
}

/// Persist freshly generated debts.
pub(crate) async fn insert_all<C: ConnectionTrait>(db: &C, debts: &[RawDebt]) -> ResultEngine<()> {
    for debt in debts {
        ActiveModel::from(debt).insert(db).await?;
    }
    Ok(())
}

/// Remove every debt generated by `source`. Returns how many rows went away;
/// zero is not an error.
pub(crate) async fn delete_by_source<C: ConnectionTrait>(
    db: &C,
    source: DebtSource,
) -> ResultEngine<u64> {
    let result = Entity::delete_many()
        .filter(by_source(source))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub(crate) async fn find_by_source<C: ConnectionTrait>(
    db: &C,
    source: DebtSource,
) -> ResultEngine<Vec<RawDebt>> {
    let models = Entity::find()
        .filter(by_source(source))
        .order_by_asc(Column::Id)
        .all(db)
        .await?;
    into_debts(models)
}

/// Debts whose sender or receiver belongs to `account_id`.
fn touching_account(account_id: Uuid) -> Condition {
    let members = persons::Entity::find()
        .select_only()
        .column(persons::Column::Id)
        .filter(persons::Column::AccountId.eq(account_id))
        .into_query();

    Condition::any()
        .add(Column::Sender.in_subquery(members.clone()))
        .add(Column::Receiver.in_subquery(members))
}

/// All debts whose sender or receiver belongs to `account_id`, ordered by id.
pub(crate) async fn list_for_account<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
) -> ResultEngine<Vec<RawDebt>> {
    let models = Entity::find()
        .filter(touching_account(account_id))
        .order_by_asc(Column::Id)
        .all(db)
        .await?;
    into_debts(models)
}

/// Reject `planned` when the gross amount of the account's debts plus
/// `planned` no longer fits in [`Money`]. While the gross total fits, no
/// balance or pairwise sum in the account can overflow during netting.
///
/// Must run after the debts being replaced are deleted.
pub(crate) async fn ensure_nettable<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    planned: &[RawDebt],
) -> ResultEngine<()> {
    let stored: Vec<i64> = Entity::find()
        .select_only()
        .column(Column::AmountMinor)
        .filter(touching_account(account_id))
        .into_tuple()
        .all(db)
        .await?;

    let gross: i128 = stored
        .into_iter()
        .chain(planned.iter().map(|debt| debt.amount.minor()))
        .map(i128::from)
        .sum();
    if gross > i128::from(i64::MAX) {
        return Err(EngineError::InvalidAmount(format!(
            "total debt of account {account_id} would exceed {}",
            Money::new(i64::MAX)
        )));
    }
    Ok(())
}
