//! Transfer primitives.
//!
//! A `Transfer` records money handed from `sender` to `receiver`. While it
//! exists the ledger holds exactly one raw debt for it: the receiver owes the
//! sender the transferred amount.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Money;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: Uuid,
    pub account_id: Uuid,
    pub sender: Uuid,
    pub receiver: Uuid,
    pub amount: Money,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub sender: Uuid,
    pub receiver: Uuid,
    pub amount_minor: i64,
    pub note: Option<String>,
    pub occurred_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transfer> for ActiveModel {
    fn from(transfer: &Transfer) -> Self {
        Self {
            id: ActiveValue::Set(transfer.id),
            account_id: ActiveValue::Set(transfer.account_id),
            sender: ActiveValue::Set(transfer.sender),
            receiver: ActiveValue::Set(transfer.receiver),
            amount_minor: ActiveValue::Set(transfer.amount.minor()),
            note: ActiveValue::Set(transfer.note.clone()),
            occurred_at: ActiveValue::Set(transfer.occurred_at),
        }
    }
}

impl From<Model> for Transfer {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            sender: model.sender,
            receiver: model.receiver,
            amount: Money::new(model.amount_minor),
            note: model.note,
            occurred_at: model.occurred_at,
        }
    }
}
