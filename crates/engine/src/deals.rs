//! Deal primitives.
//!
//! A `Deal` is a purchase paid by `sender` on behalf of `receiver` (a dinner,
//! a ticket, a shared bill). Its debts are regenerated from scratch whenever
//! the deal changes.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Money;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub id: Uuid,
    pub account_id: Uuid,
    pub title: String,
    pub sender: Uuid,
    pub receiver: Uuid,
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "deals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub title: String,
    pub sender: Uuid,
    pub receiver: Uuid,
    pub amount_minor: i64,
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

impl From<&Deal> for ActiveModel {
    fn from(deal: &Deal) -> Self {
        Self {
            id: ActiveValue::Set(deal.id),
            account_id: ActiveValue::Set(deal.account_id),
            title: ActiveValue::Set(deal.title.clone()),
            sender: ActiveValue::Set(deal.sender),
            receiver: ActiveValue::Set(deal.receiver),
            amount_minor: ActiveValue::Set(deal.amount.minor()),
            occurred_at: ActiveValue::Set(deal.occurred_at),
        }
    }
}

impl From<Model> for Deal {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            account_id: model.account_id,
            title: model.title,
            sender: model.sender,
            receiver: model.receiver,
            amount: Money::new(model.amount_minor),
            occurred_at: model.occurred_at,
        }
    }
}
