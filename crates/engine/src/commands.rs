//! Command structs for engine write operations.
//!
//! They mirror the bodies accepted by the HTTP layer once those have been
//! parsed into typed values (ids, [`Money`]).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Deal, Money, Transfer};

/// Body of a transfer: `sender` handed `amount` to `receiver`.
///
/// When `account_id` is `None` the transfer lands in the sender's account.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub account_id: Option<Uuid>,
    pub sender: Uuid,
    pub receiver: Uuid,
    pub amount: Money,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl TransferCmd {
    pub fn new(sender: Uuid, receiver: Uuid, amount: Money) -> Self {
        Self {
            account_id: None,
            sender,
            receiver,
            amount,
            note: None,
            occurred_at: Utc::now(),
        }
    }

    pub(crate) fn into_transfer(self, id: Uuid, account_id: Uuid) -> Transfer {
        Transfer {
            id,
            account_id,
            sender: self.sender,
            receiver: self.receiver,
            amount: self.amount,
            note: self.note,
            occurred_at: self.occurred_at,
        }
    }
}

/// Body of a deal: `sender` paid `amount` on behalf of `receiver`.
#[derive(Clone, Debug)]
pub struct DealCmd {
    pub account_id: Option<Uuid>,
    pub title: String,
    pub sender: Uuid,
    pub receiver: Uuid,
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
}

impl DealCmd {
    pub fn new(title: impl Into<String>, sender: Uuid, receiver: Uuid, amount: Money) -> Self {
        Self {
            account_id: None,
            title: title.into(),
            sender,
            receiver,
            amount,
            occurred_at: Utc::now(),
        }
    }

    pub(crate) fn into_deal(self, id: Uuid, account_id: Uuid) -> Deal {
        Deal {
            id,
            account_id,
            title: self.title,
            sender: self.sender,
            receiver: self.receiver,
            amount: self.amount,
            occurred_at: self.occurred_at,
        }
    }
}
