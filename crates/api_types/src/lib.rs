use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Query strings. Ids travel as camelCase query parameters
/// (`?accountId=...`), bodies use snake_case.
pub mod query {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountQuery {
        #[serde(rename = "accountId")]
        pub account_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PersonQuery {
        #[serde(rename = "personId")]
        pub person_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferQuery {
        #[serde(rename = "transferId")]
        pub transfer_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DealQuery {
        #[serde(rename = "dealId")]
        pub deal_id: Uuid,
    }
}

pub mod account {
    use super::*;

    /// Body of `addAccount` and `updateAccount`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
    }
}

pub mod person {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PersonNew {
        pub account_id: Uuid,
        pub name: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PersonUpdate {
        pub name: String,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PersonView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub name: String,
    }

    /// One counterpart of a settlement.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DebtEntry {
        pub person_id: Uuid,
        pub name: String,
        pub amount_minor: i64,
    }

    /// A person of `getPersons`.
    ///
    /// - `debtors`: persons who owe this person.
    /// - `lenders`: persons this person owes.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct PersonWithDebts {
        #[serde(flatten)]
        pub person: PersonView,
        pub debtors: Vec<DebtEntry>,
        pub lenders: Vec<DebtEntry>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct PersonsResponse {
        pub persons: Vec<PersonWithDebts>,
    }
}

pub mod transfer {
    use super::*;

    /// Body of `addTransfer` and `updateTransfer`: `sender` handed `amount`
    /// (major units, at most two decimals) to `receiver`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransferNew {
        /// Defaults to the sender's account.
        pub account_id: Option<Uuid>,
        pub sender: Uuid,
        pub receiver: Uuid,
        pub amount: f64,
        pub note: Option<String>,
        /// Defaults to now.
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TransferView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub sender: Uuid,
        pub receiver: Uuid,
        pub amount_minor: i64,
        pub note: Option<String>,
        pub occurred_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransfersResponse {
        pub transfers: Vec<TransferView>,
    }
}

pub mod deal {
    use super::*;

    /// Body of `addDeal` and `updateDeal`: `sender` paid `amount` on behalf
    /// of `receiver`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DealNew {
        pub account_id: Option<Uuid>,
        pub title: String,
        pub sender: Uuid,
        pub receiver: Uuid,
        pub amount: f64,
        pub occurred_at: Option<DateTime<FixedOffset>>,
    }

    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct DealView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub title: String,
        pub sender: Uuid,
        pub receiver: Uuid,
        pub amount_minor: i64,
        pub occurred_at: DateTime<FixedOffset>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DealsResponse {
        pub deals: Vec<DealView>,
    }
}

pub mod debt {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SourceKind {
        Transfer,
        Deal,
    }

    /// A stored debt: `sender` owes `receiver`.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RawDebtView {
        pub id: Uuid,
        pub sender: Uuid,
        pub receiver: Uuid,
        pub amount_minor: i64,
        pub source_kind: SourceKind,
        pub source_id: Uuid,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DebtsResponse {
        pub debts: Vec<RawDebtView>,
    }

    /// A settlement: `sender` should pay `receiver`.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct OptimizedDebtView {
        pub sender: Uuid,
        pub receiver: Uuid,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct OptimizedDebtsResponse {
        pub debts: Vec<OptimizedDebtView>,
    }

    /// Positive `balance_minor` means the person is owed money.
    #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct BalanceView {
        pub person_id: Uuid,
        pub balance_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BalancesResponse {
        pub balances: Vec<BalanceView>,
    }
}
