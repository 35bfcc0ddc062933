//! Debt API endpoints

use api_types::{
    debt::{
        BalanceView, BalancesResponse, DebtsResponse, OptimizedDebtView, OptimizedDebtsResponse,
        RawDebtView, SourceKind,
    },
    query::AccountQuery,
};
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use engine::RawDebt;

use crate::{ServerError, server::ServerState};

fn raw_view(debt: RawDebt) -> RawDebtView {
    RawDebtView {
        id: debt.id,
        sender: debt.sender,
        receiver: debt.receiver,
        amount_minor: debt.amount.minor(),
        source_kind: match debt.source.kind {
            engine::SourceKind::Transfer => SourceKind::Transfer,
            engine::SourceKind::Deal => SourceKind::Deal,
        },
        source_id: debt.source.id,
    }
}

/// Handle requests for the raw debts of an account
pub async fn debts_get(
    State(state): State<ServerState>,
    query: Result<Query<AccountQuery>, QueryRejection>,
) -> Result<Json<DebtsResponse>, ServerError> {
    let Query(query) = query?;
    let debts = state.engine.raw_debts(query.account_id).await?;
    Ok(Json(DebtsResponse {
        debts: debts.into_iter().map(raw_view).collect(),
    }))
}

/// Handle requests for the netted settlements of an account
pub async fn optimized_debts_get(
    State(state): State<ServerState>,
    query: Result<Query<AccountQuery>, QueryRejection>,
) -> Result<Json<OptimizedDebtsResponse>, ServerError> {
    let Query(query) = query?;
    let debts = state.engine.optimized_debts(query.account_id).await?;
    Ok(Json(OptimizedDebtsResponse {
        debts: debts
            .into_iter()
            .map(|debt| OptimizedDebtView {
                sender: debt.sender,
                receiver: debt.receiver,
                amount_minor: debt.amount.minor(),
            })
            .collect(),
    }))
}

pub async fn balances_get(
    State(state): State<ServerState>,
    query: Result<Query<AccountQuery>, QueryRejection>,
) -> Result<Json<BalancesResponse>, ServerError> {
    let Query(query) = query?;
    let balances = state.engine.balances(query.account_id).await?;
    Ok(Json(BalancesResponse {
        balances: balances
            .into_iter()
            .map(|(person_id, balance)| BalanceView {
                person_id,
                balance_minor: balance.minor(),
            })
            .collect(),
    }))
}
