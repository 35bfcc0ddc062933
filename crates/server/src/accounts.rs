//! Account API endpoints

use api_types::{
    account::{AccountNew, AccountView},
    query::AccountQuery,
};
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};

use crate::{ServerError, server::ServerState};

fn view(account: engine::Account) -> AccountView {
    AccountView {
        id: account.id,
        name: account.name,
    }
}

/// Handle requests for creating a new `Account`
pub async fn account_new(
    State(state): State<ServerState>,
    payload: Result<Json<AccountNew>, JsonRejection>,
) -> Result<(StatusCode, Json<AccountView>), ServerError> {
    let Json(payload) = payload?;
    let account = state.engine.new_account(&payload.name).await?;
    Ok((StatusCode::CREATED, Json(view(account))))
}

pub async fn account_update(
    State(state): State<ServerState>,
    query: Result<Query<AccountQuery>, QueryRejection>,
    payload: Result<Json<AccountNew>, JsonRejection>,
) -> Result<Json<AccountView>, ServerError> {
    let Query(query) = query?;
    let Json(payload) = payload?;
    let account = state
        .engine
        .update_account(query.account_id, &payload.name)
        .await?;
    Ok(Json(view(account)))
}

pub async fn account_get(
    State(state): State<ServerState>,
    query: Result<Query<AccountQuery>, QueryRejection>,
) -> Result<Json<AccountView>, ServerError> {
    let Query(query) = query?;
    let account = state.engine.account(query.account_id).await?;
    Ok(Json(view(account)))
}
