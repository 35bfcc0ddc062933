//! Transfer API endpoints

use api_types::{
    query::{AccountQuery, TransferQuery},
    transfer::{TransferNew, TransferView, TransfersResponse},
};
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use chrono::Utc;
use engine::{Money, Transfer, TransferCmd};

use crate::{ServerError, server::ServerState};

fn command(payload: TransferNew) -> Result<TransferCmd, ServerError> {
    Ok(TransferCmd {
        account_id: payload.account_id,
        sender: payload.sender,
        receiver: payload.receiver,
        amount: Money::from_major(payload.amount)?,
        note: payload.note,
        occurred_at: payload
            .occurred_at
            .map_or_else(Utc::now, |at| at.with_timezone(&Utc)),
    })
}

fn view(transfer: Transfer) -> TransferView {
    TransferView {
        id: transfer.id,
        account_id: transfer.account_id,
        sender: transfer.sender,
        receiver: transfer.receiver,
        amount_minor: transfer.amount.minor(),
        note: transfer.note,
        occurred_at: transfer.occurred_at.fixed_offset(),
    }
}

/// Handle requests for recording a transfer
pub async fn transfer_new(
    State(state): State<ServerState>,
    payload: Result<Json<TransferNew>, JsonRejection>,
) -> Result<(StatusCode, Json<TransferView>), ServerError> {
    let Json(payload) = payload?;
    let transfer = state.engine.new_transfer(command(payload)?).await?;
    Ok((StatusCode::CREATED, Json(view(transfer))))
}

pub async fn transfer_update(
    State(state): State<ServerState>,
    query: Result<Query<TransferQuery>, QueryRejection>,
    payload: Result<Json<TransferNew>, JsonRejection>,
) -> Result<StatusCode, ServerError> {
    let Query(query) = query?;
    let Json(payload) = payload?;
    state
        .engine
        .update_transfer(query.transfer_id, command(payload)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Deleting an unknown transfer succeeds as well
pub async fn transfer_delete(
    State(state): State<ServerState>,
    query: Result<Query<TransferQuery>, QueryRejection>,
) -> Result<StatusCode, ServerError> {
    let Query(query) = query?;
    state.engine.delete_transfer(query.transfer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn transfers_get(
    State(state): State<ServerState>,
    query: Result<Query<AccountQuery>, QueryRejection>,
) -> Result<Json<TransfersResponse>, ServerError> {
    let Query(query) = query?;
    let transfers = state.engine.transfers_for_account(query.account_id).await?;
    Ok(Json(TransfersResponse {
        transfers: transfers.into_iter().map(view).collect(),
    }))
}
