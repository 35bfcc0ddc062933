//! Deal API endpoints

use api_types::{
    deal::{DealNew, DealView, DealsResponse},
    query::{AccountQuery, DealQuery},
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
use engine::{Deal, DealCmd, Money};

use crate::{ServerError, server::ServerState};

fn command(payload: DealNew) -> Result<DealCmd, ServerError> {
    Ok(DealCmd {
        account_id: payload.account_id,
        title: payload.title,
        sender: payload.sender,
        receiver: payload.receiver,
        amount: Money::from_major(payload.amount)?,
        occurred_at: payload
            .occurred_at
            .map_or_else(Utc::now, |at| at.with_timezone(&Utc)),
    })
}

fn view(deal: Deal) -> DealView {
    DealView {
        id: deal.id,
        account_id: deal.account_id,
        title: deal.title,
        sender: deal.sender,
        receiver: deal.receiver,
        amount_minor: deal.amount.minor(),
        occurred_at: deal.occurred_at.fixed_offset(),
    }
}

pub async fn deal_new(
    State(state): State<ServerState>,
    payload: Result<Json<DealNew>, JsonRejection>,
) -> Result<(StatusCode, Json<DealView>), ServerError> {
    let Json(payload) = payload?;
    let deal = state.engine.new_deal(command(payload)?).await?;
    Ok((StatusCode::CREATED, Json(view(deal))))
}

pub async fn deal_update(
    State(state): State<ServerState>,
    query: Result<Query<DealQuery>, QueryRejection>,
    payload: Result<Json<DealNew>, JsonRejection>,
) -> Result<StatusCode, ServerError> {
    let Query(query) = query?;
    let Json(payload) = payload?;
    state
        .engine
        .update_deal(query.deal_id, command(payload)?)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn deal_delete(
    State(state): State<ServerState>,
    query: Result<Query<DealQuery>, QueryRejection>,
) -> Result<StatusCode, ServerError> {
    let Query(query) = query?;
    state.engine.delete_deal(query.deal_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn deals_get(
    State(state): State<ServerState>,
    query: Result<Query<AccountQuery>, QueryRejection>,
) -> Result<Json<DealsResponse>, ServerError> {
    let Query(query) = query?;
    let deals = state.engine.deals_for_account(query.account_id).await?;
    Ok(Json(DealsResponse {
        deals: deals.into_iter().map(view).collect(),
    }))
}
