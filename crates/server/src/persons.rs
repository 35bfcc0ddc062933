//! Person API endpoints

use api_types::{
    person::{DebtEntry, PersonNew, PersonUpdate, PersonView, PersonWithDebts, PersonsResponse},
    query::{AccountQuery, PersonQuery},
};
use axum::{
    Json,
    extract::{
        Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use engine::{DebtSummary, Person, PersonDebts};

use crate::{ServerError, server::ServerState};

fn view(person: Person) -> PersonView {
    PersonView {
        id: person.id,
        account_id: person.account_id,
        name: person.name,
    }
}

fn entry(summary: DebtSummary) -> DebtEntry {
    DebtEntry {
        person_id: summary.person_id,
        name: summary.name,
        amount_minor: summary.amount.minor(),
    }
}

fn with_debts(person: PersonDebts) -> PersonWithDebts {
    PersonWithDebts {
        person: view(person.person),
        debtors: person.debtors.into_iter().map(entry).collect(),
        lenders: person.lenders.into_iter().map(entry).collect(),
    }
}

/// Handle requests for adding a `Person` to an account
pub async fn person_new(
    State(state): State<ServerState>,
    payload: Result<Json<PersonNew>, JsonRejection>,
) -> Result<(StatusCode, Json<PersonView>), ServerError> {
    let Json(payload) = payload?;
    let person = state
        .engine
        .new_person(payload.account_id, &payload.name)
        .await?;
    Ok((StatusCode::CREATED, Json(view(person))))
}

pub async fn person_update(
    State(state): State<ServerState>,
    query: Result<Query<PersonQuery>, QueryRejection>,
    payload: Result<Json<PersonUpdate>, JsonRejection>,
) -> Result<Json<PersonView>, ServerError> {
    let Query(query) = query?;
    let Json(payload) = payload?;
    let person = state
        .engine
        .update_person(query.person_id, &payload.name)
        .await?;
    Ok(Json(view(person)))
}

/// Handle requests for the persons of an account, each with who owes them
/// and whom they owe
pub async fn persons_get(
    State(state): State<ServerState>,
    query: Result<Query<AccountQuery>, QueryRejection>,
) -> Result<Json<PersonsResponse>, ServerError> {
    let Query(query) = query?;
    let persons = state.engine.persons_with_debts(query.account_id).await?;
    Ok(Json(PersonsResponse {
        persons: persons.into_iter().map(with_debts).collect(),
    }))
}
