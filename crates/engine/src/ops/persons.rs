use std::collections::HashMap;

use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{EngineError, Person, PersonDebts, ResultEngine, enrichment, persons};

use super::{Engine, accounts::require_account, normalize_required_name, with_tx};

impl Engine {
    /// Add a person to an existing account.
    pub async fn new_person(&self, account_id: Uuid, name: &str) -> ResultEngine<Person> {
        let name = normalize_required_name(name, "person")?;
        self.bounded("new_person", async {
            with_tx!(self, |db_tx| {
                require_account(&db_tx, account_id).await?;
                let person = Person::new(account_id, name);
                persons::ActiveModel::from(&person).insert(&db_tx).await?;
                tracing::info!(person_id = %person.id, %account_id, "person created");
                Ok(person)
            })
        })
        .await
    }

    /// Return a person.
    pub async fn person(&self, person_id: Uuid) -> ResultEngine<Person> {
        self.bounded("person", async {
            let model = require_person(&self.database, person_id).await?;
            Ok(Person::from(model))
        })
        .await
    }

    /// Rename a person. Persons never move between accounts.
    pub async fn update_person(&self, person_id: Uuid, name: &str) -> ResultEngine<Person> {
        let name = normalize_required_name(name, "person")?;
        self.bounded("update_person", async {
            with_tx!(self, |db_tx| {
                let model = require_person(&db_tx, person_id).await?;
                let mut active: persons::ActiveModel = model.into();
                active.name = ActiveValue::Set(name);
                let model = active.update(&db_tx).await?;
                Ok(Person::from(model))
            })
        })
        .await
    }

    /// Persons of an account ordered by name. Unknown accounts have none.
    pub async fn persons_for_account(&self, account_id: Uuid) -> ResultEngine<Vec<Person>> {
        self.bounded("persons_for_account", self.members(account_id))
            .await
    }

    /// Attach to every person who owes whom and who owes them, according to
    /// the optimized debts of `account_id`.
    pub async fn enrich_persons(
        &self,
        persons: Vec<Person>,
        account_id: Uuid,
    ) -> ResultEngine<Vec<PersonDebts>> {
        self.bounded("enrich_persons", self.enriched(persons, account_id))
            .await
    }

    /// Persons of an account, each with its debtors and lenders.
    pub async fn persons_with_debts(&self, account_id: Uuid) -> ResultEngine<Vec<PersonDebts>> {
        self.bounded("persons_with_debts", async {
            let persons = self.members(account_id).await?;
            self.enriched(persons, account_id).await
        })
        .await
    }

    async fn members(&self, account_id: Uuid) -> ResultEngine<Vec<Person>> {
        let models = persons::Entity::find()
            .filter(persons::Column::AccountId.eq(account_id))
            .order_by_asc(persons::Column::Name)
            .order_by_asc(persons::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Person::from).collect())
    }

    async fn enriched(
        &self,
        persons: Vec<Person>,
        account_id: Uuid,
    ) -> ResultEngine<Vec<PersonDebts>> {
        let optimized = self.netted(account_id).await?;

        let mut names: HashMap<Uuid, String> = persons
            .iter()
            .map(|person| (person.id, person.name.clone()))
            .collect();
        let missing: Vec<Uuid> = optimized
            .iter()
            .flat_map(|debt| [debt.sender, debt.receiver])
            .filter(|id| !names.contains_key(id))
            .collect();
        if !missing.is_empty() {
            let found = persons::Entity::find()
                .filter(persons::Column::Id.is_in(missing))
                .all(&self.database)
                .await?;
            names.extend(found.into_iter().map(|model| (model.id, model.name)));
        }

        Ok(enrichment::enrich(persons, &optimized, &names))
    }
}

pub(super) async fn require_person<C: ConnectionTrait>(
    db: &C,
    person_id: Uuid,
) -> ResultEngine<persons::Model> {
    persons::Entity::find_by_id(person_id)
        .one(db)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("person {person_id}")))
}

/// Fail with `KeyNotFound` unless every person in `ids` belongs to `account_id`.
pub(super) async fn require_members<C: ConnectionTrait>(
    db: &C,
    account_id: Uuid,
    ids: &[Uuid],
) -> ResultEngine<()> {
    for &person_id in ids {
        let model = require_person(db, person_id).await?;
        if model.account_id != account_id {
            return Err(EngineError::KeyNotFound(format!(
                "person {person_id} in account {account_id}"
            )));
        }
    }
    Ok(())
}
