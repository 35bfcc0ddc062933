//! Per-person view of the optimized debts.
//!
//! For a settlement "`S` owes `R` `amount`", `R` lists `S` among its
//! `debtors` and `S` lists `R` among its `lenders`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Money, OptimizedDebt, Person};

/// The counterpart of a settlement, seen from one person.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtSummary {
    pub person_id: Uuid,
    pub name: String,
    pub amount: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonDebts {
    pub person: Person,
    /// Persons who owe this person.
    pub debtors: Vec<DebtSummary>,
    /// Persons this person owes.
    pub lenders: Vec<DebtSummary>,
}

fn summary(person_id: Uuid, amount: Money, names: &HashMap<Uuid, String>) -> DebtSummary {
    let name = match names.get(&person_id) {
        Some(name) => name.clone(),
        None => {
            tracing::warn!(%person_id, "settlement references an unknown person");
            person_id.to_string()
        }
    };
    DebtSummary {
        person_id,
        name,
        amount,
    }
}

/// Attach debtors and lenders to `persons`, keeping their order. Persons
/// untouched by `optimized` get two empty lists.
pub(crate) fn enrich(
    persons: Vec<Person>,
    optimized: &[OptimizedDebt],
    names: &HashMap<Uuid, String>,
) -> Vec<PersonDebts> {
    persons
        .into_iter()
        .map(|person| {
            let debtors = optimized
                .iter()
                .filter(|debt| debt.receiver == person.id)
                .map(|debt| summary(debt.sender, debt.amount, names))
                .collect();
            let lenders = optimized
                .iter()
                .filter(|debt| debt.sender == person.id)
                .map(|debt| summary(debt.receiver, debt.amount, names))
                .collect();
            PersonDebts {
                person,
                debtors,
                lenders,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(account_id: Uuid, name: &str) -> Person {
        Person::new(account_id, name.to_string())
    }

    #[test]
    fn settlement_shows_on_both_sides() {
        let account = Uuid::new_v4();
        let (alice, bob, carol) = (
            person(account, "Alice"),
            person(account, "Bob"),
            person(account, "Carol"),
        );
        let names: HashMap<Uuid, String> = [&alice, &bob, &carol]
            .iter()
            .map(|p| (p.id, p.name.clone()))
            .collect();
        let optimized = vec![OptimizedDebt {
            sender: bob.id,
            receiver: alice.id,
            amount: Money::new(10_000),
        }];

        let enriched = enrich(vec![alice.clone(), bob.clone(), carol], &optimized, &names);

        assert_eq!(
            enriched[0].debtors,
            vec![DebtSummary {
                person_id: bob.id,
                name: "Bob".to_string(),
                amount: Money::new(10_000),
            }]
        );
        assert!(enriched[0].lenders.is_empty());
        assert_eq!(enriched[1].lenders[0].person_id, alice.id);
        assert_eq!(enriched[1].lenders[0].name, "Alice");
        assert!(enriched[1].debtors.is_empty());
        assert!(enriched[2].debtors.is_empty() && enriched[2].lenders.is_empty());
    }

    #[test]
    fn unknown_names_fall_back_to_id() {
        let account = Uuid::new_v4();
        let alice = person(account, "Alice");
        let ghost = Uuid::new_v4();
        let optimized = vec![OptimizedDebt {
            sender: ghost,
            receiver: alice.id,
            amount: Money::new(5),
        }];

        let enriched = enrich(vec![alice], &optimized, &HashMap::new());

        assert_eq!(enriched[0].debtors[0].name, ghost.to_string());
    }
}
