//! Balance-based debt netting.
//!
//! # Algorithm
//!
//! 1. Compute the net balance of every person (owed to them minus owed by
//!    them).
//! 2. Split persons into creditors (positive balance) and debtors (negative
//!    balance). Settled persons drop out.
//! 3. Match the largest debtor with the largest creditor, emit one settlement
//!    for the smaller magnitude and push back whoever still has something
//!    left.
//!
//! Every round retires at least one person, so `n` unsettled persons produce
//! at most `n - 1` settlements. Magnitude ties go to the smaller person id.
//! When plain pairwise netting of the history is shorter than the greedy
//! result, the pairwise set wins.
//!
//! # Example
//!
//! ```text
//! Raw debts:
//!   A owes B: 100
//!   B owes C: 80
//!   C owes A: 50
//!
//! Net balances:
//!   A: -50, B: +20, C: +30
//!
//! Settlements:
//!   A pays C: 30
//!   A pays B: 20
//! ```

use std::{
    cmp::Reverse,
    collections::{BTreeMap, BinaryHeap},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, debts::RawDebt};

/// One settlement of the optimized view: `sender` owes `receiver` `amount`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OptimizedDebt {
    pub sender: Uuid,
    pub receiver: Uuid,
    pub amount: Money,
}

/// Balances are summed in `i128` and only narrowed at the end, so no
/// intermediate sum can overflow. A final balance outside `±i64::MAX` is an
/// `InvalidAmount`.
fn to_money(value: i128) -> ResultEngine<Money> {
    i64::try_from(value)
        .ok()
        .filter(|minor| *minor != i64::MIN)
        .map(Money::new)
        .ok_or_else(|| {
            EngineError::InvalidAmount(format!("balance of {value} minor units is out of range"))
        })
}

/// Net position of every person touched by `raw`. Positive means the person
/// is owed money.
pub fn net_balances(raw: &[RawDebt]) -> ResultEngine<BTreeMap<Uuid, Money>> {
    let mut sums: BTreeMap<Uuid, i128> = BTreeMap::new();
    for debt in raw {
        let amount = i128::from(debt.amount.minor());
        *sums.entry(debt.receiver).or_default() += amount;
        *sums.entry(debt.sender).or_default() -= amount;
    }
    sums.into_iter()
        .map(|(person, balance)| Ok((person, to_money(balance)?)))
        .collect()
}

/// Heap entry: the biggest outstanding amount pops first, then the smallest id.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct Party {
    outstanding: Money,
    person: Reverse<Uuid>,
}

impl Party {
    fn new(person: Uuid, outstanding: Money) -> Self {
        Self {
            outstanding,
            person: Reverse(person),
        }
    }

    fn id(&self) -> Uuid {
        self.person.0
    }
}

/// Greedy matching of the largest debtor against the largest creditor.
fn greedy(balances: BTreeMap<Uuid, Money>) -> Vec<OptimizedDebt> {
    let mut debtors = BinaryHeap::new();
    let mut creditors = BinaryHeap::new();
    for (person, balance) in balances {
        if balance.is_positive() {
            creditors.push(Party::new(person, balance));
        } else if balance.is_negative() {
            debtors.push(Party::new(person, balance.abs()));
        }
    }

    let mut settlements = Vec::with_capacity(debtors.len().max(creditors.len()));
    loop {
        let (Some(mut debtor), Some(mut creditor)) = (debtors.pop(), creditors.pop()) else {
            break;
        };

        let amount = debtor.outstanding.min(creditor.outstanding);
        settlements.push(OptimizedDebt {
            sender: debtor.id(),
            receiver: creditor.id(),
            amount,
        });

        debtor.outstanding -= amount;
        creditor.outstanding -= amount;
        if debtor.outstanding.is_positive() {
            debtors.push(debtor);
        }
        if creditor.outstanding.is_positive() {
            creditors.push(creditor);
        }
    }
    settlements
}

/// Pairwise netting: debts between the same two persons collapse into one
/// (A owes B 100, B owes A 80 gives A owes B 20).
fn bilateral(raw: &[RawDebt]) -> ResultEngine<Vec<OptimizedDebt>> {
    let mut pairs: BTreeMap<(Uuid, Uuid), i128> = BTreeMap::new();
    for debt in raw {
        let amount = i128::from(debt.amount.minor());
        if debt.sender < debt.receiver {
            *pairs.entry((debt.sender, debt.receiver)).or_default() += amount;
        } else {
            *pairs.entry((debt.receiver, debt.sender)).or_default() -= amount;
        }
    }

    let mut settlements = Vec::with_capacity(pairs.len());
    for ((low, high), amount) in pairs {
        let amount = to_money(amount)?;
        if amount.is_positive() {
            settlements.push(OptimizedDebt {
                sender: low,
                receiver: high,
                amount,
            });
        } else if amount.is_negative() {
            settlements.push(OptimizedDebt {
                sender: high,
                receiver: low,
                amount: amount.abs(),
            });
        }
    }
    Ok(settlements)
}

/// Reduce `raw` to the minimal settlement set with the same net balances.
///
/// The greedy pass guarantees at most `n - 1` settlements for `n` unsettled
/// persons. On sparse inputs (several disjoint debts) it can still split more
/// than the pairwise-netted history, in which case the pairwise set is
/// returned, so the result is never larger than the raw set either.
///
/// The result is ordered by amount (descending), then sender and receiver id
/// (ascending), so equal inputs always give identical output.
///
/// Fails with `InvalidAmount` when a balance does not fit in [`Money`].
pub fn optimize(raw: &[RawDebt]) -> ResultEngine<Vec<OptimizedDebt>> {
    let mut settlements = greedy(net_balances(raw)?);
    let pairwise = bilateral(raw)?;
    if pairwise.len() < settlements.len() {
        settlements = pairwise;
    }

    settlements.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.sender.cmp(&b.sender))
            .then_with(|| a.receiver.cmp(&b.receiver))
    });

    tracing::debug!(
        raw = raw.len(),
        optimized = settlements.len(),
        "netted debts"
    );

    Ok(settlements)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::debts::DebtSource;

    fn person(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    fn debt(sender: u128, receiver: u128, amount: i64) -> RawDebt {
        RawDebt {
            id: Uuid::new_v4(),
            account_id: Uuid::nil(),
            sender: person(sender),
            receiver: person(receiver),
            amount: Money::new(amount),
            source: DebtSource::transfer(Uuid::new_v4()),
        }
    }

    fn settled(sender: u128, receiver: u128, amount: i64) -> OptimizedDebt {
        OptimizedDebt {
            sender: person(sender),
            receiver: person(receiver),
            amount: Money::new(amount),
        }
    }

    fn balances_of(settlements: &[OptimizedDebt]) -> BTreeMap<Uuid, Money> {
        let mut balances: BTreeMap<Uuid, Money> = BTreeMap::new();
        for s in settlements {
            *balances.entry(s.receiver).or_default() += s.amount;
            *balances.entry(s.sender).or_default() -= s.amount;
        }
        balances
    }

    fn non_zero(balances: BTreeMap<Uuid, Money>) -> BTreeMap<Uuid, Money> {
        balances.into_iter().filter(|(_, b)| !b.is_zero()).collect()
    }

    #[test]
    fn empty_input_gives_empty_output() {
        assert!(optimize(&[]).unwrap().is_empty());
    }

    #[test]
    fn single_debt_passes_through() {
        assert_eq!(
            optimize(&[debt(1, 2, 4200)]).unwrap(),
            vec![settled(1, 2, 4200)]
        );
    }

    #[test]
    fn chain_collapses_through_middle_person() {
        // A owes B 100, B owes C 100: B is settled.
        let raw = vec![debt(1, 2, 10_000), debt(2, 3, 10_000)];
        assert_eq!(optimize(&raw).unwrap(), vec![settled(1, 3, 10_000)]);
    }

    #[test]
    fn opposite_debts_cancel() {
        let raw = vec![debt(1, 2, 10_000), debt(2, 1, 8_000)];
        assert_eq!(optimize(&raw).unwrap(), vec![settled(1, 2, 2_000)]);

        let raw = vec![debt(1, 2, 500), debt(2, 1, 500)];
        assert!(optimize(&raw).unwrap().is_empty());
    }

    #[test]
    fn triangle_is_netted() {
        let raw = vec![debt(1, 2, 10_000), debt(2, 3, 8_000), debt(3, 1, 5_000)];
        assert_eq!(
            optimize(&raw).unwrap(),
            vec![settled(1, 3, 3_000), settled(1, 2, 2_000)]
        );
    }

    #[test]
    fn magnitude_ties_go_to_smaller_id() {
        // Two debtors of 50 each, one creditor of 100.
        let raw = vec![debt(7, 1, 5_000), debt(3, 1, 5_000)];
        assert_eq!(
            optimize(&raw).unwrap(),
            vec![settled(3, 1, 5_000), settled(7, 1, 5_000)]
        );
    }

    #[test]
    fn disjoint_debts_are_not_split() {
        // Greedy alone would emit four settlements here.
        let raw = vec![debt(1, 2, 50), debt(1, 3, 50), debt(4, 5, 60)];
        assert_eq!(
            optimize(&raw).unwrap(),
            vec![settled(4, 5, 60), settled(1, 2, 50), settled(1, 3, 50)]
        );
    }

    #[test]
    fn largest_debtor_meets_largest_creditor() {
        let raw = vec![debt(1, 3, 900), debt(2, 4, 100), debt(1, 4, 100)];
        // balances: 1 = -1000, 2 = -100, 3 = +900, 4 = +200
        assert_eq!(
            optimize(&raw).unwrap(),
            vec![settled(1, 3, 900), settled(1, 4, 100), settled(2, 4, 100)]
        );
    }

    #[test]
    fn large_balances_do_not_overflow_intermediate_sums() {
        // Person 2 passes through 2 * MAX before settling at MAX.
        let raw = vec![
            debt(1, 2, i64::MAX),
            debt(4, 2, i64::MAX),
            debt(2, 3, i64::MAX),
        ];
        let balances = net_balances(&raw).unwrap();
        assert_eq!(balances[&person(2)], Money::new(i64::MAX));
        assert_eq!(balances[&person(3)], Money::new(i64::MAX));
        assert_eq!(balances[&person(1)], Money::new(-i64::MAX));

        let optimized = optimize(&raw).unwrap();
        assert_eq!(optimized.len(), 2);
        assert_eq!(
            non_zero(balances_of(&optimized)),
            non_zero(balances)
        );
    }

    #[test]
    fn unrepresentable_balance_is_invalid_amount() {
        let raw = vec![debt(1, 3, i64::MAX), debt(2, 3, i64::MAX)];
        assert!(matches!(
            net_balances(&raw),
            Err(EngineError::InvalidAmount(_))
        ));
        assert!(matches!(optimize(&raw), Err(EngineError::InvalidAmount(_))));
    }

    fn raw_debts() -> impl Strategy<Value = Vec<RawDebt>> {
        prop::collection::vec((1u128..8, 1u128..8, 1i64..1_000_000), 0..40).prop_map(|rows| {
            rows.into_iter()
                .filter(|(s, r, _)| s != r)
                .map(|(s, r, amount)| debt(s, r, amount))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn netting_conserves_balances(raw in raw_debts()) {
            let optimized = optimize(&raw).unwrap();
            prop_assert_eq!(non_zero(balances_of(&optimized)), non_zero(net_balances(&raw).unwrap()));
        }

        #[test]
        fn netting_is_minimal(raw in raw_debts()) {
            let optimized = optimize(&raw).unwrap();
            let unsettled = non_zero(net_balances(&raw).unwrap()).len();
            prop_assert!(optimized.len() <= unsettled.saturating_sub(1));
            prop_assert!(optimized.len() <= raw.len());
        }

        #[test]
        fn netting_never_increases_exposure(raw in raw_debts()) {
            let optimized = optimize(&raw).unwrap();
            let gross: Money = raw.iter().map(|d| d.amount).sum();
            let net: Money = optimized.iter().map(|d| d.amount).sum();
            prop_assert!(net <= gross);
            prop_assert!(optimized.iter().all(|d| d.amount.is_positive() && d.sender != d.receiver));
        }

        #[test]
        fn netting_is_deterministic(raw in raw_debts()) {
            let first = optimize(&raw).unwrap();
            let mut reversed = raw.clone();
            reversed.reverse();
            prop_assert_eq!(&first, &optimize(&raw).unwrap());
            prop_assert_eq!(&first, &optimize(&reversed).unwrap());
        }
    }
}
