//! Debt generator.
//!
//! Translates a monetary event into raw debts. Transfers and deals carry the
//! direction the money moved (`sender` paid `receiver`); the debt points the
//! other way, because the receiver now has to pay the sender back.
//!
//! Everything here is pure: validation happens before the store is touched.

use uuid::Uuid;

use crate::{
    Deal, EngineError, Money, ResultEngine, Transfer,
    debts::{DebtSource, RawDebt},
};

/// Domain checks shared by every debt: a positive amount between two
/// different persons. The amount is checked first.
pub fn validate(sender: Uuid, receiver: Uuid, amount: Money) -> ResultEngine<()> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidAmount(format!(
            "amount must be > 0, got {amount}"
        )));
    }
    if sender == receiver {
        return Err(EngineError::SelfDebt(format!(
            "person {sender} cannot owe themselves"
        )));
    }
    Ok(())
}

/// Build the raw debt "`sender` owes `receiver` `amount`".
pub fn generate(
    source: DebtSource,
    account_id: Uuid,
    sender: Uuid,
    receiver: Uuid,
    amount: Money,
) -> ResultEngine<RawDebt> {
    validate(sender, receiver, amount)?;

    Ok(RawDebt {
        id: Uuid::new_v4(),
        account_id,
        sender,
        receiver,
        amount,
        source,
    })
}

/// Debts created by `payer` handing `amount` to `payee`.
fn payment_debts(
    source: DebtSource,
    account_id: Uuid,
    payer: Uuid,
    payee: Uuid,
    amount: Money,
) -> ResultEngine<Vec<RawDebt>> {
    Ok(vec![generate(source, account_id, payee, payer, amount)?])
}

pub fn plan_transfer(transfer: &Transfer) -> ResultEngine<Vec<RawDebt>> {
    payment_debts(
        DebtSource::transfer(transfer.id),
        transfer.account_id,
        transfer.sender,
        transfer.receiver,
        transfer.amount,
    )
}

/// A deal produces one debt per person it was paid for. Today that is a
/// single receiver.
pub fn plan_deal(deal: &Deal) -> ResultEngine<Vec<RawDebt>> {
    payment_debts(
        DebtSource::deal(deal.id),
        deal.account_id,
        deal.sender,
        deal.receiver,
        deal.amount,
    )
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn transfer(sender: Uuid, receiver: Uuid, amount: i64) -> Transfer {
        Transfer {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            sender,
            receiver,
            amount: Money::new(amount),
            note: None,
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn transfer_receiver_owes_sender() {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let t = transfer(alice, bob, 2500);

        let debts = plan_transfer(&t).unwrap();

        assert_eq!(debts.len(), 1);
        let debt = &debts[0];
        assert_eq!(debt.sender, bob);
        assert_eq!(debt.receiver, alice);
        assert_eq!(debt.amount, Money::new(2500));
        assert_eq!(debt.account_id, t.account_id);
        assert_eq!(debt.source, DebtSource::transfer(t.id));
    }

    #[test]
    fn deal_is_keyed_by_deal_source() {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let deal = Deal {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            title: "pizza".to_string(),
            sender: alice,
            receiver: bob,
            amount: Money::new(1800),
            occurred_at: Utc::now(),
        };

        let debts = plan_deal(&deal).unwrap();

        assert_eq!(debts.len(), 1);
        assert_eq!(debts[0].source, DebtSource::deal(deal.id));
        assert_eq!(debts[0].sender, bob);
    }

    #[test]
    fn rejects_non_positive_amounts() {
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        for amount in [0, -1, -10_000] {
            let err = plan_transfer(&transfer(alice, bob, amount)).unwrap_err();
            assert!(matches!(err, EngineError::InvalidAmount(_)));
        }
    }

    #[test]
    fn rejects_self_debt() {
        let alice = Uuid::new_v4();
        let err = plan_transfer(&transfer(alice, alice, 100)).unwrap_err();
        assert!(matches!(err, EngineError::SelfDebt(_)));
    }

    #[test]
    fn amount_is_checked_before_parties() {
        let alice = Uuid::new_v4();
        let err = plan_transfer(&transfer(alice, alice, 0)).unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
    }
}
