use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{DeductionReceiptLine, EarnRecord, PayerBalance, RecordMutation};

/// Outcome of a spend allocation: what to persist and what to report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendPlan {
    /// Point overwrites, in the order the records were visited
    pub mutations: Vec<RecordMutation>,
    /// One line per record touched
    pub receipt: Vec<DeductionReceiptLine>,
}

impl SpendPlan {
    /// Total number of points the plan deducts
    pub fn total_deducted(&self) -> i64 {
        self.receipt.iter().map(DeductionReceiptLine::amount).sum()
    }
}

/// Sum a user's records per payer
///
/// Payers appear in the order they are first seen in `records`.
/// Fails with [`LedgerError::NoRecords`] when there is no history at all;
/// a history of fully consumed records still yields zero balances.
/// A per-payer sum outside the `i64` range fails with
/// [`LedgerError::BalanceOverflow`].
pub fn compute_balances(records: &[EarnRecord]) -> LedgerResult<Vec<PayerBalance>> {
    if records.is_empty() {
        return Err(LedgerError::NoRecords);
    }

    let mut balances: Vec<PayerBalance> = Vec::new();
    // Map of payer to its position in `balances`
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match positions.get(record.payer.as_str()) {
            Some(&index) => {
                let balance = &mut balances[index];
                balance.points = balance
                    .points
                    .checked_add(record.points)
                    .ok_or_else(|| LedgerError::BalanceOverflow {
                        payer: record.payer.clone(),
                    })?;
            }
            None => {
                positions.insert(record.payer.as_str(), balances.len());
                balances.push(PayerBalance::new(record.payer.clone(), record.points));
            }
        }
    }

    Ok(balances)
}

/// Allocate a spend across records, stamping the receipt with the current time
///
/// See [`allocate_spend_at`].
pub fn allocate_spend(records: &[EarnRecord], amount: i64) -> LedgerResult<SpendPlan> {
    allocate_spend_at(records, amount, Utc::now())
}

/// Allocate a spend across records, oldest first
///
/// `records` must already be sorted ascending by transaction date; the
/// allocator never reorders them, so equal-dated records are consumed in
/// the order given. Records with no positive balance are skipped.
///
/// Either the full amount is covered and a complete plan is returned, or
/// the call fails and nothing is returned. Every receipt line carries the
/// same `deduction_time`.
pub fn allocate_spend_at(
    records: &[EarnRecord],
    amount: i64,
    deduction_time: DateTime<Utc>,
) -> LedgerResult<SpendPlan> {
    if amount <= 0 {
        return Err(LedgerError::InvalidAmount(amount));
    }
    if records.is_empty() {
        return Err(LedgerError::NoRecords);
    }

    let mut remaining = amount;
    let mut mutations = Vec::new();
    let mut receipt = Vec::new();

    for record in records.iter().filter(|r| r.points > 0) {
        // Partial consumption when the record covers the rest, full otherwise
        let taken = record.points.min(remaining);

        mutations.push(RecordMutation::new(record.id, record.points - taken));
        receipt.push(DeductionReceiptLine::new(
            record.payer.clone(),
            taken,
            deduction_time,
        ));

        remaining -= taken;
        if remaining == 0 {
            return Ok(SpendPlan { mutations, receipt });
        }
    }

    Err(LedgerError::InsufficientPoints {
        requested: amount,
        available: amount - remaining,
    })
}
