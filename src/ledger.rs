use tracing::{debug, info};

use crate::engine::{allocate_spend, compute_balances};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{DeductionReceiptLine, EarnRecord, PayerBalance};
use crate::store::{RecordStore, SortOrder};

/// Points ledger bound to a record store
///
/// Coordinates the fetch / compute / persist cycle around the pure engine:
///
/// 1. **Fetch** the user's records from the store, oldest first
/// 2. **Compute** balances or a full spend plan in memory
/// 3. **Persist** the plan's mutations in a single atomic batch
///
/// Nothing is written unless the whole plan could be computed.
///
/// # Example
///
/// ```
/// use rewards_ledger::ledger::PointsLedger;
/// use rewards_ledger::store::InMemoryStore;
///
/// let mut ledger = PointsLedger::new(InMemoryStore::new());
/// ledger.earn("user-1", "DANNON", 300, "2020-10-31T10:00:00Z").unwrap();
/// ledger.earn("user-1", "UNILEVER", 200, "2020-10-31T11:00:00Z").unwrap();
///
/// let receipt = ledger.spend("user-1", None, 400).unwrap();
/// assert_eq!(receipt.len(), 2);
///
/// let balances = ledger.balances("user-1").unwrap();
/// assert_eq!(balances[0].points, 0);
/// assert_eq!(balances[1].points, 100);
/// ```
///
/// # Thread Safety
///
/// PointsLedger is NOT synchronized by itself. Two spends for the same user
/// must not interleave; use [`crate::concurrent_ledger::ShardedLedger`] for
/// shared access.
pub struct PointsLedger<S: RecordStore> {
    store: S,
}

impl<S: RecordStore> PointsLedger<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Credit points from a payer
    ///
    /// Negative points are rejected; spending goes through [`Self::spend`].
    /// An earn that would push the payer's total past `i64::MAX` is rejected
    /// with [`LedgerError::BalanceOverflow`].
    pub fn earn(
        &mut self,
        user_id: &str,
        payer: &str,
        points: i64,
        transaction_date: &str,
    ) -> LedgerResult<EarnRecord> {
        if points < 0 {
            return Err(LedgerError::InvalidAmount(points));
        }

        let fits = self
            .store
            .fetch_earn_records(user_id, Some(payer), SortOrder::Ascending)?
            .iter()
            .try_fold(points, |total, r| total.checked_add(r.points))
            .is_some();
        if !fits {
            return Err(LedgerError::BalanceOverflow {
                payer: payer.to_string(),
            });
        }

        let record = EarnRecord::new(user_id, payer, points, transaction_date);
        self.store.insert(record.clone())?;

        debug!(user_id, payer, points, record_id = %record.id, "points earned");
        Ok(record)
    }

    /// Current per-payer balances of a user
    pub fn balances(&self, user_id: &str) -> LedgerResult<Vec<PayerBalance>> {
        let records = self
            .store
            .fetch_earn_records(user_id, None, SortOrder::Ascending)?;
        compute_balances(&records)
    }

    /// Spend points oldest first, optionally only from one payer
    ///
    /// Returns the receipt once every mutation has been persisted.
    pub fn spend(
        &mut self,
        user_id: &str,
        payer: Option<&str>,
        amount: i64,
    ) -> LedgerResult<Vec<DeductionReceiptLine>> {
        let records = self
            .store
            .fetch_earn_records(user_id, payer, SortOrder::Ascending)?;

        let plan = allocate_spend(&records, amount)?;
        self.store.apply_mutations(&plan.mutations)?;

        info!(
            user_id,
            payer = payer.unwrap_or("*"),
            amount,
            records_touched = plan.mutations.len(),
            "points spent"
        );
        Ok(plan.receipt)
    }

    /// Delete a user's fully consumed records, returning how many went away
    ///
    /// The deletion is a single batch: on failure no record is removed.
    pub fn purge_consumed(&mut self, user_id: &str) -> LedgerResult<usize> {
        let consumed: Vec<_> = self
            .store
            .fetch_earn_records(user_id, None, SortOrder::Ascending)?
            .into_iter()
            .filter(EarnRecord::is_consumed)
            .collect();

        let ids: Vec<_> = consumed.iter().map(|r| r.id).collect();
        self.store.delete_many(&ids)?;

        if !consumed.is_empty() {
            debug!(user_id, purged = consumed.len(), "consumed records purged");
        }
        Ok(consumed.len())
    }

    /// Every user known to the store
    pub fn users(&self) -> LedgerResult<Vec<String>> {
        Ok(self.store.user_ids()?)
    }

    /// Get reference to the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }
}
