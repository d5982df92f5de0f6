use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::LedgerResult;
use crate::ledger::PointsLedger;
use crate::models::{DeductionReceiptLine, EarnRecord, PayerBalance};
use crate::store::{InMemoryStore, RecordStore};

/// Thread-safe sharded ledger
///
/// Users are distributed across shards by a hash of their id, so a user
/// always lands on the same shard. Every mutating call holds its shard's
/// write lock across fetch, allocation and persistence, which gives at most
/// one allocation per user at a time. Balance queries share the read lock.
///
/// # Example
///
/// ```no_run
/// use rewards_ledger::concurrent_ledger::ShardedLedger;
///
/// #[tokio::main]
/// async fn main() {
///     let ledger = ShardedLedger::new(8);
///     let handle = ledger.clone_handle();
///
///     tokio::spawn(async move {
///         handle
///             .earn("user-1", "DANNON", 300, "2020-10-31T10:00:00Z")
///             .await
///             .unwrap();
///     });
/// }
/// ```
pub struct ShardedLedger<S: RecordStore = InMemoryStore> {
    shards: Vec<Arc<RwLock<PointsLedger<S>>>>,
    num_shards: usize,
}

impl ShardedLedger<InMemoryStore> {
    /// Create a ledger with `num_shards` in-memory shards
    pub fn new(num_shards: usize) -> Self {
        assert!(num_shards > 0, "num_shards must be at least 1");
        Self::from_stores((0..num_shards).map(|_| InMemoryStore::new()).collect())
    }
}

impl<S: RecordStore> ShardedLedger<S> {
    /// Create a ledger with one shard per store
    pub fn from_stores(stores: Vec<S>) -> Self {
        assert!(!stores.is_empty(), "at least one store is required");

        let shards: Vec<_> = stores
            .into_iter()
            .map(|store| Arc::new(RwLock::new(PointsLedger::new(store))))
            .collect();
        let num_shards = shards.len();

        Self { shards, num_shards }
    }

    fn shard_for_user(&self, user_id: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        user_id.hash(&mut hasher);
        (hasher.finish() as usize) % self.num_shards
    }

    fn shard(&self, user_id: &str) -> &Arc<RwLock<PointsLedger<S>>> {
        &self.shards[self.shard_for_user(user_id)]
    }

    pub async fn earn(
        &self,
        user_id: &str,
        payer: &str,
        points: i64,
        transaction_date: &str,
    ) -> LedgerResult<EarnRecord> {
        let mut ledger = self.shard(user_id).write().await;
        ledger.earn(user_id, payer, points, transaction_date)
    }

    /// Spend points; serialized with every other write for the same user
    pub async fn spend(
        &self,
        user_id: &str,
        payer: Option<&str>,
        amount: i64,
    ) -> LedgerResult<Vec<DeductionReceiptLine>> {
        let mut ledger = self.shard(user_id).write().await;
        ledger.spend(user_id, payer, amount)
    }

    pub async fn balances(&self, user_id: &str) -> LedgerResult<Vec<PayerBalance>> {
        let ledger = self.shard(user_id).read().await;
        ledger.balances(user_id)
    }

    pub async fn purge_consumed(&self, user_id: &str) -> LedgerResult<usize> {
        let mut ledger = self.shard(user_id).write().await;
        ledger.purge_consumed(user_id)
    }

    /// Balances of every user across all shards, sorted by user id
    pub async fn all_balances(&self) -> LedgerResult<Vec<(String, Vec<PayerBalance>)>> {
        let futures: Vec<_> = self
            .shards
            .iter()
            .map(|shard| async move {
                let ledger = shard.read().await;
                balances_by_user(&*ledger)
            })
            .collect();

        let mut all = Vec::new();
        for shard_balances in futures::future::join_all(futures).await {
            all.extend(shard_balances?);
        }

        all.sort_by(|a, b| a.0.cmp(&b.0));
        debug!(users = all.len(), "collected balances from all shards");
        Ok(all)
    }

    /// Clone handle for sharing across tasks
    pub fn clone_handle(&self) -> Self {
        Self {
            shards: self.shards.clone(),
            num_shards: self.num_shards,
        }
    }

    pub fn num_shards(&self) -> usize {
        self.num_shards
    }
}

fn balances_by_user<S: RecordStore>(
    ledger: &PointsLedger<S>,
) -> LedgerResult<Vec<(String, Vec<PayerBalance>)>> {
    let mut balances = Vec::new();
    for user in ledger.users()? {
        let user_balances = ledger.balances(&user)?;
        balances.push((user, user_balances));
    }
    Ok(balances)
}
