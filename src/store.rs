use std::collections::HashSet;

use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{EarnRecord, RecordMutation};

/// Order of fetched records by transaction date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Durable home of earn records
///
/// The ledger engine never talks to storage itself. It is handed a snapshot
/// fetched through this trait and returns mutations that the caller applies
/// back through it.
///
/// # Example
///
/// ```
/// use rewards_ledger::models::{EarnRecord, RecordMutation};
/// use rewards_ledger::store::{InMemoryStore, RecordStore, SortOrder};
///
/// let mut store = InMemoryStore::new();
/// let record = EarnRecord::new("user-1", "DANNON", 300, "2020-10-31T10:00:00Z");
/// let id = record.id;
/// store.insert(record).unwrap();
///
/// store.apply_mutation(&RecordMutation::new(id, 100)).unwrap();
///
/// let records = store
///     .fetch_earn_records("user-1", None, SortOrder::Ascending)
///     .unwrap();
/// assert_eq!(records[0].points, 100);
/// ```
pub trait RecordStore: Send + Sync {
    /// Store a new record; ids must be unique
    fn insert(&mut self, record: EarnRecord) -> StoreResult<()>;

    /// Fetch a user's records, optionally for one payer, sorted by date
    ///
    /// Records sharing a date keep their insertion order in both directions.
    fn fetch_earn_records(
        &self,
        user_id: &str,
        payer: Option<&str>,
        order: SortOrder,
    ) -> StoreResult<Vec<EarnRecord>>;

    /// Overwrite one record's points
    ///
    /// Idempotent. Fails with [`StoreError::RecordNotFound`] if the record is gone.
    fn apply_mutation(&mut self, mutation: &RecordMutation) -> StoreResult<()>;

    /// Apply a batch of overwrites atomically: all of them or none
    fn apply_mutations(&mut self, mutations: &[RecordMutation]) -> StoreResult<()>;

    /// Remove a record
    fn delete(&mut self, id: Uuid) -> StoreResult<()>;

    /// Remove a batch of records atomically: all of them or none
    fn delete_many(&mut self, ids: &[Uuid]) -> StoreResult<()>;

    /// Every user that has at least one record, in first-seen order
    fn user_ids(&self) -> StoreResult<Vec<String>>;
}

/// Record store held in process memory
///
/// Records are kept in insertion order so that a stable sort by date
/// preserves the order of equal-dated records.
#[derive(Debug, Default, Clone)]
pub struct InMemoryStore {
    records: Vec<EarnRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by id
    pub fn get(&self, id: Uuid) -> Option<&EarnRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn position(&self, id: Uuid) -> StoreResult<usize> {
        self.records
            .iter()
            .position(|r| r.id == id)
            .ok_or(StoreError::RecordNotFound(id))
    }
}

impl RecordStore for InMemoryStore {
    fn insert(&mut self, record: EarnRecord) -> StoreResult<()> {
        if self.get(record.id).is_some() {
            return Err(StoreError::DuplicateRecord(record.id));
        }
        self.records.push(record);
        Ok(())
    }

    fn fetch_earn_records(
        &self,
        user_id: &str,
        payer: Option<&str>,
        order: SortOrder,
    ) -> StoreResult<Vec<EarnRecord>> {
        let mut records: Vec<EarnRecord> = self
            .records
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter(|r| payer.map_or(true, |p| r.payer == p))
            .cloned()
            .collect();

        // sort_by is stable, ties keep insertion order
        match order {
            SortOrder::Ascending => {
                records.sort_by(|a, b| a.transaction_date.cmp(&b.transaction_date))
            }
            SortOrder::Descending => {
                records.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date))
            }
        }

        Ok(records)
    }

    fn apply_mutation(&mut self, mutation: &RecordMutation) -> StoreResult<()> {
        let index = self.position(mutation.id)?;
        self.records[index].points = mutation.new_points;
        Ok(())
    }

    fn apply_mutations(&mut self, mutations: &[RecordMutation]) -> StoreResult<()> {
        // Resolve every id before touching anything
        let positions = mutations
            .iter()
            .map(|m| self.position(m.id))
            .collect::<StoreResult<Vec<_>>>()?;

        for (index, mutation) in positions.into_iter().zip(mutations) {
            self.records[index].points = mutation.new_points;
        }
        Ok(())
    }

    fn delete(&mut self, id: Uuid) -> StoreResult<()> {
        let index = self.position(id)?;
        self.records.remove(index);
        Ok(())
    }

    fn delete_many(&mut self, ids: &[Uuid]) -> StoreResult<()> {
        // Resolve every id before removing anything
        for id in ids {
            self.position(*id)?;
        }

        let doomed: HashSet<Uuid> = ids.iter().copied().collect();
        self.records.retain(|r| !doomed.contains(&r.id));
        Ok(())
    }

    fn user_ids(&self) -> StoreResult<Vec<String>> {
        let mut seen = HashSet::new();
        Ok(self
            .records
            .iter()
            .filter(|r| seen.insert(r.user_id.as_str()))
            .map(|r| r.user_id.clone())
            .collect())
    }
}
