use chrono::{DateTime, TimeZone, Utc};
use rewards_ledger::config::LedgerConfig;
use rewards_ledger::error::{StoreError, StoreResult};
use rewards_ledger::models::{EarnRecord, RecordMutation};
use rewards_ledger::store::{InMemoryStore, RecordStore, SortOrder};
use uuid::Uuid;

/// Helper to create a record with a predictable id
pub fn make_record(id: u128, payer: &str, points: i64, date: &str) -> EarnRecord {
    EarnRecord::with_id(Uuid::from_u128(id), "user-1", payer, points, date)
}

/// Fixed instant for deterministic receipts
pub fn fixed_time() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

/// Run a CSV string through the pipeline and return the output
pub async fn process_csv_string(csv_input: &str) -> Result<String, Box<dyn std::error::Error>> {
    let mut output = Vec::new();
    rewards_ledger::process_operations(csv_input.as_bytes(), &mut output, &LedgerConfig::default())
        .await?;
    Ok(String::from_utf8(output)?)
}

/// Create a test CSV from a list of operation descriptions
pub fn build_csv(operations: &[(&str, &str, &str, i64, &str)]) -> String {
    let mut csv = String::from("type,user,payer,points,date\n");

    for (op_type, user, payer, points, date) in operations {
        csv.push_str(&format!("{},{},{},{},{}\n", op_type, user, payer, points, date));
    }

    csv
}

/// Store double that can be switched into failure modes
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryStore,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl FlakyStore {
    fn unavailable<T>() -> StoreResult<T> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

impl RecordStore for FlakyStore {
    fn insert(&mut self, record: EarnRecord) -> StoreResult<()> {
        if self.fail_writes {
            return Self::unavailable();
        }
        self.inner.insert(record)
    }

    fn fetch_earn_records(
        &self,
        user_id: &str,
        payer: Option<&str>,
        order: SortOrder,
    ) -> StoreResult<Vec<EarnRecord>> {
        if self.fail_reads {
            return Self::unavailable();
        }
        self.inner.fetch_earn_records(user_id, payer, order)
    }

    fn apply_mutation(&mut self, mutation: &RecordMutation) -> StoreResult<()> {
        if self.fail_writes {
            return Self::unavailable();
        }
        self.inner.apply_mutation(mutation)
    }

    fn apply_mutations(&mut self, mutations: &[RecordMutation]) -> StoreResult<()> {
        if self.fail_writes {
            return Self::unavailable();
        }
        self.inner.apply_mutations(mutations)
    }

    fn delete(&mut self, id: Uuid) -> StoreResult<()> {
        if self.fail_writes {
            return Self::unavailable();
        }
        self.inner.delete(id)
    }

    fn delete_many(&mut self, ids: &[Uuid]) -> StoreResult<()> {
        if self.fail_writes {
            return Self::unavailable();
        }
        self.inner.delete_many(ids)
    }

    fn user_ids(&self) -> StoreResult<Vec<String>> {
        if self.fail_reads {
            return Self::unavailable();
        }
        self.inner.user_ids()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_record() {
        let record = make_record(7, "DANNON", 300, "2020-10-31T10:00:00Z");
        assert_eq!(record.id, Uuid::from_u128(7));
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.payer, "DANNON");
        assert_eq!(record.points, 300);
    }

    #[test]
    fn test_build_csv() {
        let csv = build_csv(&[
            ("earn", "u1", "DANNON", 300, "2020-10-31T10:00:00Z"),
            ("spend", "u1", "", 100, ""),
        ]);

        assert!(csv.starts_with("type,user,payer,points,date\n"));
        assert!(csv.contains("earn,u1,DANNON,300,2020-10-31T10:00:00Z"));
        assert!(csv.contains("spend,u1,,100,"));
    }
}
