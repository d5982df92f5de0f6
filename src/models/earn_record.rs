use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Points credited to a user by one payer on one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnRecord {
    pub id: Uuid,
    pub user_id: String,
    pub payer: String,
    pub points: i64,
    /// Ordering key, compared as text (ISO-8601 dates sort chronologically)
    pub transaction_date: String,
}

impl EarnRecord {
    /// Create a record with a freshly generated id
    pub fn new(
        user_id: impl Into<String>,
        payer: impl Into<String>,
        points: i64,
        transaction_date: impl Into<String>,
    ) -> Self {
        Self::with_id(Uuid::new_v4(), user_id, payer, points, transaction_date)
    }

    /// Create a record with a caller-chosen id
    pub fn with_id(
        id: Uuid,
        user_id: impl Into<String>,
        payer: impl Into<String>,
        points: i64,
        transaction_date: impl Into<String>,
    ) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            payer: payer.into(),
            points,
            transaction_date: transaction_date.into(),
        }
    }

    /// True once every point of the record has been spent
    pub fn is_consumed(&self) -> bool {
        self.points == 0
    }
}

/// Overwrite instruction for a record's stored points
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordMutation {
    pub id: Uuid,
    pub new_points: i64,
}

impl RecordMutation {
    pub fn new(id: Uuid, new_points: i64) -> Self {
        Self { id, new_points }
    }
}
