use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// One deduction reported by a spend allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeductionReceiptLine {
    pub payer: String,
    /// Always negative: the amount debited from one record
    pub points_deducted: i64,
    #[serde(serialize_with = "serialize_unix_seconds")]
    pub deduction_time: DateTime<Utc>,
}

impl DeductionReceiptLine {
    pub fn new(payer: impl Into<String>, taken: i64, deduction_time: DateTime<Utc>) -> Self {
        Self {
            payer: payer.into(),
            points_deducted: -taken,
            deduction_time,
        }
    }

    /// Magnitude of the debit
    pub fn amount(&self) -> i64 {
        self.points_deducted.abs()
    }
}

/// Receipts carry the deduction time as Unix seconds in a string
fn serialize_unix_seconds<S>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&time.timestamp().to_string())
}
