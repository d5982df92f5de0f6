use serde::Serialize;

/// Sum of a user's points issued by one payer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PayerBalance {
    pub payer: String,
    pub points: i64,
}

impl PayerBalance {
    pub fn new(payer: impl Into<String>, points: i64) -> Self {
        Self {
            payer: payer.into(),
            points,
        }
    }
}

/// Flattened balance row for CSV output
#[derive(Debug, Serialize)]
pub struct BalanceRow<'a> {
    pub user: &'a str,
    pub payer: &'a str,
    pub points: i64,
}
