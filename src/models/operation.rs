use serde::Deserialize;

/// Type of points operation
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OperationType {
    Earn,
    Spend,
}

/// Points operation record from CSV input
#[derive(Debug, Clone, Deserialize)]
pub struct PointsOperation {
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub user: String,
    #[serde(deserialize_with = "deserialize_optional_text")]
    pub payer: Option<String>,
    pub points: i64,
    #[serde(deserialize_with = "deserialize_optional_text")]
    pub date: Option<String>,
}

/// Custom deserializer to handle empty strings as None for optional columns
fn deserialize_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        Ok(None)
    } else {
        Ok(Some(trimmed.to_string()))
    }
}
