//! Result types returned by an ingestion run.

use crate::pipeline::classify::MediaType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One line item the model recognised on the receipt.
///
/// Values are carried exactly as the model produced them. Nothing here checks
/// that `kind` is `"income"`/`"expense"` or that `amount` is a number; the
/// transaction store does that when the caller submits the candidate. A key
/// the model left out deserialises as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTransaction {
    #[serde(rename = "type", default)]
    pub kind: Value,
    #[serde(default)]
    pub amount: Value,
    #[serde(default)]
    pub category: Value,
    #[serde(default)]
    pub description: Value,
}

impl CandidateTransaction {
    /// The `type` field, if the model emitted a string.
    pub fn kind_str(&self) -> Option<&str> {
        self.kind.as_str()
    }

    /// The `amount` field, if the model emitted a JSON number.
    pub fn amount_f64(&self) -> Option<f64> {
        self.amount.as_f64()
    }

    /// The `category` field, if the model emitted a string.
    pub fn category_str(&self) -> Option<&str> {
        self.category.as_str()
    }

    /// The `description` field, if the model emitted a string.
    pub fn description_str(&self) -> Option<&str> {
        self.description.as_str()
    }

    /// `type` interpreted against the tracker's kinds, when it matches one.
    pub fn recognised_kind(&self) -> Option<TransactionKind> {
        self.kind_str().and_then(TransactionKind::parse)
    }

    /// `category` interpreted against the tracker's categories, when it matches one.
    pub fn recognised_category(&self) -> Option<Category> {
        self.category_str().and_then(Category::parse)
    }
}

/// Transaction kinds the tracker stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Case-insensitive match against `income` / `expense`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Some(TransactionKind::Income),
            "expense" => Some(TransactionKind::Expense),
            _ => None,
        }
    }
}

/// Spending categories the tracker stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Fuel,
    Misc,
    Shopping,
    Travel,
    Salary,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Food,
        Category::Fuel,
        Category::Misc,
        Category::Shopping,
        Category::Travel,
        Category::Salary,
        Category::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Fuel => "fuel",
            Category::Misc => "misc",
            Category::Shopping => "shopping",
            Category::Travel => "travel",
            Category::Salary => "salary",
            Category::Other => "other",
        }
    }

    /// Case-insensitive match against the category names.
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
    }
}

/// Where a batch of candidates came from, matching the store's `source` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionSource {
    /// A photographed or scanned receipt.
    Receipt,
    /// A PDF statement or invoice.
    Pdf,
}

impl From<MediaType> for TransactionSource {
    fn from(media_type: MediaType) -> Self {
        match media_type {
            MediaType::Pdf => TransactionSource::Pdf,
            MediaType::Image => TransactionSource::Receipt,
        }
    }
}

/// Timing and token accounting for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionStats {
    pub upload_bytes: usize,
    pub input_tokens: usize,
    pub output_tokens: usize,
    pub extraction_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything an ingestion run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionOutput {
    /// Candidates in the order the model emitted them.
    pub transactions: Vec<CandidateTransaction>,
    pub source: TransactionSource,
    pub media_type: MediaType,
    pub stats: IngestionStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_keys_become_null() {
        let c: CandidateTransaction =
            serde_json::from_value(json!({"amount": 3, "description": "tea"})).unwrap();
        assert!(c.kind.is_null());
        assert!(c.category.is_null());
        assert_eq!(c.amount_f64(), Some(3.0));
        assert_eq!(c.description_str(), Some("tea"));
    }

    #[test]
    fn serialises_with_type_key() {
        let c = CandidateTransaction {
            kind: json!("expense"),
            amount: json!(12.5),
            category: json!("food"),
            description: json!("lunch"),
        };
        let v = serde_json::to_value(&c).unwrap();
        assert_eq!(
            v,
            json!({"type": "expense", "amount": 12.5, "category": "food", "description": "lunch"})
        );
    }

    #[test]
    fn values_pass_through_unvalidated() {
        let c: CandidateTransaction = serde_json::from_value(json!({
            "type": "refund",
            "amount": "12,50",
            "category": "groceries",
            "description": null
        }))
        .unwrap();
        assert_eq!(c.kind_str(), Some("refund"));
        assert_eq!(c.recognised_kind(), None);
        assert_eq!(c.amount_f64(), None);
        assert_eq!(c.amount, json!("12,50"));
        assert_eq!(c.recognised_category(), None);
    }

    #[test]
    fn recognises_tracker_enums_case_insensitively() {
        assert_eq!(TransactionKind::parse("Expense"), Some(TransactionKind::Expense));
        assert_eq!(TransactionKind::parse(" income "), Some(TransactionKind::Income));
        assert_eq!(Category::parse("FUEL"), Some(Category::Fuel));
        assert_eq!(Category::parse("groceries"), None);
    }

    #[test]
    fn source_follows_media_type() {
        assert_eq!(TransactionSource::from(MediaType::Pdf), TransactionSource::Pdf);
        assert_eq!(
            TransactionSource::from(MediaType::Image),
            TransactionSource::Receipt
        );
    }
}
