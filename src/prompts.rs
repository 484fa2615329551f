//! Extraction prompt sent alongside every receipt.
//!
//! Kept in one place so prompt regressions show up in unit tests rather than
//! in production parses. Callers can override it via
//! [`crate::config::IngestConfig::extraction_prompt`]; the default here is
//! used only when no override is provided.

use crate::output::{Category, TransactionKind};
use once_cell::sync::Lazy;

/// Default instruction sent with the receipt image or PDF.
///
/// The model is asked for bare JSON, but the normaliser still strips fences
/// because models wrap JSON in ```` ```json ```` regardless. The kind and
/// category lists are rendered from [`TransactionKind`] and [`Category`].
pub static DEFAULT_EXTRACTION_PROMPT: Lazy<String> = Lazy::new(|| {
    let categories = Category::ALL.map(Category::as_str).join(", ");
    format!(
        r#"Extract a list of transactions from this receipt or statement in JSON (without markdown).

Return ONLY a JSON array. Each element is an object with exactly these keys:
  - type: "{expense}" or "{income}" (a receipt is almost always "{expense}")
  - amount: a number, no currency symbol
  - category: one of {categories}
  - description: a short description of the item or merchant

If nothing can be recognised, return []."#,
        expense = TransactionKind::Expense.as_str(),
        income = TransactionKind::Income.as_str(),
    )
});

/// Resolve the prompt to send: the caller's override, or the default.
pub fn extraction_prompt(override_prompt: Option<&str>) -> &str {
    override_prompt.unwrap_or(DEFAULT_EXTRACTION_PROMPT.as_str())
}
