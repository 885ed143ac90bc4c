// File: src/ocr.rs
//! Parsing of the OCR collaborator's reply into raw drug records.

use crate::core::types::RawDrugRecord;
use crate::error::Result;
use serde_json::Value;

/// Extracts the drug records from the OCR model's reply.
///
/// The reply is expected to hold a JSON array, possibly wrapped in prose or
/// a code fence; everything from the first `[` to the last `]` is parsed.
/// Array elements that are not objects are skipped.
pub fn parse_records(text: &str) -> Result<Vec<RawDrugRecord>> {
    let json = match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    };

    let value: Value = serde_json::from_str(json.trim())?;
    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => Vec::new(),
    };

    let mut records = Vec::with_capacity(items.len());
    for item in items {
        if !item.is_object() {
            tracing::debug!(?item, "skipping non-object OCR entry");
            continue;
        }
        records.push(serde_json::from_value(item)?);
    }
    Ok(records)
}
