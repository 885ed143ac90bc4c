// src/core/types.rs
use crate::core::phonetic::NormalizedForm;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Position of a phonetic key in the fuzzy index, in load order.
pub type KeyId = usize;

/// One phonetic key of the reference dictionary and the canonical names
/// that normalize to it, in load order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub phonetic_key: NormalizedForm,
    pub canonical_names: Vec<String>,
    /// How many dictionary rows produced this key. Always >= 1.
    pub frequency_weight: u32,
}

/// A drug line as extracted by the OCR collaborator. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDrugRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub medicine_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub dosage: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub frequency: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub days: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub usage: Option<String>,
}

impl RawDrugRecord {
    pub fn named(medicine_name: &str) -> Self {
        Self {
            medicine_name: Some(medicine_name.to_string()),
            ..Self::default()
        }
    }

    /// The trimmed medicine name, empty when absent.
    pub fn name(&self) -> &str {
        self.medicine_name.as_deref().map(str::trim).unwrap_or("")
    }
}

/// A raw record plus the outcome of name correction.
///
/// When `was_corrected` is true, `correction_distance > 0` and the digit runs
/// of `original_name` and `corrected_name` are equal as sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrectedDrugRecord {
    #[serde(flatten)]
    pub raw: RawDrugRecord,
    pub corrected_name: String,
    pub original_name: String,
    pub correction_distance: usize,
    pub was_corrected: bool,
}

impl CorrectedDrugRecord {
    /// A record whose name is passed through untouched.
    pub fn unchanged(raw: RawDrugRecord) -> Self {
        let name = raw.name().to_string();
        Self {
            raw,
            corrected_name: name.clone(),
            original_name: name,
            correction_distance: 0,
            was_corrected: false,
        }
    }
}

/// Which relaxation stage produced a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchMethod {
    Full,
    DosageStripped,
    ParenStripped,
    Prefix,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryCandidate {
    pub query: String,
    pub method: SearchMethod,
}

/// Outcome of driving a candidate list against the lookup collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionResult<R> {
    pub matched: bool,
    pub method: Option<SearchMethod>,
    pub matched_record: Option<R>,
    /// Lookup calls issued.
    pub attempts: usize,
    /// Lookups that came back without a match.
    pub retries: usize,
    /// The entry was never started because its request was cancelled.
    pub cancelled: bool,
}

impl<R> ResolutionResult<R> {
    pub fn cancelled() -> Self {
        Self {
            matched: false,
            method: None,
            matched_record: None,
            attempts: 0,
            retries: 0,
            cancelled: true,
        }
    }

    /// Converts the matched payload, keeping the attempt bookkeeping.
    pub fn map_record<T, F>(self, f: F) -> ResolutionResult<T>
    where
        F: FnOnce(R) -> T,
    {
        ResolutionResult {
            matched: self.matched,
            method: self.method,
            matched_record: self.matched_record.map(f),
            attempts: self.attempts,
            retries: self.retries,
            cancelled: self.cancelled,
        }
    }
}

/// OCR output is model-generated JSON, so counts arrive as numbers or strings.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
