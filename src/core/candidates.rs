// File: src/core/candidates.rs
//! Query candidates for the external drug lookup, most specific first.

use crate::core::types::{CorrectedDrugRecord, QueryCandidate, SearchMethod};
use once_cell::sync::Lazy;
use regex::Regex;

static TRAILING_DOSAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\d+(?:\.\d+)?\s*(?:마이크로그램|밀리그램|밀리그람|미리그램|밀리리터|미리리터|그램|mcg|mg|ml|g|l)\s*$",
    )
    .expect("trailing dosage pattern is valid")
});

static PARENTHETICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*\)").expect("parenthetical pattern is valid"));

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Removes a trailing quantity-plus-unit token such as `500mg` or `2.5 ml`.
pub fn strip_trailing_dosage(name: &str) -> String {
    TRAILING_DOSAGE.replace(name, "").trim().to_string()
}

/// Removes every parenthesized substring and collapses the whitespace left behind.
pub fn strip_parentheticals(name: &str) -> String {
    let stripped = PARENTHETICAL.replace_all(name, " ");
    WHITESPACE_RUN.replace_all(stripped.trim(), " ").into_owned()
}

#[derive(Debug, Clone, Copy)]
pub struct CandidateGenerator {
    prefix_len: usize,
}

impl CandidateGenerator {
    pub fn new(prefix_len: usize) -> Self {
        Self {
            prefix_len: prefix_len.max(1),
        }
    }

    /// Derives up to four distinct queries from one record:
    /// full name, dosage-stripped, parenthetical-stripped, then a short
    /// name prefix. A blank name yields no candidates.
    pub fn candidates(&self, record: &CorrectedDrugRecord) -> Vec<QueryCandidate> {
        let name = base_name(record);
        if name.is_empty() {
            return Vec::new();
        }

        let mut out: Vec<QueryCandidate> = Vec::with_capacity(4);
        push_distinct(&mut out, name.to_string(), SearchMethod::Full);

        let dosage_stripped = strip_trailing_dosage(name);
        let base_query = if dosage_stripped.is_empty() {
            name.to_string()
        } else {
            push_distinct(&mut out, dosage_stripped.clone(), SearchMethod::DosageStripped);
            dosage_stripped
        };

        let paren_stripped = [strip_parentheticals(name), strip_parentheticals(&base_query)]
            .into_iter()
            .find(|q| q.chars().count() > 1 && !contains(&out, q));
        if let Some(query) = paren_stripped {
            push_distinct(&mut out, query, SearchMethod::ParenStripped);
        }

        // Broad and often wrong; only worth trying once everything else failed.
        if let Some(prefix) = self.prefix(&base_query) {
            push_distinct(&mut out, prefix, SearchMethod::Prefix);
        }

        out
    }

    /// The leading `prefix_len` characters of `base_query` with parenthesized
    /// text removed, cut short at any stray bracket.
    fn prefix(&self, base_query: &str) -> Option<String> {
        let stripped = strip_parentheticals(base_query);
        let source = if stripped.is_empty() { base_query } else { &stripped };
        if source.chars().count() <= self.prefix_len {
            return None;
        }
        let prefix: String = source
            .chars()
            .take(self.prefix_len)
            .take_while(|c| *c != '(' && *c != ')')
            .collect();
        let prefix = prefix.trim_end();
        (!prefix.is_empty()).then(|| prefix.to_string())
    }

    /// The single candidate used when no dictionary is available: the name
    /// as the OCR collaborator produced it.
    pub fn passthrough(&self, record: &CorrectedDrugRecord) -> Vec<QueryCandidate> {
        let name = record.original_name.trim();
        if name.is_empty() {
            return Vec::new();
        }
        vec![QueryCandidate {
            query: name.to_string(),
            method: SearchMethod::Full,
        }]
    }
}

impl Default for CandidateGenerator {
    fn default() -> Self {
        Self::new(4)
    }
}

fn base_name(record: &CorrectedDrugRecord) -> &str {
    let corrected = record.corrected_name.trim();
    if corrected.is_empty() {
        record.original_name.trim()
    } else {
        corrected
    }
}

fn contains(out: &[QueryCandidate], query: &str) -> bool {
    out.iter().any(|c| c.query == query)
}

fn push_distinct(out: &mut Vec<QueryCandidate>, query: String, method: SearchMethod) {
    if !query.is_empty() && !contains(out, &query) {
        out.push(QueryCandidate { query, method });
    }
}
