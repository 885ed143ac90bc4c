// File: src/core/corrector.rs
use crate::config::SurfaceStyle;
use crate::core::dictionary::{phonetic_key, DrugDictionary};
use crate::core::types::{CorrectedDrugRecord, RawDrugRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;

const MAX_CHANGE_EXAMPLES: usize = 5;

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("digit pattern is valid"));

static LATIN_MG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([0-9]+)mg").expect("mg pattern is valid"));

/// The set of digit runs in `text`; `"10mg x 100"` gives `{"10", "100"}`.
pub fn numeric_tokens(text: &str) -> BTreeSet<&str> {
    DIGIT_RUN.find_iter(text).map(|m| m.as_str()).collect()
}

/// Spells a canonical dictionary name the way downstream consumers expect.
pub fn render_surface(canonical_name: &str, style: SurfaceStyle) -> String {
    match style {
        SurfaceStyle::Verbatim => canonical_name.trim().to_string(),
        SurfaceStyle::LookupFormat => {
            let compact: String = canonical_name.chars().filter(|c| !c.is_whitespace()).collect();
            LATIN_MG.replace_all(&compact, "${1}밀리그램").into_owned()
        }
    }
}

/// Fixes OCR misspellings in drug names against the reference dictionary.
///
/// A correction is only accepted when it leaves every number in the name
/// untouched: numbers carry the dosage, and a wrong dosage is worse than a
/// misspelled name.
pub struct NameCorrector<'a> {
    dictionary: &'a DrugDictionary,
    max_distance: usize,
    surface_style: SurfaceStyle,
}

impl<'a> NameCorrector<'a> {
    pub fn new(dictionary: &'a DrugDictionary, max_distance: usize, surface_style: SurfaceStyle) -> Self {
        Self {
            dictionary,
            max_distance,
            surface_style,
        }
    }

    pub fn correct(&self, raw: RawDrugRecord) -> CorrectedDrugRecord {
        let original = raw.name();
        if original.is_empty() {
            return CorrectedDrugRecord::unchanged(raw);
        }

        // Same key shape as the dictionary side, so an OCR name carrying the
        // ingredient suffix still lands on its entry.
        let query = phonetic_key(original);
        let Some((entry, distance)) = self.dictionary.closest(&query, self.max_distance) else {
            return CorrectedDrugRecord::unchanged(raw);
        };

        let original_numbers = numeric_tokens(original);
        let accepted = entry
            .canonical_names
            .iter()
            .map(|name| render_surface(name, self.surface_style))
            .find(|candidate| numeric_tokens(candidate) == original_numbers);

        match accepted {
            Some(corrected_name) => {
                if distance > 0 {
                    tracing::debug!(before = original, after = %corrected_name, distance, "name corrected");
                }
                let original_name = original.to_string();
                CorrectedDrugRecord {
                    raw,
                    corrected_name,
                    original_name,
                    correction_distance: distance,
                    was_corrected: distance > 0,
                }
            }
            None => {
                tracing::debug!(
                    name = original,
                    candidate = ?entry.canonical_names.first(),
                    "correction rejected, numeric tokens differ"
                );
                CorrectedDrugRecord::unchanged(raw)
            }
        }
    }

    /// Corrects a batch, returning the records in input order plus a summary.
    pub fn correct_all<I>(&self, records: I) -> (Vec<CorrectedDrugRecord>, CorrectionReport)
    where
        I: IntoIterator<Item = RawDrugRecord>,
    {
        let corrected: Vec<CorrectedDrugRecord> =
            records.into_iter().map(|raw| self.correct(raw)).collect();
        let report = CorrectionReport::from_records(&corrected);
        (corrected, report)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeExample {
    pub before: String,
    pub after: String,
}

/// Summary of what correction changed across one prescription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorrectionReport {
    /// Sum of edit distances of accepted corrections.
    pub total_edits: usize,
    pub corrected_count: usize,
    /// The first few corrections, as evidence.
    pub change_examples: Vec<ChangeExample>,
}

impl CorrectionReport {
    pub fn from_records<'r, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'r CorrectedDrugRecord>,
    {
        let mut report = Self::default();
        for record in records {
            report.record(record);
        }
        report
    }

    pub fn record(&mut self, record: &CorrectedDrugRecord) {
        if !record.was_corrected {
            return;
        }
        self.total_edits += record.correction_distance;
        self.corrected_count += 1;
        if self.change_examples.len() < MAX_CHANGE_EXAMPLES {
            self.change_examples.push(ChangeExample {
                before: record.original_name.clone(),
                after: record.corrected_name.clone(),
            });
        }
    }
}
