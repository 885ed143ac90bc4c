// File: src/interactions.rs
//! Keyword rules flagging known interaction risks in a prescription.
//!
//! A rule fires for a drug when one of its keywords occurs in the drug's
//! corrected name, so it runs on the corrector's output rather than the raw
//! OCR text.

use crate::core::types::CorrectedDrugRecord;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InteractionRule {
    #[serde(default)]
    pub keywords: Vec<String>,
    /// The regulator's notice text, reported as is.
    #[serde(default)]
    pub original_content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InteractionWarning {
    pub keyword: String,
    pub content: String,
}

impl fmt::Display for InteractionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "keyword '{}': {}", self.keyword, self.content)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InteractionChecker {
    rules: Vec<InteractionRule>,
}

impl InteractionChecker {
    pub fn new(rules: Vec<InteractionRule>) -> Self {
        Self { rules }
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(Self::new(serde_json::from_str(text)?))
    }

    pub fn load(path: &Path) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    /// Like [`InteractionChecker::load`], but a missing or malformed rules
    /// file leaves the checker without rules.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(checker) => {
                tracing::info!(rules = checker.len(), "interaction rules loaded");
                checker
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "interaction rules unavailable");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Warnings for a prescription, in order of first occurrence and without
    /// repeats. Each rule contributes at most one warning per drug.
    pub fn check<'r, I>(&self, records: I) -> Vec<InteractionWarning>
    where
        I: IntoIterator<Item = &'r CorrectedDrugRecord>,
    {
        let mut warnings: Vec<InteractionWarning> = Vec::new();
        if self.rules.is_empty() {
            return warnings;
        }

        for record in records {
            let name = drug_name(record);
            if name.is_empty() {
                continue;
            }
            for rule in &self.rules {
                let hit = rule
                    .keywords
                    .iter()
                    .map(|k| k.trim())
                    .find(|k| !k.is_empty() && name.contains(k));
                if let Some(keyword) = hit {
                    let warning = InteractionWarning {
                        keyword: keyword.to_string(),
                        content: rule.original_content.clone(),
                    };
                    if !warnings.contains(&warning) {
                        warnings.push(warning);
                    }
                }
            }
        }
        warnings
    }
}

fn drug_name(record: &CorrectedDrugRecord) -> &str {
    let corrected = record.corrected_name.trim();
    if corrected.is_empty() {
        record.original_name.trim()
    } else {
        corrected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::RawDrugRecord;

    fn rules() -> InteractionChecker {
        InteractionChecker::from_json_str(
            r#"[
                {"keywords": ["아스피린", "aspirin"], "original_content": "출혈 위험 증가"},
                {"keywords": ["와파린"], "original_content": "항응고 효과 증가", "source": "식약처"},
                {"keywords": ["", "  "], "original_content": "never"}
            ]"#,
        )
        .unwrap()
    }

    fn corrected(original: &str, corrected: &str) -> CorrectedDrugRecord {
        let mut record = CorrectedDrugRecord::unchanged(RawDrugRecord::named(original));
        record.corrected_name = corrected.to_string();
        record
    }

    #[test]
    fn matches_keywords_in_corrected_name() {
        let records = [
            corrected("아스피란프로텍트정", "아스피린프로텍트정100밀리그램"),
            corrected("게보린정", "게보린정"),
        ];
        let warnings = rules().check(&records);
        assert_eq!(
            warnings,
            vec![InteractionWarning {
                keyword: "아스피린".into(),
                content: "출혈 위험 증가".into()
            }]
        );
        assert_eq!(warnings[0].to_string(), "keyword '아스피린': 출혈 위험 증가");
    }

    #[test]
    fn falls_back_to_original_name() {
        let records = [corrected("와파린정", "")];
        let warnings = rules().check(&records);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].keyword, "와파린");
    }

    #[test]
    fn repeated_drugs_warn_once() {
        let records = [
            corrected("아스피린정", "아스피린정"),
            corrected("아스피린장용정", "아스피린장용정"),
            corrected("와파린정", "와파린정"),
        ];
        let warnings = rules().check(&records);
        let keywords: Vec<&str> = warnings.iter().map(|w| w.keyword.as_str()).collect();
        assert_eq!(keywords, vec!["아스피린", "와파린"]);
    }

    #[test]
    fn blank_keywords_never_match() {
        let records = [corrected("타이레놀정", "타이레놀정")];
        assert!(rules().check(&records).is_empty());
    }

    #[test]
    fn missing_rules_file_means_no_warnings() {
        let dir = tempfile::tempdir().unwrap();
        let checker = InteractionChecker::load_or_empty(&dir.path().join("drug_rules.json"));
        assert!(checker.is_empty());
        assert!(checker.check(&[corrected("아스피린정", "아스피린정")]).is_empty());

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{not json").unwrap();
        assert!(InteractionChecker::load_or_empty(&bad).is_empty());
    }
}
