// File: src/core/dictionary.rs
use crate::config::EngineConfig;
use crate::core::candidates::strip_parentheticals;
use crate::core::phonetic::{normalize, NormalizedForm};
use crate::core::types::{DictionaryEntry, KeyId};
use crate::error::{Result, RxError};
use crate::fuzzy::symspell::{Suggestion, SymSpell};
use crate::persistence;
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;

/// The reference drug dictionary: canonical names grouped by phonetic key,
/// plus the fuzzy index over those keys. Immutable once built.
#[derive(Clone, Serialize, Deserialize)]
pub struct DrugDictionary {
    index: SymSpell,
    /// Indexed by `KeyId`.
    entries: Vec<DictionaryEntry>,
    row_count: usize,
}

impl DrugDictionary {
    pub fn empty(config: &EngineConfig) -> Self {
        Self {
            index: SymSpell::new(config.max_edit_distance, config.prefix_length),
            entries: Vec::new(),
            row_count: 0,
        }
    }

    pub fn from_names<I, S>(names: I, config: &EngineConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dictionary = Self::empty(config);
        for name in names {
            dictionary.insert(name.as_ref());
        }
        dictionary
    }

    /// Loads the CSV named by `config.dictionary_path`.
    pub fn load(config: &EngineConfig) -> Result<Self> {
        let file = File::open(&config.dictionary_path)?;
        Self::from_csv_reader(file, config)
    }

    pub fn from_csv_reader<R: Read>(reader: R, config: &EngineConfig) -> Result<Self> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let column = reader
            .headers()?
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim() == config.name_column)
            .ok_or_else(|| RxError::MissingColumn(config.name_column.clone()))?;

        let mut dictionary = Self::empty(config);
        for row in reader.records() {
            let row = row?;
            if let Some(name) = row.get(column) {
                dictionary.insert(name);
            }
        }
        tracing::info!(
            rows = dictionary.row_count,
            keys = dictionary.entries.len(),
            "drug dictionary loaded"
        );
        Ok(dictionary)
    }

    /// Like [`DrugDictionary::load`], but an unusable source degrades to an
    /// empty dictionary so every name passes through uncorrected.
    pub fn load_or_empty(config: &EngineConfig) -> Self {
        match Self::load(config) {
            Ok(dictionary) => dictionary,
            Err(e) => {
                tracing::warn!(
                    path = %config.dictionary_path.display(),
                    error = %e,
                    "drug dictionary unavailable, names will not be corrected"
                );
                Self::empty(config)
            }
        }
    }

    /// Loads from `config.snapshot_path` when it is current, otherwise from
    /// the CSV source, refreshing the snapshot afterwards.
    pub fn load_cached(config: &EngineConfig) -> Self {
        let Some(snapshot_path) = &config.snapshot_path else {
            return Self::load_or_empty(config);
        };

        match persistence::load_snapshot(config, snapshot_path) {
            Ok(dictionary) => {
                tracing::debug!(path = %snapshot_path.display(), "dictionary snapshot hit");
                return dictionary;
            }
            Err(e) => {
                tracing::debug!(path = %snapshot_path.display(), error = %e, "dictionary snapshot miss");
            }
        }

        let dictionary = Self::load_or_empty(config);
        if !dictionary.is_empty() {
            if let Err(e) = persistence::save_snapshot(&dictionary, config, snapshot_path) {
                tracing::warn!(path = %snapshot_path.display(), error = %e, "failed to write dictionary snapshot");
            }
        }
        dictionary
    }

    /// Adds one canonical name. Its key ignores parenthesized text, so
    /// `타이레놀정500mg(아세트아미노펜)` is found by `타이레놀정500밀리그램`.
    fn insert(&mut self, canonical_name: &str) {
        let canonical_name = canonical_name.trim();
        if canonical_name.is_empty() {
            return;
        }
        let key = phonetic_key(canonical_name);
        self.row_count += 1;
        let id = self.index.add_key(&key);
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.frequency_weight += 1;
                if !entry.canonical_names.iter().any(|n| n == canonical_name) {
                    entry.canonical_names.push(canonical_name.to_string());
                }
            }
            None => self.entries.push(DictionaryEntry {
                phonetic_key: key,
                canonical_names: vec![canonical_name.to_string()],
                frequency_weight: 1,
            }),
        }
    }

    pub fn lookup(&self, query: &NormalizedForm, max_distance: usize) -> Vec<Suggestion> {
        self.index.lookup(query, max_distance)
    }

    /// The closest entry and its distance, ties going to the entry loaded first.
    pub fn closest(
        &self,
        query: &NormalizedForm,
        max_distance: usize,
    ) -> Option<(&DictionaryEntry, usize)> {
        let best = self.index.closest(query, max_distance)?;
        self.entry(best.key_id).map(|entry| (entry, best.distance))
    }

    pub fn entry(&self, id: KeyId) -> Option<&DictionaryEntry> {
        self.entries.get(id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct phonetic keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Number of non-blank rows loaded.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn max_edit_distance(&self) -> usize {
        self.index.max_edit_distance()
    }
}

/// The phonetic key a name is indexed and queried under: parenthesized text
/// is ignored unless nothing else is left.
pub fn phonetic_key(name: &str) -> NormalizedForm {
    let key = normalize(&strip_parentheticals(name));
    if key.is_empty() {
        normalize(name)
    } else {
        key
    }
}
