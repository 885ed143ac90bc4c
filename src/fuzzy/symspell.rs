// File: src/fuzzy/symspell.rs
use crate::core::phonetic::NormalizedForm;
use crate::core::types::KeyId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A candidate key returned by [`SymSpell::lookup`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    pub key_id: KeyId,
    pub distance: usize,
}

/// A fuzzy search index based on the Symmetric Delete (SymSpell) algorithm,
/// working over phonetic symbols rather than bytes. Deletes are pre-calculated
/// for every key so a lookup only touches the deletes of the query, independent
/// of dictionary size.
#[derive(Clone, Serialize, Deserialize)]
pub struct SymSpell {
    /// Maps a delete variant to the keys it could have come from, in
    /// insertion order.
    deletes: HashMap<String, Vec<KeyId>>,
    keys: Vec<Vec<char>>,
    frequencies: Vec<u32>,
    key_ids: HashMap<Vec<char>, KeyId>,
    max_edit_distance: usize,
    /// Only the first `prefix_length` symbols of a key generate deletes.
    prefix_length: usize,
}

impl SymSpell {
    pub fn new(max_edit_distance: usize, prefix_length: usize) -> Self {
        Self {
            deletes: HashMap::new(),
            keys: Vec::new(),
            frequencies: Vec::new(),
            key_ids: HashMap::new(),
            max_edit_distance,
            prefix_length: prefix_length.max(max_edit_distance + 1),
        }
    }

    /// Adds a key, returning its id. Re-adding an existing key bumps its
    /// frequency and returns the id it was first given.
    /// Complexity: O(p^d) in the prefix length p and max distance d.
    pub fn add_key(&mut self, key: &NormalizedForm) -> KeyId {
        if let Some(&id) = self.key_ids.get(key.symbols()) {
            self.frequencies[id] += 1;
            return id;
        }

        let id = self.keys.len();
        let symbols = key.symbols().to_vec();
        for edit in self.generate_edits(self.prefix(&symbols)) {
            let ids = self.deletes.entry(edit).or_default();
            if ids.last() != Some(&id) {
                ids.push(id);
            }
        }
        self.key_ids.insert(symbols.clone(), id);
        self.keys.push(symbols);
        self.frequencies.push(1);
        id
    }

    /// Finds every key within `max_distance` (capped at the index's own
    /// bound) of `query`, ordered by ascending distance and then by the
    /// order keys were first added.
    pub fn lookup(&self, query: &NormalizedForm, max_distance: usize) -> Vec<Suggestion> {
        let max_distance = max_distance.min(self.max_edit_distance);
        let query = query.symbols();

        let mut seen: HashSet<KeyId> = HashSet::new();
        let mut suggestions = Vec::new();
        for edit in self.generate_edits_within(self.prefix(query), max_distance) {
            let Some(ids) = self.deletes.get(&edit) else {
                continue;
            };
            for &id in ids {
                if !seen.insert(id) {
                    continue;
                }
                let key = &self.keys[id];
                if key.len().abs_diff(query.len()) > max_distance {
                    continue;
                }
                if let Some(distance) = bounded_levenshtein(query, key, max_distance) {
                    suggestions.push(Suggestion { key_id: id, distance });
                }
            }
        }

        suggestions.sort_by_key(|s| (s.distance, s.key_id));
        suggestions
    }

    /// The closest key, if any lies within `max_distance`.
    pub fn closest(&self, query: &NormalizedForm, max_distance: usize) -> Option<Suggestion> {
        self.lookup(query, max_distance).into_iter().next()
    }

    pub fn key(&self, id: KeyId) -> Option<&[char]> {
        self.keys.get(id).map(Vec::as_slice)
    }

    pub fn frequency(&self, id: KeyId) -> u32 {
        self.frequencies.get(id).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn max_edit_distance(&self) -> usize {
        self.max_edit_distance
    }

    fn prefix<'a>(&self, symbols: &'a [char]) -> &'a [char] {
        &symbols[..symbols.len().min(self.prefix_length)]
    }

    fn generate_edits(&self, word: &[char]) -> HashSet<String> {
        self.generate_edits_within(word, self.max_edit_distance)
    }

    /// Generates all unique delete variants up to `depth` deletions,
    /// including the word itself.
    fn generate_edits_within(&self, word: &[char], depth: usize) -> HashSet<String> {
        let mut edits = HashSet::new();
        edits.insert(word.iter().collect::<String>());

        let mut current: HashSet<Vec<char>> = HashSet::new();
        current.insert(word.to_vec());

        for _ in 0..depth {
            let mut next = HashSet::new();
            for edit in &current {
                for i in 0..edit.len() {
                    let mut deleted_variant = edit.clone();
                    deleted_variant.remove(i);
                    next.insert(deleted_variant);
                }
            }
            edits.extend(next.iter().map(|v| v.iter().collect::<String>()));
            current = next;
        }

        edits
    }
}

/// Levenshtein distance between `a` and `b`, or `None` once it is certain to
/// exceed `max`.
pub fn bounded_levenshtein(a: &[char], b: &[char], max: usize) -> Option<usize> {
    if a.len().abs_diff(b.len()) > max {
        return None;
    }
    if a.is_empty() {
        return Some(b.len());
    }
    if b.is_empty() {
        return Some(a.len());
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, &a_ch) in a.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for (j, &b_ch) in b.iter().enumerate() {
            let cost = usize::from(a_ch != b_ch);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
            row_min = row_min.min(curr[j + 1]);
        }
        if row_min > max {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[b.len()];
    (distance <= max).then_some(distance)
}
