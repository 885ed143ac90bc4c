// File: src/lookup.rs
//! The seam to the remote drug-information lookup.
//!
//! The engine never talks to the network itself. It hands query strings to a
//! [`DrugLookup`] and treats anything other than a record (HTTP errors,
//! timeouts, unparsable bodies, empty result sets) as "no match".

use crate::error::Result;
use once_cell::sync::Lazy;
use quick_xml::escape::{resolve_html5_entity, unescape_with};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

pub trait DrugLookup: Sync {
    type Record: Send;

    fn lookup(&self, query: &str) -> Option<Self::Record>;
}

impl<F, R> DrugLookup for F
where
    F: Fn(&str) -> Option<R> + Sync,
    R: Send,
{
    type Record = R;

    fn lookup(&self, query: &str) -> Option<R> {
        self(query)
    }
}

/// An in-memory stand-in for the remote service, answering from a list of
/// item objects shaped like its JSON response items.
///
/// Like the item-name search it imitates, a query matches the first item
/// whose `ITEM_NAME` contains it, ignoring whitespace.
pub struct CatalogLookup {
    items: Vec<Value>,
}

impl CatalogLookup {
    pub fn new(items: Vec<Value>) -> Self {
        Self { items }
    }

    /// Reads a JSON array of items, or an object carrying them under
    /// `body.items` as the remote service returns them.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => map
                .remove("body")
                .and_then(|mut body| body.get_mut("items").map(Value::take))
                .and_then(|items| match items {
                    Value::Array(items) => Some(items),
                    _ => None,
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        Ok(Self::new(items))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl DrugLookup for CatalogLookup {
    type Record = Value;

    fn lookup(&self, query: &str) -> Option<Value> {
        let query = compact(query);
        if query.is_empty() {
            return None;
        }
        self.items
            .iter()
            .find(|item| {
                item.get("ITEM_NAME")
                    .and_then(Value::as_str)
                    .is_some_and(|name| compact(name).contains(&query))
            })
            .cloned()
    }
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// The parts of a matched item shown to the patient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrugInfo {
    pub item_name: Option<String>,
    pub company: Option<String>,
    pub efficacy: String,
    pub usage: String,
    pub precautions: String,
    pub valid_term: Option<String>,
    pub storage_method: Option<String>,
    pub image_url: Option<String>,
}

impl DrugInfo {
    pub fn from_item(item: &Value) -> Self {
        let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);
        let document = |key: &str| {
            item.get(key)
                .and_then(Value::as_str)
                .map(strip_markup)
                .unwrap_or_default()
        };
        Self {
            item_name: text("ITEM_NAME"),
            company: text("ENTP_NAME"),
            efficacy: document("EE_DOC_DATA"),
            usage: document("UD_DOC_DATA"),
            precautions: document("NB_DOC_DATA"),
            valid_term: text("VALID_TERM"),
            storage_method: text("STORAGE_METHOD"),
            image_url: text("ITEM_IMAGE"),
        }
    }
}

static CDATA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("cdata pattern is valid"));
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&#?[0-9A-Za-z]+;").expect("entity pattern is valid"));

/// Reduces the XML/HTML document fields of a lookup item to plain text.
pub fn strip_markup(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let text = unescape_entities(text);
    let text = CDATA.replace_all(&text, "$1");
    let text = TAG.replace_all(&text, " ");
    WHITESPACE_RUN.replace_all(&text, " ").trim().to_string()
}

/// Decodes named (HTML5) and numeric character references. Each reference is
/// decoded on its own so a bare `&` or an unknown name is left as written.
fn unescape_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures| {
            let reference = &caps[0];
            unescape_with(reference, resolve_html5_entity)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| reference.to_string())
        })
        .into_owned()
}
