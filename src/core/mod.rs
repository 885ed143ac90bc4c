pub mod cache;
pub mod candidates;
pub mod corrector;
pub mod dictionary;
pub mod engine;
pub mod phonetic;
pub mod resolver;
pub mod types;
