// src/lib.rs

pub mod config;
pub mod core;
pub mod error;
pub mod fuzzy;
pub mod interactions;
pub mod lookup;
pub mod ocr;
pub mod persistence;

pub use crate::config::{EngineConfig, SurfaceStyle};
pub use crate::core::engine::{BatchOutcome, CancelFlag, ResolvedEntry, RxEngine};
pub use crate::error::{Result, RxError};
