use crate::config::EngineConfig;
use crate::core::cache::IndexCache;
use crate::core::candidates::CandidateGenerator;
use crate::core::corrector::{CorrectionReport, NameCorrector};
use crate::core::dictionary::DrugDictionary;
use crate::core::resolver::resolve;
use crate::core::types::{CorrectedDrugRecord, QueryCandidate, RawDrugRecord, ResolutionResult};
use crate::error::Result;
use crate::interactions::{InteractionChecker, InteractionWarning};
use crate::lookup::DrugLookup;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Raised when the request that owns a batch is aborted. Entries that have
/// not started by then are not looked up; lookups already in flight finish.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything the pipeline produced for one OCR record.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedEntry<R> {
    pub record: CorrectedDrugRecord,
    pub candidates: Vec<QueryCandidate>,
    pub resolution: ResolutionResult<R>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome<R> {
    /// One entry per input record, in input order.
    pub entries: Vec<ResolvedEntry<R>>,
    pub report: CorrectionReport,
    /// Interaction rules triggered by the corrected names.
    pub warnings: Vec<InteractionWarning>,
}

// The engine composes the shared dictionary with the per-entry pipeline:
// correct -> generate candidates -> resolve.
pub struct RxEngine {
    dictionary: Arc<DrugDictionary>,
    config: EngineConfig,
    generator: CandidateGenerator,
    interactions: InteractionChecker,
    pool: ThreadPool,
}

impl RxEngine {
    pub fn new(dictionary: Arc<DrugDictionary>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.concurrency)
            .thread_name(|i| format!("rx-resolve-{}", i))
            .build()?;
        Ok(Self {
            dictionary,
            generator: CandidateGenerator::new(config.prefix_fallback_len),
            interactions: InteractionChecker::default(),
            config,
            pool,
        })
    }

    pub fn with_interactions(mut self, interactions: InteractionChecker) -> Self {
        self.interactions = interactions;
        self
    }

    /// Builds an engine over the dictionary held by `cache`, loading it if
    /// this is the first use.
    pub fn from_cache(cache: &IndexCache) -> Result<Self> {
        Self::new(cache.get(), cache.config().clone())
    }

    /// Loads the dictionary (and interaction rules, when configured) named by
    /// `config`.
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        let dictionary = Arc::new(DrugDictionary::load_cached(&config));
        let interactions = config
            .rules_path
            .as_deref()
            .map(InteractionChecker::load_or_empty)
            .unwrap_or_default();
        Ok(Self::new(dictionary, config)?.with_interactions(interactions))
    }

    pub fn dictionary(&self) -> &DrugDictionary {
        &self.dictionary
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn corrector(&self) -> NameCorrector<'_> {
        NameCorrector::new(
            &self.dictionary,
            self.config.max_edit_distance,
            self.config.surface_style,
        )
    }

    pub fn correct(&self, raw: RawDrugRecord) -> CorrectedDrugRecord {
        self.corrector().correct(raw)
    }

    /// Query candidates for a corrected record. Without a dictionary only the
    /// name as read by OCR is offered.
    pub fn candidates(&self, record: &CorrectedDrugRecord) -> Vec<QueryCandidate> {
        if self.dictionary.is_empty() {
            self.generator.passthrough(record)
        } else {
            self.generator.candidates(record)
        }
    }

    /// Runs the full pipeline for one record on the calling thread.
    pub fn process_entry<L>(&self, raw: RawDrugRecord, lookup: &L) -> ResolvedEntry<L::Record>
    where
        L: DrugLookup + ?Sized,
    {
        let record = self.correct(raw);
        let candidates = self.candidates(&record);
        let resolution = resolve(&candidates, lookup);
        ResolvedEntry {
            record,
            candidates,
            resolution,
        }
    }

    /// Runs the pipeline for every record, fanning entries out over the
    /// worker pool. Output order matches input order.
    pub fn process_batch<L>(
        &self,
        records: Vec<RawDrugRecord>,
        lookup: &L,
        cancel: &CancelFlag,
    ) -> BatchOutcome<L::Record>
    where
        L: DrugLookup,
    {
        let entries: Vec<ResolvedEntry<L::Record>> = self.pool.install(|| {
            records
                .into_par_iter()
                .map(|raw| {
                    if cancel.is_cancelled() {
                        let record = self.correct(raw);
                        let candidates = self.candidates(&record);
                        return ResolvedEntry {
                            record,
                            candidates,
                            resolution: ResolutionResult::cancelled(),
                        };
                    }
                    self.process_entry(raw, lookup)
                })
                .collect()
        });

        let report = CorrectionReport::from_records(entries.iter().map(|e| &e.record));
        let warnings = self.interactions.check(entries.iter().map(|e| &e.record));
        let matched = entries.iter().filter(|e| e.resolution.matched).count();
        let cancelled = entries.iter().filter(|e| e.resolution.cancelled).count();
        tracing::info!(
            entries = entries.len(),
            matched,
            corrected = report.corrected_count,
            cancelled,
            warnings = warnings.len(),
            "batch resolved"
        );

        BatchOutcome {
            entries,
            report,
            warnings,
        }
    }
}
