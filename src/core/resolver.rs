// File: src/core/resolver.rs
use crate::core::types::{QueryCandidate, ResolutionResult};
use crate::lookup::DrugLookup;

/// Where a resolution run is. `Matched` and `Exhausted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveState {
    Pending,
    Trying(usize),
    Matched(usize),
    Exhausted,
}

/// Offers each candidate to `lookup` in order and stops at the first hit.
///
/// Every candidate is tried at most once; a failed lookup moves on to the
/// next, broader query rather than repeating the same one. Timeouts and
/// transport failures belong to the lookup and look like a miss here.
pub fn resolve<L>(candidates: &[QueryCandidate], lookup: &L) -> ResolutionResult<L::Record>
where
    L: DrugLookup + ?Sized,
{
    let mut state = ResolveState::Pending;
    let mut attempts = 0;
    let mut retries = 0;
    let mut matched_record = None;

    loop {
        state = match state {
            ResolveState::Pending if candidates.is_empty() => ResolveState::Exhausted,
            ResolveState::Pending => ResolveState::Trying(0),
            ResolveState::Trying(i) => {
                let candidate = &candidates[i];
                attempts += 1;
                match lookup.lookup(&candidate.query) {
                    Some(record) => {
                        tracing::debug!(query = %candidate.query, method = ?candidate.method, attempts, "lookup matched");
                        matched_record = Some(record);
                        ResolveState::Matched(i)
                    }
                    None => {
                        tracing::debug!(query = %candidate.query, method = ?candidate.method, "lookup missed");
                        retries += 1;
                        if i + 1 < candidates.len() {
                            ResolveState::Trying(i + 1)
                        } else {
                            ResolveState::Exhausted
                        }
                    }
                }
            }
            ResolveState::Matched(i) => {
                return ResolutionResult {
                    matched: true,
                    method: Some(candidates[i].method),
                    matched_record,
                    attempts,
                    retries,
                    cancelled: false,
                };
            }
            ResolveState::Exhausted => {
                tracing::debug!(attempts, "candidates exhausted without a match");
                return ResolutionResult {
                    matched: false,
                    method: None,
                    matched_record: None,
                    attempts,
                    retries,
                    cancelled: false,
                };
            }
        };
    }
}
