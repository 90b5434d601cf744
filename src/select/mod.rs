//! Arg-max selection of the best candidate.
//!
//! Candidates are evaluated independently. The best fused score wins and ties
//! go to the lowest index, so sequential and parallel scans agree. A candidate
//! that fails to decode is recorded and skipped.

use crate::engine::ComparisonReport;
use crate::image::Image;
use crate::trace::{trace_event, trace_warn};
use crate::util::{MatchError, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Selector behaviour.
#[derive(Clone, Debug)]
pub struct SelectorConfig {
    /// Evaluate candidates on the rayon pool (requires the `rayon` feature).
    pub parallel: bool,
    /// Stop a sequential scan once a candidate reaches a fused score of 100.
    pub stop_on_perfect: bool,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            stop_on_perfect: true,
        }
    }
}

/// Cooperative cancellation flag shared between a caller and a scan.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; candidates not yet started are skipped.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// A candidate that could not be evaluated.
#[derive(Clone, Debug, PartialEq)]
pub struct CandidateFailure {
    /// Position in the candidate slice.
    pub index: usize,
    /// Candidate identifier.
    pub id: String,
    pub error: MatchError,
}

/// Outcome of a best-match scan.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    /// Identifier of the reference image.
    pub reference_id: String,
    /// Index of the winning candidate, if any candidate was evaluated.
    pub candidate_index: Option<usize>,
    /// Identifier of the winning candidate.
    pub candidate_id: Option<String>,
    /// Fused score of the winner, 0 when there is none.
    pub score: f32,
    /// Full report of the winner.
    pub report: Option<ComparisonReport>,
    /// Number of candidates scored successfully.
    pub evaluated: usize,
    /// Candidates that failed, ordered by index.
    pub failures: Vec<CandidateFailure>,
    /// `true` when cancellation skipped at least one candidate.
    pub cancelled: bool,
}

impl MatchResult {
    /// Returns `true` when a candidate was selected with `score >= threshold`.
    pub fn is_match(&self, threshold: f32) -> bool {
        self.candidate_index.is_some() && self.score >= threshold
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScanState {
    Scanning,
    Done,
}

#[derive(Clone, Debug)]
struct Best {
    index: usize,
    report: ComparisonReport,
}

impl Best {
    fn beats(&self, other: &Best) -> bool {
        self.report.fused > other.report.fused
            || (self.report.fused == other.report.fused && self.index < other.index)
    }
}

#[derive(Clone, Debug, Default)]
struct Scan {
    best: Option<Best>,
    evaluated: usize,
    failures: Vec<CandidateFailure>,
    cancelled: bool,
}

impl Scan {
    fn observe(
        &mut self,
        index: usize,
        candidate: &Image,
        outcome: Result<ComparisonReport>,
        stop_on_perfect: bool,
    ) -> ScanState {
        match outcome {
            Ok(report) => {
                trace_event!("candidate_scored", index = index, fused = report.fused);
                self.evaluated += 1;
                let perfect = report.fused >= 100.0;
                let next = Best { index, report };
                if self.best.as_ref().map_or(true, |best| next.beats(best)) {
                    self.best = Some(next);
                }
                if perfect && stop_on_perfect {
                    ScanState::Done
                } else {
                    ScanState::Scanning
                }
            }
            Err(error) => {
                trace_warn!("candidate_failed", index = index, id = candidate.id());
                self.failures.push(CandidateFailure {
                    index,
                    id: candidate.id().to_owned(),
                    error,
                });
                ScanState::Scanning
            }
        }
    }

    #[cfg(feature = "rayon")]
    fn merge(mut self, other: Scan) -> Scan {
        self.best = match (self.best, other.best) {
            (Some(a), Some(b)) => Some(if b.beats(&a) { b } else { a }),
            (a, b) => a.or(b),
        };
        self.evaluated += other.evaluated;
        self.failures.extend(other.failures);
        self.cancelled |= other.cancelled;
        self
    }

    fn finish(mut self, reference_id: &str, candidates: &[Image]) -> MatchResult {
        self.failures.sort_by_key(|f| f.index);
        let (candidate_index, candidate_id, score, report) = match self.best {
            Some(best) => (
                Some(best.index),
                candidates.get(best.index).map(|c| c.id().to_owned()),
                best.report.fused,
                Some(best.report),
            ),
            None => (None, None, 0.0, None),
        };
        trace_event!(
            "selection",
            evaluated = self.evaluated,
            failed = self.failures.len(),
            score = score,
            cancelled = self.cancelled
        );
        MatchResult {
            reference_id: reference_id.to_owned(),
            candidate_index,
            candidate_id,
            score,
            report,
            evaluated: self.evaluated,
            failures: self.failures,
            cancelled: self.cancelled,
        }
    }
}

/// Scores every candidate with `evaluate` and keeps the arg-max.
///
/// Returns [`MatchError::EmptyPool`] for an empty slice. Errors returned by
/// `evaluate` are recorded as [`CandidateFailure`]s.
pub fn select_best<F>(
    reference_id: &str,
    candidates: &[Image],
    cfg: &SelectorConfig,
    cancel: &CancellationToken,
    evaluate: F,
) -> Result<MatchResult>
where
    F: Fn(&Image) -> Result<ComparisonReport> + Sync,
{
    if candidates.is_empty() {
        return Err(MatchError::EmptyPool);
    }

    #[cfg(feature = "rayon")]
    {
        if cfg.parallel {
            let scan = scan_parallel(candidates, cancel, &evaluate);
            return Ok(scan.finish(reference_id, candidates));
        }
    }

    Ok(scan_sequential(candidates, cfg, cancel, &evaluate).finish(reference_id, candidates))
}

fn scan_sequential<F>(
    candidates: &[Image],
    cfg: &SelectorConfig,
    cancel: &CancellationToken,
    evaluate: &F,
) -> Scan
where
    F: Fn(&Image) -> Result<ComparisonReport>,
{
    let mut scan = Scan::default();
    for (index, candidate) in candidates.iter().enumerate() {
        if cancel.is_cancelled() {
            trace_event!("cancelled", remaining = candidates.len() - index);
            scan.cancelled = true;
            break;
        }
        let state = scan.observe(index, candidate, evaluate(candidate), cfg.stop_on_perfect);
        if state == ScanState::Done {
            break;
        }
    }
    scan
}

#[cfg(feature = "rayon")]
fn scan_parallel<F>(candidates: &[Image], cancel: &CancellationToken, evaluate: &F) -> Scan
where
    F: Fn(&Image) -> Result<ComparisonReport> + Sync,
{
    use rayon::prelude::*;

    candidates
        .par_iter()
        .enumerate()
        .fold(Scan::default, |mut scan, (index, candidate)| {
            if cancel.is_cancelled() {
                scan.cancelled = true;
            } else {
                scan.observe(index, candidate, evaluate(candidate), false);
            }
            scan
        })
        .reduce(Scan::default, Scan::merge)
}
