//! Per-run status table, the single owner of every reference's status.
//!
//! Verification tasks never touch the board directly. Their updates arrive
//! through a channel and are applied here one at a time, so each index is
//! written at most once per run. Updates tagged with an older [`RunId`] are
//! dropped: a new run may reuse the same indices for different references.

use serde::Serialize;

use crate::VerificationStatus;

/// Generation number of one verification run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u64);

impl RunId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// What [`StatusBoard::apply`] did with an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Updated,
    /// The update belongs to a superseded run.
    Stale,
    /// The index already holds a terminal status.
    Duplicate,
    OutOfRange,
    /// `NOT_CHECKED` is never written back.
    NotTerminal,
}

#[derive(Debug, Default)]
pub struct StatusBoard {
    run: RunId,
    statuses: Vec<VerificationStatus>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run of `len` references, all `NOT_CHECKED`.
    pub fn begin_run(&mut self, len: usize) -> RunId {
        self.run = RunId(self.run.0 + 1);
        self.statuses = vec![VerificationStatus::NotChecked; len];
        tracing::debug!(run = %self.run, len, "run started");
        self.run
    }

    pub fn apply(&mut self, run: RunId, index: usize, status: VerificationStatus) -> Applied {
        if run != self.run {
            tracing::debug!(%run, current = %self.run, index, "dropping stale update");
            return Applied::Stale;
        }
        if !status.is_terminal() {
            return Applied::NotTerminal;
        }
        let Some(slot) = self.statuses.get_mut(index) else {
            return Applied::OutOfRange;
        };
        if slot.is_terminal() {
            return Applied::Duplicate;
        }
        *slot = status;
        Applied::Updated
    }

    pub fn status(&self, index: usize) -> Option<VerificationStatus> {
        self.statuses.get(index).copied()
    }

    pub fn statuses(&self) -> &[VerificationStatus] {
        &self.statuses
    }

    /// Number of references still waiting for a result.
    pub fn pending(&self) -> usize {
        self.statuses.iter().filter(|s| !s.is_terminal()).count()
    }

    pub fn is_complete(&self) -> bool {
        self.pending() == 0
    }

    pub fn summary(&self) -> StatusSummary {
        let mut summary = StatusSummary {
            total: self.statuses.len(),
            ..Default::default()
        };
        for status in &self.statuses {
            match status {
                VerificationStatus::NotChecked => summary.not_checked += 1,
                VerificationStatus::Ok => summary.ok += 1,
                VerificationStatus::Nok => summary.nok += 1,
                VerificationStatus::LikelyFoundGoogleBooks => summary.likely_google_books += 1,
                VerificationStatus::LikelyFoundCrossref => summary.likely_crossref += 1,
                VerificationStatus::LikelyFoundOpenalex => summary.likely_openalex += 1,
                VerificationStatus::NotFound => summary.not_found += 1,
            }
        }
        summary
    }
}

/// Counts per status for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub total: usize,
    pub ok: usize,
    pub nok: usize,
    pub likely_google_books: usize,
    pub likely_crossref: usize,
    pub likely_openalex: usize,
    pub not_found: usize,
    pub not_checked: usize,
}

impl StatusSummary {
    pub fn likely_found(&self) -> usize {
        self.likely_google_books + self.likely_crossref + self.likely_openalex
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_run_starts_unchecked() {
        let mut board = StatusBoard::new();
        board.begin_run(3);
        assert_eq!(board.statuses(), &[VerificationStatus::NotChecked; 3]);
        assert_eq!(board.pending(), 3);
        assert!(!board.is_complete());
    }

    #[test]
    fn each_index_written_once() {
        let mut board = StatusBoard::new();
        let run = board.begin_run(2);
        assert_eq!(board.apply(run, 0, VerificationStatus::Ok), Applied::Updated);
        assert_eq!(
            board.apply(run, 0, VerificationStatus::Nok),
            Applied::Duplicate
        );
        assert_eq!(board.status(0), Some(VerificationStatus::Ok));
    }

    #[test]
    fn stale_run_is_dropped() {
        let mut board = StatusBoard::new();
        let old = board.begin_run(2);
        let new = board.begin_run(1);
        assert!(new > old);
        assert_eq!(
            board.apply(old, 0, VerificationStatus::NotFound),
            Applied::Stale
        );
        assert_eq!(board.status(0), Some(VerificationStatus::NotChecked));
    }

    #[test]
    fn out_of_range_and_not_terminal() {
        let mut board = StatusBoard::new();
        let run = board.begin_run(1);
        assert_eq!(
            board.apply(run, 5, VerificationStatus::Ok),
            Applied::OutOfRange
        );
        assert_eq!(
            board.apply(run, 0, VerificationStatus::NotChecked),
            Applied::NotTerminal
        );
    }

    #[test]
    fn summary_counts() {
        let mut board = StatusBoard::new();
        let run = board.begin_run(5);
        board.apply(run, 0, VerificationStatus::Ok);
        board.apply(run, 1, VerificationStatus::LikelyFoundCrossref);
        board.apply(run, 2, VerificationStatus::LikelyFoundOpenalex);
        board.apply(run, 3, VerificationStatus::NotFound);

        let summary = board.summary();
        assert_eq!(summary.total, 5);
        assert_eq!(summary.ok, 1);
        assert_eq!(summary.likely_found(), 2);
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.not_checked, 1);
    }
}
