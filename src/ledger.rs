// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Per-frame report ledger.

use alloc::vec::Vec;

use serde::Serialize;

use crate::report::{Report, ReportKind};

/// Lifecycle of a ledger. Transitions only move forward.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum LedgerState {
    /// Frame under analysis: appends and reconciler filtering.
    #[default]
    Open,
    /// Reconciler pass done: only reconciler filtering.
    Reconciled,
    /// Read-only.
    Frozen,
}

/// Rejected mutation of a ledger in the given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("ledger is {0:?}")]
pub struct Sealed(pub LedgerState);

/// Ordered list of live reports owned by one frame.
#[derive(Clone, Debug, Default)]
pub struct FrameLedger {
    reports: Vec<Report>,
    state: LedgerState,
}

impl FrameLedger {
    pub fn new() -> Self {
        FrameLedger::default()
    }

    pub fn state(&self) -> LedgerState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Report> {
        self.reports.iter()
    }

    /// Appends a report. Returns `Ok(false)` when the ledger already holds an
    /// identical report, or one of the same kind at the same location for
    /// kinds that do not allow repetition.
    pub fn push(&mut self, report: Report) -> Result<bool, Sealed> {
        if self.state != LedgerState::Open {
            return Err(Sealed(self.state));
        }

        let kind = report.kind();
        let duplicate = self.reports.iter().any(|existing| {
            if existing.kind() != kind || existing.location != report.location {
                return false;
            }
            !kind.allows_repetition() || existing.detail == report.detail
        });

        if duplicate {
            log::trace!("dropping duplicate {kind} report");
            return Ok(false);
        }

        log::trace!("recording {kind} report: {report}");
        self.reports.push(report);
        Ok(true)
    }

    /// Retracts every report for which `keep` returns false. Returns the
    /// number of reports removed.
    pub(crate) fn retain<F>(&mut self, keep: F) -> Result<usize, Sealed>
    where
        F: FnMut(&Report) -> bool,
    {
        if self.state == LedgerState::Frozen {
            return Err(Sealed(self.state));
        }
        let before = self.reports.len();
        self.reports.retain(keep);
        Ok(before - self.reports.len())
    }

    pub(crate) fn mark_reconciled(&mut self) -> Result<(), Sealed> {
        if self.state != LedgerState::Open {
            return Err(Sealed(self.state));
        }
        self.state = LedgerState::Reconciled;
        Ok(())
    }

    pub(crate) fn freeze(&mut self) {
        self.state = LedgerState::Frozen;
    }

    /// Read access for consumers; only granted once frozen.
    pub fn frozen_reports(&self) -> Option<&[Report]> {
        match self.state {
            LedgerState::Frozen => Some(&self.reports),
            _ => None,
        }
    }
}
