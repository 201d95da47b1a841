// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Frame completion: the local-undef pass, the uncaught-throw reconciler and
//! result caching.

use alloc::collections::BTreeSet;
use alloc::vec::Vec;

use log::debug;

use crate::cache::CachedFrame;
use crate::engine::Instruction;
use crate::error::{AnalysisError, AnalysisResult};
use crate::lattice::LatticeType;
use crate::ledger::LedgerState;
use crate::pass::{Observation, PassFlavor};
use crate::report::{RaisePoint, Report, ReportDetail, ReportKind, SourcePos};

use super::{Analyzer, FrameId};

impl Analyzer<'_> {
    /// Called once the engine has inferred `result` for `frame` and optimised
    /// its body into `instructions`. Records undefined-local and uncaught
    /// exception reports, seals the frame against further hooks and stores it
    /// in the result cache. The instruction stream is handed back unchanged.
    pub fn on_frame_finished(
        &mut self,
        frame: FrameId,
        result: LatticeType,
        instructions: Vec<Instruction>,
    ) -> AnalysisResult<Vec<Instruction>> {
        if self.live_record(frame)?.ledger.state() != LedgerState::Open {
            return Err(AnalysisError::AlreadyReconciled(frame));
        }
        self.record_mut(frame)?.result = result.clone();

        for (idx, instruction) in instructions.iter().enumerate() {
            if let Instruction::UndefCheck { position, slot } = instruction {
                let definite = matches!(
                    instructions.get(idx + 1),
                    Some(Instruction::Unreachable { .. })
                );
                self.observe(
                    frame,
                    position,
                    Observation::UndefCheck { slot, definite },
                )?;
            }
        }

        let claimed = self.claimed_positions(frame)?;
        let raises: Vec<RaisePoint> = instructions
            .iter()
            .filter_map(|instruction| match instruction {
                Instruction::Raise { position, expr } if !claimed.contains(position) => {
                    Some(RaisePoint {
                        position: position.clone(),
                        expr: expr.clone(),
                    })
                }
                _ => None,
            })
            .collect();

        if self.flavor() == PassFlavor::Basic && !result.is_bottom() {
            self.retract(frame, ReportKind::UncaughtException)?;
        }
        if let Some(first) = raises.first() {
            let position = first.position.clone();
            self.observe(
                frame,
                &position,
                Observation::Uncaught {
                    raises: &raises,
                    result: &result,
                },
            )?;
        }

        self.seal(frame)?;
        self.pop_stack(frame);
        debug!(
            "frame {frame} finished with {result}, {} report(s)",
            self.record(frame)?.ledger.len()
        );

        self.store(frame)?;
        Ok(instructions)
    }

    /// Publishes a converged result for an already finished frame. Returns
    /// the number of reports retracted because of it.
    ///
    /// When the frame is already cached, its entry is rewritten together
    /// with the entries of every finished caller, whose cached subtrees
    /// include this frame's reports.
    pub fn refine_result(
        &mut self,
        frame: FrameId,
        result: LatticeType,
    ) -> AnalysisResult<usize> {
        let state = self.live_record(frame)?.ledger.state();
        if state == LedgerState::Frozen {
            return Err(AnalysisError::LedgerSealed { frame, state });
        }

        let removed = if self.flavor() == PassFlavor::Basic && !result.is_bottom() {
            self.retract(frame, ReportKind::UncaughtException)?
        } else {
            0
        };
        self.record_mut(frame)?.result = result;

        if state == LedgerState::Reconciled {
            self.store(frame)?;
            if removed > 0 {
                self.store_callers(frame)?;
            }
        }
        Ok(removed)
    }

    /// Fills the freshly opened frame `id` from a cache entry, re-rooting the
    /// cached chains under the frame's callers.
    pub(super) fn restore_cached(
        &mut self,
        id: FrameId,
        cached: CachedFrame,
    ) -> AnalysisResult<()> {
        let prefix = self.ancestry(id);
        for report in cached.reports {
            let rebased = Report::new(report.location.rebased(&prefix), report.detail);
            self.push_report(id, rebased)?;
        }

        self.seal(id)?;
        self.record_mut(id)?.result = cached.result;
        Ok(())
    }

    /// Re-stores the callers of `frame` that already finished. Callers still
    /// open are stored when they finish.
    fn store_callers(&mut self, frame: FrameId) -> AnalysisResult<()> {
        let mut current = frame;
        while let Some(caller) = self.record(current)?.call_site.as_ref().map(|s| s.caller) {
            current = caller;
            if self.record(current)?.ledger.state() == LedgerState::Reconciled {
                self.store(current)?;
            }
        }
        Ok(())
    }

    /// Positions of the raises this frame already reported as serious.
    fn claimed_positions(&self, frame: FrameId) -> AnalysisResult<BTreeSet<SourcePos>> {
        Ok(self
            .record(frame)?
            .ledger
            .iter()
            .filter_map(|report| match &report.detail {
                ReportDetail::SeriousException { position, .. } => Some(position.clone()),
                _ => None,
            })
            .collect())
    }

    fn seal(&mut self, frame: FrameId) -> AnalysisResult<()> {
        self.record_mut(frame)?
            .ledger
            .mark_reconciled()
            .map_err(|sealed| AnalysisError::LedgerSealed {
                frame,
                state: sealed.0,
            })
    }

    /// Writes a finished frame to the cache together with the reports of
    /// every frame analysed beneath it. Entry frames are not cached.
    fn store(&mut self, frame: FrameId) -> AnalysisResult<()> {
        let (signature, result, depth) = {
            let record = self.record(frame)?;
            if record.is_entry || record.aborted {
                return Ok(());
            }
            (record.signature.clone(), record.result.clone(), record.depth)
        };

        let mut reports = Vec::new();
        for idx in frame.index()..self.frames.len() {
            let id = FrameId(idx as u32);
            if id != frame && !self.descends_from(id, frame) {
                continue;
            }
            reports.extend(self.frames[idx].ledger.iter().map(|report| {
                Report::new(report.location.strip_prefix(depth), report.detail.clone())
            }));
        }

        debug!(
            "caching {signature} with {} report(s) under {:?}",
            reports.len(),
            self.key
        );
        self.cache
            .insert(self.key.clone(), signature, CachedFrame { result, reports });
        Ok(())
    }

    fn descends_from(&self, frame: FrameId, ancestor: FrameId) -> bool {
        let mut current = frame;
        while let Some(site) = &self.frames[current.index()].call_site {
            if site.caller == ancestor {
                return true;
            }
            current = site.caller;
        }
        false
    }
}
