// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The analyzer the inference engine drives.
//!
//! An [`Analyzer`] is created per analysis run from a [`Session`]. The engine
//! opens frames with [`Analyzer::enter_entry`] and [`Analyzer::enter_call`],
//! calls the hook methods (see `hooks.rs`) while it infers a frame, and closes
//! the frame with [`Analyzer::on_frame_finished`], which runs the reconciler
//! (see `reconcile.rs`). [`Analyzer::finish`] freezes every ledger and hands
//! the reports to the caller.
//!
//! [`Session`]: crate::Session

mod frames;
mod hooks;
mod reconcile;

use alloc::vec::Vec;
use core::fmt;

use log::{debug, info, trace};
use serde::Serialize;

use crate::cache::ResultCache;
use crate::config::{AnalyzerConfig, CacheKey};
use crate::engine::{CallSite, FrameEntry};
use crate::error::{AnalysisError, AnalysisResult};
use crate::lattice::{CallSignature, LatticeType};
use crate::ledger::LedgerState;
use crate::pass::{Observation, PassFlavor};
use crate::report::{LocationChain, Report, ReportKind, SourcePos, VirtualFrame};

use frames::FrameRecord;

/// Index of a frame within one analyzer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FrameId(u32);

impl FrameId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct Analyzer<'s> {
    config: AnalyzerConfig,
    key: CacheKey,
    cache: &'s mut ResultCache,
    frames: Vec<FrameRecord>,
    /// Frames currently under analysis, innermost last.
    stack: Vec<FrameId>,
}

impl<'s> Analyzer<'s> {
    pub fn new(config: AnalyzerConfig, cache: &'s mut ResultCache) -> Self {
        let key = config.cache_key();
        Analyzer {
            config,
            key,
            cache,
            frames: Vec::new(),
            stack: Vec::new(),
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn cache_key(&self) -> &CacheKey {
        &self.key
    }

    fn flavor(&self) -> PassFlavor {
        self.config.pass().flavor()
    }

    fn next_id(&self) -> FrameId {
        FrameId(self.frames.len() as u32)
    }

    /// Opens the frame of an entry signature. Entry frames are always
    /// analysed and never written to the cache.
    pub fn enter_entry(&mut self, signature: CallSignature) -> FrameId {
        let id = self.next_id();
        debug!("entering entry frame {id} for {signature}");
        self.frames.push(FrameRecord::new(signature, None, true, 0));
        self.stack.push(id);
        id
    }

    /// Opens a callee frame entered from `site`.
    pub fn enter_call(
        &mut self,
        signature: CallSignature,
        site: CallSite,
    ) -> AnalysisResult<FrameEntry> {
        let depth = self.live_record(site.caller)?.depth + 1;

        if let Some(frame) = self
            .stack
            .iter()
            .copied()
            .find(|id| self.frames[id.index()].signature == signature)
        {
            debug!("cycle detected on {signature}, reusing frame {frame}");
            let result = self.frames[frame.index()].result.clone();
            return Ok(FrameEntry::Cycle { frame, result });
        }

        let id = self.next_id();
        let cached = self.cache.get(&self.key, &signature).cloned();
        self.frames
            .push(FrameRecord::new(signature, Some(site), false, depth));

        match cached {
            Some(cached) => {
                debug!(
                    "frame {id} restored from cache with {} report(s)",
                    cached.reports.len()
                );
                let result = cached.result.clone();
                self.restore_cached(id, cached)?;
                Ok(FrameEntry::Cached { frame: id, result })
            }
            None => {
                debug!(
                    "entering frame {id} for {}",
                    self.frames[id.index()].signature
                );
                self.stack.push(id);
                Ok(FrameEntry::Analyze(id))
            }
        }
    }

    fn record(&self, frame: FrameId) -> AnalysisResult<&FrameRecord> {
        self.frames
            .get(frame.index())
            .ok_or(AnalysisError::UnknownFrame(frame))
    }

    fn record_mut(&mut self, frame: FrameId) -> AnalysisResult<&mut FrameRecord> {
        self.frames
            .get_mut(frame.index())
            .ok_or(AnalysisError::UnknownFrame(frame))
    }

    /// Like [`Self::record`] but rejects frames aborted by a generator failure.
    fn live_record(&self, frame: FrameId) -> AnalysisResult<&FrameRecord> {
        let record = self.record(frame)?;
        if record.aborted {
            return Err(AnalysisError::FrameAborted(frame));
        }
        Ok(record)
    }

    /// Chain entries of the callers of `frame`, outermost first.
    fn ancestry(&self, frame: FrameId) -> Vec<VirtualFrame> {
        let mut chain = Vec::new();
        let mut current = frame;
        while let Some(site) = &self.frames[current.index()].call_site {
            chain.push(VirtualFrame {
                signature: self.frames[site.caller.index()].signature.clone(),
                position: site.position.clone(),
            });
            current = site.caller;
        }
        chain.reverse();
        chain
    }

    fn location(&self, frame: FrameId, position: &SourcePos) -> LocationChain {
        let mut chain = self.ancestry(frame);
        chain.push(VirtualFrame {
            signature: self.frames[frame.index()].signature.clone(),
            position: position.clone(),
        });
        LocationChain::new(chain)
    }

    /// Asks the active pass about `observation` and records the resulting
    /// report. `Ok(None)` means the pass declined; `Ok(Some(recorded))` tells
    /// whether the report was new to the ledger.
    fn observe(
        &mut self,
        frame: FrameId,
        position: &SourcePos,
        observation: Observation<'_>,
    ) -> AnalysisResult<Option<bool>> {
        let record = self.live_record(frame)?;
        let Some(detail) = self
            .config
            .pass()
            .evaluate(&record.view(), &observation)
        else {
            trace!("{} not reported in frame {frame}", observation.kind());
            return Ok(None);
        };

        let report = Report::new(self.location(frame, position), detail);
        let recorded = self.push_report(frame, report)?;
        Ok(Some(recorded))
    }

    fn push_report(&mut self, frame: FrameId, report: Report) -> AnalysisResult<bool> {
        self.record_mut(frame)?
            .ledger
            .push(report)
            .map_err(|sealed| AnalysisError::LedgerSealed {
                frame,
                state: sealed.0,
            })
    }

    fn retract(&mut self, frame: FrameId, kind: ReportKind) -> AnalysisResult<usize> {
        let removed = self
            .record_mut(frame)?
            .ledger
            .retain(|report| report.kind() != kind)
            .map_err(|sealed| AnalysisError::LedgerSealed {
                frame,
                state: sealed.0,
            })?;
        if removed > 0 {
            debug!("retracted {removed} {kind} report(s) from frame {frame}");
        }
        Ok(removed)
    }

    fn pop_stack(&mut self, frame: FrameId) {
        if let Some(pos) = self.stack.iter().rposition(|id| *id == frame) {
            self.stack.remove(pos);
        }
    }

    pub fn frame_signature(&self, frame: FrameId) -> AnalysisResult<&CallSignature> {
        Ok(&self.record(frame)?.signature)
    }

    /// Current inferred result of the frame; `Bottom` until it is known.
    pub fn frame_result(&self, frame: FrameId) -> AnalysisResult<&LatticeType> {
        Ok(&self.record(frame)?.result)
    }

    pub fn ledger_state(&self, frame: FrameId) -> AnalysisResult<LedgerState> {
        Ok(self.record(frame)?.ledger.state())
    }

    /// Reports of a frame; only available once the ledger is frozen.
    pub fn get_reports(&self, frame: FrameId) -> AnalysisResult<&[Report]> {
        self.record(frame)?
            .ledger
            .frozen_reports()
            .ok_or(AnalysisError::NotFrozen(frame))
    }

    /// Freezes every ledger. Frames still open are frozen as they are.
    pub fn freeze(&mut self) {
        for record in &mut self.frames {
            record.ledger.freeze();
        }
        self.stack.clear();
    }

    /// Freezes every ledger and returns the reports of the run.
    pub fn finish(mut self) -> AnalysisOutcome {
        self.freeze();

        let frames: Vec<FrameSummary> = self
            .frames
            .into_iter()
            .map(FrameRecord::into_summary)
            .collect();
        let total: usize = frames.iter().map(|f| f.reports.len()).sum();
        info!(
            "analysis finished: {} frame(s), {total} report(s)",
            frames.len()
        );

        AnalysisOutcome { frames }
    }
}

/// Final state of one frame.
#[derive(Clone, Debug, Serialize)]
pub struct FrameSummary {
    pub signature: CallSignature,
    pub result: LatticeType,
    pub reports: Vec<Report>,
}

/// Frozen reports of a whole analysis run, in frame creation order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AnalysisOutcome {
    frames: Vec<FrameSummary>,
}

impl AnalysisOutcome {
    pub fn frames(&self) -> &[FrameSummary] {
        &self.frames
    }

    pub fn frame_reports(&self, frame: FrameId) -> Option<&[Report]> {
        self.frames
            .get(frame.index())
            .map(|summary| summary.reports.as_slice())
    }

    pub fn reports(&self) -> impl Iterator<Item = &Report> {
        self.frames.iter().flat_map(|f| f.reports.iter())
    }

    pub fn count(&self, kind: ReportKind) -> usize {
        self.reports().filter(|r| r.kind() == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.reports().next().is_none()
    }
}
