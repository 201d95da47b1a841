// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::engine::CallSite;
use crate::lattice::{CallSignature, LatticeType};
use crate::ledger::FrameLedger;
use crate::pass::FrameView;

use super::FrameSummary;

/// Inference result record of one frame: signature, caller link, current
/// result and the ledger it owns.
#[derive(Debug)]
pub(super) struct FrameRecord {
    pub(super) signature: CallSignature,
    pub(super) call_site: Option<CallSite>,
    pub(super) is_entry: bool,
    /// Number of callers between the entry frame and this one.
    pub(super) depth: usize,
    pub(super) result: LatticeType,
    pub(super) aborted: bool,
    pub(super) ledger: FrameLedger,
}

impl FrameRecord {
    pub(super) fn new(
        signature: CallSignature,
        call_site: Option<CallSite>,
        is_entry: bool,
        depth: usize,
    ) -> Self {
        FrameRecord {
            signature,
            call_site,
            is_entry,
            depth,
            result: LatticeType::Bottom,
            aborted: false,
            ledger: FrameLedger::new(),
        }
    }

    pub(super) fn view(&self) -> FrameView<'_> {
        FrameView {
            signature: &self.signature,
            is_entry: self.is_entry,
        }
    }

    pub(super) fn into_summary(self) -> FrameSummary {
        FrameSummary {
            signature: self.signature,
            result: self.result,
            reports: self.ledger.iter().cloned().collect(),
        }
    }
}
