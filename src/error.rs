// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::analyzer::FrameId;
use crate::ledger::LedgerState;

/// Misuse of the analyzer by the driving engine, or a defect in the core.
///
/// Diagnostic findings are never reported through this type; they are
/// recorded as [`Report`](crate::report::Report)s. An `AnalysisError` means the
/// whole analysis run should be abandoned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    #[error("unknown frame {0}")]
    UnknownFrame(FrameId),
    #[error("frame {0} was aborted after a generator failure")]
    FrameAborted(FrameId),
    #[error("ledger of frame {frame} no longer accepts changes (state {state:?})")]
    LedgerSealed { frame: FrameId, state: LedgerState },
    #[error("frame {0} has already been reconciled")]
    AlreadyReconciled(FrameId),
    #[error("reports of frame {0} are read before the ledger is frozen")]
    NotFrozen(FrameId),
}

pub type AnalysisResult<T> = core::result::Result<T, AnalysisError>;
