// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Records exchanged with the driving inference engine at hook points.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::analyzer::FrameId;
use crate::lattice::{CallSignature, LatticeType};
use crate::report::SourcePos;
use crate::Rc;

/// Method candidates found for one union-split case of a call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitCandidates {
    pub signature: CallSignature,
    pub candidates: usize,
}

/// Method resolution details for a call site. A call without union
/// splitting has exactly one entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallInfo {
    pub splits: Vec<SplitCandidates>,
}

impl CallInfo {
    pub fn single(signature: CallSignature, candidates: usize) -> Self {
        CallInfo {
            splits: alloc::vec![SplitCandidates {
                signature,
                candidates,
            }],
        }
    }
}

/// Result of resolving and inferring a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallOutcome {
    pub info: CallInfo,
    pub result: LatticeType,
    /// Frame that was analysed for the resolved callee, if any.
    pub callee: Option<FrameId>,
}

/// Primitive operation evaluated by the engine's builtin models.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrinsicOp {
    pub name: Rc<str>,
    #[serde(default)]
    pub kind: IntrinsicKind,
    /// False when the engine has no transfer function for this operation.
    #[serde(default = "modeled_by_default")]
    pub modeled: bool,
}

fn modeled_by_default() -> bool {
    true
}

impl IntrinsicOp {
    pub fn new(name: &str, kind: IntrinsicKind) -> Self {
        IntrinsicOp {
            name: name.into(),
            kind,
            modeled: true,
        }
    }

    pub fn unmodeled(name: &str) -> Self {
        IntrinsicOp {
            name: name.into(),
            kind: IntrinsicKind::Other,
            modeled: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntrinsicKind {
    /// `getfield(object, field)`; the object is the first argument.
    FieldAccess { field: Rc<str> },
    /// Integer division; the divisor is the second argument.
    IntegerDivision,
    #[default]
    Other,
}

/// Statement of a frame's optimised body, as handed to `on_frame_finished`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    Raise { position: SourcePos, expr: Rc<str> },
    /// Guard inserted where a local slot may be read before assignment.
    UndefCheck { position: SourcePos, slot: Rc<str> },
    Unreachable { position: SourcePos },
    Statement { position: SourcePos },
}

/// Position in the caller at which a callee frame is entered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallSite {
    pub caller: FrameId,
    pub position: SourcePos,
}

/// What the engine should do after asking to enter a callee.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FrameEntry {
    /// Fresh frame; run inference on it.
    Analyze(FrameId),
    /// Restored from the result cache; already reconciled.
    Cached { frame: FrameId, result: LatticeType },
    /// The signature is still being analysed further up the stack; use its
    /// partial result.
    Cycle { frame: FrameId, result: LatticeType },
}

impl FrameEntry {
    pub fn frame(&self) -> FrameId {
        match self {
            FrameEntry::Analyze(frame)
            | FrameEntry::Cached { frame, .. }
            | FrameEntry::Cycle { frame, .. } => *frame,
        }
    }
}
