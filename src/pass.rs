// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Report passes: the policy deciding which observations become reports.
//!
//! Every hook builds an [`Observation`] and asks the active [`ReportPass`]
//! whether it is worth a report. Decisions are made by an exhaustive match
//! over the observation and the pass flavor, so adding a diagnostic kind
//! forces a decision for every flavor.
//!
//! * `Basic` keeps false positives low. Most call-related checks only fire
//!   in frames that are the entry point or whose signature is concrete.
//! * `Sound` reports every statically possible error.
//! * `Fresh` wraps another pass and only changes the cache key.

mod catalog;
mod checks;

use alloc::boxed::Box;

use crate::engine::{CallOutcome, IntrinsicOp};
use crate::lattice::{CallSignature, LatticeType, ThrownError};
use crate::report::{RaisePoint, ReportDetail, ReportKind, SourcePos};

pub use catalog::{known_shapes, CatalogError, KnownShapes};

/// Decision behaviour of a pass once `Fresh` wrappers are looked through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassFlavor {
    Basic,
    Sound,
}

/// The diagnostic policy selected for an analyzer.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReportPass {
    #[default]
    Basic,
    Sound,
    /// Same decisions as `inner`, but a cache partition of its own.
    Fresh {
        inner: Box<ReportPass>,
        generation: Generation,
    },
}

impl ReportPass {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "basic" => Some(ReportPass::Basic),
            "sound" => Some(ReportPass::Sound),
            _ => None,
        }
    }

    pub fn flavor(&self) -> PassFlavor {
        match self {
            ReportPass::Basic => PassFlavor::Basic,
            ReportPass::Sound => PassFlavor::Sound,
            ReportPass::Fresh { inner, .. } => inner.flavor(),
        }
    }

    /// Decides whether `observation`, made in `frame`, should be reported.
    pub fn evaluate(
        &self,
        frame: &FrameView<'_>,
        observation: &Observation<'_>,
    ) -> Option<ReportDetail> {
        checks::dispatch(self.flavor(), frame, observation)
    }
}

/// Identity of a `Fresh` pass. Only a [`crate::Session`] hands these out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

/// Hands out `Fresh` generations. Owned by the session so that no global
/// counter is needed.
#[derive(Debug, Default)]
pub(crate) struct FreshGenerations {
    next: u64,
}

impl FreshGenerations {
    pub(crate) fn wrap(&mut self, inner: ReportPass) -> ReportPass {
        let generation = Generation(self.next);
        self.next += 1;
        ReportPass::Fresh {
            inner: Box::new(inner),
            generation,
        }
    }
}

/// What a pass may look at about the frame an observation was made in.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub signature: &'a CallSignature,
    pub is_entry: bool,
}

impl FrameView<'_> {
    /// True for the entry frame and for frames whose arguments are all
    /// concrete.
    pub fn is_entry_or_concrete(&self) -> bool {
        self.is_entry || self.signature.is_concrete()
    }
}

/// Something the engine observed at a hook point, with the arguments the
/// corresponding check needs. Each variant maps to exactly one report kind.
#[derive(Clone, Copy, Debug)]
pub enum Observation<'a> {
    GeneratorFailure {
        error: &'a ThrownError,
    },
    /// `definite` is set when the guard is immediately followed by an
    /// unreachable marker, i.e. the read always fails.
    UndefCheck {
        slot: &'a str,
        definite: bool,
    },
    Uncaught {
        raises: &'a [RaisePoint],
        result: &'a LatticeType,
    },
    CallResolution {
        outcome: &'a CallOutcome,
    },
    ReturnTypeQuery {
        arg_count: usize,
    },
    ExplicitDispatch {
        arg_types: &'a [LatticeType],
        outcome: &'a CallOutcome,
        /// Inferred result of the analysed callee frame, if there was one.
        callee_result: Option<&'a LatticeType>,
    },
    GlobalReference {
        scope: &'a str,
        name: &'a str,
        resolved: bool,
    },
    Condition {
        observed: &'a LatticeType,
    },
    Raise {
        thrown: &'a LatticeType,
        position: &'a SourcePos,
    },
    FieldAccess {
        object: &'a LatticeType,
        field: &'a str,
    },
    Division {
        divisor: &'a LatticeType,
    },
    BuiltinResult {
        op: &'a IntrinsicOp,
        arg_types: &'a [LatticeType],
        observed: &'a LatticeType,
    },
    UnmodeledBuiltin {
        op: &'a IntrinsicOp,
        arg_types: &'a [LatticeType],
    },
}

impl Observation<'_> {
    pub fn kind(&self) -> ReportKind {
        match self {
            Observation::GeneratorFailure { .. } => ReportKind::GeneratorError,
            Observation::UndefCheck { .. } => ReportKind::LocalUndefVar,
            Observation::Uncaught { .. } => ReportKind::UncaughtException,
            Observation::CallResolution { .. } => ReportKind::NoMethodError,
            Observation::ReturnTypeQuery { .. } => ReportKind::InvalidReturnTypeCall,
            Observation::ExplicitDispatch { .. } => ReportKind::InvalidInvoke,
            Observation::GlobalReference { .. } => ReportKind::GlobalUndefVar,
            Observation::Condition { .. } => ReportKind::NonBooleanCond,
            Observation::Raise { .. } => ReportKind::SeriousException,
            Observation::FieldAccess { .. } => ReportKind::NoFieldError,
            Observation::Division { .. } => ReportKind::DivideError,
            Observation::BuiltinResult { .. } => ReportKind::InvalidBuiltinCall,
            Observation::UnmodeledBuiltin { .. } => ReportKind::UnimplementedBuiltinCall,
        }
    }
}
