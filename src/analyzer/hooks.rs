// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Extension points called by the inference engine while it infers a frame.
//!
//! Hooks that only observe return whether a new report was recorded. Hooks
//! that sit on a value the engine keeps using return that value, possibly
//! narrowed.

use log::debug;

use crate::engine::{CallOutcome, IntrinsicKind, IntrinsicOp};
use crate::error::{AnalysisError, AnalysisResult};
use crate::lattice::{LatticeType, ThrownError};
use crate::pass::Observation;
use crate::report::SourcePos;

use super::{Analyzer, FrameId};

impl Analyzer<'_> {
    /// The callee's implementation could not be generated. The frame is
    /// aborted and reconciled on the spot; no further hook may target it.
    pub fn on_frame_creation_failed(
        &mut self,
        frame: FrameId,
        position: &SourcePos,
        error: &ThrownError,
    ) -> AnalysisResult<bool> {
        let recorded = self.observe(frame, position, Observation::GeneratorFailure { error })?;

        let record = self.record_mut(frame)?;
        record.aborted = true;
        record.result = LatticeType::Bottom;
        record
            .ledger
            .mark_reconciled()
            .map_err(|sealed| AnalysisError::LedgerSealed {
                frame,
                state: sealed.0,
            })?;
        self.pop_stack(frame);
        debug!("frame {frame} aborted: {error}");

        Ok(matches!(recorded, Some(true)))
    }

    /// Method resolution finished for a call site.
    pub fn on_call_resolution(
        &mut self,
        frame: FrameId,
        position: &SourcePos,
        outcome: CallOutcome,
    ) -> AnalysisResult<CallOutcome> {
        self.observe(
            frame,
            position,
            Observation::CallResolution { outcome: &outcome },
        )?;
        Ok(outcome)
    }

    /// A reflective "what would this call return" query with `arg_count`
    /// arguments, before the engine handles it.
    pub fn on_reflective_return_type_query(
        &mut self,
        frame: FrameId,
        position: &SourcePos,
        arg_count: usize,
    ) -> AnalysisResult<bool> {
        let recorded = self.observe(
            frame,
            position,
            Observation::ReturnTypeQuery { arg_count },
        )?;
        Ok(matches!(recorded, Some(true)))
    }

    /// An explicit (non-virtual) dispatch call has been resolved.
    pub fn on_explicit_dispatch_call(
        &mut self,
        frame: FrameId,
        position: &SourcePos,
        arg_types: &[LatticeType],
        outcome: CallOutcome,
    ) -> AnalysisResult<CallOutcome> {
        let callee_result = match outcome.callee {
            Some(callee) => Some(self.record(callee)?.result.clone()),
            None => None,
        };
        self.observe(
            frame,
            position,
            Observation::ExplicitDispatch {
                arg_types,
                outcome: &outcome,
                callee_result: callee_result.as_ref(),
            },
        )?;
        Ok(outcome)
    }

    pub fn on_global_reference_evaluated(
        &mut self,
        frame: FrameId,
        position: &SourcePos,
        scope: &str,
        name: &str,
        resolved: bool,
    ) -> AnalysisResult<bool> {
        let recorded = self.observe(
            frame,
            position,
            Observation::GlobalReference {
                scope,
                name,
                resolved,
            },
        )?;
        Ok(matches!(recorded, Some(true)))
    }

    /// A branch guard evaluated to `observed`.
    pub fn on_condition_evaluated(
        &mut self,
        frame: FrameId,
        position: &SourcePos,
        observed: &LatticeType,
    ) -> AnalysisResult<bool> {
        let recorded = self.observe(frame, position, Observation::Condition { observed })?;
        Ok(matches!(recorded, Some(true)))
    }

    /// A raise whose argument evaluated to `thrown`. Serious exceptions are
    /// recorded here, ahead of any catch analysis.
    pub fn on_raise_evaluated(
        &mut self,
        frame: FrameId,
        position: &SourcePos,
        thrown: &LatticeType,
    ) -> AnalysisResult<bool> {
        let recorded = self.observe(frame, position, Observation::Raise { thrown, position })?;
        Ok(matches!(recorded, Some(true)))
    }

    /// A primitive operation was evaluated by the engine's builtin models.
    /// Returns the result the engine should continue with: `Bottom` when the
    /// operation is known to always fail.
    pub fn on_intrinsic_evaluated(
        &mut self,
        frame: FrameId,
        position: &SourcePos,
        op: &IntrinsicOp,
        arg_types: &[LatticeType],
        observed: LatticeType,
    ) -> AnalysisResult<LatticeType> {
        if !op.modeled {
            self.observe(
                frame,
                position,
                Observation::UnmodeledBuiltin { op, arg_types },
            )?;
            return Ok(observed);
        }

        let specific = match &op.kind {
            IntrinsicKind::FieldAccess { field } => match arg_types.first() {
                Some(object) => self.observe(
                    frame,
                    position,
                    Observation::FieldAccess { object, field },
                )?,
                None => None,
            },
            IntrinsicKind::IntegerDivision => match arg_types.get(1) {
                Some(divisor) => {
                    self.observe(frame, position, Observation::Division { divisor })?
                }
                None => None,
            },
            IntrinsicKind::Other => None,
        };

        if specific.is_some() {
            return Ok(LatticeType::Bottom);
        }

        self.observe(
            frame,
            position,
            Observation::BuiltinResult {
                op,
                arg_types,
                observed: &observed,
            },
        )?;
        Ok(observed)
    }
}
