// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::vec::Vec;

use crate::lattice::{Constant, FieldLookup, LatticeType};
use crate::report::ReportDetail;

use super::catalog::known_shapes;
use super::{FrameView, Observation, PassFlavor};

use PassFlavor::{Basic, Sound};

// Sound checks for the intrinsic kinds are not worked out; both flavors
// share the basic behaviour there.
pub(super) fn dispatch(
    flavor: PassFlavor,
    frame: &FrameView<'_>,
    observation: &Observation<'_>,
) -> Option<ReportDetail> {
    match (*observation, flavor) {
        (Observation::GeneratorFailure { error }, Basic | Sound) => {
            Some(ReportDetail::GeneratorError {
                error: error.clone(),
            })
        }

        (Observation::UndefCheck { slot, definite }, Basic) => {
            definite.then(|| ReportDetail::LocalUndefVar { slot: slot.into() })
        }
        (Observation::UndefCheck { slot, .. }, Sound) => {
            Some(ReportDetail::LocalUndefVar { slot: slot.into() })
        }

        (Observation::Uncaught { raises, .. }, _) if raises.is_empty() => None,
        (Observation::Uncaught { raises, result }, Basic) => {
            result.is_bottom().then(|| ReportDetail::UncaughtException {
                raises: raises.to_vec(),
            })
        }
        (Observation::Uncaught { raises, .. }, Sound) => Some(ReportDetail::UncaughtException {
            raises: raises.to_vec(),
        }),

        (Observation::CallResolution { .. }, Basic) if !frame.is_entry_or_concrete() => None,
        (Observation::CallResolution { outcome }, Basic | Sound) => {
            let mut failing: Vec<_> = outcome
                .info
                .splits
                .iter()
                .filter(|split| split.candidates == 0)
                .map(|split| split.signature.clone())
                .collect();
            if failing.is_empty() {
                return None;
            }
            failing.sort();
            Some(ReportDetail::NoMethodError {
                signatures: failing,
                splits: outcome.info.splits.len(),
            })
        }

        (Observation::ReturnTypeQuery { arg_count }, Basic | Sound) => {
            (arg_count != 3).then_some(ReportDetail::InvalidReturnTypeCall)
        }

        (
            Observation::ExplicitDispatch {
                arg_types,
                outcome,
                callee_result,
            },
            Basic | Sound,
        ) => {
            let from_callee = callee_result.is_some_and(LatticeType::is_bottom);
            (outcome.result.is_bottom() && !from_callee).then(|| ReportDetail::InvalidInvoke {
                arg_types: arg_types.to_vec(),
            })
        }

        (Observation::GlobalReference { resolved: true, .. }, _) => None,
        (Observation::GlobalReference { scope, name, .. }, Basic)
            if known_shapes().is_shim(scope, name) =>
        {
            None
        }
        (Observation::GlobalReference { scope, name, .. }, Basic | Sound) => {
            Some(ReportDetail::GlobalUndefVar {
                scope: scope.into(),
                name: name.into(),
            })
        }

        (Observation::Condition { observed }, _) if observed.is_bottom() => None,
        (Observation::Condition { .. }, Basic) if !frame.is_entry_or_concrete() => None,
        (Observation::Condition { observed }, Basic) => {
            non_boolean(observed, |ty| !ty.may_be_bool())
        }
        (Observation::Condition { observed }, Sound) => {
            non_boolean(observed, |ty| !ty.is_bool_subtype())
        }

        (Observation::Raise { .. }, Basic) if !frame.is_entry_or_concrete() => None,
        (Observation::Raise { thrown, position }, Basic | Sound) => match thrown.as_constant() {
            Some(Constant::Error(error)) if known_shapes().is_serious(&error.error_type) => {
                Some(ReportDetail::SeriousException {
                    error: error.clone(),
                    position: position.clone(),
                })
            }
            _ => None,
        },

        (Observation::FieldAccess { object, field }, Basic | Sound) => {
            (object.field(field) == FieldLookup::Absent).then(|| ReportDetail::NoFieldError {
                ty: object.clone(),
                field: field.into(),
            })
        }

        (Observation::Division { divisor }, Basic | Sound) => {
            matches!(divisor.as_constant(), Some(Constant::Int(0)))
                .then_some(ReportDetail::DivideError)
        }

        (
            Observation::BuiltinResult {
                op,
                arg_types,
                observed,
            },
            Basic | Sound,
        ) => observed
            .is_bottom()
            .then(|| ReportDetail::InvalidBuiltinCall {
                op: op.name.clone(),
                arg_types: arg_types.to_vec(),
            }),

        (Observation::UnmodeledBuiltin { op, arg_types }, Basic | Sound) => {
            Some(ReportDetail::UnimplementedBuiltinCall {
                op: op.name.clone(),
                arg_types: arg_types.to_vec(),
            })
        }
    }
}

/// Collects the disjuncts of `observed` rejected by `fails`, in canonical
/// union order, into a single report.
fn non_boolean<F>(observed: &LatticeType, fails: F) -> Option<ReportDetail>
where
    F: Fn(&LatticeType) -> bool,
{
    let components = observed.components();
    let types: Vec<LatticeType> = components.iter().filter(|ty| fails(*ty)).cloned().collect();
    if types.is_empty() {
        return None;
    }
    Some(ReportDetail::NonBooleanCond {
        types,
        splits: components.len(),
    })
}
