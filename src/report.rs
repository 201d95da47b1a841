// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Diagnostic findings attached to inference frames.
//!
//! A [`Report`] is a value object: the location chain that led to the
//! offending statement plus a kind-specific [`ReportDetail`]. Reports are
//! never mutated once built; ledgers only add or retract them.

mod location;

use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::lattice::{CallSignature, LatticeType, ThrownError};
use crate::Rc;

pub use location::{LocationChain, SourcePos, VirtualFrame};

/// Tag identifying the kind of a report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReportKind {
    GeneratorError,
    LocalUndefVar,
    UncaughtException,
    NoMethodError,
    InvalidReturnTypeCall,
    InvalidInvoke,
    GlobalUndefVar,
    NonBooleanCond,
    SeriousException,
    NoFieldError,
    DivideError,
    InvalidBuiltinCall,
    UnimplementedBuiltinCall,
}

impl ReportKind {
    /// Kinds whose reports may share a location chain as long as their
    /// payloads differ.
    pub fn allows_repetition(self) -> bool {
        matches!(
            self,
            ReportKind::NoMethodError | ReportKind::NonBooleanCond | ReportKind::SeriousException
        )
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A raise statement that no serious-exception report accounts for.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RaisePoint {
    pub position: SourcePos,
    pub expr: Rc<str>,
}

/// Kind-specific payload of a report.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ReportDetail {
    GeneratorError {
        error: ThrownError,
    },
    LocalUndefVar {
        slot: Rc<str>,
    },
    UncaughtException {
        raises: Vec<RaisePoint>,
    },
    NoMethodError {
        signatures: Vec<CallSignature>,
        /// Number of union-split cases at the call site.
        splits: usize,
    },
    InvalidReturnTypeCall,
    InvalidInvoke {
        arg_types: Vec<LatticeType>,
    },
    GlobalUndefVar {
        scope: Rc<str>,
        name: Rc<str>,
    },
    NonBooleanCond {
        types: Vec<LatticeType>,
        /// Number of disjuncts of the observed condition type.
        splits: usize,
    },
    SeriousException {
        error: ThrownError,
        position: SourcePos,
    },
    NoFieldError {
        ty: LatticeType,
        field: Rc<str>,
    },
    DivideError,
    InvalidBuiltinCall {
        op: Rc<str>,
        arg_types: Vec<LatticeType>,
    },
    UnimplementedBuiltinCall {
        op: Rc<str>,
        arg_types: Vec<LatticeType>,
    },
}

impl ReportDetail {
    pub fn kind(&self) -> ReportKind {
        match self {
            ReportDetail::GeneratorError { .. } => ReportKind::GeneratorError,
            ReportDetail::LocalUndefVar { .. } => ReportKind::LocalUndefVar,
            ReportDetail::UncaughtException { .. } => ReportKind::UncaughtException,
            ReportDetail::NoMethodError { .. } => ReportKind::NoMethodError,
            ReportDetail::InvalidReturnTypeCall => ReportKind::InvalidReturnTypeCall,
            ReportDetail::InvalidInvoke { .. } => ReportKind::InvalidInvoke,
            ReportDetail::GlobalUndefVar { .. } => ReportKind::GlobalUndefVar,
            ReportDetail::NonBooleanCond { .. } => ReportKind::NonBooleanCond,
            ReportDetail::SeriousException { .. } => ReportKind::SeriousException,
            ReportDetail::NoFieldError { .. } => ReportKind::NoFieldError,
            ReportDetail::DivideError => ReportKind::DivideError,
            ReportDetail::InvalidBuiltinCall { .. } => ReportKind::InvalidBuiltinCall,
            ReportDetail::UnimplementedBuiltinCall { .. } => ReportKind::UnimplementedBuiltinCall,
        }
    }
}

fn write_types(f: &mut fmt::Formatter<'_>, types: &[LatticeType]) -> fmt::Result {
    for (idx, ty) in types.iter().enumerate() {
        if idx > 0 {
            f.write_str(", ")?;
        }
        write!(f, "::{ty}")?;
    }
    Ok(())
}

fn write_split_suffix(f: &mut fmt::Formatter<'_>, failing: usize, splits: usize) -> fmt::Result {
    if splits > 1 {
        write!(f, " ({failing}/{splits} union split)")?;
    }
    Ok(())
}

impl fmt::Display for ReportDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportDetail::GeneratorError { error } => {
                write!(f, "failed to generate a method body: {error}")
            }
            ReportDetail::LocalUndefVar { slot } => {
                write!(f, "local variable `{slot}` is not defined")
            }
            ReportDetail::UncaughtException { raises } => {
                match raises.as_slice() {
                    [single] => write!(f, "may throw `{}`", single.expr)?,
                    many => {
                        f.write_str("may throw either of:")?;
                        for raise in many {
                            write!(f, " `{}` at {};", raise.expr, raise.position)?;
                        }
                    }
                }
                Ok(())
            }
            ReportDetail::NoMethodError { signatures, splits } => {
                f.write_str("no matching method found")?;
                for (idx, sig) in signatures.iter().enumerate() {
                    let sep = if idx == 0 { " " } else { ", " };
                    write!(f, "{sep}`{sig}`")?;
                }
                write_split_suffix(f, signatures.len(), *splits)
            }
            ReportDetail::InvalidReturnTypeCall => {
                f.write_str("invalid return type query: expected a function and an argument tuple")
            }
            ReportDetail::InvalidInvoke { arg_types } => {
                f.write_str("invalid explicit dispatch call with argument types (")?;
                write_types(f, arg_types)?;
                f.write_str(")")
            }
            ReportDetail::GlobalUndefVar { scope, name } => {
                write!(f, "`{scope}.{name}` is not defined")
            }
            ReportDetail::NonBooleanCond { types, splits } => {
                f.write_str("non-boolean (")?;
                write_types(f, types)?;
                f.write_str(") found in boolean context")?;
                write_split_suffix(f, types.len(), *splits)
            }
            ReportDetail::SeriousException { error, .. } => write!(f, "{error}"),
            ReportDetail::NoFieldError { ty, field } => {
                write!(f, "type `{ty}` has no field `{field}`")
            }
            ReportDetail::DivideError => f.write_str("DivideError: integer division error"),
            ReportDetail::InvalidBuiltinCall { op, arg_types } => {
                write!(f, "invalid builtin call `{op}(")?;
                write_types(f, arg_types)?;
                f.write_str(")`")
            }
            ReportDetail::UnimplementedBuiltinCall { op, arg_types } => {
                write!(f, "unimplemented builtin call `{op}(")?;
                write_types(f, arg_types)?;
                f.write_str(")`")
            }
        }
    }
}

/// A diagnostic finding attached to a frame.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Report {
    pub location: LocationChain,
    pub detail: ReportDetail,
}

impl Report {
    pub fn new(location: LocationChain, detail: ReportDetail) -> Self {
        Report { location, detail }
    }

    pub fn kind(&self) -> ReportKind {
        self.detail.kind()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location.position() {
            Some(position) => write!(f, "{position}: {}", self.detail),
            None => write!(f, "{}", self.detail),
        }
    }
}
