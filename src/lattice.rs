// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Observed-value vocabulary shared with the inference engine.
//!
//! The engine owns the lattice algebra. What it hands to the hooks is a
//! snapshot of an abstract value expressed with [`LatticeType`]; this module
//! only offers the inspections the report passes need (bottom checks, union
//! components, boolean compatibility, field shapes). Nothing here joins,
//! widens or resolves anything.

use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::Rc;

/// Runtime error object captured by the engine, either from a failed code
/// generator or from a raise whose argument is a known constant.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ThrownError {
    pub error_type: Rc<str>,
    #[serde(default = "empty_message")]
    pub message: Rc<str>,
}

fn empty_message() -> Rc<str> {
    "".into()
}

impl ThrownError {
    pub fn new(error_type: &str, message: &str) -> Self {
        ThrownError {
            error_type: error_type.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ThrownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.error_type)
        } else {
            write!(f, "{}: {}", self.error_type, self.message)
        }
    }
}

/// Value known at analysis time through constant propagation.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constant {
    Nothing,
    Bool(bool),
    Int(i64),
    Str(Rc<str>),
    Symbol(Rc<str>),
    Error(ThrownError),
}

impl Constant {
    /// Name of the concrete data type the constant belongs to.
    pub fn type_name(&self) -> &str {
        match self {
            Constant::Nothing => "Nothing",
            Constant::Bool(_) => "Bool",
            Constant::Int(_) => "Int64",
            Constant::Str(_) => "String",
            Constant::Symbol(_) => "Symbol",
            Constant::Error(err) => &err.error_type,
        }
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Nothing => f.write_str("nothing"),
            Constant::Bool(b) => write!(f, "{b}"),
            Constant::Int(i) => write!(f, "{i}"),
            Constant::Str(s) => write!(f, "\"{s}\""),
            Constant::Symbol(s) => write!(f, ":{s}"),
            Constant::Error(err) => write!(f, "{}(\"{}\")", err.error_type, err.message),
        }
    }
}

/// Concrete data type together with the field names the engine knows it has.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DataType {
    pub name: Rc<str>,
    #[serde(default)]
    pub fields: Vec<Rc<str>>,
}

impl DataType {
    pub fn new(name: &str) -> Self {
        DataType {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(name: &str, fields: &[&str]) -> Self {
        DataType {
            name: name.into(),
            fields: fields.iter().map(|f| (*f).into()).collect(),
        }
    }
}

/// Result of looking a field name up in a type's shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldLookup {
    Present,
    Absent,
    Unknown,
}

/// Abstract value observed by the engine.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatticeType {
    /// The empty type: no value can flow here.
    Bottom,
    Any,
    Bool,
    Const(Constant),
    Concrete(DataType),
    /// Abstract type; `admits_bool` records whether `Bool` is one of its subtypes.
    Abstract {
        name: Rc<str>,
        #[serde(default)]
        admits_bool: bool,
    },
    /// Union in canonical (sorted, deduplicated) order. Build with [`LatticeType::union`].
    Union(Vec<LatticeType>),
}

impl LatticeType {
    pub fn concrete(name: &str) -> Self {
        LatticeType::Concrete(DataType::new(name))
    }

    pub fn constant(value: Constant) -> Self {
        LatticeType::Const(value)
    }

    pub fn abstract_type(name: &str, admits_bool: bool) -> Self {
        LatticeType::Abstract {
            name: name.into(),
            admits_bool,
        }
    }

    /// Canonical union: nested unions are flattened, bottoms dropped and the
    /// members sorted. `Any` absorbs everything.
    pub fn union<I>(types: I) -> Self
    where
        I: IntoIterator<Item = LatticeType>,
    {
        let mut members = Vec::new();
        for ty in types {
            match ty {
                LatticeType::Bottom => {}
                LatticeType::Any => return LatticeType::Any,
                LatticeType::Union(inner) => members.extend(inner),
                other => members.push(other),
            }
        }
        members.sort();
        members.dedup();

        match members.len() {
            0 => LatticeType::Bottom,
            1 => members.remove(0),
            _ => LatticeType::Union(members),
        }
    }

    pub fn is_bottom(&self) -> bool {
        match self {
            LatticeType::Bottom => true,
            LatticeType::Union(members) => members.is_empty(),
            _ => false,
        }
    }

    /// Union members in canonical order, or the type itself.
    pub fn components(&self) -> &[LatticeType] {
        match self {
            LatticeType::Union(members) => members,
            other => core::slice::from_ref(other),
        }
    }

    /// Constants and concrete data types. Abstract types, `Any` and unions are not.
    pub fn is_concrete(&self) -> bool {
        matches!(
            self,
            LatticeType::Bool | LatticeType::Const(_) | LatticeType::Concrete(_)
        )
    }

    /// Whether the type intersects `Bool`.
    pub fn may_be_bool(&self) -> bool {
        match self {
            LatticeType::Any | LatticeType::Bool | LatticeType::Const(Constant::Bool(_)) => true,
            LatticeType::Abstract { admits_bool, .. } => *admits_bool,
            LatticeType::Concrete(dt) => dt.name.as_ref() == "Bool",
            LatticeType::Union(members) => members.iter().any(Self::may_be_bool),
            LatticeType::Bottom | LatticeType::Const(_) => false,
        }
    }

    /// Whether the type is a subtype of `Bool`. Stricter than [`Self::may_be_bool`].
    pub fn is_bool_subtype(&self) -> bool {
        match self {
            LatticeType::Bottom | LatticeType::Bool | LatticeType::Const(Constant::Bool(_)) => {
                true
            }
            LatticeType::Concrete(dt) => dt.name.as_ref() == "Bool",
            LatticeType::Union(members) => members.iter().all(Self::is_bool_subtype),
            _ => false,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            LatticeType::Const(value) => Some(value),
            _ => None,
        }
    }

    /// Shape lookup: only concrete data types have a definite answer.
    pub fn field(&self, name: &str) -> FieldLookup {
        match self {
            LatticeType::Concrete(dt) => {
                if dt.fields.iter().any(|f| f.as_ref() == name) {
                    FieldLookup::Present
                } else {
                    FieldLookup::Absent
                }
            }
            LatticeType::Bool | LatticeType::Const(_) => FieldLookup::Absent,
            _ => FieldLookup::Unknown,
        }
    }
}

impl fmt::Display for LatticeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LatticeType::Bottom => f.write_str("Union{}"),
            LatticeType::Any => f.write_str("Any"),
            LatticeType::Bool => f.write_str("Bool"),
            LatticeType::Const(value) => f.write_str(value.type_name()),
            LatticeType::Concrete(dt) => f.write_str(&dt.name),
            LatticeType::Abstract { name, .. } => f.write_str(name),
            LatticeType::Union(members) => {
                f.write_str("Union{")?;
                for (idx, member) in members.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Call-site type: the callee and the abstract types of its arguments.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CallSignature {
    pub callee: Rc<str>,
    #[serde(default)]
    pub args: Vec<LatticeType>,
}

impl CallSignature {
    pub fn new(callee: &str, args: Vec<LatticeType>) -> Self {
        CallSignature {
            callee: callee.into(),
            args,
        }
    }

    /// True when every argument is a constant or concrete data type.
    pub fn is_concrete(&self) -> bool {
        self.args.iter().all(LatticeType::is_concrete)
    }
}

impl fmt::Display for CallSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.callee)?;
        for (idx, arg) in self.args.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "::{arg}")?;
        }
        f.write_str(")")
    }
}
