// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::lattice::CallSignature;
use crate::Rc;

/// Statement position inside a source file.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourcePos {
    pub file: Rc<str>,
    pub line: u32,
}

impl SourcePos {
    pub fn new(file: &str, line: u32) -> Self {
        SourcePos {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One step of a location chain: the frame's signature and the statement it
/// was executing.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VirtualFrame {
    pub signature: CallSignature,
    pub position: SourcePos,
}

/// Causal chain from the entry frame down to the statement that triggered a
/// report.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationChain {
    frames: Vec<VirtualFrame>,
}

impl LocationChain {
    pub fn new(frames: Vec<VirtualFrame>) -> Self {
        LocationChain { frames }
    }

    pub fn frames(&self) -> &[VirtualFrame] {
        &self.frames
    }

    /// Innermost position, i.e. the triggering statement.
    pub fn position(&self) -> Option<&SourcePos> {
        self.frames.last().map(|vf| &vf.position)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drops the first `depth` entries, giving a chain relative to the frame
    /// found at that depth.
    pub fn strip_prefix(&self, depth: usize) -> LocationChain {
        LocationChain {
            frames: self.frames.iter().skip(depth).cloned().collect(),
        }
    }

    /// Prepends `prefix` to a relative chain.
    pub fn rebased(&self, prefix: &[VirtualFrame]) -> LocationChain {
        let mut frames = Vec::with_capacity(prefix.len() + self.frames.len());
        frames.extend_from_slice(prefix);
        frames.extend(self.frames.iter().cloned());
        LocationChain { frames }
    }
}

impl fmt::Display for LocationChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, vf) in self.frames.iter().enumerate() {
            if idx > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{} @ {}", vf.signature, vf.position)?;
        }
        Ok(())
    }
}
