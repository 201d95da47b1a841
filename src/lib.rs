// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

// Use README.md as crate documentation.
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/README.md"))]
#![no_std]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

#[cfg(feature = "arc")]
pub(crate) use alloc::sync::Arc as Rc;

#[cfg(not(feature = "arc"))]
pub(crate) use alloc::rc::Rc;

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod engine;
mod error;
pub mod lattice;
pub mod ledger;
pub mod pass;
pub mod report;
mod session;

pub use analyzer::{AnalysisOutcome, Analyzer, FrameId, FrameSummary};
pub use config::{AnalyzerConfig, CacheKey, ConfigError, TuningOptions};
pub use error::{AnalysisError, AnalysisResult};
pub use lattice::{CallSignature, Constant, DataType, LatticeType, ThrownError};
pub use pass::ReportPass;
pub use report::{LocationChain, Report, ReportDetail, ReportKind, SourcePos};
pub use session::Session;
