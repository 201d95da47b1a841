// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Analyzer configuration and the cache key derived from it.

use alloc::borrow::ToOwned;
use alloc::collections::BTreeMap;
use alloc::string::String;

use serde::Serialize;
use serde_json::Value;

use crate::pass::{FreshGenerations, ReportPass};

/// Errors raised while building an [`AnalyzerConfig`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown analyzer option `{0}`")]
    UnknownOption(String),
    #[error("invalid configuration: {option} {reason}")]
    InvalidConfiguration {
        option: &'static str,
        reason: &'static str,
    },
    #[error("option `{option}` expects {expected}, got {got}")]
    InvalidValue {
        option: String,
        expected: &'static str,
        got: String,
    },
    #[error("configuration parse error: {0}")]
    Json(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::Json(alloc::format!("{error}"))
    }
}

const AGGRESSIVE_CONSTANT_PROPAGATION: &str = "aggressive_constant_propagation";
const UNOPTIMIZE_THROW_BLOCKS: &str = "unoptimize_throw_blocks";
const INLINING: &str = "inlining";
const REPORT_PASS: &str = "report_pass";
const FRESH: &str = "fresh";

/// Inference tuning knobs forwarded to the engine.
///
/// Inlining has no field: the report passes assume that every callee keeps
/// its own frame, so it is always off.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TuningOptions {
    pub aggressive_constant_propagation: bool,
    pub unoptimize_throw_blocks: bool,
}

impl Default for TuningOptions {
    fn default() -> Self {
        TuningOptions {
            aggressive_constant_propagation: true,
            unoptimize_throw_blocks: false,
        }
    }
}

impl TuningOptions {
    pub fn inlining(&self) -> bool {
        false
    }
}

/// Opaque key partitioning the inference result cache.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey {
    tuning: TuningOptions,
    pass: ReportPass,
}

/// Immutable analyzer configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AnalyzerConfig {
    tuning: TuningOptions,
    pass: ReportPass,
}

impl AnalyzerConfig {
    pub fn new(pass: ReportPass) -> Self {
        AnalyzerConfig {
            tuning: TuningOptions::default(),
            pass,
        }
    }

    pub fn with_tuning(mut self, tuning: TuningOptions) -> Self {
        self.tuning = tuning;
        self
    }

    pub fn tuning(&self) -> &TuningOptions {
        &self.tuning
    }

    pub fn pass(&self) -> &ReportPass {
        &self.pass
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            tuning: self.tuning,
            pass: self.pass.clone(),
        }
    }

    /// Builds a configuration from an option map. `fresh = true` takes the
    /// next generation from `generations`.
    pub(crate) fn from_options(
        options: &BTreeMap<String, Value>,
        generations: &mut FreshGenerations,
    ) -> Result<Self, ConfigError> {
        let mut tuning = TuningOptions::default();
        let mut pass = ReportPass::Basic;
        let mut fresh = false;

        for (name, value) in options {
            match name.as_str() {
                AGGRESSIVE_CONSTANT_PROPAGATION => {
                    tuning.aggressive_constant_propagation = expect_bool(name, value)?;
                }
                UNOPTIMIZE_THROW_BLOCKS => {
                    tuning.unoptimize_throw_blocks = expect_bool(name, value)?;
                }
                INLINING => {
                    if expect_bool(name, value)? {
                        return Err(ConfigError::InvalidConfiguration {
                            option: INLINING,
                            reason: "must stay disabled; reports rely on un-inlined frames",
                        });
                    }
                }
                REPORT_PASS => {
                    pass = match value.as_str() {
                        Some(pass_name) => ReportPass::from_name(pass_name).ok_or_else(|| {
                            ConfigError::InvalidValue {
                                option: name.clone(),
                                expected: "\"basic\" or \"sound\"",
                                got: pass_name.to_owned(),
                            }
                        })?,
                        None => return Err(invalid_value(name, "a string", value)),
                    };
                }
                FRESH => fresh = expect_bool(name, value)?,
                _ => return Err(ConfigError::UnknownOption(name.clone())),
            }
        }

        if fresh {
            pass = generations.wrap(pass);
        }

        Ok(AnalyzerConfig { tuning, pass })
    }

    /// Same as [`Self::from_options`] with the map given as a JSON object.
    pub(crate) fn from_json_str(
        json: &str,
        generations: &mut FreshGenerations,
    ) -> Result<Self, ConfigError> {
        let options: BTreeMap<String, Value> = serde_json::from_str(json)?;
        Self::from_options(&options, generations)
    }
}

fn expect_bool(name: &str, value: &Value) -> Result<bool, ConfigError> {
    value
        .as_bool()
        .ok_or_else(|| invalid_value(name, "a boolean", value))
}

fn invalid_value(name: &str, expected: &'static str, value: &Value) -> ConfigError {
    ConfigError::InvalidValue {
        option: name.to_owned(),
        expected,
        got: alloc::format!("{value}"),
    }
}
