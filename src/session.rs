// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::collections::BTreeMap;
use alloc::string::String;

use serde_json::Value;

use crate::analyzer::Analyzer;
use crate::cache::ResultCache;
use crate::config::{AnalyzerConfig, ConfigError};
use crate::pass::{FreshGenerations, ReportPass};

/// State shared by the analysis runs of one tool invocation: the inference
/// result cache and the `Fresh` generation counter.
///
/// ```ignore
/// let mut session = Session::new();
/// let config = session.configure_json(r#"{"report_pass": "sound"}"#)?;
/// let mut analyzer = session.analyzer(config);
/// let entry = analyzer.enter_entry(signature);
/// // ... engine drives the hooks ...
/// let outcome = analyzer.finish();
/// ```
#[derive(Debug, Default)]
pub struct Session {
    cache: ResultCache,
    generations: FreshGenerations,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    pub fn configure(
        &mut self,
        options: &BTreeMap<String, Value>,
    ) -> Result<AnalyzerConfig, ConfigError> {
        AnalyzerConfig::from_options(options, &mut self.generations)
    }

    pub fn configure_json(&mut self, json: &str) -> Result<AnalyzerConfig, ConfigError> {
        AnalyzerConfig::from_json_str(json, &mut self.generations)
    }

    /// Wraps `inner` so that analyzers using it get a cache partition no
    /// earlier configuration shares.
    pub fn fresh(&mut self, inner: ReportPass) -> ReportPass {
        self.generations.wrap(inner)
    }

    /// Starts an analysis run. The analyzer borrows the session's cache until
    /// it is finished.
    pub fn analyzer(&mut self, config: AnalyzerConfig) -> Analyzer<'_> {
        Analyzer::new(config, &mut self.cache)
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
