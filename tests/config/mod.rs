// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(test)]

use std::collections::BTreeMap;

use anyhow::Result;
use inferbug::pass::PassFlavor;
use inferbug::*;
use serde_json::json;

fn options(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, serde_json::Value> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

#[test]
fn defaults() -> Result<()> {
    let mut session = Session::new();
    let config = session.configure(&BTreeMap::new())?;

    assert_eq!(config.pass(), &ReportPass::Basic);
    assert!(config.tuning().aggressive_constant_propagation);
    assert!(!config.tuning().unoptimize_throw_blocks);
    assert!(!config.tuning().inlining());
    assert_eq!(config, AnalyzerConfig::default());
    Ok(())
}

#[test]
fn inlining_cannot_be_enabled() {
    let mut session = Session::new();

    let err = session.configure(&options(&[("inlining", json!(true))])).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::InvalidConfiguration {
            option: "inlining",
            ..
        }
    ));

    let config = session.configure(&options(&[("inlining", json!(false))]));
    assert!(config.is_ok());
}

#[test]
fn unknown_and_malformed_options() {
    let mut session = Session::new();

    let err = session.configure(&options(&[("max_depth", json!(3))])).unwrap_err();
    assert_eq!(err, ConfigError::UnknownOption("max_depth".to_string()));

    let err = session
        .configure(&options(&[("unoptimize_throw_blocks", json!("yes"))]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));

    let err = session.configure(&options(&[("report_pass", json!("paranoid"))])).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref got, .. } if got == "paranoid"));

    let err = session.configure_json("{report_pass").unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)));
}

#[test]
fn equal_configurations_share_a_cache_key() -> Result<()> {
    let mut session = Session::new();
    let a = session.configure_json(r#"{"report_pass": "sound", "unoptimize_throw_blocks": true}"#)?;
    let b = session.configure_json(r#"{"unoptimize_throw_blocks": true, "report_pass": "sound"}"#)?;
    assert_eq!(a.cache_key(), b.cache_key());

    let programmatic = AnalyzerConfig::new(ReportPass::Sound).with_tuning(TuningOptions {
        unoptimize_throw_blocks: true,
        ..TuningOptions::default()
    });
    assert_eq!(a.cache_key(), programmatic.cache_key());
    Ok(())
}

#[test]
fn differing_configurations_get_distinct_keys() -> Result<()> {
    let mut session = Session::new();
    let basic = session.configure_json("{}")?;
    let sound = session.configure_json(r#"{"report_pass": "sound"}"#)?;
    let no_const_prop = session.configure_json(r#"{"aggressive_constant_propagation": false}"#)?;

    assert_ne!(basic.cache_key(), sound.cache_key());
    assert_ne!(basic.cache_key(), no_const_prop.cache_key());
    assert_ne!(sound.cache_key(), no_const_prop.cache_key());
    Ok(())
}

#[test]
fn fresh_passes_never_share_keys() -> Result<()> {
    let mut session = Session::new();
    let first = session.configure_json(r#"{"fresh": true}"#)?;
    let second = session.configure_json(r#"{"fresh": true}"#)?;
    let plain = session.configure_json("{}")?;

    assert_ne!(first.cache_key(), second.cache_key());
    assert_ne!(first.cache_key(), plain.cache_key());
    assert_eq!(first.pass().flavor(), PassFlavor::Basic);

    let inner = session.fresh(ReportPass::Sound);
    let nested = session.fresh(inner);
    assert_eq!(nested.flavor(), PassFlavor::Sound);
    Ok(())
}

#[test]
fn fresh_generations_are_shared_by_every_entry_point() -> Result<()> {
    let mut session = Session::new();
    let from_map = session.configure(&options(&[("fresh", json!(true))]))?;
    let from_json = session.configure_json(r#"{"fresh": true}"#)?;
    let wrapped = AnalyzerConfig::new(session.fresh(ReportPass::Basic));

    let keys = [
        from_map.cache_key(),
        from_json.cache_key(),
        wrapped.cache_key(),
    ];
    for (idx, key) in keys.iter().enumerate() {
        for other in &keys[idx + 1..] {
            assert_ne!(key, other);
        }
    }

    // A clone keeps its generation and therefore its partition.
    assert_eq!(from_map.clone().cache_key(), keys[0]);
    Ok(())
}
