// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::std_instead_of_core,
    clippy::semicolon_if_nothing_returned,
    clippy::pattern_type_mismatch,
    clippy::as_conversions
)] // scripted engine tests rely on asserts/unwraps and std conveniences

use crate::engine::*;
use crate::*;
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use test_generator::test_resources;

use std::collections::BTreeMap;
use std::format;
use std::string::{String, ToString};
use std::vec::Vec;

use super::common::{init_logging, parse_type, parse_types};

const FILE: &str = "test.jl";

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct SplitSpec {
    args: Vec<String>,
    candidates: usize,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct ResolveSpec {
    callee: String,
    splits: Vec<SplitSpec>,
    #[serde(default = "bottom")]
    result: String,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct InvokeSpec {
    args: Vec<String>,
    result: String,
    /// Frame entered for the resolved callee before the hook fires.
    #[serde(default)]
    callee: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct GlobalSpec {
    scope: String,
    name: String,
    #[serde(default)]
    resolved: bool,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct IntrinsicSpec {
    op: String,
    #[serde(default)]
    field: Option<String>,
    #[serde(default)]
    division: bool,
    #[serde(default = "modeled")]
    modeled: bool,
    args: Vec<String>,
    observed: String,
    #[serde(default)]
    expect_result: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct ErrorSpec {
    error_type: String,
    #[serde(default)]
    message: String,
}

/// One hook invocation made by the scripted engine. Exactly one action field
/// is set.
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct Step {
    line: u32,
    #[serde(default)]
    call: Option<String>,
    #[serde(default)]
    resolve: Option<ResolveSpec>,
    #[serde(default)]
    return_type_query: Option<usize>,
    #[serde(default)]
    invoke: Option<InvokeSpec>,
    #[serde(default)]
    global: Option<GlobalSpec>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    raise: Option<String>,
    #[serde(default)]
    intrinsic: Option<IntrinsicSpec>,
    /// Expected return value of bool-returning hooks.
    #[serde(default)]
    expect: Option<bool>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct BodyItem {
    line: u32,
    op: String,
    #[serde(default)]
    arg: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct FrameSpec {
    callee: String,
    #[serde(default)]
    args: Vec<String>,
    #[serde(default)]
    steps: Vec<Step>,
    #[serde(default = "any")]
    result: String,
    #[serde(default)]
    body: Vec<BodyItem>,
    /// The body cannot be generated; the frame is aborted when entered.
    #[serde(default)]
    generator_failure: Option<ErrorSpec>,
    /// Converged result published after the frame finished.
    #[serde(default)]
    refine: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct ExpectedReport {
    kind: ReportKind,
    /// Callee names along the location chain, entry first.
    chain: Vec<String>,
    line: u32,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct TestCase {
    note: String,
    #[serde(default)]
    options: BTreeMap<String, serde_json::Value>,
    frames: BTreeMap<String, FrameSpec>,
    entries: Vec<String>,
    #[serde(default)]
    reports: Vec<ExpectedReport>,
}

#[derive(Deserialize, Debug)]
struct YamlTest {
    cases: Vec<TestCase>,
}

fn bottom() -> String {
    "bottom".to_string()
}

fn any() -> String {
    "any".to_string()
}

fn modeled() -> bool {
    true
}

fn pos(line: u32) -> SourcePos {
    SourcePos::new(FILE, line)
}

fn signature(callee: &str, args: &[String]) -> Result<CallSignature> {
    Ok(CallSignature::new(callee, parse_types(args)?))
}

struct Driver<'a, 's> {
    analyzer: Analyzer<'s>,
    frames: &'a BTreeMap<String, FrameSpec>,
}

impl<'a> Driver<'a, '_> {
    fn spec(&self, name: &str) -> Result<&'a FrameSpec> {
        self.frames
            .get(name)
            .ok_or_else(|| anyhow!("undefined frame `{name}`"))
    }

    fn run_entry(&mut self, name: &str) -> Result<()> {
        let spec = self.spec(name)?;
        let id = self
            .analyzer
            .enter_entry(signature(&spec.callee, &spec.args)?);
        self.run_frame(id, name)
    }

    /// Enters `name` from `caller`. Returns the callee frame.
    fn call(&mut self, caller: FrameId, name: &str, line: u32) -> Result<FrameId> {
        let spec = self.spec(name)?;
        let site = CallSite {
            caller,
            position: pos(line),
        };
        let entry = self
            .analyzer
            .enter_call(signature(&spec.callee, &spec.args)?, site)?;
        match entry {
            FrameEntry::Analyze(id) => {
                if let Some(err) = &spec.generator_failure {
                    let error = ThrownError::new(&err.error_type, &err.message);
                    self.analyzer
                        .on_frame_creation_failed(id, &pos(line), &error)?;
                } else {
                    self.run_frame(id, name)?;
                }
                Ok(id)
            }
            FrameEntry::Cached { frame, .. } | FrameEntry::Cycle { frame, .. } => Ok(frame),
        }
    }

    fn run_frame(&mut self, id: FrameId, name: &str) -> Result<()> {
        let spec = self.spec(name)?;

        for step in &spec.steps {
            self.run_step(id, step)
                .with_context(|| format!("frame `{name}` line {}", step.line))?;
        }

        let body = spec
            .body
            .iter()
            .map(instruction)
            .collect::<Result<Vec<_>>>()?;
        let returned = self
            .analyzer
            .on_frame_finished(id, parse_type(&spec.result)?, body.clone())?;
        assert_eq!(returned, body, "instructions must be returned unchanged");

        if let Some(refined) = &spec.refine {
            self.analyzer.refine_result(id, parse_type(refined)?)?;
        }
        Ok(())
    }

    fn run_step(&mut self, frame: FrameId, step: &Step) -> Result<()> {
        let position = pos(step.line);
        let recorded = if let Some(callee) = &step.call {
            self.call(frame, callee, step.line)?;
            None
        } else if let Some(resolve) = &step.resolve {
            let splits = resolve
                .splits
                .iter()
                .map(|split| {
                    Ok(SplitCandidates {
                        signature: signature(&resolve.callee, &split.args)?,
                        candidates: split.candidates,
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            let outcome = CallOutcome {
                info: CallInfo { splits },
                result: parse_type(&resolve.result)?,
                callee: None,
            };
            let returned = self
                .analyzer
                .on_call_resolution(frame, &position, outcome.clone())?;
            assert_eq!(returned, outcome);
            None
        } else if let Some(arg_count) = step.return_type_query {
            Some(
                self.analyzer
                    .on_reflective_return_type_query(frame, &position, arg_count)?,
            )
        } else if let Some(invoke) = &step.invoke {
            let callee = match &invoke.callee {
                Some(name) => Some(self.call(frame, name, step.line)?),
                None => None,
            };
            let outcome = CallOutcome {
                info: CallInfo::default(),
                result: parse_type(&invoke.result)?,
                callee,
            };
            let returned = self.analyzer.on_explicit_dispatch_call(
                frame,
                &position,
                &parse_types(&invoke.args)?,
                outcome.clone(),
            )?;
            assert_eq!(returned, outcome);
            None
        } else if let Some(global) = &step.global {
            Some(self.analyzer.on_global_reference_evaluated(
                frame,
                &position,
                &global.scope,
                &global.name,
                global.resolved,
            )?)
        } else if let Some(observed) = &step.condition {
            Some(
                self.analyzer
                    .on_condition_evaluated(frame, &position, &parse_type(observed)?)?,
            )
        } else if let Some(thrown) = &step.raise {
            Some(
                self.analyzer
                    .on_raise_evaluated(frame, &position, &parse_type(thrown)?)?,
            )
        } else if let Some(intrinsic) = &step.intrinsic {
            let op = if !intrinsic.modeled {
                IntrinsicOp::unmodeled(&intrinsic.op)
            } else if let Some(field) = &intrinsic.field {
                IntrinsicOp::new(
                    &intrinsic.op,
                    IntrinsicKind::FieldAccess {
                        field: field.as_str().into(),
                    },
                )
            } else if intrinsic.division {
                IntrinsicOp::new(&intrinsic.op, IntrinsicKind::IntegerDivision)
            } else {
                IntrinsicOp::new(&intrinsic.op, IntrinsicKind::Other)
            };
            let result = self.analyzer.on_intrinsic_evaluated(
                frame,
                &position,
                &op,
                &parse_types(&intrinsic.args)?,
                parse_type(&intrinsic.observed)?,
            )?;
            if let Some(expected) = &intrinsic.expect_result {
                assert_eq!(result, parse_type(expected)?, "intrinsic result");
            }
            None
        } else {
            bail!("step without an action");
        };

        if let (Some(expected), Some(recorded)) = (step.expect, recorded) {
            assert_eq!(recorded, expected, "hook return value");
        }
        Ok(())
    }
}

fn instruction(item: &BodyItem) -> Result<Instruction> {
    let position = pos(item.line);
    let arg = || {
        item.arg
            .as_deref()
            .ok_or_else(|| anyhow!("`{}` needs an arg", item.op))
    };
    Ok(match item.op.as_str() {
        "raise" => Instruction::Raise {
            position,
            expr: arg()?.into(),
        },
        "undef_check" => Instruction::UndefCheck {
            position,
            slot: arg()?.into(),
        },
        "unreachable" => Instruction::Unreachable { position },
        "statement" => Instruction::Statement { position },
        other => bail!("unknown instruction `{other}`"),
    })
}

fn check_reports(outcome: &AnalysisOutcome, expected: &[ExpectedReport]) -> Result<()> {
    let actual: Vec<&Report> = outcome.reports().collect();
    for report in &actual {
        std::println!("  {} [{}]", report, report.location);
    }

    if actual.len() != expected.len() {
        bail!(
            "expected {} report(s), got {}",
            expected.len(),
            actual.len()
        );
    }

    for (idx, (report, exp)) in actual.iter().zip(expected).enumerate() {
        assert_eq!(report.kind(), exp.kind, "kind of report {idx}");
        let chain: Vec<String> = report
            .location
            .frames()
            .iter()
            .map(|vf| vf.signature.callee.to_string())
            .collect();
        assert_eq!(chain, exp.chain, "chain of report {idx}");
        assert_eq!(
            report.location.position().map(|p| p.line),
            Some(exp.line),
            "line of report {idx}"
        );
        if let Some(message) = &exp.message {
            assert_eq!(&report.detail.to_string(), message, "message of report {idx}");
        }
    }
    Ok(())
}

fn run_case(case: &TestCase) -> Result<()> {
    let mut session = Session::new();
    let config = session.configure(&case.options)?;
    let mut driver = Driver {
        analyzer: session.analyzer(config),
        frames: &case.frames,
    };

    for entry in &case.entries {
        driver.run_entry(entry)?;
    }

    let outcome = driver.analyzer.finish();
    check_reports(&outcome, &case.reports)
}

fn yaml_test_impl(file: &str) -> Result<()> {
    std::println!("\nrunning {file}");
    init_logging();

    let yaml_str = std::fs::read_to_string(file)?;
    let test: YamlTest = serde_yaml::from_str(&yaml_str)?;

    for case in &test.cases {
        std::println!("\ncase {} ", case.note);
        run_case(case).with_context(|| format!("case `{}`", case.note))?;
        std::println!("passed");
    }

    std::println!("{} cases passed.", test.cases.len());
    Ok(())
}

fn yaml_test(file: &str) -> Result<()> {
    match yaml_test_impl(file) {
        Ok(_) => Ok(()),
        Err(e) => {
            // If Err is returned, it doesn't always get printed by cargo test.
            // Therefore, panic with the error.
            panic!("{:?}", e);
        }
    }
}

#[test_resources("tests/reports/**/*.yaml")]
fn run(path: &str) {
    yaml_test(path).unwrap()
}
