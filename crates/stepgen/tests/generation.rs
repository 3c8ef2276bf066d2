//! Behavioural tests for complete generation runs.
//!
//! Each test lays out a small project in a temporary directory, runs the
//! pipeline with a recording writer and inspects the suites it produced.

use rstest::{fixture, rstest};
use stepgen::pipeline::{FsSuiteWriter, RunSummary, run};
use stepgen::test_support::{RecordingWriter, Workspace};

const CALCULATOR_FEATURE: &str = "\
Feature: Calculator
  Scenario: Simple addition
    Given the number \"2\"
    And the number \"3\"
    When I add them
    Then the result should be \"5\"
";

const CALCULATOR_STEPS: &str = "\
defineFileScopes([{ feature: 'Calculator' }]);
given(/^the number \"(.*)\"$/, (value) => {
  scenarioContext.numbers = [...(scenarioContext.numbers || []), Number(value)];
});
when('I add them', () => {
  scenarioContext.result = scenarioContext.numbers[0] + scenarioContext.numbers[1];
});
then(/^the result should be \"(.*)\"$/, (result) => {
  expect(scenarioContext.result).toBe(Number(result));
});
";

#[fixture]
fn calculator() -> Workspace {
    let workspace = Workspace::new();
    workspace
        .file("calc/calculator.feature", CALCULATOR_FEATURE)
        .steps("calc/calculator.stepdefinitions.js", CALCULATOR_STEPS);
    workspace
}

fn generate(workspace: &Workspace, writer: &mut RecordingWriter) -> RunSummary {
    match run(&workspace.config(), writer) {
        Ok(summary) => summary,
        Err(err) => panic!("generation should succeed: {err}"),
    }
}

#[rstest]
fn generates_calculator_suite(calculator: Workspace) {
    let mut writer = RecordingWriter::default();
    let summary = generate(&calculator, &mut writer);

    assert_eq!(summary.written, 1);
    assert_eq!(summary.definitions, 3);
    let suite_path = calculator.path("calc/calculator.steps.js");
    let Some(suite) = writer.contents(&suite_path) else {
        panic!("suite should be written beside the document");
    };
    assert!(suite.contains("\tdefineScenario('Simple addition', ({ given, when, then }) => {"));
    let calls = [
        "\t\tTheNumber(given);\n\t\tTheNumber(given);\n",
        "\t\tIAddThem(when);\n",
        "\t\tTheResultShouldBe(then);\n",
    ]
    .concat();
    assert!(suite.contains(&calls));
    assert!(suite.contains("\tbeforeEach(() => {\n\t\tscenarioContext = {};\n\t});"));
    assert!(calculator.read("stepgen.hash.json").is_some());
}

#[rstest]
fn second_run_writes_nothing(calculator: Workspace) {
    let mut first = RecordingWriter::default();
    generate(&calculator, &mut first);
    assert_eq!(first.writes.len(), 1);

    let mut second = RecordingWriter::default();
    let summary = generate(&calculator, &mut second);
    assert!(second.writes.is_empty());
    assert_eq!(summary.unchanged, 1);
}

#[rstest]
fn scenario_change_regenerates(calculator: Workspace) {
    generate(&calculator, &mut RecordingWriter::default());
    calculator.file(
        "calc/calculator.feature",
        &CALCULATOR_FEATURE.replace("Simple addition", "Plain addition"),
    );

    let mut writer = RecordingWriter::default();
    let summary = generate(&calculator, &mut writer);
    assert_eq!(summary.written, 1);
}

#[rstest]
fn forced_run_rewrites_without_recording(calculator: Workspace) {
    let mut config = calculator.config();
    config.force = true;

    let mut writer = RecordingWriter::default();
    let first = run(&config, &mut writer).unwrap_or_else(|err| panic!("run: {err}"));
    let second = run(&config, &mut writer).unwrap_or_else(|err| panic!("run: {err}"));
    assert_eq!((first.written, second.written), (1, 1));
    assert!(calculator.read("stepgen.hash.json").is_none());
}

#[rstest]
fn failed_write_is_not_recorded(calculator: Workspace) {
    let mut failing = RecordingWriter {
        fail_on: vec![calculator.path("calc/calculator.steps.js")],
        ..RecordingWriter::default()
    };
    let summary = generate(&calculator, &mut failing);
    assert_eq!(summary.failed_writes, 1);
    assert_eq!(summary.written, 0);

    let mut retry = RecordingWriter::default();
    let summary = generate(&calculator, &mut retry);
    assert_eq!(summary.written, 1);
}

#[rstest]
fn writes_suites_to_disk(calculator: Workspace) {
    run(&calculator.config(), &mut FsSuiteWriter).unwrap_or_else(|err| panic!("run: {err}"));
    let Some(suite) = calculator.read("calc/calculator.steps.js") else {
        panic!("suite should exist on disk");
    };
    assert!(suite.starts_with("// Generated by stepgen"));
    assert!(suite.ends_with("});\n"));
}

#[test]
fn typed_definitions_produce_typed_suite() {
    let workspace = Workspace::new();
    workspace
        .file(
            "login/login.feature",
            "Feature: Login\n  Scenario: Grant\n    Then access is granted\n",
        )
        .steps(
            "login/login.stepdefinitions.tsx",
            "defineFileScopes([{}]);\nthen('access is granted', () => {});\n",
        );
    let mut writer = RecordingWriter::default();
    generate(&workspace, &mut writer);
    assert!(writer.contents(&workspace.path("login/login.steps.tsx")).is_some());
}

#[test]
fn merged_dependencies_are_imported_once() {
    let workspace = Workspace::new();
    workspace
        .file(
            "shop/cart.feature",
            "Feature: Cart\n  Scenario: Add\n    Given an empty cart\n    When I add an item\n",
        )
        .steps(
            "shop/given.stepdefinitions.js",
            "import { A } from 'lib';\ndefineFileScopes([{ feature: 'Cart' }]);\ngiven('an empty cart', () => { A(); });\n",
        )
        .steps(
            "shop/when.stepdefinitions.js",
            "import { B } from 'lib';\ndefineFileScopes([{ feature: 'Cart' }]);\nwhen('I add an item', () => { B(); });\n",
        );
    let mut writer = RecordingWriter::default();
    generate(&workspace, &mut writer);
    let Some(suite) = writer.contents(&workspace.path("shop/cart.steps.js")) else {
        panic!("suite should be written");
    };
    assert_eq!(suite.matches("from 'lib'").count(), 1);
    assert!(suite.contains("import { A, B } from 'lib';"));
}

#[rstest]
#[case("@skip", "defineScenario.skip('Tagged'")]
#[case("@only", "defineScenario.only('Tagged'")]
#[case("@skip @only", "defineScenario.skip('Tagged'")]
#[case("", "defineScenario('Tagged'")]
fn execution_tags_select_registrar(#[case] tags: &str, #[case] expected: &str) {
    let workspace = Workspace::new();
    workspace
        .file(
            "calc/calculator.feature",
            &format!("Feature: Calculator\n  {tags}\n  Scenario: Tagged\n    When I add them\n"),
        )
        .steps("calc/calculator.stepdefinitions.js", CALCULATOR_STEPS);
    let mut writer = RecordingWriter::default();
    generate(&workspace, &mut writer);
    let Some(suite) = writer.contents(&workspace.path("calc/calculator.steps.js")) else {
        panic!("suite should be written");
    };
    assert!(suite.contains(expected), "missing {expected} in\n{suite}");
}

#[test]
fn generation_tags_filter_documents() {
    let workspace = Workspace::new();
    workspace
        .file(
            "calc/ignored.feature",
            "@ignore-generation\nFeature: Calculator\n  Scenario: A\n    When I add them\n",
        )
        .file(
            "calc/kept.feature",
            "Feature: Calculator\n  Scenario: B\n    When I add them\n",
        )
        .steps("calc/calculator.stepdefinitions.js", CALCULATOR_STEPS);
    let mut writer = RecordingWriter::default();
    let summary = generate(&workspace, &mut writer);
    assert_eq!(summary.skipped_by_tag, 1);
    assert_eq!(summary.documents, 1);
    assert!(writer.contents(&workspace.path("calc/kept.steps.js")).is_some());
    assert!(writer.contents(&workspace.path("calc/ignored.steps.js")).is_none());
}
