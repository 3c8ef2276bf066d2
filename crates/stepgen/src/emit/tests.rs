//! Unit tests for suite rendering.

use std::collections::BTreeSet;
use std::path::Path;

use rstest::rstest;

use super::*;
use crate::config::TagPair;
use crate::extract::{Surface, extract_source};
use crate::feature::parse_document;
use crate::link::Linker;
use crate::pool::StepPool;

const STEPS: &str = concat!(
    "import { defineStep, defineFileScopes, scenarioContext } from '@charlesgilles/bdd-generator';\n",
    "import { PasswordValidator } from '../password-validator';\n",
    "defineFileScopes([{ feature: 'Calculator' }]);\n",
    "const iMultiplyThem = function () {\n",
    "  scenarioContext.result = scenarioContext.numbers[0] * scenarioContext.numbers[1];\n",
    "};\n",
    "beforeEach(() => {\n",
    "  scenarioContext.numbers = [];\n",
    "});\n",
    "defineStep(['given'], /^the number \"(.*)\"$/, (value) => {\n",
    "  if (value) {\n",
    "    scenarioContext.numbers.push(Number(value));\n",
    "  }\n",
    "});\n",
    "defineStep(['when'], 'I multiply them', iMultiplyThem);\n",
    "defineStep(['then'], \"the result's \\\"value\\\"\", () => { new PasswordValidator(); });\n",
);

const DOCUMENT: &str = concat!(
    "Feature: Calculator\n",
    "  Scenario: Simple multiplication\n",
    "    Given the number \"2\"\n",
    "    And the number \"3\"\n",
    "    When I multiply them\n",
    "    Then the result's \"value\"\n",
    "  @skip\n",
    "  Scenario: Isn't run\n",
    "    When I multiply them\n",
);

const EXPECTED: &str = r#"// Generated by stepgen. Edit the step definitions instead.
import { defineFeature, loadFeature } from 'jest-cucumber';
import { PasswordValidator } from './password-validator';

const feature = loadFeature('src/features/calc.feature');

defineFeature(feature, (defineScenario) => {
	let scenarioContext;

	// Common code from src/features/steps/calc.stepdefinitions.js
	const iMultiplyThem = function () {
	  scenarioContext.result = scenarioContext.numbers[0] * scenarioContext.numbers[1];
	};
	// End of common code from src/features/steps/calc.stepdefinitions.js

	beforeEach(() => {
		scenarioContext = {};
		scenarioContext.numbers = [];
	});

	function TheNumber(registrar) {
		registrar(/^the number "(.*)"$/, (value) => {
			if (value) {
			  scenarioContext.numbers.push(Number(value));
			}
		});
	}

	function IMultiplyThem(registrar) {
		registrar('I multiply them', function () {
			scenarioContext.result = scenarioContext.numbers[0] * scenarioContext.numbers[1];
		});
	}

	function TheResultsValue(registrar) {
		registrar('the result\'s "value"', () => { new PasswordValidator(); });
	}

	defineScenario('Simple multiplication', ({ given, when, then }) => {
		TheNumber(given);
		TheNumber(given);
		IMultiplyThem(when);
		TheResultsValue(then);
	});

	defineScenario.skip('Isn\'t run', ({ given, when, then }) => {
		IMultiplyThem(when);
	});

});
"#;

fn pool() -> StepPool {
    match extract_source(
        Path::new("src/features/steps/calc.stepdefinitions.js"),
        STEPS,
        &Surface::default(),
    ) {
        Ok(file) => std::iter::once(file).collect(),
        Err(err) => panic!("extraction should succeed: {err}"),
    }
}

fn render(pool: &StepPool, text: &str) -> String {
    let doc = match parse_document(Path::new("src/features/calc.feature"), text.to_string()) {
        Ok(doc) => doc,
        Err(err) => panic!("document should parse: {err}"),
    };
    let linker = Linker::new(pool, TagPair::new("skip", "only"));
    match linker.link(&doc) {
        Ok(linked) => render_suite(&linked, &EmitOptions::default()),
        Err(err) => panic!("linking should succeed: {err}"),
    }
}

#[test]
fn renders_complete_suite() {
    let pool = pool();
    assert_eq!(render(&pool, DOCUMENT), EXPECTED);
}

#[test]
fn rendering_is_deterministic() {
    let pool = pool();
    assert_eq!(render(&pool, DOCUMENT), render(&pool, DOCUMENT));
}

fn imports(default: Option<&str>, namespace: Option<&str>, named: &[&str]) -> ModuleImports {
    ModuleImports {
        default: default.map(str::to_string),
        namespace: namespace.map(str::to_string),
        named: named.iter().map(|name| (*name).to_string()).collect::<BTreeSet<_>>(),
    }
}

#[rstest]
#[case(imports(None, None, &[]), &["import 'polyfill';"])]
#[case(imports(Some("D"), None, &[]), &["import D from 'polyfill';"])]
#[case(imports(Some("D"), None, &["b", "a"]), &["import D, { a, b } from 'polyfill';"])]
#[case(imports(None, None, &["a"]), &["import { a } from 'polyfill';"])]
#[case(imports(None, Some("ns"), &[]), &["import * as ns from 'polyfill';"])]
#[case(imports(Some("D"), Some("ns"), &[]), &["import D, * as ns from 'polyfill';"])]
#[case(
    imports(None, Some("ns"), &["a"]),
    &["import * as ns from 'polyfill';", "import { a } from 'polyfill';"]
)]
fn renders_import_shapes(#[case] imports: ModuleImports, #[case] expected: &[&str]) {
    assert_eq!(import_lines("polyfill", &imports), expected);
}

#[rstest]
#[case("plain", "plain")]
#[case("it's", r"it\'s")]
#[case(r"a\b", r"a\\b")]
#[case("two\nlines", r"two\nlines")]
fn escapes_single_quoted_text(#[case] text: &str, #[case] expected: &str) {
    assert_eq!(escape_single_quoted(text), expected);
}

#[rstest]
#[case("calc.feature", false, false, "calc.steps.js")]
#[case("dir/calc.feature", true, false, "dir/calc.steps.ts")]
#[case("dir/calc.feature", false, true, "dir/calc.steps.jsx")]
#[case("dir/calc.feature", true, true, "dir/calc.steps.tsx")]
fn derives_suite_paths(
    #[case] document: &str,
    #[case] typed: bool,
    #[case] markup: bool,
    #[case] expected: &str,
) {
    let kind = SourceKind { typed, markup };
    assert_eq!(suite_path(Path::new(document), kind), Path::new(expected));
}

#[test]
fn template_literals_in_bodies_survive() {
    let steps = concat!(
        "import { defineFileScopes, given, then, scenarioContext } from '@charlesgilles/bdd-generator';\n",
        "defineFileScopes([{}]);\n",
        "const banner = `line one\n  line two`;\n",
        "beforeEach(() => {\n",
        "    scenarioContext.doc = `a\n  b`;\n",
        "});\n",
        "given('a document', () => {\n",
        "    scenarioContext.out = render();\n",
        "});\n",
        "then('it is printed', () => {\n",
        "    expect(scenarioContext.out).toBe(`first\nsecond\n  third`);\n",
        "});\n",
        "then('it is quoted', () => scenarioContext.quote(`one\n  two`));\n",
    );
    let pool: StepPool = match extract_source(
        Path::new("src/features/doc.stepdefinitions.js"),
        steps,
        &Surface::default(),
    ) {
        Ok(file) => std::iter::once(file).collect(),
        Err(err) => panic!("extraction should succeed: {err}"),
    };
    let suite = render(
        &pool,
        concat!(
            "Feature: Docs\n",
            "  Scenario: Print\n",
            "    Given a document\n",
            "    Then it is printed\n",
            "    And it is quoted\n",
        ),
    );

    assert!(suite.contains("\nconst banner = `line one\n  line two`;\n"));
    assert!(suite.contains("\t\tscenarioContext.doc = `a\n  b`;\n"));
    assert!(suite.contains(
        "\t\t\texpect(scenarioContext.out).toBe(`first\nsecond\n  third`);\n\t\t});\n"
    ));
    assert!(suite.contains(
        "\t\tregistrar('it is quoted', () => scenarioContext.quote(`one\n  two`));\n"
    ));
}
