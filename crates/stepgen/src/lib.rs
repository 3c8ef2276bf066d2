//! Suite generation for Gherkin scenarios implemented in ECMAScript.
//!
//! The crate links `.feature` documents to step definitions declared in
//! `*.stepdefinitions.*` files and writes one jest-cucumber suite per
//! document.
//!
//! # Overview
//!
//! A run goes through these phases:
//!
//! - [`extract`] parses each implementation file with tree-sitter and
//!   validates the declarative surface (file scopes, steps, hooks).
//! - [`pool`] aggregates every extracted definition into one arena.
//! - [`feature`] reads scenario documents with the `gherkin` parser.
//! - [`link`] resolves every scenario line to exactly one definition and
//!   merges the import declarations the matched steps need.
//! - [`gate`] fingerprints each linked feature and skips unchanged ones.
//! - [`emit`] renders the suite text.
//!
//! [`pipeline::run`] wires the phases together.
//!
//! # Configuration
//!
//! - `stepgen.json`: optional project file (camelCase keys)
//! - `STEPGEN_LOG_LEVEL`: log verbosity (trace, debug, info, warn, error)
//!
//! # Example
//!
//! ```ignore
//! use stepgen::config::GeneratorConfig;
//! use stepgen::pipeline::{run, FsSuiteWriter};
//!
//! let config = GeneratorConfig::load(None)?;
//! let summary = run(&config, &mut FsSuiteWriter)?;
//! ```

pub mod config;
pub mod discovery;
pub mod emit;
pub mod error;
pub mod extract;
pub mod feature;
pub mod gate;
pub mod link;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod pool;
pub mod scope;

/// Test support utilities for unit and integration tests.
///
/// This module is hidden from documentation as it's intended for internal
/// test use only.
#[cfg(any(test, feature = "test-support"))]
#[doc(hidden)]
pub mod test_support;
