//! Interpreter resolution - deciding which python a formula gets.
//!
//! A formula may depend on any of a fixed set of python spellings. Exactly one
//! may be wanted; more than one is a misconfigured formula and fails loudly.
//! When none are wanted we fall back to a configurable legacy default, which
//! ships as `python2.7` for compatibility with older formulae.

use crate::error::{PykegError, Result};
use crate::formula::Formula;

/// Every python spelling a formula may declare, in resolution order.
pub const PYTHON_CANDIDATES: &[&str] = &[
    "python",
    "python@2",
    "python2",
    "python3",
    "python@3",
    "pypy",
    "pypy3",
];

/// Historical fallback when a formula declares no python at all.
pub const LEGACY_DEFAULT_PYTHON: &str = "python2.7";

/// Pick the interpreter for a formula.
///
/// Filters [`PYTHON_CANDIDATES`] through the formula's declared dependencies.
/// More than one match is fatal ([`PykegError::AmbiguousPython`]); zero
/// matches falls back to `default`.
pub fn resolve(formula: &Formula, default: &str) -> Result<String> {
    let wanted: Vec<&str> = PYTHON_CANDIDATES
        .iter()
        .copied()
        .filter(|py| formula.needs_python(py))
        .collect();

    if wanted.len() > 1 {
        return Err(PykegError::AmbiguousPython {
            formula: formula.name.clone(),
            wanted: wanted.iter().map(|s| s.to_string()).collect(),
        });
    }

    let python = wanted.first().copied().unwrap_or(default);
    Ok(normalize(python))
}

/// Rewrite an interpreter identifier into a resolvable binary name.
///
/// `python -m venv` needs a concrete binary: bare `python` becomes `python3`,
/// and the `@` version separator is stripped (`python@3` -> `python3`).
pub fn normalize(python: &str) -> String {
    let python = if python == "python" { "python3" } else { python };
    python.replace('@', "")
}
