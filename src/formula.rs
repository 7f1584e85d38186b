//! Formula manifests - the declarative side of an install.
//!
//! A formula is a JSON manifest naming the target project (source tarball plus
//! checksum), the pythons it depends on, and a flat, pre-resolved list of
//! pinned resources. Everything here is inert data; the decisions live in
//! [`crate::resolver`] and [`crate::installer`].

use crate::error::Result;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A single pinned, hash-verified dependency archive.
///
/// Resources carry no dependency edges of their own: the list in the formula
/// is assumed already flattened, and installation order is list order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,
    pub url: String,
    pub sha256: String,
}

/// Formula manifest for a Python command-line tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Formula {
    pub name: String,
    pub version: String,
    /// Source tarball for the target project itself.
    pub url: String,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub homepage: Option<String>,
    /// Declared dependencies, e.g. `["python3", "pkg-config"]`. Only the
    /// python entries matter to interpreter resolution.
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub resources: Vec<Resource>,
}

impl Formula {
    /// Load a formula manifest from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read formula: {}", path.display()))?;
        let formula: Formula = serde_json::from_str(&contents)?;
        Ok(formula)
    }

    /// The ordered resource list, installed in full before the target.
    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// Whether this formula declares a dependency on the given python.
    ///
    /// Only python spellings count: a non-python dependency is never "needed"
    /// here even when declared. Matches the declared name exactly: `python3`
    /// does not imply `python`, and vice versa.
    pub fn needs_python(&self, python: &str) -> bool {
        crate::resolver::PYTHON_CANDIDATES.contains(&python)
            && self.dependencies.iter().any(|d| d == python)
    }
}
