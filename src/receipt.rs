//! Install receipts written into each keg.
//!
//! `INSTALL_RECEIPT.json` records what was installed and with which
//! interpreter, so the surrounding package manager can inspect kegs without
//! re-reading formulae.

use crate::error::Result;
use crate::formula::Formula;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
pub struct InstallReceipt {
    pub pykeg_version: String,
    pub formula: String,
    pub version: String,
    pub interpreter: String,
    pub pip_pinned: bool,
    pub resources: Vec<String>,
    pub time: i64,
}

impl InstallReceipt {
    pub fn new(formula: &Formula, interpreter: &str, pip_pinned: bool) -> Self {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        Self {
            pykeg_version: env!("CARGO_PKG_VERSION").to_string(),
            formula: formula.name.clone(),
            version: formula.version.clone(),
            interpreter: interpreter.to_string(),
            pip_pinned,
            resources: formula.resources().iter().map(|r| r.name.clone()).collect(),
            time: now,
        }
    }

    /// Write receipt to INSTALL_RECEIPT.json in the keg
    pub fn write(&self, keg: &Path) -> Result<()> {
        let receipt_path = keg.join("INSTALL_RECEIPT.json");
        let json =
            serde_json::to_string_pretty(self).context("Failed to serialize install receipt")?;

        fs::write(&receipt_path, json)
            .with_context(|| format!("Failed to write receipt: {}", receipt_path.display()))?;

        Ok(())
    }

    /// Read an existing INSTALL_RECEIPT.json from a keg
    pub fn read(keg: &Path) -> Result<Self> {
        let receipt_path = keg.join("INSTALL_RECEIPT.json");
        let contents = fs::read_to_string(&receipt_path)
            .with_context(|| format!("Failed to read receipt: {}", receipt_path.display()))?;
        let receipt: Self = serde_json::from_str(&contents)?;
        Ok(receipt)
    }
}
