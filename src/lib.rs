//! Library interface for pykeg - the virtualenv formula installer
//!
//! This library exposes core functionality for testing and potential future use.

pub mod cellar;
pub mod download;
pub mod error;
pub mod extract;
pub mod formula;
pub mod installer;
pub mod receipt;
pub mod resolver;
pub mod symlink;
pub mod venv;

// Re-export commonly used types
pub use error::{PykegError, Result};
pub use formula::{Formula, Resource};
pub use installer::{InstallOptions, install};
pub use venv::{CommandRunner, InstallState, SystemRunner, Venv};
