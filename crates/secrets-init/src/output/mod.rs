//! Output adapters
//!
//! - [`shell`] flattens every resolved pair into a sourceable POSIX script.
//! - [`ini`] writes plain-text secrets back into the slots of the INI file they
//!   were read from.

pub mod ini;
pub mod shell;

use std::path::PathBuf;
use thiserror::Error;

/// Failure to open, read or write the output target
#[derive(Debug, Error)]
pub enum OutputError {
    /// The target could not be opened or read
    #[error("Could not open '{}': {source}", path.display())]
    Open {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The target was opened but writing failed
    #[error("Could not write '{}': {source}", path.display())]
    Write {
        /// Target path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The structured file could not be parsed
    #[error("Could not parse '{}': {message}", path.display())]
    Parse {
        /// Target path
        path: PathBuf,
        /// Parser message
        message: String,
    },
}
