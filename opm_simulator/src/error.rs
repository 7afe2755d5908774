//! Error types for data synthesis

use opm_common::config::ConfigError;
use opm_common::store::StoreError;
use thiserror::Error;

/// Errors that can occur while synthesizing a dataset.
///
/// Invariant violations inside the simulator (negative interval, broken
/// START/STOP alternation) are programming errors and abort the run via
/// `assert!`; they are deliberately not represented here.
#[derive(Error, Debug)]
pub enum SimError {
    /// A statistical parameter produced an unusable distribution.
    #[error("invalid distribution parameter: {0}")]
    Distribution(String),

    /// Configuration error
    #[error("configuration error: {source}")]
    Config {
        /// Source configuration error
        #[from]
        source: ConfigError,
    },

    /// Store error
    #[error("store error: {source}")]
    Store {
        /// Source store error
        #[from]
        source: StoreError,
    },
}

/// Result type for simulator operations
pub type SimResult<T> = Result<T, SimError>;
