//! Error taxonomy for the chain database manager.

use shared_types::ChainId;
use thiserror::Error;

/// Errors returned by [`crate::ChainDbManager`].
#[derive(Debug, Error)]
pub enum ChainDbError {
    /// The database file (or its parent directory) could not be opened.
    ///
    /// Reference: spec.md §7 — "Fatal: DB open failure on a required path
    /// ... crash with nonzero exit."
    #[error("failed to open chain db for {chain_id}: {source}")]
    Open {
        /// Chain the open was attempted for.
        chain_id: ChainId,
        /// Underlying sqlite error.
        #[source]
        source: rusqlite::Error,
    },

    /// A PRAGMA statement required by spec.md §4.2 failed to apply.
    #[error("failed to configure chain db for {chain_id}: {source}")]
    Configure {
        /// Chain the configuration was attempted for.
        chain_id: ChainId,
        /// Underlying sqlite error.
        #[source]
        source: rusqlite::Error,
    },

    /// `CloseChainDB` was asked to close a chain with no open handle.
    #[error("no open database for chain {0}")]
    NotOpen(ChainId),

    /// The base directory could not be created.
    #[error("failed to create database directory {path}: {source}")]
    CreateDir {
        /// Path that failed to be created.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
