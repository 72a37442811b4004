//! Errors raised by an indexing run.
//!
//! Lifecycle violations are programming errors: they abort the run and the
//! partially written graph is not usable. Oracle gaps never show up here;
//! they are absorbed where they are detected.

use thiserror::Error;

use crate::graph::VertexLabel;
use crate::index::SymbolId;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("symbol data for `{0}` has already been cleared")]
    SymbolDataCleared(SymbolId),

    #[error("document data for `{0}` has already been cleared")]
    DocumentCleared(String),

    #[error("partition of symbol `{symbol}` for `{document}` has already been cleared")]
    PartitionCleared { symbol: SymbolId, document: String },

    #[error("symbol data for `{0}` is closed")]
    SymbolDataClosed(SymbolId),

    #[error("symbol data for `{0}` has already begun")]
    AlreadyBegun(SymbolId),

    #[error("cyclic resolution of symbol `{0}`")]
    CyclicResolution(SymbolId),

    #[error("{resolver} resolver invoked without a location")]
    MissingLocation { resolver: &'static str },

    #[error("unbalanced document symbol containers at the end of `{0}`")]
    UnbalancedContainers(String),

    #[error("cannot create a `{edge}` edge from a `{label}` vertex")]
    UnexpectedVertex {
        edge: &'static str,
        label: VertexLabel,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl IndexError {
    /// Errors that mean a symbol or document was opened or closed out of order.
    pub fn is_lifecycle_violation(&self) -> bool {
        matches!(
            self,
            IndexError::SymbolDataCleared(_)
                | IndexError::DocumentCleared(_)
                | IndexError::PartitionCleared { .. }
                | IndexError::SymbolDataClosed(_)
                | IndexError::AlreadyBegun(_)
                | IndexError::UnbalancedContainers(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
