//! Errors raised while loading or validating a serialized model.

use crate::SymbolId;

/// A malformed compilation model.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("invalid program model: {0}")]
    Json(#[from] serde_json::Error),

    #[error("symbol #{index} is stored with id {found:?}")]
    MisplacedSymbol { index: usize, found: SymbolId },

    #[error("symbol '{owner}' refers to unknown symbol {target:?}")]
    DanglingReference { owner: String, target: SymbolId },
}
