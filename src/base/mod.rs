//! Foundation types for the indexer.
//!
//! This module provides fundamental types used throughout the crate:
//! - [`FileId`], [`NodeId`], [`SymbolRef`], [`TypeRef`] - Handles into the checked program
//! - [`TextRange`], [`TextSize`] - Source byte positions
//! - [`Position`], [`LineRange`], [`LineIndex`] - Line/character conversion
//!
//! This module has NO dependencies on other modules of this crate.

mod ids;
mod span;

pub use ids::{FileId, NodeId, SymbolRef, TypeRef};
pub use span::{LineIndex, LineRange, Position, TextRange, TextSize};

// Re-export text-size types for convenience
pub use text_size;
