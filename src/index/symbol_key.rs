//! Stable identity of semantic symbols.
//!
//! A [`SymbolId`] is the SHA-256 of the coordinates of every declaration of
//! a symbol. Symbols without declarations share one of three sentinel ids,
//! so all such symbols are deliberately treated as one.

use std::fmt;

use rustc_hash::FxHashMap;
use sha2::{Digest, Sha256};
use smol_str::SmolStr;

use crate::base::SymbolRef;
use crate::program::Program;

/// Identity of a symbol within one run; the key of every symbol cache.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(SmolStr);

impl SymbolId {
    pub const UNKNOWN: &'static str = "unknown";
    pub const UNDEFINED: &'static str = "undefined";
    pub const NONE: &'static str = "none";

    pub fn from_raw(raw: impl Into<SmolStr>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// One of the shared ids of declaration-less symbols.
    pub fn is_sentinel(&self) -> bool {
        matches!(
            self.0.as_str(),
            Self::UNKNOWN | Self::UNDEFINED | Self::NONE
        )
    }
}

impl fmt::Debug for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolId({})", self.0)
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Memoizes [`SymbolId`]s per symbol handle.
#[derive(Debug, Default)]
pub struct SymbolKeys {
    memo: FxHashMap<SymbolRef, SymbolId>,
}

impl SymbolKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(&mut self, program: &dyn Program, symbol: SymbolRef) -> SymbolId {
        self.memo
            .entry(symbol)
            .or_insert_with(|| compute_key(program, symbol))
            .clone()
    }
}

/// Compute the id of `symbol` without memoization.
pub fn compute_key(program: &dyn Program, symbol: SymbolRef) -> SymbolId {
    let declarations = program.declarations_of(symbol);
    if declarations.is_empty() {
        let sentinel = if program.is_unknown_symbol(symbol) {
            SymbolId::UNKNOWN
        } else if program.is_undefined_symbol(symbol) {
            SymbolId::UNDEFINED
        } else {
            SymbolId::NONE
        };
        return SymbolId::from_raw(sentinel);
    }

    let mut hasher = Sha256::new();
    for decl in declarations {
        let path = program
            .file_path(program.node_file(decl))
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let range = program.range(decl);
        hasher.update(path.as_bytes());
        hasher.update(format!(":{}:{};", u32::from(range.start()), u32::from(range.end())));
    }
    SymbolId::from_raw(hex::encode(hasher.finalize()))
}
