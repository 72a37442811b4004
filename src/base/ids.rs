//! Lightweight handles into the checked program.
//!
//! The oracle owns files, syntax nodes, symbols and types. The indexer only
//! ever holds these `u32` handles and asks the oracle about them.

use std::fmt;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $display:literal) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            pub const fn new(id: u32) -> Self {
                Self(id)
            }

            #[inline]
            pub const fn index(self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            #[inline]
            fn from(id: u32) -> Self {
                Self(id)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($display, "#{}"), self.0)
            }
        }
    };
}

handle!(
    /// A source file of the program.
    ///
    /// The path lives in the [`FileSet`](crate::program::FileSet) that produced it.
    FileId,
    "file"
);

handle!(
    /// A syntax node of some source file.
    ///
    /// Node handles are unique across the whole program, not just one file,
    /// so they can key the per-node lifecycle registry directly.
    NodeId,
    "node"
);

handle!(
    /// The oracle's handle for a semantic symbol.
    ///
    /// Two handles may denote the same semantic symbol (a merged declaration
    /// seen through different files, say). Identity for caching purposes is
    /// the content-derived [`SymbolId`](crate::index::SymbolId), never this handle.
    SymbolRef,
    "symbol"
);

handle!(
    /// The oracle's handle for a type.
    TypeRef,
    "type"
);

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn test_formatting() {
        assert_eq!(FileId::new(3).to_string(), "file#3");
        assert_eq!(format!("{:?}", FileId::new(3)), "FileId(3)");
        assert_eq!(format!("{:?}", SymbolRef::from(7)), "SymbolRef(7)");
        assert_eq!(TypeRef::new(0).to_string(), "type#0");
    }

    #[test]
    fn test_handles_hash_by_index() {
        let mut set = FxHashSet::default();
        set.insert(NodeId::new(1));
        set.insert(NodeId::new(2));
        set.insert(NodeId::new(1));

        assert_eq!(set.len(), 2);
    }
}
