//! The source files of a program and where they come from.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::base::FileId;

/// Where a source file was loaded from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FileOrigin {
    /// Part of the project being indexed.
    #[default]
    Project,
    /// One of the checker's bundled `lib.*.d.ts` files.
    DefaultLibrary,
    /// A dependency, typically under `node_modules`.
    ExternalLibrary,
}

#[derive(Clone, Debug)]
struct SourceFile {
    path: PathBuf,
    text: Arc<str>,
    origin: FileOrigin,
    declaration: bool,
}

/// Registry of source files keyed by [`FileId`].
///
/// Files keep the id of their first registration; registering a path again
/// replaces its text. Iteration follows registration order.
#[derive(Debug, Default)]
pub struct FileSet {
    inner: RwLock<Files>,
}

#[derive(Debug, Default)]
struct Files {
    by_path: IndexMap<PathBuf, FileId>,
    by_id: IndexMap<FileId, SourceFile>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `path` with `text`, returning its id.
    pub fn add(&self, path: &Path, text: impl Into<Arc<str>>) -> FileId {
        let text = text.into();
        let mut files = self.inner.write();
        if let Some(&id) = files.by_path.get(path) {
            if let Some(file) = files.by_id.get_mut(&id) {
                file.text = text;
            }
            return id;
        }

        let id = FileId::new(files.by_id.len() as u32);
        files.by_path.insert(path.to_owned(), id);
        files.by_id.insert(
            id,
            SourceFile {
                path: path.to_owned(),
                text,
                origin: FileOrigin::Project,
                declaration: is_declaration_path(path),
            },
        );
        id
    }

    pub fn lookup(&self, path: &Path) -> Option<FileId> {
        self.inner.read().by_path.get(path).copied()
    }

    pub fn path(&self, file: FileId) -> Option<PathBuf> {
        self.inner.read().by_id.get(&file).map(|f| f.path.clone())
    }

    pub fn text(&self, file: FileId) -> Option<Arc<str>> {
        self.inner.read().by_id.get(&file).map(|f| Arc::clone(&f.text))
    }

    pub fn origin(&self, file: FileId) -> Option<FileOrigin> {
        self.inner.read().by_id.get(&file).map(|f| f.origin)
    }

    pub fn set_origin(&self, file: FileId, origin: FileOrigin) {
        if let Some(f) = self.inner.write().by_id.get_mut(&file) {
            f.origin = origin;
        }
    }

    /// Whether the file only declares types (`.d.ts` and friends).
    pub fn is_declaration(&self, file: FileId) -> bool {
        self.inner.read().by_id.get(&file).is_some_and(|f| f.declaration)
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All file ids in registration order.
    pub fn files(&self) -> Vec<FileId> {
        self.inner.read().by_id.keys().copied().collect()
    }
}

/// `.d.ts`, `.d.mts` and `.d.cts` files carry declarations only.
pub fn is_declaration_path(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    [".d.ts", ".d.mts", ".d.cts"]
        .iter()
        .any(|suffix| name.len() > suffix.len() && name.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_ids_follow_registration_order() {
        let files = FileSet::new();
        let a = files.add(Path::new("/p/a.ts"), "a");
        let b = files.add(Path::new("/p/b.ts"), "b");

        assert_ne!(a, b);
        assert_eq!(files.files(), vec![a, b]);
        assert_eq!(files.lookup(Path::new("/p/b.ts")), Some(b));
        assert_eq!(files.lookup(Path::new("/p/c.ts")), None);
    }

    #[test]
    fn test_re_adding_replaces_text() {
        let files = FileSet::new();
        let first = files.add(Path::new("/p/a.ts"), "let a;");
        files.set_origin(first, FileOrigin::ExternalLibrary);
        let second = files.add(Path::new("/p/a.ts"), "let b;");

        assert_eq!(first, second);
        assert_eq!(files.len(), 1);
        assert_eq!(files.text(first).as_deref(), Some("let b;"));
        assert_eq!(files.origin(first), Some(FileOrigin::ExternalLibrary));
    }

    #[rstest]
    #[case("/p/a.ts", false)]
    #[case("/p/a.d.ts", true)]
    #[case("/p/a.d.mts", true)]
    #[case("/p/a.d.cts", true)]
    #[case("/p/.d.ts", false)]
    #[case("/p/a.d.tsx", false)]
    fn test_declaration_paths(#[case] path: &str, #[case] expected: bool) {
        assert_eq!(is_declaration_path(Path::new(path)), expected);
    }
}
