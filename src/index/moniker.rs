//! Moniker identifiers.
//!
//! A `tsc` moniker is `<module path>:<export path>` for symbols living in
//! modules and the bare export path for global and library symbols. A
//! [`MonikerLinker`] can map it to a package-qualified moniker.

use std::path::{Component, Path};

use super::symbols::LocationKind;

pub const TSC_SCHEME: &str = "tsc";
pub const NPM_SCHEME: &str = "npm";

const EXTENSIONS: [&str; 5] = [".d.ts", ".ts", ".tsx", ".js", ".jsx"];

/// `path` relative to `root`, `/`-separated, without its source extension.
///
/// Paths outside `root` are kept whole.
pub fn module_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let joined = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            Component::ParentDir => Some("..".into()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    strip_extension(&joined).to_owned()
}

fn strip_extension(path: &str) -> &str {
    EXTENSIONS
        .iter()
        .find_map(|ext| path.strip_suffix(ext))
        .unwrap_or(path)
}

/// The `tsc` identifier of a symbol with the given export path.
pub fn tsc_identifier(kind: LocationKind, module_path: &str, export_path: &str) -> String {
    match kind {
        LocationKind::Module => format!("{module_path}:{export_path}"),
        LocationKind::Global | LocationKind::Library => export_path.to_owned(),
    }
}

/// Maps a `tsc` identifier to a package-qualified one.
pub trait MonikerLinker {
    fn scheme(&self) -> &str {
        NPM_SCHEME
    }

    fn link(&self, tsc_identifier: &str) -> Option<String>;
}

/// Links module monikers into an npm package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NpmMonikerLinker {
    name: String,
    version: String,
    /// Module path of the package entry point, extension stripped.
    main: Option<String>,
}

impl NpmMonikerLinker {
    pub fn new(name: impl Into<String>, version: impl Into<String>, main: Option<&str>) -> Self {
        let main = main.map(|m| {
            let trimmed = m.trim_start_matches("./");
            strip_extension(trimmed).to_owned()
        });
        Self {
            name: name.into(),
            version: version.into(),
            main,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl MonikerLinker for NpmMonikerLinker {
    fn link(&self, tsc_identifier: &str) -> Option<String> {
        let (module, export) = tsc_identifier.split_once(':')?;
        if self.main.as_deref() == Some(module) {
            Some(format!("{}::{export}", self.name))
        } else {
            Some(format!("{}:{module}:{export}", self.name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/p/a.ts", "a")]
    #[case("/p/src/util.tsx", "src/util")]
    #[case("/p/types/index.d.ts", "types/index")]
    #[case("/p/lib/x.js", "lib/x")]
    #[case("/other/b.ts", "other/b")]
    fn test_module_path(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(module_path(Path::new("/p"), Path::new(path)), expected);
    }

    #[test]
    fn test_tsc_identifier() {
        assert_eq!(tsc_identifier(LocationKind::Module, "a", ""), "a:");
        assert_eq!(tsc_identifier(LocationKind::Module, "a", "x"), "a:x");
        assert_eq!(tsc_identifier(LocationKind::Global, "g", "Array"), "Array");
        assert_eq!(tsc_identifier(LocationKind::Library, "lib", "Array.push"), "Array.push");
    }

    #[test]
    fn test_npm_linking() {
        let linker = NpmMonikerLinker::new("pkg", "1.0.0", Some("./lib/index.js"));

        assert_eq!(linker.link("lib/index:x").as_deref(), Some("pkg::x"));
        assert_eq!(linker.link("src/a:C.m").as_deref(), Some("pkg:src/a:C.m"));
        assert_eq!(linker.link("Array"), None);
        assert_eq!(linker.scheme(), "npm");
        assert_eq!(linker.version(), "1.0.0");
    }
}
