//! Run configuration.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{IndexError, Result};
use crate::index::NpmMonikerLinker;

/// Options of one indexing run.
///
/// Deserializes from camelCase JSON; every field may be omitted.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexOptions {
    /// Root that moniker module paths are relative to.
    pub project_root: PathBuf,
    pub emit_hover: bool,
    pub emit_monikers: bool,
    pub emit_document_symbols: bool,
    /// Package the project is published as; enables npm monikers.
    pub package: Option<PackageInfo>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("/"),
            emit_hover: true,
            emit_monikers: true,
            emit_document_symbols: true,
            package: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PackageInfo {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub main: Option<String>,
}

impl IndexOptions {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            ..Self::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| IndexError::Config(err.to_string()))
    }

    /// The npm linker for the configured package, if any.
    pub fn linker(&self) -> Option<NpmMonikerLinker> {
        self.package
            .as_ref()
            .map(|pkg| NpmMonikerLinker::new(&pkg.name, &pkg.version, pkg.main.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MonikerLinker;

    #[test]
    fn test_defaults_from_empty_object() {
        let options = IndexOptions::from_json_str("{}").unwrap();
        assert_eq!(options, IndexOptions::default());
        assert!(options.emit_hover && options.emit_monikers && options.emit_document_symbols);
        assert!(options.linker().is_none());
    }

    #[test]
    fn test_camel_case_fields() {
        let json = r#"{
            "projectRoot": "/work/app",
            "emitHover": false,
            "package": { "name": "app", "version": "2.0.0", "main": "./dist/index.js" }
        }"#;
        let options = IndexOptions::from_json_str(json).unwrap();

        assert_eq!(options.project_root, PathBuf::from("/work/app"));
        assert!(!options.emit_hover);
        assert!(options.emit_monikers);
        let linker = options.linker().unwrap();
        assert_eq!(linker.link("dist/index:run").as_deref(), Some("app::run"));
    }

    #[test]
    fn test_invalid_json_is_a_config_error() {
        let err = IndexOptions::from_json_str(r#"{"emitHover": "yes"}"#).unwrap_err();
        assert!(matches!(err, IndexError::Config(_)));
        assert!(!err.is_lifecycle_violation());
    }
}
