//! The three manifest shapes consumed by the resolver (spec §4.C, §6).

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::dependency::DependencyValue;
use crate::error::ManifestError;

/// `browser` may be a single replacement entry or a specifier → specifier map.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BrowserField {
    Entry(String),
    Map(BTreeMap<String, String>),
}

/// The native `typings.json` manifest. Unknown keys are ignored (§6), unlike
/// the strict npm/bower readers — ecosystems here are genuinely optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NativeManifest {
    pub name: Option<String>,
    pub main: Option<String>,
    pub browser: Option<BrowserField>,
    pub typings: Option<String>,
    #[serde(rename = "browserTypings")]
    pub browser_typings: Option<String>,
    #[serde(default)]
    pub ambient: bool,
    #[serde(default)]
    pub dependencies: BTreeMap<String, DependencyValue>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, DependencyValue>,
    #[serde(default, rename = "ambientDependencies")]
    pub ambient_dependencies: BTreeMap<String, DependencyValue>,
    #[serde(default, rename = "ambientDevDependencies")]
    pub ambient_dev_dependencies: BTreeMap<String, DependencyValue>,
}

/// The npm-style `package.json` manifest, read for its typings-relevant
/// fields only.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NpmManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub main: Option<String>,
    pub browser: Option<BrowserField>,
    pub typings: Option<String>,
    #[serde(rename = "browserTypings")]
    pub browser_typings: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "optionalDependencies")]
    pub optional_dependencies: BTreeMap<String, String>,
}

impl NpmManifest {
    /// `dependencies` overlaid by `optionalDependencies` (§9 open-question
    /// resolution: optional wins on key collision).
    pub fn effective_dependencies(&self) -> BTreeMap<String, String> {
        let mut merged = self.dependencies.clone();
        merged.extend(self.optional_dependencies.clone());
        merged
    }
}

/// The bower-style `bower.json` manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BowerManifest {
    pub name: Option<String>,
    pub version: Option<String>,
    pub main: Option<String>,
    pub browser: Option<BrowserField>,
    pub typings: Option<String>,
    #[serde(rename = "browserTypings")]
    pub browser_typings: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
}

/// `.bowerrc`, read alongside `bower.json` for the components directory.
#[derive(Debug, Clone, Deserialize)]
pub struct BowerRc {
    pub directory: Option<String>,
}

impl BowerRc {
    pub const DEFAULT_DIRECTORY: &'static str = "bower_components";

    pub fn directory_or_default(&self) -> &str {
        self.directory.as_deref().unwrap_or(Self::DEFAULT_DIRECTORY)
    }
}

/// Read and parse `path` as a native manifest.
///
/// Returns `Ok(None)` when the file does not exist — a missing manifest is
/// not an error (§4.C); only malformed JSON is.
///
/// # Errors
/// Returns `ManifestError::Read` if the file exists but cannot be read, or
/// `ManifestError::Parse` if its content is not valid JSON.
pub fn read_native(path: &Path) -> Result<Option<NativeManifest>, ManifestError> {
    read_json(path)
}

/// Read and parse `path` as an npm-style manifest. See [`read_native`].
///
/// # Errors
/// As [`read_native`].
pub fn read_npm(path: &Path) -> Result<Option<NpmManifest>, ManifestError> {
    read_json(path)
}

/// Read and parse `path` as a bower-style manifest. See [`read_native`].
///
/// # Errors
/// As [`read_native`].
pub fn read_bower(path: &Path) -> Result<Option<BowerManifest>, ManifestError> {
    read_json(path)
}

/// Read and parse `path` as a `.bowerrc`. See [`read_native`].
///
/// # Errors
/// As [`read_native`].
pub fn read_bowerrc(path: &Path) -> Result<Option<BowerRc>, ManifestError> {
    read_json(path)
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, ManifestError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ManifestError::Read {
                path: path.display().to_string(),
                source,
            })
        }
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| ManifestError::Parse {
            path: path.display().to_string(),
            source,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn read_native_missing_file_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let result = read_native(&tmp.path().join("typings.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn read_native_parses_known_fields() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("typings.json");
        std::fs::write(
            &path,
            r#"{"name":"dep","typings":"typed.d.ts","ambient":true,"dependencies":{"a":"npm:a","b":["npm:b","file:./b.d.ts"]}}"#,
        )
        .unwrap();

        let manifest = read_native(&path).unwrap().unwrap();
        assert_eq!(manifest.name.as_deref(), Some("dep"));
        assert_eq!(manifest.typings.as_deref(), Some("typed.d.ts"));
        assert!(manifest.ambient);
        assert_eq!(
            manifest.dependencies.get("a"),
            Some(&DependencyValue::Single("npm:a".to_owned()))
        );
        assert_eq!(
            manifest.dependencies.get("b"),
            Some(&DependencyValue::List(vec![
                "npm:b".to_owned(),
                "file:./b.d.ts".to_owned()
            ]))
        );
    }

    #[test]
    fn read_native_ignores_unknown_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("typings.json");
        std::fs::write(&path, r#"{"name":"dep","totallyUnknown":{"x":1}}"#).unwrap();

        let manifest = read_native(&path).unwrap().unwrap();
        assert_eq!(manifest.name.as_deref(), Some("dep"));
    }

    #[test]
    fn read_native_malformed_json_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("typings.json");
        std::fs::write(&path, "{not json").unwrap();

        let result = read_native(&path);
        assert!(matches!(result, Err(ManifestError::Parse { .. })));
    }

    #[test]
    fn npm_effective_dependencies_optional_overrides() {
        let manifest = NpmManifest {
            dependencies: BTreeMap::from([("a".to_owned(), "1.0.0".to_owned())]),
            optional_dependencies: BTreeMap::from([("a".to_owned(), "2.0.0".to_owned())]),
            ..Default::default()
        };
        assert_eq!(
            manifest.effective_dependencies().get("a"),
            Some(&"2.0.0".to_owned())
        );
    }

    #[test]
    fn bowerrc_defaults_directory() {
        let rc = BowerRc { directory: None };
        assert_eq!(rc.directory_or_default(), "bower_components");
    }

    #[test]
    fn bowerrc_honors_custom_directory() {
        let rc = BowerRc {
            directory: Some("components".to_owned()),
        };
        assert_eq!(rc.directory_or_default(), "components");
    }

    #[test]
    fn browser_field_entry_variant() {
        let parsed: BrowserField = serde_json::from_str("\"browser.d.ts\"").unwrap();
        assert!(matches!(parsed, BrowserField::Entry(s) if s == "browser.d.ts"));
    }

    #[test]
    fn browser_field_map_variant() {
        let parsed: BrowserField = serde_json::from_str(r#"{"./a":"./b"}"#).unwrap();
        match parsed {
            BrowserField::Map(map) => assert_eq!(map.get("./a"), Some(&"./b".to_owned())),
            BrowserField::Entry(_) => panic!("expected Map variant"),
        }
    }
}
