//! Entry-file resolution (spec §4.F).

use typings_config::manifest::BrowserField;
use typings_resolve::tree::TreeNodeData;
use typings_util::fetch::{fetch_text, FetchConfig};
use typings_util::locator::{is_definition, join_location};

use crate::error::CompileError;

/// Which output the caller is assembling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Main,
    Browser,
}

/// A resolved entry file: its joined location and fetched text.
pub struct ResolvedEntry {
    pub location: String,
    pub content: String,
}

/// Resolve and read `node`'s entry file for `target`, relative to `dir` (the
/// directory its `src` manifest lives in). `namespace` is the node's
/// fully-namespaced diagnostic name (e.g. `root` or `root~a~b`) and is what
/// gets surfaced in any error (§7 class 2: "surfaced with the
/// fully-namespaced dependency name").
///
/// # Errors
/// `EntryResolution` if the node defines no usable entry; `EntryNotFound` if
/// a `main`-derived `.d.ts` substitute does not exist; `TypingsReadFailure`
/// if a chosen entry cannot be read.
pub fn resolve_entry(
    node: &TreeNodeData,
    target: Target,
    dir: &str,
    namespace: &str,
    fetch_config: &FetchConfig,
) -> Result<ResolvedEntry, CompileError> {
    if target == Target::Browser {
        if let Some(browser_typings) = &node.browser_typings {
            return read_entry(browser_typings, dir, namespace, fetch_config);
        }
    }

    if let Some(typings) = &node.typings {
        return read_entry(typings, dir, namespace, fetch_config);
    }

    let Some(main) = effective_main(node, target) else {
        return Err(CompileError::EntryResolution { name: namespace.to_owned() });
    };

    if is_definition(&main) {
        return read_entry(&main, dir, namespace, fetch_config);
    }

    let substituted = substitute_dts(&main);
    let location = join_location(dir, &substituted);
    match fetch_text(&location, fetch_config) {
        Ok(content) => Ok(ResolvedEntry { location, content }),
        Err(_) => Err(CompileError::EntryNotFound { name: namespace.to_owned() }),
    }
}

fn read_entry(path: &str, dir: &str, name: &str, fetch_config: &FetchConfig) -> Result<ResolvedEntry, CompileError> {
    let location = join_location(dir, path);
    let content = fetch_text(&location, fetch_config).map_err(|_| CompileError::TypingsReadFailure {
        namespace: name.to_owned(),
    })?;
    Ok(ResolvedEntry { location, content })
}

/// `main`, overridden for the browser target when `browser` is a bare
/// replacement string rather than a specifier map (§4.F rule 3).
fn effective_main(node: &TreeNodeData, target: Target) -> Option<String> {
    if target == Target::Browser {
        if let Some(BrowserField::Entry(replacement)) = &node.browser {
            return Some(replacement.clone());
        }
    }
    node.main.clone()
}

/// Replace `main`'s extension with `.d.ts`: `"index.js"` → `"index.d.ts"`.
fn substitute_dts(main: &str) -> String {
    match main.rfind('.') {
        Some(idx) => format!("{}.d.ts", main.get(..idx).unwrap_or(main)),
        None => format!("{main}.d.ts"),
    }
}
