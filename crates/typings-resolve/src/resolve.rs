//! The tree resolver (spec §4.E): three-ecosystem concurrent fan-out, overlay
//! merge, cycle detection, missing-node handling.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use typings_config::dependency::{DependencyDescriptor, DependencyValue};
use typings_config::manifest::NativeManifest;
use typings_config::{discovery, manifest};
use typings_util::fetch::{fetch_json, FetchConfig};
use typings_util::locator;

use crate::error::ResolveError;
use crate::tree::{graft, Arena, EcosystemKind, NodeId, SubTree, TreeNodeData};

/// Caller-supplied configuration for a resolution run (spec §6).
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Absolute starting directory.
    pub cwd: PathBuf,
    /// Include `devDependencies` at the root.
    pub dev: bool,
    /// Include `ambientDependencies`/`ambientDevDependencies` at the root.
    pub ambient: bool,
    pub proxy: Option<String>,
    pub cache_dir: PathBuf,
}

impl ResolveOptions {
    fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            cache_dir: self.cache_dir.clone(),
            proxy: self.proxy.clone(),
            ..FetchConfig::default()
        }
    }
}

/// The fully resolved tree.
pub struct ResolvedTree {
    pub arena: Arena,
    pub root: NodeId,
}

/// Resolve all three ecosystems from `options.cwd` and merge them into a
/// single root (§4.E).
///
/// # Errors
/// Returns `ResolveError::CircularDependency` if a cycle is found, or a
/// propagated manifest/fetch error for a malformed (not merely absent)
/// manifest.
pub fn resolve_dependencies(options: &ResolveOptions) -> Result<ResolvedTree, ResolveError> {
    let (bower_result, (npm_result, native_result)) = rayon::join(
        || resolve_bower_root(options),
        || rayon::join(|| resolve_npm_root(options), || resolve_native_root(options)),
    );

    let bower = bower_result?;
    let npm = npm_result?;
    let native = native_result?;

    let (arena, root) = merge_ecosystem_roots(bower, npm, native);
    Ok(ResolvedTree { arena, root })
}

// ---------------------------------------------------------------------
// Ecosystem root discovery
// ---------------------------------------------------------------------

fn resolve_native_root(options: &ResolveOptions) -> Result<SubTree, ResolveError> {
    match discovery::find_upward(&options.cwd, "typings.json") {
        Some(path) => resolve_native_node(&path, Vec::new(), true, options),
        None => Ok(missing_subtree(EcosystemKind::Native, "typings.json")),
    }
}

fn resolve_npm_root(options: &ResolveOptions) -> Result<SubTree, ResolveError> {
    match discovery::find_upward(&options.cwd, "package.json") {
        Some(path) => resolve_npm_node(&path, Vec::new(), true, options),
        None => Ok(missing_subtree(EcosystemKind::Npm, "package.json")),
    }
}

fn resolve_bower_root(options: &ResolveOptions) -> Result<SubTree, ResolveError> {
    match discovery::find_upward(&options.cwd, "bower.json") {
        Some(path) => resolve_bower_node(&path, Vec::new(), true, options),
        None => Ok(missing_subtree(EcosystemKind::Bower, "bower.json")),
    }
}

fn missing_subtree(ecosystem: EcosystemKind, name: &str) -> SubTree {
    let mut arena = Arena::new();
    let id = arena.push(TreeNodeData::missing_node(name.to_owned(), ecosystem));
    (arena, id)
}

// ---------------------------------------------------------------------
// Cycle check
// ---------------------------------------------------------------------

fn check_cycle(ancestors: &[String], src: &str) -> Result<(), ResolveError> {
    if ancestors.iter().any(|s| s == src) {
        let mut chain = ancestors.to_vec();
        chain.push(src.to_owned());
        return Err(ResolveError::CircularDependency {
            chain: chain.join(" -> "),
        });
    }
    Ok(())
}

fn descend(ancestors: &[String], src: &str) -> Vec<String> {
    let mut next = ancestors.to_vec();
    next.push(src.to_owned());
    next
}

// ---------------------------------------------------------------------
// Native ecosystem
// ---------------------------------------------------------------------

fn resolve_native_node(
    path: &Path,
    ancestors: Vec<String>,
    is_root: bool,
    options: &ResolveOptions,
) -> Result<SubTree, ResolveError> {
    let src = path.display().to_string();
    check_cycle(&ancestors, &src)?;

    let Some(parsed) = manifest::read_native(path)? else {
        return Ok(missing_subtree(EcosystemKind::Native, &src));
    };
    let dir = path.parent().unwrap_or(path).to_path_buf();
    resolve_native_manifest(src, &dir, &parsed, ancestors, is_root, options)
}

fn resolve_native_manifest(
    src: String,
    dir: &Path,
    parsed: &NativeManifest,
    ancestors: Vec<String>,
    is_root: bool,
    options: &ResolveOptions,
) -> Result<SubTree, ResolveError> {
    let mut arena = Arena::new();
    let node_id = arena.push(TreeNodeData {
        src: src.clone(),
        ecosystem: EcosystemKind::Native,
        missing: false,
        ambient: parsed.ambient,
        name: parsed.name.clone(),
        version: None,
        main: parsed.main.clone(),
        browser: parsed.browser.clone(),
        typings: parsed.typings.clone(),
        browser_typings: parsed.browser_typings.clone(),
        raw: None,
        parent: None,
        dependencies: BTreeMap::new(),
        dev_dependencies: BTreeMap::new(),
        ambient_dependencies: BTreeMap::new(),
        ambient_dev_dependencies: BTreeMap::new(),
    });

    let children_ancestors = descend(&ancestors, &src);
    let expand_dev = is_root && options.dev;
    let expand_ambient = is_root && options.ambient;

    expand_native_map(
        &mut arena,
        node_id,
        &parsed.dependencies,
        dir,
        &children_ancestors,
        options,
        false,
        |n| &mut n.dependencies,
    )?;
    if expand_dev {
        expand_native_map(
            &mut arena,
            node_id,
            &parsed.dev_dependencies,
            dir,
            &children_ancestors,
            options,
            false,
            |n| &mut n.dev_dependencies,
        )?;
    }
    if expand_ambient {
        expand_native_map(
            &mut arena,
            node_id,
            &parsed.ambient_dependencies,
            dir,
            &children_ancestors,
            options,
            true,
            |n| &mut n.ambient_dependencies,
        )?;
        if expand_dev {
            expand_native_map(
                &mut arena,
                node_id,
                &parsed.ambient_dev_dependencies,
                dir,
                &children_ancestors,
                options,
                true,
                |n| &mut n.ambient_dev_dependencies,
            )?;
        }
    }

    Ok((arena, node_id))
}

/// Resolve every entry of a native dependency map and install the results
/// into the map selected by `target` on `node_id`, forcing `ambient: true`
/// on each child when `mark_ambient` is set (I4).
#[allow(clippy::too_many_arguments)]
fn expand_native_map(
    arena: &mut Arena,
    node_id: NodeId,
    map: &BTreeMap<String, DependencyValue>,
    dir: &Path,
    ancestors: &[String],
    options: &ResolveOptions,
    mark_ambient: bool,
    target: impl Fn(&mut TreeNodeData) -> &mut BTreeMap<String, NodeId>,
) -> Result<(), ResolveError> {
    for (key, value) in map {
        let (child_arena, child_root) = resolve_native_candidates(value, dir, ancestors, options)?;
        let child_id = graft(arena, &child_arena, child_root, Some(node_id));
        if mark_ambient {
            arena.get_mut(child_id).ambient = true;
        }
        target(arena.get_mut(node_id)).insert(key.clone(), child_id);
    }
    Ok(())
}

/// Try each candidate in `value` in order, accepting the first non-missing
/// result (B1).
fn resolve_native_candidates(
    value: &DependencyValue,
    dir: &Path,
    ancestors: &[String],
    options: &ResolveOptions,
) -> Result<SubTree, ResolveError> {
    let mut last = None;
    for candidate in value.candidates() {
        let descriptor = DependencyDescriptor::from_str(candidate)?;
        let subtree = resolve_descriptor(&descriptor, candidate, dir, ancestors, options)?;
        if !subtree.0.get(subtree.1).missing {
            return Ok(subtree);
        }
        last = Some(subtree);
    }
    Ok(last.unwrap_or_else(|| missing_subtree(EcosystemKind::Native, "")))
}

fn resolve_descriptor(
    descriptor: &DependencyDescriptor,
    raw: &str,
    dir: &Path,
    ancestors: &[String],
    options: &ResolveOptions,
) -> Result<SubTree, ResolveError> {
    let subtree = match descriptor {
        DependencyDescriptor::File { path } => resolve_file_candidate(path, dir, ancestors, options)?,
        DependencyDescriptor::Npm { name } => resolve_npm_by_name(name, dir, ancestors, options)?,
        DependencyDescriptor::Bower { name } => resolve_bower_by_name(name, dir, ancestors, options)?,
        DependencyDescriptor::Github { .. } => {
            resolve_remote_candidate(&descriptor.location(), ancestors, options)?
        }
        DependencyDescriptor::Http { url } => resolve_remote_candidate(url, ancestors, options)?,
    };
    let (mut arena, root) = subtree;
    if arena.get(root).raw.is_none() {
        arena.get_mut(root).raw = Some(raw.to_owned());
    }
    Ok((arena, root))
}

/// A `file:`-scheme or bare-path candidate. A `.d.ts` location short-circuits
/// straight to a file node (B2); otherwise it names a directory holding its
/// own native manifest.
fn resolve_file_candidate(
    path: &str,
    dir: &Path,
    ancestors: &[String],
    options: &ResolveOptions,
) -> Result<SubTree, ResolveError> {
    let location = locator::join_location(&dir.display().to_string(), path);
    if locator::is_definition(&location) {
        return Ok(file_node(location));
    }
    let manifest_path = Path::new(&location).join("typings.json");
    resolve_native_node(&manifest_path, ancestors.to_vec(), false, options)
}

fn file_node(location: String) -> SubTree {
    let mut arena = Arena::new();
    let id = arena.push(TreeNodeData {
        typings: Some(location.clone()),
        missing: false,
        ..TreeNodeData::missing_node(location, EcosystemKind::Native)
    });
    (arena, id)
}

/// Search upward from `start_dir` for `node_modules/NAME/package.json`,
/// shared by native `npm:NAME` candidates and an npm manifest's own
/// `dependencies` map (§4.E).
fn find_npm_package(start_dir: &Path, name: &str) -> Option<PathBuf> {
    let mut dir = Some(start_dir);
    while let Some(current) = dir {
        let candidate = current.join("node_modules").join(name).join("package.json");
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn resolve_npm_by_name(
    name: &str,
    dir: &Path,
    ancestors: &[String],
    options: &ResolveOptions,
) -> Result<SubTree, ResolveError> {
    if locator::is_definition(name) {
        return Ok(file_node(locator::join_location(&dir.display().to_string(), name)));
    }
    match find_npm_package(dir, name) {
        Some(path) => resolve_npm_node(&path, ancestors.to_vec(), false, options),
        None => Ok(missing_subtree(EcosystemKind::Npm, name)),
    }
}

/// Resolve the bower components directory for `dir`: the nearest `.bowerrc`
/// ancestor's `directory`, defaulting to `bower_components`.
fn bower_components_dir(dir: &Path) -> PathBuf {
    let default = dir.join(manifest::BowerRc::DEFAULT_DIRECTORY);
    let Some(rc_path) = discovery::find_upward(dir, ".bowerrc") else {
        return default;
    };
    match manifest::read_bowerrc(&rc_path) {
        Ok(Some(rc)) => {
            let base = rc_path.parent().unwrap_or(dir);
            base.join(rc.directory_or_default())
        }
        _ => default,
    }
}

fn resolve_bower_by_name(
    name: &str,
    dir: &Path,
    ancestors: &[String],
    options: &ResolveOptions,
) -> Result<SubTree, ResolveError> {
    if locator::is_definition(name) {
        return Ok(file_node(locator::join_location(&dir.display().to_string(), name)));
    }
    let components = bower_components_dir(dir);
    let manifest_path = components.join(name).join("bower.json");
    resolve_bower_node(&manifest_path, ancestors.to_vec(), false, options)
}

fn resolve_remote_candidate(
    url: &str,
    ancestors: &[String],
    options: &ResolveOptions,
) -> Result<SubTree, ResolveError> {
    check_cycle(ancestors, url)?;
    let value = fetch_json(url, &options.fetch_config())?;
    let parsed: NativeManifest = serde_json::from_value(value).unwrap_or_default();
    resolve_native_manifest(url.to_owned(), Path::new("."), &parsed, ancestors.to_vec(), false, options)
}

// ---------------------------------------------------------------------
// npm ecosystem
// ---------------------------------------------------------------------

fn resolve_npm_node(
    path: &Path,
    ancestors: Vec<String>,
    is_root: bool,
    options: &ResolveOptions,
) -> Result<SubTree, ResolveError> {
    let src = path.display().to_string();
    check_cycle(&ancestors, &src)?;

    let Some(parsed) = manifest::read_npm(path)? else {
        return Ok(missing_subtree(EcosystemKind::Npm, &src));
    };

    let dir = path.parent().unwrap_or(path).to_path_buf();
    let overlay = manifest::read_native(&dir.join("typings.json"))?;

    let mut arena = Arena::new();
    let node_id = arena.push(TreeNodeData {
        src: src.clone(),
        ecosystem: EcosystemKind::Npm,
        missing: false,
        ambient: false,
        name: overlay.as_ref().and_then(|o| o.name.clone()).or_else(|| parsed.name.clone()),
        version: parsed.version.clone(),
        main: overlay_or(overlay.as_ref().and_then(|o| o.main.clone()), parsed.main.clone()),
        browser: overlay_or(overlay.as_ref().and_then(|o| o.browser.clone()), parsed.browser.clone()),
        typings: overlay_or(overlay.as_ref().and_then(|o| o.typings.clone()), parsed.typings.clone()),
        browser_typings: overlay_or(
            overlay.as_ref().and_then(|o| o.browser_typings.clone()),
            parsed.browser_typings.clone(),
        ),
        raw: None,
        parent: None,
        dependencies: BTreeMap::new(),
        dev_dependencies: BTreeMap::new(),
        ambient_dependencies: BTreeMap::new(),
        ambient_dev_dependencies: BTreeMap::new(),
    });

    let children_ancestors = descend(&ancestors, &src);
    let expand_dev = is_root && options.dev;
    let expand_ambient = is_root && options.ambient;

    let effective = parsed.effective_dependencies();
    for key in union_keys(&effective, overlay.as_ref().map(|o| &o.dependencies)) {
        let overlay_value = overlay.as_ref().and_then(|o| o.dependencies.get(key));
        let child = resolve_overlaid_entry(key, overlay_value, EcosystemKind::Npm, &dir, &children_ancestors, options)?;
        let child_id = graft(&mut arena, &child.0, child.1, Some(node_id));
        arena.get_mut(node_id).dependencies.insert(key.clone(), child_id);
    }

    if expand_dev {
        for key in union_keys(&parsed.dev_dependencies, overlay.as_ref().map(|o| &o.dev_dependencies)) {
            let overlay_value = overlay.as_ref().and_then(|o| o.dev_dependencies.get(key));
            let child = resolve_overlaid_entry(key, overlay_value, EcosystemKind::Npm, &dir, &children_ancestors, options)?;
            let child_id = graft(&mut arena, &child.0, child.1, Some(node_id));
            arena.get_mut(node_id).dev_dependencies.insert(key.clone(), child_id);
        }
    }

    if expand_ambient {
        if let Some(overlay) = &overlay {
            expand_native_map(
                &mut arena,
                node_id,
                &overlay.ambient_dependencies,
                &dir,
                &children_ancestors,
                options,
                true,
                |n| &mut n.ambient_dependencies,
            )?;
            if expand_dev {
                expand_native_map(
                    &mut arena,
                    node_id,
                    &overlay.ambient_dev_dependencies,
                    &dir,
                    &children_ancestors,
                    options,
                    true,
                    |n| &mut n.ambient_dev_dependencies,
                )?;
            }
        }
    }

    Ok((arena, node_id))
}

fn overlay_or<T>(overlay: Option<T>, own: Option<T>) -> Option<T> {
    overlay.or(own)
}

/// The key-wise union of an ecosystem manifest's own dependency map and the
/// native overlay's corresponding map (§4.E: the overlay is merged **over**
/// the ecosystem's own map, not just consulted on collision).
fn union_keys<'a, V>(own: &'a BTreeMap<String, String>, overlay: Option<&'a BTreeMap<String, V>>) -> BTreeSet<&'a String> {
    let mut keys: BTreeSet<&String> = own.keys().collect();
    if let Some(overlay) = overlay {
        keys.extend(overlay.keys());
    }
    keys
}

/// Resolve one dependency-map entry that may have been overridden by a
/// native overlay sitting beside the ecosystem manifest (§4.E overlay rule).
fn resolve_overlaid_entry(
    key: &str,
    overlay_value: Option<&DependencyValue>,
    ecosystem: EcosystemKind,
    dir: &Path,
    ancestors: &[String],
    options: &ResolveOptions,
) -> Result<SubTree, ResolveError> {
    if let Some(value) = overlay_value {
        return resolve_native_candidates(value, dir, ancestors, options);
    }
    match ecosystem {
        EcosystemKind::Npm => resolve_npm_by_name(key, dir, ancestors, options),
        EcosystemKind::Bower => resolve_bower_by_name(key, dir, ancestors, options),
        EcosystemKind::Native => unreachable!("native entries never fall back to name search"),
    }
}

// ---------------------------------------------------------------------
// bower ecosystem
// ---------------------------------------------------------------------

fn resolve_bower_node(
    path: &Path,
    ancestors: Vec<String>,
    is_root: bool,
    options: &ResolveOptions,
) -> Result<SubTree, ResolveError> {
    let src = path.display().to_string();
    check_cycle(&ancestors, &src)?;

    let Some(parsed) = manifest::read_bower(path)? else {
        return Ok(missing_subtree(EcosystemKind::Bower, &src));
    };

    let dir = path.parent().unwrap_or(path).to_path_buf();
    let overlay = manifest::read_native(&dir.join("typings.json"))?;

    let mut arena = Arena::new();
    let node_id = arena.push(TreeNodeData {
        src: src.clone(),
        ecosystem: EcosystemKind::Bower,
        missing: false,
        ambient: false,
        name: overlay.as_ref().and_then(|o| o.name.clone()).or_else(|| parsed.name.clone()),
        version: parsed.version.clone(),
        main: overlay_or(overlay.as_ref().and_then(|o| o.main.clone()), parsed.main.clone()),
        browser: overlay_or(overlay.as_ref().and_then(|o| o.browser.clone()), parsed.browser.clone()),
        typings: overlay_or(overlay.as_ref().and_then(|o| o.typings.clone()), parsed.typings.clone()),
        browser_typings: overlay_or(
            overlay.as_ref().and_then(|o| o.browser_typings.clone()),
            parsed.browser_typings.clone(),
        ),
        raw: None,
        parent: None,
        dependencies: BTreeMap::new(),
        dev_dependencies: BTreeMap::new(),
        ambient_dependencies: BTreeMap::new(),
        ambient_dev_dependencies: BTreeMap::new(),
    });

    let children_ancestors = descend(&ancestors, &src);
    let expand_dev = is_root && options.dev;
    let expand_ambient = is_root && options.ambient;

    for key in union_keys(&parsed.dependencies, overlay.as_ref().map(|o| &o.dependencies)) {
        let overlay_value = overlay.as_ref().and_then(|o| o.dependencies.get(key));
        let child = resolve_overlaid_entry(key, overlay_value, EcosystemKind::Bower, &dir, &children_ancestors, options)?;
        let child_id = graft(&mut arena, &child.0, child.1, Some(node_id));
        arena.get_mut(node_id).dependencies.insert(key.clone(), child_id);
    }

    if expand_dev {
        for key in union_keys(&parsed.dev_dependencies, overlay.as_ref().map(|o| &o.dev_dependencies)) {
            let overlay_value = overlay.as_ref().and_then(|o| o.dev_dependencies.get(key));
            let child = resolve_overlaid_entry(key, overlay_value, EcosystemKind::Bower, &dir, &children_ancestors, options)?;
            let child_id = graft(&mut arena, &child.0, child.1, Some(node_id));
            arena.get_mut(node_id).dev_dependencies.insert(key.clone(), child_id);
        }
    }

    if expand_ambient {
        if let Some(overlay) = &overlay {
            expand_native_map(
                &mut arena,
                node_id,
                &overlay.ambient_dependencies,
                &dir,
                &children_ancestors,
                options,
                true,
                |n| &mut n.ambient_dependencies,
            )?;
            if expand_dev {
                expand_native_map(
                    &mut arena,
                    node_id,
                    &overlay.ambient_dev_dependencies,
                    &dir,
                    &children_ancestors,
                    options,
                    true,
                    |n| &mut n.ambient_dev_dependencies,
                )?;
            }
        }
    }

    Ok((arena, node_id))
}

// ---------------------------------------------------------------------
// Merging the three ecosystem roots (§4.E merge rule)
// ---------------------------------------------------------------------

/// Merge the three top-level ecosystem subtrees into one root. Order
/// matters: bower, npm, native — the last subtree that defines ANY of
/// `{main, browser, typings, browserTypings}` wins for all four plus `name`
/// and `src`; dependency maps are a key-wise union, later overwriting
/// earlier.
fn merge_ecosystem_roots(bower: SubTree, npm: SubTree, native: SubTree) -> SubTree {
    let mut dest = Arena::new();
    let merged_id = dest.push(TreeNodeData::missing_node(String::new(), EcosystemKind::Native));

    let mut name = None;
    let mut main = None;
    let mut browser = None;
    let mut typings = None;
    let mut browser_typings = None;
    let mut src = String::new();
    let mut ambient = false;
    let mut all_missing = true;

    let mut dependencies = BTreeMap::new();
    let mut dev_dependencies = BTreeMap::new();
    let mut ambient_dependencies = BTreeMap::new();
    let mut ambient_dev_dependencies = BTreeMap::new();

    for (arena, root_id) in [bower, npm, native] {
        let node = arena.get(root_id);
        if !node.missing {
            all_missing = false;
        }
        let defines_any =
            node.main.is_some() || node.browser.is_some() || node.typings.is_some() || node.browser_typings.is_some();
        if defines_any {
            name = node.name.clone();
            main = node.main.clone();
            browser = node.browser.clone();
            typings = node.typings.clone();
            browser_typings = node.browser_typings.clone();
            src = node.src.clone();
            ambient = node.ambient;
        } else if src.is_empty() {
            src = node.src.clone();
        }

        dependencies.extend(graft_map_entries(&mut dest, &arena, &node.dependencies, merged_id));
        dev_dependencies.extend(graft_map_entries(&mut dest, &arena, &node.dev_dependencies, merged_id));
        ambient_dependencies.extend(graft_map_entries(&mut dest, &arena, &node.ambient_dependencies, merged_id));
        ambient_dev_dependencies.extend(graft_map_entries(
            &mut dest,
            &arena,
            &node.ambient_dev_dependencies,
            merged_id,
        ));
    }

    let merged = dest.get_mut(merged_id);
    merged.src = src;
    merged.name = name;
    merged.main = main;
    merged.browser = browser;
    merged.typings = typings;
    merged.browser_typings = browser_typings;
    merged.ambient = ambient;
    merged.missing = all_missing;
    merged.dependencies = dependencies;
    merged.dev_dependencies = dev_dependencies;
    merged.ambient_dependencies = ambient_dependencies;
    merged.ambient_dev_dependencies = ambient_dev_dependencies;

    (dest, merged_id)
}

fn graft_map_entries(
    dest: &mut Arena,
    other: &Arena,
    map: &BTreeMap<String, NodeId>,
    new_parent: NodeId,
) -> BTreeMap<String, NodeId> {
    map.iter()
        .map(|(key, &child_id)| (key.clone(), graft(dest, other, child_id, Some(new_parent))))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    fn options(cwd: PathBuf) -> ResolveOptions {
        ResolveOptions {
            cwd,
            dev: false,
            ambient: false,
            proxy: None,
            cache_dir: std::env::temp_dir().join("typings-resolve-tests-cache"),
        }
    }

    #[test]
    fn resolve_missing_root_is_all_missing() {
        let tmp = tempfile::tempdir().unwrap();
        let tree = resolve_dependencies(&options(tmp.path().to_path_buf())).unwrap();
        assert!(tree.arena.get(tree.root).missing);
    }

    #[test]
    fn resolve_native_root_only() {
        let tmp = tempfile::tempdir().unwrap();
        write(&tmp.path().join("typings.json"), r#"{"name":"root","typings":"index.d.ts"}"#);

        let tree = resolve_dependencies(&options(tmp.path().to_path_buf())).unwrap();
        let root = tree.arena.get(tree.root);
        assert!(!root.missing);
        assert_eq!(root.name.as_deref(), Some("root"));
        assert_eq!(root.typings.as_deref(), Some("index.d.ts"));
    }

    #[test]
    fn resolve_native_dependency_chain() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("typings.json"),
            r#"{"name":"root","dependencies":{"dep":"file:./dep"}}"#,
        );
        write(&tmp.path().join("dep/typings.json"), r#"{"name":"dep","typings":"dep.d.ts"}"#);

        let tree = resolve_dependencies(&options(tmp.path().to_path_buf())).unwrap();
        let root = tree.arena.get(tree.root);
        let dep_id = *root.dependencies.get("dep").unwrap();
        let dep = tree.arena.get(dep_id);
        assert_eq!(dep.name.as_deref(), Some("dep"));
        assert_eq!(dep.typings.as_deref(), Some("dep.d.ts"));
        assert_eq!(dep.parent, Some(tree.root));
    }

    #[test]
    fn direct_dts_dependency_short_circuits() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("typings.json"),
            r#"{"name":"root","dependencies":{"dep":"file:./dep.d.ts"}}"#,
        );
        write(&tmp.path().join("dep.d.ts"), "export const x: number;");

        let tree = resolve_dependencies(&options(tmp.path().to_path_buf())).unwrap();
        let root = tree.arena.get(tree.root);
        let dep_id = *root.dependencies.get("dep").unwrap();
        let dep = tree.arena.get(dep_id);
        assert!(!dep.missing);
        assert!(dep.typings.as_deref().unwrap().ends_with("dep.d.ts"));
    }

    #[test]
    fn cycle_detection_fails_fatally() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("typings.json"),
            r#"{"name":"root","dependencies":{"a":"file:./a"}}"#,
        );
        write(
            &tmp.path().join("a/typings.json"),
            r#"{"name":"a","dependencies":{"back":"file:.."}}"#,
        );

        let result = resolve_dependencies(&options(tmp.path().to_path_buf()));
        assert!(matches!(result, Err(ResolveError::CircularDependency { .. })));
    }

    #[test]
    fn list_candidates_take_first_success() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("typings.json"),
            r#"{"name":"root","dependencies":{"dep":["file:./missing","file:./dep.d.ts"]}}"#,
        );
        write(&tmp.path().join("dep.d.ts"), "export const y: string;");

        let tree = resolve_dependencies(&options(tmp.path().to_path_buf())).unwrap();
        let root = tree.arena.get(tree.root);
        let dep_id = *root.dependencies.get("dep").unwrap();
        assert!(!tree.arena.get(dep_id).missing);
    }

    #[test]
    fn dev_dependency_excluded_without_dev_flag() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("typings.json"),
            r#"{"name":"root","devDependencies":{"dep":"file:./dep.d.ts"}}"#,
        );
        write(&tmp.path().join("dep.d.ts"), "export const z: boolean;");

        let tree = resolve_dependencies(&options(tmp.path().to_path_buf())).unwrap();
        assert!(tree.arena.get(tree.root).dev_dependencies.is_empty());
    }

    #[test]
    fn ambient_dependency_marks_child_ambient() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("typings.json"),
            r#"{"name":"root","ambientDependencies":{"fs":"file:./fs.d.ts"}}"#,
        );
        write(&tmp.path().join("fs.d.ts"), "export function readFileSync(): void;");

        let mut opts = options(tmp.path().to_path_buf());
        opts.ambient = true;
        let tree = resolve_dependencies(&opts).unwrap();
        let root = tree.arena.get(tree.root);
        let fs_id = *root.ambient_dependencies.get("fs").unwrap();
        assert!(tree.arena.get(fs_id).ambient);
    }

    #[test]
    fn native_overlay_wins_over_npm_fields() {
        let tmp = tempfile::tempdir().unwrap();
        write(&tmp.path().join("package.json"), r#"{"name":"pkg","main":"index.js"}"#);
        write(&tmp.path().join("typings.json"), r#"{"typings":"typed.d.ts"}"#);

        let tree = resolve_dependencies(&options(tmp.path().to_path_buf())).unwrap();
        let root = tree.arena.get(tree.root);
        assert_eq!(root.typings.as_deref(), Some("typed.d.ts"));
    }

    #[test]
    fn overlay_dependency_key_absent_from_npm_manifest_is_still_merged_in() {
        // Exercises `resolve_npm_node` directly (not the full three-ecosystem
        // merge): the native ecosystem root would independently resolve the
        // same `typings.json` and mask a bug scoped to the npm overlay alone.
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("package.json"),
            r#"{"name":"pkg","dependencies":{"a":"^1.0.0"}}"#,
        );
        write(
            &tmp.path().join("typings.json"),
            r#"{"dependencies":{"b":"file:./b.d.ts"}}"#,
        );
        write(&tmp.path().join("b.d.ts"), "export const b: number;");

        let opts = options(tmp.path().to_path_buf());
        let (arena, root_id) =
            resolve_npm_node(&tmp.path().join("package.json"), Vec::new(), true, &opts).unwrap();
        let root = arena.get(root_id);
        assert!(root.dependencies.contains_key("a"));
        let b_id = *root.dependencies.get("b").unwrap();
        assert!(!arena.get(b_id).missing);
    }

    #[test]
    fn native_overlay_dev_override_reads_the_overlay_dev_map() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            &tmp.path().join("package.json"),
            r#"{"name":"pkg","devDependencies":{"dep":"^1.0.0"}}"#,
        );
        write(
            &tmp.path().join("typings.json"),
            r#"{"devDependencies":{"dep":"file:./dep.d.ts"}}"#,
        );
        write(&tmp.path().join("dep.d.ts"), "export const x: number;");

        let mut opts = options(tmp.path().to_path_buf());
        opts.dev = true;
        let (arena, root_id) =
            resolve_npm_node(&tmp.path().join("package.json"), Vec::new(), true, &opts).unwrap();
        let root = arena.get(root_id);
        let dep_id = *root.dev_dependencies.get("dep").unwrap();
        assert!(!arena.get(dep_id).missing);
    }

    #[test]
    fn bower_overlay_dependency_key_absent_from_bower_manifest_is_still_merged_in() {
        let tmp = tempfile::tempdir().unwrap();
        write(&tmp.path().join("bower.json"), r#"{"name":"pkg","dependencies":{"a":"^1.0.0"}}"#);
        write(
            &tmp.path().join("typings.json"),
            r#"{"dependencies":{"b":"file:./b.d.ts"}}"#,
        );
        write(&tmp.path().join("b.d.ts"), "export const b: number;");

        let opts = options(tmp.path().to_path_buf());
        let (arena, root_id) =
            resolve_bower_node(&tmp.path().join("bower.json"), Vec::new(), true, &opts).unwrap();
        let root = arena.get(root_id);
        assert!(root.dependencies.contains_key("a"));
        let b_id = *root.dependencies.get("b").unwrap();
        assert!(!arena.get(b_id).missing);
    }

    proptest::proptest! {
        /// P1: a `src` chain with no repeats never reports a cycle, and
        /// descending it never loses or reorders an ancestor.
        #[test]
        fn acyclic_chains_never_trigger_cycle_detection(names in proptest::collection::vec("[a-z]{1,8}", 0..12)) {
            let mut unique = Vec::new();
            for name in names {
                if !unique.contains(&name) {
                    unique.push(name);
                }
            }

            let mut ancestors: Vec<String> = Vec::new();
            for src in &unique {
                proptest::prop_assert!(check_cycle(&ancestors, src).is_ok());
                ancestors = descend(&ancestors, src);
            }
            proptest::prop_assert_eq!(ancestors, unique);
        }

        /// Re-descending into any name already on the chain is always a
        /// reported cycle, regardless of where it sits in the chain.
        #[test]
        fn repeating_any_ancestor_is_always_a_cycle(
            names in proptest::collection::vec("[a-z]{1,8}", 1..8),
            repeat_idx in 0usize..8,
        ) {
            let mut ancestors: Vec<String> = Vec::new();
            for src in &names {
                if check_cycle(&ancestors, src).is_ok() {
                    ancestors = descend(&ancestors, src);
                }
            }
            if let Some(repeated) = ancestors.get(repeat_idx % ancestors.len().max(1)).cloned() {
                proptest::prop_assert!(check_cycle(&ancestors, &repeated).is_err());
            }
        }
    }
}
