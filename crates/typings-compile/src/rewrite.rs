//! The namespacing rewriter (spec §4.H): walks a resolved tree in post-order
//! and produces one rewritten, namespaced declaration block per node.
//!
//! Within a single node, a relative specifier (`"./foo"`) is chased to its
//! target file and that file is recursively processed the same way, so a
//! node's own declaration content can span more than one emitted block.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use typings_config::manifest::BrowserField;
use typings_resolve::tree::{Arena, NodeId};
use typings_util::fetch::{fetch_text, FetchConfig};
use typings_util::locator::{is_definition, join_location, to_definition};

use crate::entry::{resolve_entry, Target};
use crate::error::CompileError;
use crate::tokenizer::{self, DeclareModule, ParsedDeclaration, Span};

/// Walk `arena` from `root` and produce the emitted blocks for `target`, in
/// the fixed depth-first alphabetical order (§4.H "Ordering and
/// determinism").
pub fn build_blocks(
    arena: &Arena,
    root: NodeId,
    target: Target,
    name: &str,
    meta: bool,
    fetch_config: &FetchConfig,
) -> Result<Vec<String>, CompileError> {
    if arena.get(root).missing {
        return Err(CompileError::MissingRoot { name: name.to_owned() });
    }

    let mut blocks = Vec::new();
    walk(arena, root, name, true, target, name, meta, fetch_config, &mut blocks)?;
    Ok(blocks)
}

#[allow(clippy::too_many_arguments)]
fn walk(
    arena: &Arena,
    node_id: NodeId,
    namespace: &str,
    is_root: bool,
    target: Target,
    name: &str,
    meta: bool,
    fetch_config: &FetchConfig,
    blocks: &mut Vec<String>,
) -> Result<(), CompileError> {
    let node = arena.get(node_id);

    for (_, map) in node.dependency_maps() {
        for (key, &child_id) in map {
            let child = arena.get(child_id);
            if child.missing {
                return Err(CompileError::MissingDependency {
                    namespace: namespace.to_owned(),
                    key: key.clone(),
                });
            }
            let child_namespace = format!("{namespace}~{key}");
            walk(arena, child_id, &child_namespace, false, target, name, meta, fetch_config, blocks)?;
        }
    }

    emit_node(arena, node_id, namespace, is_root, target, name, meta, fetch_config, blocks)
}

#[allow(clippy::too_many_arguments)]
fn emit_node(
    arena: &Arena,
    node_id: NodeId,
    namespace: &str,
    is_root: bool,
    target: Target,
    name: &str,
    meta: bool,
    fetch_config: &FetchConfig,
    blocks: &mut Vec<String>,
) -> Result<(), CompileError> {
    let node = arena.get(node_id);
    let manifest_dir = Path::new(&node.src).parent().map(|p| p.display().to_string()).unwrap_or_default();

    let entry = resolve_entry(node, target, &manifest_dir, namespace, fetch_config)?;
    let header = meta_header(meta, &entry.location);

    if node.ambient {
        blocks.push(format!("{header}{}", entry.content));
        return Ok(());
    }

    let dep_namespaces = dependency_namespaces(node.dependency_maps().iter().flat_map(|(_, m)| m.iter()), namespace);
    let browser_overlay = match (target, &node.browser) {
        (Target::Browser, Some(BrowserField::Map(map))) => Some(map),
        _ => None,
    };

    let content_namespace = if is_root {
        format!("{name}/{}", entry_stem(&entry.location))
    } else {
        namespace.to_owned()
    };

    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(entry.location.clone());

    let parsed = emit_file(
        &entry.location,
        &entry.content,
        &content_namespace,
        namespace,
        &dep_namespaces,
        browser_overlay,
        meta,
        fetch_config,
        &mut visited,
        blocks,
    )?;

    if is_root {
        let alias = if parsed.has_export_assignment {
            format!("declare module '{name}' {{\n  import main = require('{content_namespace}');\n  export = main;\n}}")
        } else {
            format!("declare module '{name}' {{\n  export * from '{content_namespace}';\n}}")
        };
        blocks.push(alias);
    }

    Ok(())
}

/// Rewrite and emit one file's block, recursively chasing any relative
/// specifiers it contains before emitting its own block (post-order, so
/// referenced files appear first in the output — spec §4.H scenario S1).
#[allow(clippy::too_many_arguments)]
fn emit_file(
    location: &str,
    content: &str,
    block_namespace: &str,
    node_namespace: &str,
    dep_namespaces: &BTreeMap<String, String>,
    browser_overlay: Option<&BTreeMap<String, String>>,
    meta: bool,
    fetch_config: &FetchConfig,
    visited: &mut HashSet<String>,
    blocks: &mut Vec<String>,
) -> Result<ParsedDeclaration, CompileError> {
    let parsed = tokenizer::parse(content);

    let top_level_refs: Vec<Span> = parsed
        .references
        .iter()
        .filter(|r| !parsed.declare_modules.iter().any(|m| contains(m.full_span, r.span)))
        .map(|r| r.span)
        .collect();

    let mut patches: Vec<(Span, String)> = top_level_refs.into_iter().map(|span| (span, String::new())).collect();

    for specifier in &parsed.specifiers {
        if parsed.declare_modules.iter().any(|m| contains(m.full_span, specifier.span)) {
            continue;
        }

        let effective = browser_overlay
            .and_then(|m| m.get(&specifier.value))
            .cloned()
            .unwrap_or_else(|| specifier.value.clone());

        if let Some(ns) = dep_namespaces.get(&effective) {
            patches.push((specifier.span, ns.clone()));
            continue;
        }

        if effective.starts_with("./") || effective.starts_with("../") {
            let segment = relative_namespace_segment(&effective);
            let child_namespace = format!("{node_namespace}/{segment}");
            patches.push((specifier.span, child_namespace.clone()));

            if let Some((target_location, target_content)) = fetch_relative(location, &effective, fetch_config) {
                if visited.insert(target_location.clone()) {
                    emit_file(
                        &target_location,
                        &target_content,
                        &child_namespace,
                        node_namespace,
                        dep_namespaces,
                        browser_overlay,
                        meta,
                        fetch_config,
                        visited,
                        blocks,
                    )?;
                }
            }
            continue;
        }

        return Err(CompileError::UnresolvedSpecifier {
            namespace: node_namespace.to_owned(),
            specifier: specifier.value.clone(),
        });
    }

    for module in &parsed.declare_modules {
        patches.push((module.full_span, String::new()));
    }

    let body = apply_patches(content, patches);
    let header = meta_header(meta, location);
    blocks.push(format!("{header}declare module '{block_namespace}' {{\n{body}\n}}"));

    for module in &parsed.declare_modules {
        let sub_namespace = format!("{node_namespace}/{}", submodule_segment(&module.name));
        blocks.push(emit_submodule(content, module, &sub_namespace, dep_namespaces, browser_overlay, node_namespace)?);
    }

    Ok(parsed)
}

fn emit_submodule(
    content: &str,
    module: &DeclareModule,
    sub_namespace: &str,
    dep_namespaces: &BTreeMap<String, String>,
    browser_overlay: Option<&BTreeMap<String, String>>,
    node_namespace: &str,
) -> Result<String, CompileError> {
    let body_start = module.body_span.0;
    let body = content.get(module.body_span.0..module.body_span.1).unwrap_or("");

    let mut patches: Vec<(Span, String)> = Vec::new();
    for specifier in specifiers_in(content, module.body_span) {
        let effective = browser_overlay
            .and_then(|m| m.get(&specifier.value))
            .cloned()
            .unwrap_or_else(|| specifier.value.clone());

        let replacement = if let Some(ns) = dep_namespaces.get(&effective) {
            ns.clone()
        } else if effective.starts_with("./") || effective.starts_with("../") {
            format!("{node_namespace}/{}", relative_namespace_segment(&effective))
        } else {
            return Err(CompileError::UnresolvedSpecifier {
                namespace: node_namespace.to_owned(),
                specifier: specifier.value.clone(),
            });
        };
        patches.push(((specifier.span.0 - body_start, specifier.span.1 - body_start), replacement));
    }

    let rewritten = apply_patches(body, patches);
    Ok(format!("declare module '{sub_namespace}' {{\n{rewritten}\n}}"))
}

fn specifiers_in(content: &str, span: Span) -> Vec<tokenizer::SpecifierRef> {
    let parsed = tokenizer::parse(content.get(span.0..span.1).unwrap_or(""));
    parsed
        .specifiers
        .into_iter()
        .map(|mut s| {
            s.span = (s.span.0 + span.0, s.span.1 + span.0);
            s
        })
        .collect()
}

/// Resolve a relative specifier against the file at `location`, trying the
/// literal path first and a `.d.ts`-suffixed variant second. `None` if
/// neither resolves (the specifier is still rewritten; its target just
/// contributes no block).
fn fetch_relative(location: &str, specifier: &str, fetch_config: &FetchConfig) -> Option<(String, String)> {
    let direct = join_location(location, specifier);
    if let Ok(content) = fetch_text(&direct, fetch_config) {
        return Some((direct, content));
    }
    if !is_definition(specifier) {
        let with_ext = join_location(location, &to_definition(specifier));
        if let Ok(content) = fetch_text(&with_ext, fetch_config) {
            return Some((with_ext, content));
        }
    }
    None
}

fn contains(outer: Span, inner: Span) -> bool {
    inner.0 >= outer.0 && inner.1 <= outer.1
}

fn dependency_namespaces<'a>(
    maps: impl Iterator<Item = (&'a String, &'a NodeId)>,
    namespace: &str,
) -> BTreeMap<String, String> {
    maps.map(|(key, _)| (key.clone(), format!("{namespace}~{key}"))).collect()
}

/// Collapse `.`/`..` segments in a path-like specifier for use as a
/// namespace suffix: `"./foo/../bar"` → `"bar"`.
fn relative_namespace_segment(spec: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in spec.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// A `declare module` name used as a submodule suffix: path-like names are
/// normalized the same way a relative specifier is.
fn submodule_segment(name: &str) -> String {
    if name.starts_with("./") || name.starts_with("../") {
        relative_namespace_segment(name)
    } else {
        name.to_owned()
    }
}

fn entry_stem(location: &str) -> String {
    let file_name = Path::new(location).file_name().and_then(|f| f.to_str()).unwrap_or(location);
    file_name.strip_suffix(".d.ts").unwrap_or(file_name).to_owned()
}

fn meta_header(meta: bool, location: &str) -> String {
    if !meta {
        return String::new();
    }
    format!("// typings-compile v{}\n// {location}\n", env!("CARGO_PKG_VERSION"))
}

/// Apply non-overlapping byte-range replacements to `source`, processed from
/// the highest offset down so earlier spans stay valid.
fn apply_patches(source: &str, mut patches: Vec<(Span, String)>) -> String {
    patches.sort_by(|a, b| b.0 .0.cmp(&a.0 .0));
    let mut out = source.to_owned();
    for (span, replacement) in patches {
        let (start, end) = span;
        if start <= end && end <= out.len() {
            out.replace_range(start..end, &replacement);
        }
    }
    out
}
