//! The dependency tree: an arena of nodes linked by `NodeId` indices (spec §3,
//! §9 "cyclic parent back-references").

use std::collections::BTreeMap;

pub use typings_config::BrowserField;

/// Index into an [`Arena`]. Never meaningful across two different arenas.
pub type NodeId = usize;

/// Which manifest ecosystem produced a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcosystemKind {
    Native,
    Npm,
    Bower,
}

/// A single node in the dependency tree (spec §3).
#[derive(Debug, Clone)]
pub struct TreeNodeData {
    /// Absolute filesystem path or absolute URL identifying the manifest
    /// that produced this node.
    pub src: String,
    pub ecosystem: EcosystemKind,
    /// True when the manifest could not be read; the four dependency maps
    /// are then empty (I2).
    pub missing: bool,
    /// True when this node provides globally declared names.
    pub ambient: bool,
    pub name: Option<String>,
    pub version: Option<String>,
    pub main: Option<String>,
    pub browser: Option<BrowserField>,
    pub typings: Option<String>,
    pub browser_typings: Option<String>,
    /// The short-form dependency string that produced this node, if any.
    pub raw: Option<String>,
    /// Non-owning back-edge, consulted only for cycle checks and URL base
    /// resolution — never followed for destruction.
    pub parent: Option<NodeId>,
    pub dependencies: BTreeMap<String, NodeId>,
    pub dev_dependencies: BTreeMap<String, NodeId>,
    pub ambient_dependencies: BTreeMap<String, NodeId>,
    pub ambient_dev_dependencies: BTreeMap<String, NodeId>,
}

impl TreeNodeData {
    /// Build a `missing:true` placeholder node (§4.C — a missing manifest is
    /// success-with-missing-flag, never an error).
    pub fn missing_node(src: String, ecosystem: EcosystemKind) -> Self {
        Self {
            src,
            ecosystem,
            missing: true,
            ambient: false,
            name: None,
            version: None,
            main: None,
            browser: None,
            typings: None,
            browser_typings: None,
            raw: None,
            parent: None,
            dependencies: BTreeMap::new(),
            dev_dependencies: BTreeMap::new(),
            ambient_dependencies: BTreeMap::new(),
            ambient_dev_dependencies: BTreeMap::new(),
        }
    }

    /// The four dependency maps in the fixed emission sequence used by the
    /// namespacing rewriter (§4.H).
    pub fn dependency_maps(&self) -> [(&'static str, &BTreeMap<String, NodeId>); 4] {
        [
            ("dependencies", &self.dependencies),
            ("devDependencies", &self.dev_dependencies),
            ("ambientDependencies", &self.ambient_dependencies),
            ("ambientDevDependencies", &self.ambient_dev_dependencies),
        ]
    }
}

/// An arena of tree nodes. Children are owned exclusively through their
/// parent's four dependency maps; `parent` is a non-owning index back into
/// the same arena.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<TreeNodeData>,
}

impl Arena {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn push(&mut self, data: TreeNodeData) -> NodeId {
        self.nodes.push(data);
        self.nodes.len() - 1
    }

    /// # Panics
    /// if `id` was not produced by this arena. `NodeId`s are never valid
    /// across two different arenas.
    #[allow(clippy::indexing_slicing)]
    pub fn get(&self, id: NodeId) -> &TreeNodeData {
        &self.nodes[id]
    }

    /// # Panics
    /// if `id` was not produced by this arena.
    #[allow(clippy::indexing_slicing)]
    pub fn get_mut(&mut self, id: NodeId) -> &mut TreeNodeData {
        &mut self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A freshly built subtree: its own arena plus the id of its root within it.
/// Resolvers build one of these per node rather than sharing a single arena,
/// so fan-out (rayon::join / par_iter) needs no shared mutable state.
pub type SubTree = (Arena, NodeId);

/// Copy the subtree rooted at `other_root` (within `other`) into `dest`,
/// re-numbering every `NodeId` and wiring `parent` to `new_parent`. Returns
/// the copied root's id in `dest`.
pub fn graft(dest: &mut Arena, other: &Arena, other_root: NodeId, new_parent: Option<NodeId>) -> NodeId {
    let src = other.get(other_root);
    let new_id = dest.push(TreeNodeData {
        src: src.src.clone(),
        ecosystem: src.ecosystem,
        missing: src.missing,
        ambient: src.ambient,
        name: src.name.clone(),
        version: src.version.clone(),
        main: src.main.clone(),
        browser: src.browser.clone(),
        typings: src.typings.clone(),
        browser_typings: src.browser_typings.clone(),
        raw: src.raw.clone(),
        parent: new_parent,
        dependencies: BTreeMap::new(),
        dev_dependencies: BTreeMap::new(),
        ambient_dependencies: BTreeMap::new(),
        ambient_dev_dependencies: BTreeMap::new(),
    });

    let dependencies = graft_map(dest, other, &src.dependencies, new_id);
    let dev_dependencies = graft_map(dest, other, &src.dev_dependencies, new_id);
    let ambient_dependencies = graft_map(dest, other, &src.ambient_dependencies, new_id);
    let ambient_dev_dependencies = graft_map(dest, other, &src.ambient_dev_dependencies, new_id);

    let node = dest.get_mut(new_id);
    node.dependencies = dependencies;
    node.dev_dependencies = dev_dependencies;
    node.ambient_dependencies = ambient_dependencies;
    node.ambient_dev_dependencies = ambient_dev_dependencies;

    new_id
}

fn graft_map(
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

    fn leaf(src: &str) -> TreeNodeData {
        TreeNodeData {
            name: Some(src.to_owned()),
            ..TreeNodeData::missing_node(src.to_owned(), EcosystemKind::Native)
        }
    }

    #[test]
    fn push_and_get_round_trip() {
        let mut arena = Arena::new();
        let id = arena.push(leaf("a"));
        assert_eq!(arena.get(id).src, "a");
    }

    #[test]
    fn graft_copies_subtree_and_relinks_parent() {
        let mut child_arena = Arena::new();
        let child_id = child_arena.push(leaf("child"));

        let mut parent_arena = Arena::new();
        let parent_id = parent_arena.push(leaf("parent"));
        let grafted_child_id = graft(&mut parent_arena, &child_arena, child_id, Some(parent_id));

        assert_eq!(parent_arena.get(grafted_child_id).src, "child");
        assert_eq!(parent_arena.get(grafted_child_id).parent, Some(parent_id));
    }

    #[test]
    fn graft_preserves_nested_dependencies() {
        let mut child_arena = Arena::new();
        let grandchild_id = child_arena.push(leaf("grandchild"));
        let mut root = leaf("root");
        root.dependencies.insert("g".to_owned(), grandchild_id);
        let root_id = child_arena.push(root);

        let mut dest = Arena::new();
        let new_root = graft(&mut dest, &child_arena, root_id, None);

        let copied_root = dest.get(new_root);
        let copied_grandchild_id = *copied_root.dependencies.get("g").unwrap();
        assert_eq!(dest.get(copied_grandchild_id).src, "grandchild");
        assert_eq!(dest.get(copied_grandchild_id).parent, Some(new_root));
    }

    #[test]
    fn dependency_maps_in_fixed_order() {
        let node = TreeNodeData::missing_node("x".to_owned(), EcosystemKind::Npm);
        let names: Vec<&str> = node.dependency_maps().iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            ["dependencies", "devDependencies", "ambientDependencies", "ambientDevDependencies"]
        );
    }
}
