#![forbid(unsafe_code)]
//! Entry resolution, declaration tokenizing, namespacing, and output
//! assembly: turns a resolved dependency tree into bundled `.d.ts` output.

pub mod assemble;
pub mod entry;
pub mod error;
pub mod rewrite;
pub mod tokenizer;

pub use entry::Target;
pub use error::CompileError;

use typings_resolve::tree::{Arena, NodeId};
use typings_util::fetch::FetchConfig;

/// The two outputs spec §4.I assembles: one bundle per target.
#[derive(Debug, Clone)]
pub struct CompiledOutput {
    pub main: String,
    pub browser: String,
}

/// Compile the tree rooted at `root` under `name` into both outputs.
///
/// # Errors
/// Any [`CompileError`] raised while resolving an entry file or rewriting a
/// node's specifiers, for either target.
pub fn compile(
    arena: &Arena,
    root: NodeId,
    name: &str,
    meta: bool,
    fetch_config: &FetchConfig,
) -> Result<CompiledOutput, CompileError> {
    let (main_blocks, browser_blocks) = rayon::join(
        || rewrite::build_blocks(arena, root, Target::Main, name, meta, fetch_config),
        || rewrite::build_blocks(arena, root, Target::Browser, name, meta, fetch_config),
    );
    Ok(CompiledOutput {
        main: assemble::assemble(&main_blocks?),
        browser: assemble::assemble(&browser_blocks?),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use typings_resolve::tree::{EcosystemKind, TreeNodeData};

    #[test]
    fn compile_produces_both_outputs() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("index.d.ts"), "export const x: number;").unwrap();

        let mut arena = Arena::new();
        let node = TreeNodeData {
            typings: Some("index.d.ts".to_owned()),
            missing: false,
            name: Some("pkg".to_owned()),
            ..TreeNodeData::missing_node(tmp.path().join("typings.json").display().to_string(), EcosystemKind::Native)
        };
        let id = arena.push(node);

        let output = compile(&arena, id, "pkg", false, &FetchConfig::default()).unwrap();
        assert!(output.main.contains("declare module 'pkg/index'"));
        assert!(output.browser.contains("declare module 'pkg/index'"));
    }
}
