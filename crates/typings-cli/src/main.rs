#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

type CliResult = Result<(), TypingsError>;

/// Top-level error type composing every crate's error enum, mirroring the
/// teacher's one-wrapper-per-binary layout.
#[derive(Debug, thiserror::Error)]
enum TypingsError {
    #[error(transparent)]
    Resolve(#[from] typings_resolve::ResolveError),
    #[error(transparent)]
    Compile(#[from] typings_compile::CompileError),
    #[error(transparent)]
    Manifest(#[from] typings_config::error::ManifestError),
    #[error(transparent)]
    Util(#[from] typings_util::error::UtilError),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Parser)]
#[command(name = "typings", about = "Multi-ecosystem dependency resolver and bundler for TypeScript declaration files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve the current project's dependencies and write typings/main.d.ts + typings/browser.d.ts
    Install {
        /// Skip devDependencies
        #[arg(long)]
        production: bool,
        /// Include ambientDependencies/ambientDevDependencies at the root
        #[arg(long)]
        ambient: bool,
        /// HTTP proxy to use for remote fetches
        #[arg(long)]
        proxy: Option<String>,
    },
    /// Resolve and compile a bundle under a given package name, without writing an install layout
    Bundle {
        /// Namespace the bundle's root module under
        #[arg(long)]
        name: String,
        /// Include devDependencies at the root
        #[arg(long)]
        dev: bool,
        /// Include ambientDependencies/ambientDevDependencies at the root
        #[arg(long)]
        ambient: bool,
        /// Prefix each emitted block with a source-location comment
        #[arg(long)]
        meta: bool,
        /// HTTP proxy to use for remote fetches
        #[arg(long)]
        proxy: Option<String>,
        /// Write `main.d.ts`/`browser.d.ts` into this directory instead of printing `main` to stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Manage the fetch cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Debug, Subcommand)]
enum CacheAction {
    /// Remove the cache directory
    Clean,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Install {
            production,
            ambient,
            proxy,
        } => cmd_install(production, ambient, proxy),
        Command::Bundle {
            name,
            dev,
            ambient,
            meta,
            proxy,
            out,
        } => cmd_bundle(name, dev, ambient, meta, proxy, out),
        Command::Cache { action } => match action {
            CacheAction::Clean => cmd_cache_clean(),
        },
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn current_dir() -> Result<PathBuf, TypingsError> {
    std::env::current_dir().map_err(|source| TypingsError::Other(format!("cannot read current directory: {source}")))
}

fn cache_dir() -> Result<PathBuf, TypingsError> {
    typings_util::fs::default_cache_home().map_err(TypingsError::from)
}

/// The native manifest's `name`, falling back to the current directory's
/// basename (mirrors the teacher's `cmd_init` project-name fallback).
fn project_name(cwd: &std::path::Path) -> Result<String, TypingsError> {
    if let Some(manifest_path) = typings_config::discovery::find_upward(cwd, "typings.json") {
        if let Some(manifest) = typings_config::manifest::read_native(&manifest_path)? {
            if let Some(name) = manifest.name {
                return Ok(name);
            }
        }
    }
    Ok(cwd
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("typings-project")
        .to_owned())
}

fn cmd_install(production: bool, ambient: bool, proxy: Option<String>) -> CliResult {
    let cwd = current_dir()?;
    let cache_dir = cache_dir()?;
    let name = project_name(&cwd)?;

    let options = typings_resolve::ResolveOptions {
        cwd: cwd.clone(),
        dev: !production,
        ambient,
        proxy: proxy.clone(),
        cache_dir: cache_dir.clone(),
    };
    let tree = typings_resolve::resolve_dependencies(&options)?;

    let fetch_config = typings_util::fetch::FetchConfig {
        cache_dir,
        proxy,
        ..typings_util::fetch::FetchConfig::default()
    };
    let output = typings_compile::compile(&tree.arena, tree.root, &name, false, &fetch_config)?;

    let typings_dir = cwd.join("typings");
    typings_util::fs::ensure_dir(&typings_dir)?;
    typings_util::fs::write_atomic(&typings_dir.join("main.d.ts"), &output.main)?;
    typings_util::fs::write_atomic(&typings_dir.join("browser.d.ts"), &output.browser)?;

    eprintln!("    Installed typings for `{name}` at {}", typings_dir.display());
    Ok(())
}

fn cmd_bundle(
    name: String,
    dev: bool,
    ambient: bool,
    meta: bool,
    proxy: Option<String>,
    out: Option<PathBuf>,
) -> CliResult {
    let cwd = current_dir()?;
    let cache_dir = cache_dir()?;

    let options = typings_resolve::ResolveOptions {
        cwd,
        dev,
        ambient,
        proxy: proxy.clone(),
        cache_dir: cache_dir.clone(),
    };
    let tree = typings_resolve::resolve_dependencies(&options)?;

    let fetch_config = typings_util::fetch::FetchConfig {
        cache_dir,
        proxy,
        ..typings_util::fetch::FetchConfig::default()
    };
    let output = typings_compile::compile(&tree.arena, tree.root, &name, meta, &fetch_config)?;

    match out {
        Some(dir) => {
            typings_util::fs::ensure_dir(&dir)?;
            typings_util::fs::write_atomic(&dir.join("main.d.ts"), &output.main)?;
            typings_util::fs::write_atomic(&dir.join("browser.d.ts"), &output.browser)?;
            eprintln!("    Wrote bundle for `{name}` to {}", dir.display());
        }
        None => {
            println!("{}", output.main);
        }
    }
    Ok(())
}

fn cmd_cache_clean() -> CliResult {
    let dir = cache_dir()?;
    typings_util::fs::remove_dir_all_if_exists(&dir)?;
    eprintln!("    Cleaned cache at {}", dir.display());
    Ok(())
}
