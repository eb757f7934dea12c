//! Path/URL classification and composition (spec §4.A).

/// Returns `true` if `s` is an absolute HTTP(S) URL.
pub fn is_http(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Returns `true` if `s` names a TypeScript declaration file.
pub fn is_definition(s: &str) -> bool {
    s.ends_with(".d.ts")
}

/// Returns `true` if `s` is an absolute location: an HTTP(S) URL or an
/// absolute filesystem path.
fn is_absolute(s: &str) -> bool {
    is_http(s) || std::path::Path::new(s).is_absolute()
}

/// Produce a canonical `.d.ts` filename from a bare dependency name.
///
/// `"react"` becomes `"react.d.ts"`; a name that already ends in `.d.ts` is
/// returned unchanged.
pub fn to_definition(name: &str) -> String {
    if is_definition(name) {
        name.to_owned()
    } else {
        format!("{name}.d.ts")
    }
}

/// Join a child location against its parent.
///
/// - If `child` is already absolute (URL or absolute path), it is returned as-is.
/// - Else if `parent` is an HTTP(S) URL, `child` is resolved against it as a
///   relative URL reference (`..`/`.` segments collapse the same way a
///   browser resolves a relative link).
/// - Else `child` is resolved against `parent` as a filesystem path, taking
///   `parent`'s *directory* as the base when `parent` names a file.
pub fn join_location(parent: &str, child: &str) -> String {
    if is_absolute(child) {
        return child.to_owned();
    }

    if is_http(parent) {
        return join_url(parent, child);
    }

    let parent_path = std::path::Path::new(parent);
    let base = if parent_path.extension().is_some() {
        parent_path.parent().unwrap_or(parent_path)
    } else {
        parent_path
    };
    normalize_path(&base.join(child))
}

/// Resolve `child` against the directory component of URL `parent`.
fn join_url(parent: &str, child: &str) -> String {
    let (scheme_and_host, path) = match parent.find("://") {
        Some(idx) => {
            let after_scheme = idx + 3;
            match parent.get(after_scheme..).and_then(|rest| rest.find('/')) {
                Some(slash) => (
                    parent.get(..after_scheme + slash).unwrap_or(parent),
                    parent.get(after_scheme + slash..).unwrap_or(""),
                ),
                None => (parent, "/"),
            }
        }
        None => (parent, ""),
    };

    let base_dir = match path.rfind('/') {
        Some(idx) => path.get(..=idx).unwrap_or("/"),
        None => "/",
    };

    let combined = format!("{base_dir}{child}");
    let normalized = normalize_url_path(&combined);
    format!("{scheme_and_host}{normalized}")
}

/// Collapse `.`/`..` segments in a URL path, the way a browser would when
/// resolving a relative link. Never escapes above the root (`/..` is `/`).
fn normalize_url_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for seg in path.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// Collapse `.`/`..` components in a filesystem path without touching disk.
fn normalize_path(path: &std::path::Path) -> String {
    use std::path::Component;

    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.last(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out.iter().collect::<std::path::PathBuf>().display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_http_matches_both_schemes() {
        assert!(is_http("http://example.com/x"));
        assert!(is_http("https://example.com/x"));
        assert!(!is_http("ftp://example.com/x"));
        assert!(!is_http("/local/path"));
    }

    #[test]
    fn is_definition_matches_suffix() {
        assert!(is_definition("foo.d.ts"));
        assert!(!is_definition("foo.ts"));
        assert!(!is_definition("foo.js"));
    }

    #[test]
    fn to_definition_appends_suffix() {
        assert_eq!(to_definition("react"), "react.d.ts");
    }

    #[test]
    fn to_definition_idempotent() {
        assert_eq!(to_definition("react.d.ts"), "react.d.ts");
    }

    #[test]
    fn join_location_absolute_child_wins() {
        assert_eq!(
            join_location("/some/parent.json", "https://example.com/x.d.ts"),
            "https://example.com/x.d.ts"
        );
        assert_eq!(join_location("/some/parent.json", "/other/abs.d.ts"), "/other/abs.d.ts");
    }

    #[test]
    fn join_location_relative_against_http_parent() {
        assert_eq!(
            join_location("http://example.com/pkg/typings.json", "./index.d.ts"),
            "http://example.com/pkg/index.d.ts"
        );
        assert_eq!(
            join_location("http://example.com/pkg/typings.json", "../shared/index.d.ts"),
            "http://example.com/shared/index.d.ts"
        );
    }

    #[test]
    fn join_location_relative_against_file_parent() {
        let joined = join_location("/proj/typings.json", "./a/b.d.ts");
        assert!(joined.ends_with(&format!("a{}b.d.ts", std::path::MAIN_SEPARATOR)));
        assert!(joined.starts_with("/proj"));
    }

    #[test]
    fn join_location_parent_dir_against_dir_parent() {
        // When parent has no extension, treat it as a directory, not a file.
        let joined = join_location("/proj/sub", "../other.d.ts");
        assert_eq!(joined, std::path::Path::new("/proj/other.d.ts").display().to_string());
    }

    #[test]
    fn join_url_collapses_parent_segments() {
        assert_eq!(
            join_url("http://example.com/a/b/c.json", "../../d.d.ts"),
            "http://example.com/d.d.ts"
        );
    }

    #[test]
    fn join_url_never_escapes_root() {
        assert_eq!(
            join_url("http://example.com/a.json", "../../../etc.d.ts"),
            "http://example.com/etc.d.ts"
        );
    }
}
