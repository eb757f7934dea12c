//! Upward manifest discovery (spec §4.E: walk directory ancestors for
//! `package.json`, `bower.json`, or the native config file).

use std::path::{Path, PathBuf};

/// Search `start_dir` and its ancestors for a file named `filename`,
/// returning the first match.
pub fn find_upward(start_dir: &Path, filename: &str) -> Option<PathBuf> {
    let mut dir = Some(start_dir);
    while let Some(current) = dir {
        let candidate = current.join(filename);
        if candidate.is_file() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn finds_file_in_start_dir() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("package.json"), "{}").unwrap();
        assert_eq!(
            find_upward(tmp.path(), "package.json"),
            Some(tmp.path().join("package.json"))
        );
    }

    #[test]
    fn finds_file_in_ancestor() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("bower.json"), "{}").unwrap();
        let nested = tmp.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(
            find_upward(&nested, "bower.json"),
            Some(tmp.path().join("bower.json"))
        );
    }

    #[test]
    fn returns_none_when_absent() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(find_upward(tmp.path(), "package.json"), None);
    }

    #[test]
    fn prefers_closest_ancestor() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("typings.json"), "{\"name\":\"outer\"}").unwrap();
        let nested = tmp.path().join("nested");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(nested.join("typings.json"), "{\"name\":\"inner\"}").unwrap();

        let found = find_upward(&nested, "typings.json").unwrap();
        assert_eq!(found, nested.join("typings.json"));
    }
}
