//! Short-form dependency string grammar (spec §4.D).

use std::str::FromStr;

use crate::error::DependencyParseError;

/// A single dependency value as written in a manifest's dependency map.
///
/// Native manifests allow a list of candidates, tried in order until one
/// resolves (§4.E, boundary behavior B1); npm and bower manifests only ever
/// carry a bare string.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(untagged)]
pub enum DependencyValue {
    Single(String),
    List(Vec<String>),
}

impl DependencyValue {
    /// Candidates in resolution order.
    pub fn candidates(&self) -> &[String] {
        match self {
            Self::Single(s) => std::slice::from_ref(s),
            Self::List(items) => items,
        }
    }
}

/// The parsed form of a short dependency string, tagged by scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyDescriptor {
    Npm { name: String },
    Bower { name: String },
    Github {
        owner: String,
        repo: String,
        reference: Option<String>,
    },
    File { path: String },
    Http { url: String },
}

impl DependencyDescriptor {
    /// The location this descriptor resolves to: an HTTP(S) URL for `Http`
    /// and `Github` forms (raw-content convention, since the registry
    /// protocol itself is out of scope), otherwise a filesystem path.
    pub fn location(&self) -> String {
        match self {
            Self::Npm { name } | Self::Bower { name } => name.clone(),
            Self::Github {
                owner,
                repo,
                reference,
            } => {
                let reference = reference.as_deref().unwrap_or("master");
                format!(
                    "https://raw.githubusercontent.com/{owner}/{repo}/{reference}/typings.json"
                )
            }
            Self::File { path } => path.clone(),
            Self::Http { url } => url.clone(),
        }
    }
}

impl FromStr for DependencyDescriptor {
    type Err = DependencyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(name) = s.strip_prefix("npm:") {
            return Ok(Self::Npm {
                name: name.to_owned(),
            });
        }
        if let Some(name) = s.strip_prefix("bower:") {
            return Ok(Self::Bower {
                name: name.to_owned(),
            });
        }
        if let Some(rest) = s.strip_prefix("github:") {
            return parse_github(rest, s);
        }
        if let Some(path) = s.strip_prefix("file:") {
            return Ok(Self::File {
                path: path.to_owned(),
            });
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(Self::Http { url: s.to_owned() });
        }
        Ok(Self::File {
            path: s.to_owned(),
        })
    }
}

fn parse_github(rest: &str, raw: &str) -> Result<DependencyDescriptor, DependencyParseError> {
    let (repo_part, reference) = match rest.split_once('#') {
        Some((repo, r)) => (repo, Some(r.to_owned())),
        None => (rest, None),
    };
    let (owner, repo) = repo_part
        .split_once('/')
        .ok_or_else(|| DependencyParseError::InvalidGithubForm {
            raw: raw.to_owned(),
        })?;
    if owner.is_empty() || repo.is_empty() {
        return Err(DependencyParseError::InvalidGithubForm {
            raw: raw.to_owned(),
        });
    }
    Ok(DependencyDescriptor::Github {
        owner: owner.to_owned(),
        repo: repo.to_owned(),
        reference,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_npm_form() {
        assert_eq!(
            "npm:react".parse(),
            Ok(DependencyDescriptor::Npm {
                name: "react".to_owned()
            })
        );
    }

    #[test]
    fn parses_bower_form() {
        assert_eq!(
            "bower:jquery".parse(),
            Ok(DependencyDescriptor::Bower {
                name: "jquery".to_owned()
            })
        );
    }

    #[test]
    fn parses_github_form_without_ref() {
        assert_eq!(
            "github:DefinitelyTyped/DefinitelyTyped".parse(),
            Ok(DependencyDescriptor::Github {
                owner: "DefinitelyTyped".to_owned(),
                repo: "DefinitelyTyped".to_owned(),
                reference: None,
            })
        );
    }

    #[test]
    fn parses_github_form_with_ref() {
        assert_eq!(
            "github:owner/repo#v1.2.3".parse(),
            Ok(DependencyDescriptor::Github {
                owner: "owner".to_owned(),
                repo: "repo".to_owned(),
                reference: Some("v1.2.3".to_owned()),
            })
        );
    }

    #[test]
    fn rejects_malformed_github_form() {
        let result: Result<DependencyDescriptor, _> = "github:not-a-repo".parse();
        assert!(matches!(
            result,
            Err(DependencyParseError::InvalidGithubForm { .. })
        ));
    }

    #[test]
    fn parses_file_form() {
        assert_eq!(
            "file:./vendor/lib.d.ts".parse(),
            Ok(DependencyDescriptor::File {
                path: "./vendor/lib.d.ts".to_owned()
            })
        );
    }

    #[test]
    fn parses_bare_http_url() {
        assert_eq!(
            "https://example.com/x.d.ts".parse(),
            Ok(DependencyDescriptor::Http {
                url: "https://example.com/x.d.ts".to_owned()
            })
        );
    }

    #[test]
    fn bare_string_defaults_to_file() {
        assert_eq!(
            "./local/path.d.ts".parse(),
            Ok(DependencyDescriptor::File {
                path: "./local/path.d.ts".to_owned()
            })
        );
    }

    #[test]
    fn github_location_defaults_reference_to_master() {
        let dep = DependencyDescriptor::Github {
            owner: "o".to_owned(),
            repo: "r".to_owned(),
            reference: None,
        };
        assert_eq!(
            dep.location(),
            "https://raw.githubusercontent.com/o/r/master/typings.json"
        );
    }

    #[test]
    fn dependency_value_single_candidates() {
        let v = DependencyValue::Single("a".to_owned());
        assert_eq!(v.candidates(), &["a".to_owned()]);
    }

    #[test]
    fn dependency_value_list_candidates() {
        let v = DependencyValue::List(vec!["a".to_owned(), "b".to_owned()]);
        assert_eq!(v.candidates(), &["a".to_owned(), "b".to_owned()]);
    }
}
