//! Declaration-file tokenizer (spec §4.G): enough structure to drive the
//! namespacing rewriter without building a full syntax tree.

/// A byte range into the source text, half-open `[start, end)`.
pub type Span = (usize, usize);

/// The syntactic form a specifier reference was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// `import ... from "X"` / `export ... from "X"`.
    FromClause,
    /// `import X = require("Y")`.
    RequireImport,
}

/// A module specifier string found inside an `import`/`export`/`require`
/// form, with the byte span of the quoted text (quotes excluded) so the
/// rewriter can splice in a replacement.
#[derive(Debug, Clone)]
pub struct SpecifierRef {
    pub span: Span,
    pub value: String,
    pub kind: SpecifierKind,
}

/// Which triple-slash reference directive was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Path,
    Types,
}

/// A triple-slash reference directive, span covering the whole directive
/// line so the rewriter can drop it once its dependency is folded in.
#[derive(Debug, Clone)]
pub struct ReferenceDirective {
    pub span: Span,
    pub kind: ReferenceKind,
    pub value: String,
}

/// A top-level `declare module "NAME" { ... }` block.
#[derive(Debug, Clone)]
pub struct DeclareModule {
    pub name: String,
    /// Span of the quoted name, for rewriting when `NAME` is path-like.
    pub name_span: Span,
    /// Span of the block body, braces excluded.
    pub body_span: Span,
    /// Span of the whole `declare module "NAME" { ... }` construct, for
    /// carving it out of its enclosing body once it becomes its own block.
    pub full_span: Span,
}

/// The result of tokenizing one declaration file.
#[derive(Debug, Clone, Default)]
pub struct ParsedDeclaration {
    pub declare_modules: Vec<DeclareModule>,
    pub specifiers: Vec<SpecifierRef>,
    pub references: Vec<ReferenceDirective>,
    /// Whether `export =` appears at top level (drives the root wrapper
    /// form in §4.H).
    pub has_export_assignment: bool,
}

/// Tokenize `source` (spec §4.G).
pub fn parse(source: &str) -> ParsedDeclaration {
    let mut result = ParsedDeclaration {
        references: find_references(source),
        declare_modules: find_declare_modules(source),
        has_export_assignment: has_export_assignment(source),
        specifiers: Vec::new(),
    };
    result.specifiers = find_specifiers(source);
    result
}

fn find_references(source: &str) -> Vec<ReferenceDirective> {
    let mut out = Vec::new();
    for (line_start, line) in line_spans(source) {
        let trimmed = line.trim_start();
        if !trimmed.starts_with("///") {
            continue;
        }
        let leading_ws = line.len() - trimmed.len();
        let tag_start = line_start + leading_ws;
        if let Some((kind, value, value_span)) = parse_reference_directive(trimmed) {
            out.push(ReferenceDirective {
                span: (tag_start, line_start + line.len()),
                kind,
                value,
            });
            let _ = value_span;
        }
    }
    out
}

fn parse_reference_directive(trimmed: &str) -> Option<(ReferenceKind, String, Span)> {
    let (kind, attr) = if trimmed.contains("reference path") {
        (ReferenceKind::Path, "path")
    } else if trimmed.contains("reference types") {
        (ReferenceKind::Types, "types")
    } else {
        return None;
    };
    let needle = format!("{attr}=");
    let attr_idx = trimmed.find(&needle)?;
    let after = trimmed.get(attr_idx + needle.len()..)?;
    let quote = after.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let rest = after.get(1..)?;
    let end = rest.find(quote)?;
    Some((kind, rest.get(..end)?.to_owned(), (0, 0)))
}

fn line_spans(source: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = 0;
    for line in source.split('\n') {
        out.push((start, line));
        start += line.len() + 1;
    }
    out
}

/// Find top-level `declare module "NAME" { ... }` blocks via brace counting.
fn find_declare_modules(source: &str) -> Vec<DeclareModule> {
    let mut out = Vec::new();
    let bytes = source.as_bytes();
    let mut search_from = 0;
    while let Some(rel_idx) = source.get(search_from..).and_then(|s| s.find("declare module")) {
        let keyword_idx = search_from + rel_idx;
        let after_keyword = keyword_idx + "declare module".len();
        let Some(rest) = source.get(after_keyword..) else {
            break;
        };
        let trimmed_offset = rest.len() - rest.trim_start().len();
        let quote_pos = after_keyword + trimmed_offset;
        let Some(quote) = bytes.get(quote_pos).copied() else {
            search_from = after_keyword;
            continue;
        };
        if quote != b'"' && quote != b'\'' {
            search_from = after_keyword;
            continue;
        }
        let name_start = quote_pos + 1;
        let Some(name_end_rel) = source.get(name_start..).and_then(|s| s.find(quote as char)) else {
            search_from = after_keyword;
            continue;
        };
        let name_end = name_start + name_end_rel;
        let name = source.get(name_start..name_end).unwrap_or("").to_owned();

        let Some(brace_rel) = source.get(name_end + 1..).and_then(|s| s.find('{')) else {
            search_from = name_end + 1;
            continue;
        };
        let brace_start = name_end + 1 + brace_rel;
        let Some(body_end) = matching_brace(source, brace_start) else {
            search_from = brace_start + 1;
            continue;
        };

        out.push(DeclareModule {
            name,
            name_span: (name_start, name_end),
            body_span: (brace_start + 1, body_end),
            full_span: (keyword_idx, body_end + 1),
        });
        search_from = body_end + 1;
    }
    out
}

/// Given the byte index of an opening `{`, find the index of its matching
/// `}`, accounting for nested braces.
fn matching_brace(source: &str, open_idx: usize) -> Option<usize> {
    let mut depth = 0i32;
    for (idx, ch) in source.get(open_idx..)?.char_indices().map(|(i, c)| (i + open_idx, c)) {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

fn has_export_assignment(source: &str) -> bool {
    source.lines().any(|line| line.trim_start().starts_with("export ="))
}

/// Find `import ... from "X"`, `export ... from "X"`, and
/// `import Y = require("X")` specifiers anywhere in the source.
fn find_specifiers(source: &str) -> Vec<SpecifierRef> {
    let mut out = Vec::new();
    out.extend(find_from_clauses(source));
    out.extend(find_require_imports(source));
    out
}

fn find_from_clauses(source: &str) -> Vec<SpecifierRef> {
    let mut out = Vec::new();
    let mut search_from = 0;
    while let Some(rel) = source.get(search_from..).and_then(|s| s.find("from ")) {
        let keyword_idx = search_from + rel;
        let after = keyword_idx + "from ".len();
        if let Some((value, span)) = extract_quoted(source, after) {
            out.push(SpecifierRef {
                span,
                value,
                kind: SpecifierKind::FromClause,
            });
            search_from = span.1 + 1;
        } else {
            search_from = after;
        }
    }
    out
}

fn find_require_imports(source: &str) -> Vec<SpecifierRef> {
    let mut out = Vec::new();
    let mut search_from = 0;
    while let Some(rel) = source.get(search_from..).and_then(|s| s.find("require(")) {
        let keyword_idx = search_from + rel;
        let after = keyword_idx + "require(".len();
        if let Some((value, span)) = extract_quoted(source, after) {
            out.push(SpecifierRef {
                span,
                value,
                kind: SpecifierKind::RequireImport,
            });
            search_from = span.1 + 1;
        } else {
            search_from = after;
        }
    }
    out
}

/// Starting at `from_idx`, skip whitespace, then read a quoted string.
/// Returns the unquoted value and the span of its contents (quotes
/// excluded).
fn extract_quoted(source: &str, from_idx: usize) -> Option<(String, Span)> {
    let rest = source.get(from_idx..)?;
    let trimmed = rest.trim_start();
    let ws = rest.len() - trimmed.len();
    let quote = trimmed.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let quote_idx = from_idx + ws;
    let value_start = quote_idx + 1;
    let value_end_rel = source.get(value_start..)?.find(quote)?;
    let value_end = value_start + value_end_rel;
    Some((source.get(value_start..value_end)?.to_owned(), (value_start, value_end)))
}
