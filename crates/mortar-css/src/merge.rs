//! Merging of per-fragment stylesheets into one tree.
//!
//! Children are concatenated in fragment order. The only structural change is
//! `@import` hoisting: every `@import`, from any fragment, moves to the front of
//! the merged tree in its original relative order. An `@import` that already
//! leads its fragment (optionally preceded by comments or `@charset`) moves
//! silently; one that follows other content is hoisted with a warning.
//!
//! Merging never fails. Anything unusual is passed through and reported via
//! the warning callback.

use crate::ast::{AtRule, Node, Stylesheet};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::sync::Arc;

static CSS_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\burl\(\s*(?:"([^"]*)"|'([^']*)'|([^'"\s)]*))\s*\)"#)
        .expect("valid url() pattern")
});

static URL_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*:").expect("valid scheme pattern"));

#[derive(Debug, Clone, Copy, Default)]
pub struct MergeOptions {
    /// Rewrite relative `url(...)` references to absolute bundle paths.
    pub rewrite_urls: bool,
}

/// Merges `asts` in order, reporting `(fragment path, message)` warnings.
///
/// # Example
///
/// ```
/// use mortar_css::{merge, parse};
///
/// let a = parse("a { color: red }", "a.css", false).unwrap();
/// let b = parse("b { color: blue } @import \"x.css\";", "b.css", false).unwrap();
/// let mut warnings = Vec::new();
/// let merged = merge(vec![a, b], |path, message| {
///     warnings.push((path.to_string(), message.to_string()))
/// });
/// assert!(merged.children[0].is_import());
/// assert_eq!(warnings.len(), 1);
/// ```
pub fn merge(
    asts: impl IntoIterator<Item = Stylesheet>,
    on_warning: impl FnMut(&str, &str),
) -> Stylesheet {
    merge_with(asts, &MergeOptions::default(), on_warning)
}

pub fn merge_with(
    asts: impl IntoIterator<Item = Stylesheet>,
    options: &MergeOptions,
    mut on_warning: impl FnMut(&str, &str),
) -> Stylesheet {
    let mut imports = Vec::new();
    let mut body = Vec::new();

    for sheet in asts {
        let source: Arc<str> = sheet.source.clone().unwrap_or_else(|| Arc::from(""));
        let mut leading = true;
        let mut pending_comments = Vec::new();

        for mut node in sheet.children {
            if options.rewrite_urls {
                rewrite_node_urls(&mut node, &source);
            }
            match &node {
                Node::Comment(_) if leading => pending_comments.push(node),
                node_ref if node_ref.is_import() => {
                    if leading {
                        imports.append(&mut pending_comments);
                    } else {
                        on_warning(
                            &source,
                            "@import must precede all other statements; hoisted to the top of the merged stylesheet",
                        );
                    }
                    imports.push(node);
                }
                Node::AtRule(at) if at.is_charset() => {
                    check_charset(at, &source, &mut on_warning);
                    body.append(&mut pending_comments);
                    body.push(node);
                }
                Node::Declaration(decl) => {
                    on_warning(
                        &source,
                        &format!(
                            "unexpected declaration `{}` outside of a rule; passed through unchanged",
                            decl.property
                        ),
                    );
                    leading = false;
                    body.append(&mut pending_comments);
                    body.push(node);
                }
                _ => {
                    leading = false;
                    body.append(&mut pending_comments);
                    body.push(node);
                }
            }
        }
        body.append(&mut pending_comments);
    }

    imports.append(&mut body);
    Stylesheet::new(None, imports)
}

fn check_charset(at: &AtRule, source: &str, on_warning: &mut impl FnMut(&str, &str)) {
    let encoding = at.prelude.trim_matches(|c| c == '"' || c == '\'');
    if !encoding.eq_ignore_ascii_case("utf-8") {
        on_warning(
            source,
            &format!("@charset \"{encoding}\" is ignored; merged output is always UTF-8"),
        );
    }
}

fn rewrite_node_urls(node: &mut Node, source: &str) {
    match node {
        Node::Declaration(decl) => {
            if let Some(rewritten) = rewrite_urls(&decl.value, source) {
                decl.value = rewritten;
            }
        }
        Node::Rule(rule) => {
            for child in &mut rule.children {
                rewrite_node_urls(child, source);
            }
        }
        Node::AtRule(at) => {
            if at.is_import() {
                if let Some(rewritten) = rewrite_urls(&at.prelude, source) {
                    at.prelude = rewritten;
                }
            }
            for child in at.block.iter_mut().flatten() {
                rewrite_node_urls(child, source);
            }
        }
        Node::Comment(_) => {}
    }
}

/// Rewrites relative `url()` references in `value` against the directory of
/// `source`. Returns `None` when nothing changed.
pub(crate) fn rewrite_urls(value: &str, source: &str) -> Option<String> {
    if !CSS_URL.is_match(value) {
        return None;
    }
    let base = source.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    let rewritten = CSS_URL.replace_all(value, |caps: &Captures<'_>| {
        let (quote, url) = if let Some(m) = caps.get(1) {
            ("\"", m.as_str())
        } else if let Some(m) = caps.get(2) {
            ("'", m.as_str())
        } else {
            ("", caps.get(3).map(|m| m.as_str()).unwrap_or(""))
        };
        if is_absolute_url(url) {
            return caps[0].to_string();
        }
        format!("url({quote}{}{quote})", resolve_path(base, url))
    });
    (rewritten != value).then(|| rewritten.into_owned())
}

fn is_absolute_url(url: &str) -> bool {
    url.is_empty() || url.starts_with(['/', '#']) || URL_SCHEME.is_match(url)
}

/// Joins `url` onto `base`, folding `.` and `..` segments.
fn resolve_path(base: &str, url: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in base.split('/').chain(url.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }
    format!("/{}", segments.join("/"))
}
