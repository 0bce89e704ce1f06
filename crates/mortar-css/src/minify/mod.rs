//! Minification of merged CSS.
//!
//! Minifying is three steps: an AST pass that drops what has no effect,
//! selector/value compaction, and compact printing. When a selector budget is
//! configured the top-level nodes are additionally split into chunks that are
//! each valid stylesheets on their own.

mod values;

use crate::ast::{Node, Stylesheet};
use crate::error::MinifyError;
use crate::parser::parse;
use crate::printer::{PrintStyle, Stringified, StringifyOptions, stringify_nodes};
use tracing::debug;

/// Virtual source name used when re-parsing merged text.
const MERGED_SOURCE: &str = "<merged>";

#[derive(Debug, Clone, Copy, Default)]
pub struct MinifyOptions {
    /// Split the output once it holds more selectors than this.
    pub max_selectors_per_chunk: Option<usize>,
}

/// Minifier output: one stylesheet or an ordered list of chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Minified {
    Text(String),
    Chunks(Vec<String>),
}

impl Minified {
    /// Normalizes both shapes to a list of chunks.
    pub fn into_chunks(self) -> Vec<String> {
        match self {
            Minified::Text(text) => vec![text],
            Minified::Chunks(chunks) => chunks,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Minified::Text(text) => text.is_empty(),
            Minified::Chunks(chunks) => chunks.iter().all(String::is_empty),
        }
    }
}

impl From<Vec<String>> for Minified {
    fn from(mut chunks: Vec<String>) -> Self {
        if chunks.len() == 1 {
            Minified::Text(chunks.remove(0))
        } else {
            Minified::Chunks(chunks)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Minifier {
    options: MinifyOptions,
}

impl Minifier {
    pub fn new(options: MinifyOptions) -> Self {
        Self { options }
    }

    /// Minifies CSS text. Empty or whitespace-only input yields `Text("")`.
    pub fn minify(&self, text: &str) -> Result<Minified, MinifyError> {
        if text.trim().is_empty() {
            return Ok(Minified::Text(String::new()));
        }
        let sheet = parse(text, MERGED_SOURCE, false)?;
        let chunks = self
            .minify_tree(sheet, false)
            .into_iter()
            .map(|chunk| chunk.text)
            .collect::<Vec<_>>();
        Ok(chunks.into())
    }

    /// Minifies an already merged tree, keeping node provenance so each chunk
    /// can carry a source map skeleton.
    pub fn minify_tree(&self, mut sheet: Stylesheet, source_map: bool) -> Vec<Stringified> {
        minify_stylesheet(&mut sheet);
        let options = StringifyOptions::new()
            .with_style(PrintStyle::Compact)
            .with_source_map(source_map);
        let chunks = self.split(sheet.children);
        debug!(chunks = chunks.len(), "minified stylesheet");
        chunks
            .iter()
            .map(|nodes| stringify_nodes(nodes, &options))
            .collect()
    }

    fn split(&self, nodes: Vec<Node>) -> Vec<Vec<Node>> {
        let Some(max) = self.options.max_selectors_per_chunk.filter(|&max| max > 0) else {
            return vec![nodes];
        };
        if count_selectors(&nodes) <= max {
            return vec![nodes];
        }

        let mut charsets = Vec::new();
        let mut imports = Vec::new();
        let mut namespaces = Vec::new();
        let mut body = Vec::new();
        for node in nodes {
            match slot(&node) {
                Slot::Charset => charsets.push(node),
                Slot::Import => imports.push(node),
                Slot::Namespace => namespaces.push(node),
                Slot::Body => body.push(node),
            }
        }

        let mut groups: Vec<Vec<Node>> = Vec::new();
        let mut current = Vec::new();
        let mut count = 0;
        for node in body {
            let selectors = count_selectors(std::slice::from_ref(&node));
            if count + selectors > max && current.iter().any(|n| !Node::is_comment(n)) {
                groups.push(std::mem::take(&mut current));
                count = 0;
            }
            count += selectors;
            current.push(node);
        }
        if !current.is_empty() || groups.is_empty() {
            groups.push(current);
        }

        groups
            .into_iter()
            .enumerate()
            .map(|(index, group)| {
                let mut chunk = charsets.clone();
                if index == 0 {
                    chunk.append(&mut imports);
                }
                chunk.extend(namespaces.iter().cloned());
                chunk.extend(group);
                chunk
            })
            .collect()
    }
}

/// Minifies `text` with default options.
///
/// # Example
///
/// ```
/// let out = mortar_css::minify("a {\n  color: #FF0000;\n  margin: 0px;\n}").unwrap();
/// assert_eq!(out, mortar_css::Minified::Text("a{color:#f00;margin:0}".into()));
/// ```
pub fn minify(text: &str) -> Result<Minified, MinifyError> {
    Minifier::default().minify(text)
}

/// Removes nodes without effect and compacts selectors, preludes and values in place.
pub fn minify_stylesheet(sheet: &mut Stylesheet) {
    minify_nodes(&mut sheet.children);
}

fn minify_nodes(nodes: &mut Vec<Node>) {
    nodes.retain_mut(|node| match node {
        Node::Comment(comment) => comment.is_preserved(),
        Node::Rule(rule) => {
            for selector in &mut rule.selectors {
                *selector = values::compact_selector(selector);
            }
            minify_nodes(&mut rule.children);
            !rule.children.is_empty()
        }
        Node::AtRule(at) => {
            at.prelude = values::compact_prelude(&at.prelude);
            let conditional = at.is_conditional_group();
            match at.block.as_mut() {
                Some(block) => {
                    minify_nodes(block);
                    !(conditional && block.is_empty())
                }
                None => true,
            }
        }
        Node::Declaration(decl) => {
            if !decl.is_custom_property() {
                decl.value = values::compact_value(&decl.property, &decl.value);
            }
            true
        }
    });
}

enum Slot {
    Charset,
    Import,
    Namespace,
    Body,
}

fn slot(node: &Node) -> Slot {
    match node.as_at_rule() {
        Some(at) if at.block.is_none() && at.is_charset() => Slot::Charset,
        Some(at) if at.block.is_none() && at.is_import() => Slot::Import,
        Some(at) if at.block.is_none() && at.name == "namespace" => Slot::Namespace,
        _ => Slot::Body,
    }
}

fn count_selectors(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            Node::Rule(rule) => rule.selectors.len() + count_selectors(&rule.children),
            Node::AtRule(at) => at.block.as_deref().map(count_selectors).unwrap_or(0),
            _ => 0,
        })
        .sum()
}
