//! CSS syntax tree.
//!
//! A [`Stylesheet`] owns its children exclusively; nodes are never shared
//! between trees. Every node records where it came from through a
//! [`Provenance`], which the printer uses to build source maps.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A 1-based line/column pair. Columns are counted in chars, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Origin of a node: the fragment it was parsed from and, when the parser
/// was asked to capture them, its position inside that fragment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: Arc<str>,
    pub position: Option<Position>,
}

impl Provenance {
    pub fn new(source: Arc<str>, position: Option<Position>) -> Self {
        Self { source, position }
    }

    /// Provenance for nodes created by tooling rather than parsed from text.
    pub fn synthetic(source: Arc<str>) -> Self {
        Self {
            source,
            position: None,
        }
    }
}

/// Root of a parsed fragment or of a merged tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stylesheet {
    /// Virtual path of the fragment, `None` for merged trees.
    pub source: Option<Arc<str>>,
    pub children: Vec<Node>,
}

impl Stylesheet {
    pub fn new(source: Option<Arc<str>>, children: Vec<Node>) -> Self {
        Self { source, children }
    }

    /// An empty sheet standing in for a fragment that failed to build.
    pub fn empty(source: impl Into<Arc<str>>) -> Self {
        Self {
            source: Some(source.into()),
            children: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of style rules in the tree, nested ones included.
    pub fn rule_count(&self) -> usize {
        count_rules(&self.children)
    }
}

fn count_rules(nodes: &[Node]) -> usize {
    nodes
        .iter()
        .map(|node| match node {
            Node::Rule(rule) => 1 + count_rules(&rule.children),
            Node::AtRule(at) => at.block.as_deref().map(count_rules).unwrap_or(0),
            _ => 0,
        })
        .sum()
}

/// Any node that may appear inside a stylesheet or a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Rule(Rule),
    #[serde(rename = "atrule")]
    AtRule(AtRule),
    #[serde(rename = "decl")]
    Declaration(Declaration),
    Comment(Comment),
}

impl Node {
    pub fn provenance(&self) -> &Provenance {
        match self {
            Node::Rule(n) => &n.provenance,
            Node::AtRule(n) => &n.provenance,
            Node::Declaration(n) => &n.provenance,
            Node::Comment(n) => &n.provenance,
        }
    }

    pub fn as_at_rule(&self) -> Option<&AtRule> {
        match self {
            Node::AtRule(at) => Some(at),
            _ => None,
        }
    }

    pub fn is_comment(&self) -> bool {
        matches!(self, Node::Comment(_))
    }

    /// `true` for `@import` statements.
    pub fn is_import(&self) -> bool {
        self.as_at_rule().is_some_and(AtRule::is_import)
    }
}

/// A qualified rule: `selector, selector { ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub selectors: Vec<String>,
    pub children: Vec<Node>,
    pub provenance: Provenance,
}

/// An at-rule, either a statement (`@import "x";`) or a block (`@media x { }`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtRule {
    /// Lowercased name without the `@`.
    pub name: String,
    pub prelude: String,
    pub block: Option<Vec<Node>>,
    pub provenance: Provenance,
}

impl AtRule {
    pub fn is_import(&self) -> bool {
        self.name == "import"
    }

    pub fn is_charset(&self) -> bool {
        self.name == "charset"
    }

    /// Conditional group rules whose empty blocks have no effect.
    pub fn is_conditional_group(&self) -> bool {
        matches!(
            self.name.as_str(),
            "media" | "supports" | "container" | "document" | "-moz-document"
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
    pub provenance: Provenance,
}

impl Declaration {
    /// Custom properties keep their value verbatim.
    pub fn is_custom_property(&self) -> bool {
        self.property.starts_with("--")
    }
}

/// A comment; `text` is everything between `/*` and `*/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub provenance: Provenance,
}

impl Comment {
    /// `/*! ... */` comments carry license text and survive minification.
    pub fn is_preserved(&self) -> bool {
        self.text.starts_with('!')
    }
}
