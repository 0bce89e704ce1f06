//! Stylesheet serialization.
//!
//! The printer walks the tree once, tracking the output line and column so
//! that every node's start can be recorded against its [`Provenance`] when a
//! source map is requested.

use crate::ast::{AtRule, Declaration, Node, Position, Rule, Stylesheet};
use std::sync::Arc;

const INDENT: &str = "  ";

/// Output layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PrintStyle {
    /// Human-readable, two-space indentation.
    #[default]
    Pretty,
    /// No insignificant whitespace, no final semicolon in blocks.
    Compact,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StringifyOptions {
    pub style: PrintStyle,
    pub source_map: bool,
}

impl StringifyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(mut self, style: PrintStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_source_map(mut self, enabled: bool) -> Self {
        self.source_map = enabled;
        self
    }
}

/// One generated position and where it came from.
///
/// `original` is `None` for nodes without a recorded position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub generated: Position,
    pub original: Option<(Arc<str>, Position)>,
}

/// Mappings collected while printing, before they are resolved into a real
/// source map by [`crate::sourcemap::SourceMapStitcher`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceMapSkeleton {
    pub mappings: Vec<Mapping>,
}

impl SourceMapSkeleton {
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Stringified {
    pub text: String,
    pub map: Option<SourceMapSkeleton>,
}

/// Serializes `sheet`. Output is a pure function of the tree and options.
///
/// # Example
///
/// ```
/// use mortar_css::{parse, stringify, StringifyOptions};
///
/// let sheet = parse("a{color:red}", "a.css", false).unwrap();
/// let out = stringify(&sheet, &StringifyOptions::new());
/// assert_eq!(out.text, "a {\n  color: red;\n}\n");
/// ```
pub fn stringify(sheet: &Stylesheet, options: &StringifyOptions) -> Stringified {
    let mut printer = Printer::new(options);
    printer.stylesheet(sheet);
    Stringified {
        text: printer.out,
        map: printer.mappings.map(|mappings| SourceMapSkeleton { mappings }),
    }
}

/// Serializes a slice of top-level nodes as if they were a stylesheet.
pub(crate) fn stringify_nodes(nodes: &[Node], options: &StringifyOptions) -> Stringified {
    let mut printer = Printer::new(options);
    printer.top_level(nodes);
    Stringified {
        text: printer.out,
        map: printer.mappings.map(|mappings| SourceMapSkeleton { mappings }),
    }
}

struct Printer {
    out: String,
    line: u32,
    column: u32,
    style: PrintStyle,
    mappings: Option<Vec<Mapping>>,
}

impl Printer {
    fn new(options: &StringifyOptions) -> Self {
        Self {
            out: String::new(),
            line: 1,
            column: 1,
            style: options.style,
            mappings: options.source_map.then(Vec::new),
        }
    }

    fn pretty(&self) -> bool {
        self.style == PrintStyle::Pretty
    }

    /// Appends `s`, advancing the column in UTF-16 code units as source-map
    /// consumers count them.
    fn write(&mut self, s: &str) {
        for c in s.chars() {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += c.len_utf16() as u32;
            }
        }
        self.out.push_str(s);
    }

    fn indent(&mut self, depth: usize) {
        if self.pretty() {
            for _ in 0..depth {
                self.write(INDENT);
            }
        }
    }

    fn mark(&mut self, node: &Node) {
        let generated = Position::new(self.line, self.column);
        if let Some(mappings) = self.mappings.as_mut() {
            let provenance = node.provenance();
            mappings.push(Mapping {
                generated,
                original: provenance
                    .position
                    .map(|position| (provenance.source.clone(), position)),
            });
        }
    }

    fn stylesheet(&mut self, sheet: &Stylesheet) {
        self.top_level(&sheet.children);
    }

    fn top_level(&mut self, nodes: &[Node]) {
        let mut previous: Option<&Node> = None;
        for node in nodes {
            if let Some(prev) = previous {
                if self.pretty() {
                    if is_statement(prev) && is_statement(node) {
                        self.write("\n");
                    } else {
                        self.write("\n\n");
                    }
                }
            }
            self.node(node, 0);
            previous = Some(node);
        }
        if self.pretty() && !nodes.is_empty() {
            self.write("\n");
        }
    }

    fn node(&mut self, node: &Node, depth: usize) {
        self.mark(node);
        match node {
            Node::Rule(rule) => self.rule(rule, depth),
            Node::AtRule(at) => self.at_rule(at, depth),
            Node::Declaration(decl) => self.declaration(decl),
            Node::Comment(comment) => {
                self.write("/*");
                self.write(&comment.text);
                self.write("*/");
            }
        }
    }

    fn rule(&mut self, rule: &Rule, depth: usize) {
        for (i, selector) in rule.selectors.iter().enumerate() {
            if i > 0 {
                self.write(",");
                if self.pretty() {
                    self.write("\n");
                    self.indent(depth);
                }
            }
            self.write(selector);
        }
        self.block(&rule.children, depth);
    }

    fn at_rule(&mut self, at: &AtRule, depth: usize) {
        self.write("@");
        self.write(&at.name);
        if !at.prelude.is_empty() {
            self.write(" ");
            self.write(&at.prelude);
        }
        match &at.block {
            Some(children) => self.block(children, depth),
            None => self.write(";"),
        }
    }

    fn declaration(&mut self, decl: &Declaration) {
        self.write(&decl.property);
        self.write(if self.pretty() { ": " } else { ":" });
        self.write(&decl.value);
        if decl.important {
            self.write(if self.pretty() { " !important" } else { "!important" });
        }
        if self.pretty() {
            self.write(";");
        }
    }

    fn block(&mut self, children: &[Node], depth: usize) {
        if !self.pretty() {
            self.write("{");
            let mut previous_was_decl = false;
            for child in children {
                if previous_was_decl {
                    self.write(";");
                }
                self.node(child, depth + 1);
                previous_was_decl = matches!(child, Node::Declaration(_));
            }
            self.write("}");
            return;
        }

        if children.is_empty() {
            self.write(" {}");
            return;
        }
        self.write(" {");
        for child in children {
            self.write("\n");
            self.indent(depth + 1);
            self.node(child, depth + 1);
        }
        self.write("\n");
        self.indent(depth);
        self.write("}");
    }
}

/// Block-less at-rules, printed one per line at the top level.
fn is_statement(node: &Node) -> bool {
    matches!(node, Node::AtRule(at) if at.block.is_none())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn pretty(text: &str) -> String {
        let sheet = parse(text, "a.css", false).unwrap();
        stringify(&sheet, &StringifyOptions::new()).text
    }

    fn compact(text: &str) -> String {
        let sheet = parse(text, "a.css", false).unwrap();
        stringify(&sheet, &StringifyOptions::new().with_style(PrintStyle::Compact)).text
    }

    #[test]
    fn test_pretty_layout() {
        let out = pretty(
            "@import 'a.css';@import 'b.css';a,b{color:red;margin:0!important}@media print{a{b:c}}",
        );
        insta::assert_snapshot!(out, @r"
        @import 'a.css';
        @import 'b.css';

        a,
        b {
          color: red;
          margin: 0 !important;
        }

        @media print {
          a {
            b: c;
          }
        }
        ");
    }

    #[test]
    fn test_compact_layout() {
        assert_eq!(
            compact("a , b { color : red ; margin: 0 } @media print { a { b: c } } /* x */"),
            "a,b{color:red;margin:0}@media print{a{b:c}}/* x */"
        );
    }

    #[test]
    fn test_compact_separates_declaration_from_nested_rule() {
        assert_eq!(
            compact("a { color: red; &:hover { color: blue } top: 0 }"),
            "a{color:red;&:hover{color:blue}top:0}"
        );
    }

    #[test]
    fn test_empty_blocks() {
        assert_eq!(pretty("a {}"), "a {}\n");
        assert_eq!(compact("a {}"), "a{}");
        assert_eq!(pretty(""), "");
    }

    #[test]
    fn test_source_map_records_node_starts() {
        let sheet = parse("a {\n  color: red;\n}\n\nb { top: 0 }", "in.css", true).unwrap();
        let out = stringify(&sheet, &StringifyOptions::new().with_source_map(true));
        let map = out.map.unwrap();
        let generated: Vec<(u32, u32)> = map
            .mappings
            .iter()
            .map(|m| (m.generated.line, m.generated.column))
            .collect();
        assert_eq!(generated, vec![(1, 1), (2, 3), (5, 1), (6, 3)]);
        let (source, original) = map.mappings[3].original.clone().unwrap();
        assert_eq!(&*source, "in.css");
        assert_eq!(original, Position::new(5, 5));
    }

    #[test]
    fn test_generated_columns_count_utf16_units() {
        let sheet = parse("/*\u{1F600}*/a{b:c}", "in.css", true).unwrap();
        let options = StringifyOptions::new()
            .with_style(PrintStyle::Compact)
            .with_source_map(true);
        let map = stringify(&sheet, &options).map.unwrap();
        assert_eq!(map.mappings[1].generated, Position::new(1, 7));
    }

    #[test]
    fn test_synthetic_nodes_map_to_nothing() {
        let sheet = parse("a { b: c }", "in.css", false).unwrap();
        let out = stringify(&sheet, &StringifyOptions::new().with_source_map(true));
        assert!(out.map.unwrap().mappings.iter().all(|m| m.original.is_none()));
    }

    #[test]
    fn test_deterministic() {
        let sheet = parse("a { b: c } @media x { d { e: f } }", "in.css", true).unwrap();
        let options = StringifyOptions::new();
        assert_eq!(stringify(&sheet, &options).text, stringify(&sheet, &options).text);
    }
}
