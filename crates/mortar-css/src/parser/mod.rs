//! CSS parser.
//!
//! A hand-written recursive descent parser over a char [`Cursor`]. It builds
//! the [`Stylesheet`] tree directly; there is no separate token stream.
//!
//! Blocks are parsed as mixed lists: inside `{ ... }` an item that reaches a
//! `{` before a `;` is a nested rule, anything else is a declaration. This
//! covers `@media` groups, `@keyframes` frames, `@font-face` descriptors and
//! CSS nesting with one code path.

pub(crate) mod cursor;
pub(crate) mod normalize;

use crate::ast::{AtRule, Comment, Declaration, Node, Provenance, Rule, Stylesheet};
use crate::error::SyntaxError;
use cursor::{Cursor, is_ident_char};
use normalize::{Comments, collapse, find_top_level, split_top_level};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static IMPORTANT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\s*!\s*important\s*$").expect("valid !important pattern")
});

/// Options for [`parse_with`].
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Virtual path recorded on every node.
    pub source: Arc<str>,
    /// Record line/column positions on nodes.
    pub positions: bool,
}

impl ParseOptions {
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
            positions: false,
        }
    }

    pub fn with_positions(mut self, enabled: bool) -> Self {
        self.positions = enabled;
        self
    }
}

/// Parses `text` into a stylesheet whose nodes are tagged with `source`.
///
/// # Errors
///
/// Returns a [`SyntaxError`] with the failing line, column and a source
/// excerpt when `text` is not well-formed CSS.
///
/// # Example
///
/// ```
/// let sheet = mortar_css::parse("a { color: red }", "a.css", true).unwrap();
/// assert_eq!(sheet.children.len(), 1);
/// ```
pub fn parse(
    text: &str,
    source: impl Into<Arc<str>>,
    capture_positions: bool,
) -> Result<Stylesheet, SyntaxError> {
    parse_with(text, &ParseOptions::new(source).with_positions(capture_positions))
}

pub fn parse_with(text: &str, options: &ParseOptions) -> Result<Stylesheet, SyntaxError> {
    let mut parser = Parser {
        cursor: Cursor::new(text),
        text,
        source: options.source.clone(),
        positions: options.positions,
    };
    let children = parser.parse_top_level()?;
    Ok(Stylesheet::new(Some(options.source.clone()), children))
}

struct Parser<'a> {
    cursor: Cursor,
    text: &'a str,
    source: Arc<str>,
    positions: bool,
}

type PResult<T> = Result<T, SyntaxError>;

impl Parser<'_> {
    fn parse_top_level(&mut self) -> PResult<Vec<Node>> {
        let mut children = Vec::new();
        loop {
            self.cursor.skip_whitespace();
            let Some(c) = self.cursor.peek() else {
                break;
            };
            if self.cursor.starts_with("<!--") {
                self.cursor.advance(4);
                continue;
            }
            if self.cursor.starts_with("-->") {
                self.cursor.advance(3);
                continue;
            }
            match c {
                '/' if self.cursor.peek_at(1) == Some('*') => {
                    children.push(self.parse_comment()?);
                }
                '}' => return Err(self.error_at("Unexpected }", self.cursor.pos())),
                ';' => {
                    self.cursor.bump();
                }
                '@' => children.push(self.parse_at_rule()?),
                _ => children.push(self.parse_top_level_rule()?),
            }
        }
        Ok(children)
    }

    fn parse_top_level_rule(&mut self) -> PResult<Node> {
        let start = self.cursor.pos();
        match self.scan_until(&['{', ';', '}'])? {
            Some('{') => self.finish_rule(start),
            Some('}') => Err(self.error_at("Unexpected }", self.cursor.pos())),
            _ => Err(self.error_at("Unknown word", start)),
        }
    }

    /// Builds a rule from the prelude scanned since `start`; the cursor is on `{`.
    fn finish_rule(&mut self, start: usize) -> PResult<Node> {
        let prelude = self.cursor.slice(start, self.cursor.pos());
        let selectors: Vec<String> = split_top_level(&collapse(&prelude, Comments::Remove), ',')
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        if selectors.is_empty() {
            return Err(self.error_at("Missing selector", start));
        }
        let children = self.parse_block()?;
        Ok(Node::Rule(Rule {
            selectors,
            children,
            provenance: self.provenance(start),
        }))
    }

    fn parse_at_rule(&mut self) -> PResult<Node> {
        let start = self.cursor.pos();
        self.cursor.bump();
        let name_start = self.cursor.pos();
        while let Some(c) = self.cursor.peek() {
            if c == '\\' {
                self.cursor.advance(2);
            } else if is_ident_char(c) {
                self.cursor.bump();
            } else {
                break;
            }
        }
        let name = self
            .cursor
            .slice(name_start, self.cursor.pos())
            .to_ascii_lowercase();
        if name.is_empty() {
            return Err(self.error_at("At-rule without name", start));
        }

        let prelude_start = self.cursor.pos();
        let stop = self.scan_until(&['{', ';', '}'])?;
        let prelude = collapse(
            &self.cursor.slice(prelude_start, self.cursor.pos()),
            Comments::AsSpace,
        );
        let block = match stop {
            Some('{') => Some(self.parse_block()?),
            Some(';') => {
                self.cursor.bump();
                None
            }
            // `}` belongs to the enclosing block; EOF ends the statement.
            _ => None,
        };
        Ok(Node::AtRule(AtRule {
            name,
            prelude,
            block,
            provenance: self.provenance(start),
        }))
    }

    /// Parses `{ ... }`; the cursor must be on the opening brace.
    fn parse_block(&mut self) -> PResult<Vec<Node>> {
        let open = self.cursor.pos();
        self.cursor.bump();
        let mut children = Vec::new();
        loop {
            self.cursor.skip_whitespace();
            let Some(c) = self.cursor.peek() else {
                return Err(self.error_at("Unclosed block", open));
            };
            match c {
                '}' => {
                    self.cursor.bump();
                    return Ok(children);
                }
                ';' => {
                    self.cursor.bump();
                }
                '/' if self.cursor.peek_at(1) == Some('*') => {
                    children.push(self.parse_comment()?);
                }
                '@' => children.push(self.parse_at_rule()?),
                _ => children.push(self.parse_block_item()?),
            }
        }
    }

    fn parse_block_item(&mut self) -> PResult<Node> {
        let start = self.cursor.pos();
        match self.scan_until(&['{', ';', '}'])? {
            Some('{') => self.finish_rule(start),
            // A missing `}` is reported by the enclosing block.
            _ => self.finish_declaration(start),
        }
    }

    fn finish_declaration(&mut self, start: usize) -> PResult<Node> {
        let raw = self.cursor.slice(start, self.cursor.pos());
        let Some(colon) = find_top_level(&raw, ':') else {
            return Err(self.error_at("Unknown word", start));
        };
        let property = collapse(&raw[..colon], Comments::Remove);
        if property.is_empty() {
            return Err(self.error_at("Missing property name", start));
        }
        if property.contains(' ') {
            return Err(self.error_at("Unknown word", start));
        }

        let raw_value = &raw[colon + 1..];
        let mut value = if property.starts_with("--") {
            raw_value.trim().to_string()
        } else {
            collapse(raw_value, Comments::AsSpace)
        };
        let important = match IMPORTANT.find(&value) {
            Some(found) => {
                value.truncate(found.start());
                true
            }
            None => false,
        };

        Ok(Node::Declaration(Declaration {
            property,
            value,
            important,
            provenance: self.provenance(start),
        }))
    }

    fn parse_comment(&mut self) -> PResult<Node> {
        let start = self.cursor.pos();
        self.skip_comment()?;
        let text = self.cursor.slice(start + 2, self.cursor.pos() - 2);
        Ok(Node::Comment(Comment {
            text,
            provenance: self.provenance(start),
        }))
    }

    /// Advances to the first of `stops` outside strings, comments and
    /// brackets, leaving the cursor on it. Returns `None` at end of input.
    fn scan_until(&mut self, stops: &[char]) -> PResult<Option<char>> {
        let mut closers: Vec<(char, usize)> = Vec::new();
        loop {
            let Some(c) = self.cursor.peek() else {
                return match closers.last() {
                    Some(&(_, open)) => Err(self.error_at("Unclosed bracket", open)),
                    None => Ok(None),
                };
            };
            match c {
                '"' | '\'' => self.skip_string()?,
                '/' if self.cursor.peek_at(1) == Some('*') => self.skip_comment()?,
                '\\' => self.cursor.advance(2),
                '(' => {
                    closers.push((')', self.cursor.pos()));
                    self.cursor.bump();
                }
                '[' => {
                    closers.push((']', self.cursor.pos()));
                    self.cursor.bump();
                }
                ')' | ']' => {
                    if closers.last().is_some_and(|&(closer, _)| closer == c) {
                        closers.pop();
                    }
                    self.cursor.bump();
                }
                'u' | 'U' if self.at_unquoted_url() => self.skip_unquoted_url()?,
                _ if closers.is_empty() && stops.contains(&c) => return Ok(Some(c)),
                _ => {
                    self.cursor.bump();
                }
            }
        }
    }

    fn skip_string(&mut self) -> PResult<()> {
        let start = self.cursor.pos();
        let quote = self.cursor.bump();
        loop {
            match self.cursor.bump() {
                None => return Err(self.error_at("Unclosed string", start)),
                Some('\\') => {
                    self.cursor.bump();
                }
                Some(c) if Some(c) == quote => return Ok(()),
                Some(_) => {}
            }
        }
    }

    fn skip_comment(&mut self) -> PResult<()> {
        let start = self.cursor.pos();
        self.cursor.advance(2);
        loop {
            if self.cursor.starts_with("*/") {
                self.cursor.advance(2);
                return Ok(());
            }
            if self.cursor.is_eof() {
                return Err(self.error_at("Unclosed comment", start));
            }
            self.cursor.bump();
        }
    }

    /// `url(` not preceded by an identifier char and not followed by a quote.
    fn at_unquoted_url(&self) -> bool {
        if !self.cursor.starts_with_ignore_case("url(") {
            return false;
        }
        let pos = self.cursor.pos();
        if pos > 0 && self.cursor.char_at(pos - 1).is_some_and(is_ident_char) {
            return false;
        }
        let mut offset = 4;
        while self
            .cursor
            .peek_at(offset)
            .is_some_and(cursor::is_whitespace)
        {
            offset += 1;
        }
        !matches!(self.cursor.peek_at(offset), Some('"' | '\''))
    }

    fn skip_unquoted_url(&mut self) -> PResult<()> {
        let start = self.cursor.pos();
        self.cursor.advance(4);
        loop {
            match self.cursor.bump() {
                None => return Err(self.error_at("Unclosed bracket", start + 3)),
                Some('\\') => {
                    self.cursor.bump();
                }
                Some(')') => return Ok(()),
                Some(_) => {}
            }
        }
    }

    fn provenance(&self, start: usize) -> Provenance {
        let position = self.positions.then(|| self.cursor.position_of(start));
        Provenance::new(self.source.clone(), position)
    }

    fn error_at(&self, message: &str, index: usize) -> SyntaxError {
        let at = self.cursor.position_of(index);
        SyntaxError::new(message, self.source.clone(), self.text, at.line, at.column)
    }
}
