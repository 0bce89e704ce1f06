//! Error types for CSS parsing and minification.

use crate::parser::cursor::LineIndex;
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme, NamedSource, SourceSpan};
use std::sync::Arc;
use thiserror::Error;

/// Lines of context shown above and below the offending line.
const EXCERPT_CONTEXT: usize = 2;

/// Malformed CSS input.
///
/// Carries a 1-based `line`/`column` (columns count chars) and the source
/// text, so the failing line can be rendered; see
/// [`SyntaxError::show_source_code`].
#[derive(Debug, Clone, Error, Diagnostic)]
#[error("{file}:{line}:{column}: {message}")]
#[diagnostic(code(mortar::css::syntax_error))]
pub struct SyntaxError {
    pub message: String,
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
    #[source_code]
    source_code: NamedSource<String>,
    #[label("{message}")]
    span: SourceSpan,
}

impl SyntaxError {
    /// A syntax error at `line`/`column` of `text`. Positions past the end
    /// are clamped to the last line.
    pub fn new(
        message: impl Into<String>,
        file: impl Into<Arc<str>>,
        text: &str,
        line: u32,
        column: u32,
    ) -> Self {
        let file = file.into();
        let index = LineIndex::new(text);
        let offset = index
            .offset(text, line.clamp(1, index.line_count()), column)
            .unwrap_or(text.len());
        let len = text[offset..].chars().next().map_or(0, char::len_utf8);
        Self {
            message: message.into(),
            source_code: NamedSource::new(file.to_string(), normalize_line_breaks(text)),
            span: (offset, len).into(),
            file,
            line,
            column,
        }
    }

    /// The failing line with its neighbours and a marker under the column,
    /// rendered without colors.
    pub fn show_source_code(&self) -> String {
        let handler = GraphicalReportHandler::new_themed(GraphicalTheme::none())
            .with_context_lines(EXCERPT_CONTEXT)
            .with_links(false);
        let mut out = String::new();
        if handler.render_report(&mut out, self).is_err() {
            return String::new();
        }
        out.truncate(out.trim_end().len());
        out
    }
}

/// Turns lone `\r` and form feeds into `\n` so the rendered lines match the
/// parser's line numbers. Byte offsets are unchanged.
fn normalize_line_breaks(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' if chars.peek() != Some(&'\n') => out.push('\n'),
            '\u{c}' => out.push('\n'),
            c => out.push(c),
        }
    }
    out
}

/// Failure while minifying merged CSS.
#[derive(Debug, Clone, Error, Diagnostic)]
pub enum MinifyError {
    /// The merged stylesheet could not be parsed back.
    #[error("merged stylesheet is not valid CSS: {0}")]
    #[diagnostic(code(mortar::css::minify_input))]
    InvalidInput(#[from] SyntaxError),
}
