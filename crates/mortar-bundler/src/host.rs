//! The seam between the pipeline and the build tool that hosts it.
//!
//! The host discovers stylesheet files, hands them to the pipeline as
//! [`InputFile`]s, and receives errors and output stylesheets back through
//! the same objects. Methods take `&self`; hosts use interior mutability.

use mortar_css::SyntaxError;
use std::fmt;

/// One stylesheet fragment as supplied by the host.
pub trait InputFile: Send + Sync {
    /// Unique virtual path of the fragment within the bundle.
    fn path_in_bundle(&self) -> &str;

    /// URL the host serves the fragment under, used for import-only
    /// classification and as the transform origin.
    fn source_url(&self) -> Option<&str> {
        None
    }

    /// Reads the fragment's text.
    fn contents(&self) -> std::io::Result<String>;

    /// Source map JSON produced by an upstream step, if any.
    fn source_map(&self) -> Option<String> {
        None
    }

    /// Reports an error scoped to this fragment.
    fn error(&self, error: FragmentError);

    /// Emits an output stylesheet. Only called on the pass's primary file.
    fn add_stylesheet(&self, stylesheet: OutputStylesheet);
}

/// An error attached to a single fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentError {
    pub message: String,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub source_excerpt: Option<String>,
}

impl FragmentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: None,
            column: None,
            source_excerpt: None,
        }
    }

    pub fn at(mut self, line: Option<u32>, column: Option<u32>) -> Self {
        self.line = line;
        self.column = column;
        self
    }

    /// Syntax errors carry the excerpt both separately and inside `message`,
    /// since hosts commonly display only the message.
    pub fn syntax(message: &str, line: Option<u32>, column: Option<u32>, excerpt: Option<String>) -> Self {
        let message = match excerpt.as_deref() {
            Some(excerpt) if !excerpt.is_empty() => {
                format!("{message}\n\nCss Syntax Error\n\n{excerpt}")
            }
            _ => message.to_string(),
        };
        Self {
            message,
            line,
            column,
            source_excerpt: excerpt,
        }
    }
}

impl From<&SyntaxError> for FragmentError {
    fn from(err: &SyntaxError) -> Self {
        Self::syntax(
            &err.message,
            Some(err.line),
            Some(err.column),
            Some(err.show_source_code()),
        )
    }
}

impl fmt::Display for FragmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => write!(f, "{line}:{column}: {}", self.message),
            (Some(line), None) => write!(f, "{line}: {}", self.message),
            _ => f.write_str(&self.message),
        }
    }
}

/// A stylesheet emitted by a build pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputStylesheet {
    pub data: String,
    /// Synthetic output path; set in development mode.
    pub path: Option<String>,
    /// Source map JSON, when requested.
    pub source_map: Option<String>,
}
