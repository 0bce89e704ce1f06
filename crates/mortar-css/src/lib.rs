//! # mortar-css
//!
//! The CSS core of the mortar stylesheet pipeline: a parser producing a
//! provenance-tagged syntax tree, a merger that combines per-fragment trees
//! under `@import` ordering rules, a deterministic printer, a minifier, and a
//! source-map stitcher that resolves printed positions back to input files.
//!
//! ```
//! use mortar_css::{merge, parse, stringify, StringifyOptions};
//!
//! let a = parse("a { color: red }", "a.css", true).unwrap();
//! let b = parse("@import \"base.css\";\nb { color: blue }", "b.css", true).unwrap();
//! let merged = merge(vec![a, b], |_, _| {});
//! let out = stringify(&merged, &StringifyOptions::new());
//! assert!(out.text.starts_with("@import \"base.css\";"));
//! ```

pub mod ast;
pub mod error;
pub mod merge;
pub mod minify;
pub mod parser;
pub mod printer;
pub mod sourcemap;

pub use ast::{AtRule, Comment, Declaration, Node, Position, Provenance, Rule, Stylesheet};
pub use error::{MinifyError, SyntaxError};
pub use merge::{MergeOptions, merge, merge_with};
pub use minify::{Minified, Minifier, MinifyOptions, minify, minify_stylesheet};
pub use parser::{ParseOptions, parse, parse_with};
pub use printer::{Mapping, PrintStyle, SourceMapSkeleton, Stringified, StringifyOptions, stringify};
pub use sourcemap::{SourceMapStitcher, compose_json, retarget_json};
