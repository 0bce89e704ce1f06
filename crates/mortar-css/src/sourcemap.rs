//! Source-map stitching.
//!
//! The printer records, for every emitted node, a generated position and the
//! fragment position it came from. [`SourceMapStitcher`] resolves those
//! positions into a real map: either directly against the fragment's text, or
//! through the fragment's own upstream map when one is registered.
//!
//! Generated and original columns are UTF-16 code units.

use crate::ast::Position;
use crate::parser::cursor::LineIndex;
use crate::printer::SourceMapSkeleton;
use oxc_sourcemap::{SourceMap, SourceMapBuilder};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone, Copy)]
struct Token {
    dst: (u32, u32),
    src: (u32, u32),
    source_id: u32,
}

/// Tokens of `map` with a source, sorted by generated position, all 0-based.
fn sorted_tokens(map: &SourceMap) -> Vec<Token> {
    let mut tokens: Vec<Token> = map
        .get_tokens()
        .filter_map(|token| {
            Some(Token {
                dst: (token.get_dst_line(), token.get_dst_col()),
                src: (token.get_src_line(), token.get_src_col()),
                source_id: token.get_source_id()?,
            })
        })
        .collect();
    tokens.sort_by_key(|token| token.dst);
    tokens
}

/// The closest token at or before `(line, column)` on the same line.
fn lookup(tokens: &[Token], line: u32, column: u32) -> Option<Token> {
    let index = tokens.partition_point(|token| token.dst <= (line, column));
    let token = *tokens.get(index.checked_sub(1)?)?;
    (token.dst.0 == line).then_some(token)
}

fn source_of(map: &SourceMap, id: u32) -> (String, String) {
    let source = map.get_source(id).map(|s| s.to_string()).unwrap_or_default();
    let content = map
        .get_source_content(id)
        .map(|content| content.to_string())
        .unwrap_or_default();
    (source, content)
}

fn parse_map(json: &str) -> Option<SourceMap> {
    match SourceMap::from_json_string(json) {
        Ok(map) => Some(map),
        Err(e) => {
            warn!(error = ?e, "ignoring invalid source map");
            None
        }
    }
}

/// Composes `outer` (a text onto an intermediate text) with `inner` (that
/// intermediate text onto its sources). Outer tokens with no inner token on
/// the same line are dropped.
pub fn compose(outer: &SourceMap, inner: &SourceMap) -> SourceMap {
    let inner_tokens = sorted_tokens(inner);
    let mut builder = SourceMapBuilder::default();
    let mut ids: FxHashMap<u32, u32> = FxHashMap::default();
    for token in sorted_tokens(outer) {
        let Some(found) = lookup(&inner_tokens, token.src.0, token.src.1) else {
            continue;
        };
        let id = *ids.entry(found.source_id).or_insert_with(|| {
            let (source, content) = source_of(inner, found.source_id);
            builder.add_source_and_content(&source, &content)
        });
        builder.add_token(token.dst.0, token.dst.1, found.src.0, found.src.1, Some(id), None);
    }
    builder.into_sourcemap()
}

/// Points every token of `map` at one `source` with `content`.
pub fn retarget(map: &SourceMap, source: &str, content: &str) -> SourceMap {
    let mut builder = SourceMapBuilder::default();
    let id = builder.add_source_and_content(source, content);
    for token in sorted_tokens(map) {
        builder.add_token(token.dst.0, token.dst.1, token.src.0, token.src.1, Some(id), None);
    }
    builder.into_sourcemap()
}

/// [`compose`] on JSON maps; `None` when either map does not parse.
pub fn compose_json(outer: &str, inner: &str) -> Option<String> {
    Some(compose(&parse_map(outer)?, &parse_map(inner)?).to_json_string())
}

/// [`retarget`] on a JSON map; `None` when it does not parse.
pub fn retarget_json(map: &str, source: &str, content: &str) -> Option<String> {
    Some(retarget(&parse_map(map)?, source, content).to_json_string())
}

struct Upstream {
    map: SourceMap,
    tokens: Vec<Token>,
}

struct Fragment {
    content: String,
    lines: LineIndex,
    upstream: Option<Upstream>,
}

/// Collects per-fragment inputs, then stitches printer skeletons into maps.
#[derive(Default)]
pub struct SourceMapStitcher {
    fragments: FxHashMap<Arc<str>, Fragment>,
}

impl SourceMapStitcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fragment by the virtual path its nodes are tagged with.
    ///
    /// An upstream map that fails to parse is dropped with a warning; the
    /// fragment then maps onto its own text.
    pub fn register(&mut self, path: impl Into<Arc<str>>, content: &str, upstream: Option<&str>) {
        let path = path.into();
        let upstream = upstream.and_then(|json| match SourceMap::from_json_string(json) {
            Ok(map) => Some(Upstream {
                tokens: sorted_tokens(&map),
                map,
            }),
            Err(e) => {
                warn!(path = %path, error = ?e, "ignoring invalid upstream source map");
                None
            }
        });
        self.fragments.insert(
            path,
            Fragment {
                content: content.to_string(),
                lines: LineIndex::new(content),
                upstream,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Builds the end-to-end map for one printed output.
    pub fn stitch(&self, skeleton: &SourceMapSkeleton) -> SourceMap {
        let mut builder = SourceMapBuilder::default();
        let mut source_ids: FxHashMap<String, u32> = FxHashMap::default();

        for mapping in &skeleton.mappings {
            let Some((path, original)) = &mapping.original else {
                continue;
            };
            let Some((source, content, line, column)) = self.resolve(path, *original) else {
                continue;
            };
            let id = match source_ids.get(&source) {
                Some(&id) => id,
                None => {
                    let id = builder.add_source_and_content(&source, &content);
                    source_ids.insert(source, id);
                    id
                }
            };
            builder.add_token(
                mapping.generated.line - 1,
                mapping.generated.column - 1,
                line,
                column,
                Some(id),
                None,
            );
        }
        builder.into_sourcemap()
    }

    /// Same as [`SourceMapStitcher::stitch`], serialized to JSON.
    pub fn stitch_to_json(&self, skeleton: &SourceMapSkeleton) -> String {
        self.stitch(skeleton).to_json_string()
    }

    /// Maps a 1-based fragment position (char column) to `(source, content,
    /// line, column)` with 0-based line and UTF-16 column.
    ///
    /// With an upstream map, positions it does not cover have no original.
    fn resolve(&self, path: &Arc<str>, at: Position) -> Option<(String, String, u32, u32)> {
        let line = at.line.saturating_sub(1);
        let Some(fragment) = self.fragments.get(path) else {
            return Some((path.to_string(), String::new(), line, at.column.saturating_sub(1)));
        };
        let column = fragment.lines.utf16_column(&fragment.content, at.line, at.column);

        match &fragment.upstream {
            Some(upstream) => {
                let token = lookup(&upstream.tokens, line, column)?;
                let (source, content) = source_of(&upstream.map, token.source_id);
                Some((source, content, token.src.0, token.src.1))
            }
            None => Some((path.to_string(), fragment.content.clone(), line, column)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer::Mapping;

    fn skeleton(entries: &[((u32, u32), Option<(&str, (u32, u32))>)]) -> SourceMapSkeleton {
        SourceMapSkeleton {
            mappings: entries
                .iter()
                .map(|&((line, column), original)| Mapping {
                    generated: Position::new(line, column),
                    original: original
                        .map(|(path, (l, c))| (Arc::from(path), Position::new(l, c))),
                })
                .collect(),
        }
    }

    fn find_token(map: &SourceMap, dst_line: u32, dst_col: u32) -> (String, u32, u32) {
        let token = map
            .get_tokens()
            .find(|t| t.get_dst_line() == dst_line && t.get_dst_col() == dst_col)
            .expect("token");
        let source = map
            .get_source(token.get_source_id().expect("source id"))
            .expect("source")
            .to_string();
        (source, token.get_src_line(), token.get_src_col())
    }

    #[test]
    fn test_maps_onto_fragment_text() {
        let mut stitcher = SourceMapStitcher::new();
        stitcher.register("a.css", "a { b: c }", None);
        stitcher.register("b.css", "\n\n\n\nd { e: f }", None);
        let map = stitcher.stitch(&skeleton(&[
            ((1, 1), Some(("a.css", (1, 1)))),
            ((1, 5), Some(("b.css", (5, 1)))),
        ]));
        assert_eq!(find_token(&map, 0, 4), ("b.css".to_string(), 4, 0));
        assert_eq!(
            map.get_source_content(1).map(|c| c.to_string()),
            Some("\n\n\n\nd { e: f }".to_string())
        );
    }

    #[test]
    fn test_synthetic_mappings_are_skipped() {
        let stitcher = SourceMapStitcher::new();
        let map = stitcher.stitch(&skeleton(&[((1, 1), None)]));
        assert_eq!(map.get_tokens().count(), 0);
    }

    #[test]
    fn test_remaps_through_upstream_map() {
        let mut upstream = SourceMapBuilder::default();
        let id = upstream.add_source_and_content("src/b.scss", "// scss\n.x { y: z }");
        upstream.add_token(0, 0, 1, 0, Some(id), None);
        let upstream_json = upstream.into_sourcemap().to_json_string();

        let mut stitcher = SourceMapStitcher::new();
        stitcher.register("b.css", ".x { y: z }", Some(&upstream_json));
        let map = stitcher.stitch(&skeleton(&[
            ((3, 1), Some(("b.css", (1, 1)))),
            ((4, 1), Some(("b.css", (2, 1)))),
        ]));
        assert_eq!(find_token(&map, 2, 0), ("src/b.scss".to_string(), 1, 0));
        // Line 2 of b.css is not covered upstream.
        assert_eq!(map.get_tokens().count(), 1);
    }

    #[test]
    fn test_original_columns_count_utf16_units() {
        let mut stitcher = SourceMapStitcher::new();
        stitcher.register("a.css", "/*\u{1F600}*/a{b:c}", None);
        let map = stitcher.stitch(&skeleton(&[((1, 1), Some(("a.css", (1, 6))))]));
        assert_eq!(find_token(&map, 0, 0), ("a.css".to_string(), 0, 6));
    }

    #[test]
    fn test_compose_follows_inner_map() {
        // outer: line 1 of the final text came from line 0 of the intermediate.
        let mut outer = SourceMapBuilder::default();
        let id = outer.add_source_and_content("intermediate.css", "");
        outer.add_token(1, 0, 0, 0, Some(id), None);
        outer.add_token(2, 0, 5, 0, Some(id), None);

        let mut inner = SourceMapBuilder::default();
        let id = inner.add_source_and_content("src/a.scss", "// scss\n.a { b: c }");
        inner.add_token(0, 0, 1, 0, Some(id), None);

        let composed = compose(&outer.into_sourcemap(), &inner.into_sourcemap());
        assert_eq!(find_token(&composed, 1, 0), ("src/a.scss".to_string(), 1, 0));
        assert_eq!(composed.get_tokens().count(), 1);
    }

    #[test]
    fn test_retarget_names_a_single_source() {
        let mut map = SourceMapBuilder::default();
        let id = map.add_source_and_content("/abs/origin.css", "x");
        map.add_token(0, 0, 0, 0, Some(id), None);
        let json = retarget_json(&map.into_sourcemap().to_json_string(), "a.css", ".a{}").unwrap();
        let map = SourceMap::from_json_string(&json).unwrap();
        assert_eq!(find_token(&map, 0, 0), ("a.css".to_string(), 0, 0));
        assert_eq!(map.get_source_content(0).map(|c| c.to_string()), Some(".a{}".to_string()));
        assert!(compose_json("not json", &json).is_none());
    }

    #[test]
    fn test_invalid_upstream_map_falls_back_to_fragment() {
        let mut stitcher = SourceMapStitcher::new();
        stitcher.register("b.css", "a{}", Some("not json"));
        let map = stitcher.stitch(&skeleton(&[((1, 1), Some(("b.css", (1, 1))))]));
        assert_eq!(find_token(&map, 0, 0), ("b.css".to_string(), 0, 0));
    }
}
