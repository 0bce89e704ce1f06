//! End-to-end tests of parse -> merge -> stringify -> minify -> stitch.

use mortar_css::{
    Minified, Node, SourceMapStitcher, StringifyOptions, merge, minify, parse, stringify,
};

fn parse_all(fragments: &[(&str, &str)]) -> Vec<mortar_css::Stylesheet> {
    fragments
        .iter()
        .map(|(path, text)| parse(text, *path, true).expect("valid fragment"))
        .collect()
}

#[test]
fn merged_output_keeps_fragment_rule_order() {
    let merged = merge(
        parse_all(&[
            ("f1.css", ".one { a: 1 }"),
            ("f2.css", ".two { a: 2 }\n.three { a: 3 }"),
            ("f3.css", ".four { a: 4 }"),
        ]),
        |_, _| {},
    );
    let text = stringify(&merged, &StringifyOptions::new()).text;
    let positions: Vec<usize> = [".one", ".two", ".three", ".four"]
        .iter()
        .map(|selector| text.find(selector).expect("selector present"))
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn late_import_precedes_every_rule_after_merge() {
    let mut warnings = Vec::new();
    let merged = merge(
        parse_all(&[
            ("a.css", "a { color: red } @import \"x.css\";"),
            ("b.css", "b { color: blue }"),
        ]),
        |path, message| warnings.push((path.to_string(), message.to_string())),
    );
    let text = stringify(&merged, &StringifyOptions::new()).text;
    assert!(text.starts_with("@import \"x.css\";"));
    assert!(text.find("@import").unwrap() < text.find("a {").unwrap());
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].0, "a.css");
}

#[test]
fn minify_of_merged_output() {
    let merged = merge(
        parse_all(&[
            ("a.css", "/* header */\n.a {\n  margin: 0px auto;\n}\n"),
            ("b.css", "@media (min-width: 100px) {\n  .b { color: #FFFFFF }\n}\n"),
        ]),
        |_, _| {},
    );
    let text = stringify(&merged, &StringifyOptions::new()).text;
    assert_eq!(
        minify(&text).unwrap(),
        Minified::Text(".a{margin:0 auto}@media (min-width:100px){.b{color:#fff}}".into())
    );
}

#[test]
fn minify_tolerates_empty_and_comment_only_input() {
    assert!(minify("").unwrap().is_empty());
    assert!(minify("/* nothing */\n\n").unwrap().is_empty());
}

#[test]
fn stitched_map_points_back_to_fragment_line() {
    let fragments = [
        ("a.css", "a {\n  color: red;\n}\n"),
        ("b.css", "/* 1 */\n/* 2 */\n/* 3 */\n\n.target { color: blue }\n"),
    ];
    let merged = merge(parse_all(&fragments), |_, _| {});
    let out = stringify(&merged, &StringifyOptions::new().with_source_map(true));

    let mut stitcher = SourceMapStitcher::new();
    for (path, text) in fragments {
        stitcher.register(path, text, None);
    }
    let map = stitcher.stitch(out.map.as_ref().expect("skeleton"));

    let generated_line = out
        .text
        .lines()
        .position(|line| line.starts_with(".target"))
        .expect("rule printed") as u32;
    let token = map
        .get_tokens()
        .find(|token| token.get_dst_line() == generated_line && token.get_dst_col() == 0)
        .expect("token for .target");
    let source = map
        .get_source(token.get_source_id().expect("source id"))
        .expect("source")
        .to_string();
    assert_eq!(source, "b.css");
    assert_eq!(token.get_src_line(), 4);
}

#[test]
fn parse_errors_carry_location_and_excerpt() {
    let err = parse("a { color: red }\nb {\n  color: blue;\n", "broken.css", false).unwrap_err();
    assert_eq!(err.message, "Unclosed block");
    assert_eq!((err.line, err.column), (2, 3));
    assert!(err.show_source_code().contains("b {"));
    assert!(err.to_string().starts_with("broken.css:2:3"));
}

#[test]
fn inspect_shape_serializes() {
    let sheet = parse("@media print { a { b: c } }", "x.css", true).unwrap();
    let json = serde_json::to_value(&sheet).unwrap();
    assert_eq!(json["children"][0]["type"], "atrule");
    assert_eq!(json["children"][0]["block"][0]["type"], "rule");
    assert!(matches!(sheet.children[0], Node::AtRule(_)));
}
