//! Semantically neutral compaction of selectors, at-rule preludes and values.
//!
//! All inputs are expected to be whitespace-collapsed by the parser, so the
//! only whitespace left is single spaces between tokens.

/// Units that may be dropped from a zero length.
const LENGTH_UNITS: &[&str] = &[
    "px", "em", "rem", "ex", "ch", "vw", "vh", "vmin", "vmax", "cm", "mm", "in", "pt", "pc", "q",
];

/// Properties where `0` and `0px` are not interchangeable.
const KEEP_ZERO_UNIT: &[&str] = &["flex", "flex-basis", "-webkit-flex", "-ms-flex"];

/// Removes spaces around combinators and commas.
pub(crate) fn compact_selector(selector: &str) -> String {
    let chars: Vec<char> = selector.chars().collect();
    let mut out = String::with_capacity(selector.len());
    let mut depth = 0usize;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => i = copy_string(&chars, i, &mut out),
            '(' | '[' => {
                depth += 1;
                out.push(c);
                i += 1;
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                out.push(c);
                i += 1;
            }
            ' ' => {
                let prev = out.chars().last();
                let next = chars.get(i + 1).copied();
                let joins = |ch: Option<char>| match ch {
                    Some(',') => true,
                    Some('>' | '+' | '~') => depth == 0,
                    Some('(') | Some(')') => depth > 0,
                    _ => false,
                };
                if !joins(prev) && !joins(next) {
                    out.push(' ');
                }
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Drops spaces after commas and, inside parentheses, after colons.
pub(crate) fn compact_prelude(prelude: &str) -> String {
    let chars: Vec<char> = prelude.chars().collect();
    let mut out = String::with_capacity(prelude.len());
    let mut depth = 0usize;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => i = copy_string(&chars, i, &mut out),
            '(' => {
                depth += 1;
                out.push(c);
                i += 1;
            }
            ')' => {
                depth = depth.saturating_sub(1);
                out.push(c);
                i += 1;
            }
            ' ' => {
                let prev = out.chars().last();
                let next = chars.get(i + 1).copied();
                let drop = prev == Some(',')
                    || next == Some(',')
                    || (depth > 0 && (prev == Some(':') || prev == Some('(') || next == Some(')')));
                if !drop {
                    out.push(' ');
                }
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

/// Compacts a declaration value: separators, numbers, zero lengths and hex colors.
pub(crate) fn compact_value(property: &str, value: &str) -> String {
    let property = property.to_ascii_lowercase();
    if property == "unicode-range" {
        return value.to_string();
    }
    let keep_zero_unit = KEEP_ZERO_UNIT.contains(&property.as_str());
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());
    let mut functions: Vec<String> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => i = copy_string(&chars, i, &mut out),
            ' ' => {
                let prev = out.chars().last();
                let next = chars.get(i + 1).copied();
                let drop = matches!(prev, Some(',' | '/' | '('))
                    || matches!(next, Some(',' | '/' | ')'));
                if !drop {
                    out.push(' ');
                }
                i += 1;
            }
            '(' => {
                functions.push(trailing_ident(&out).to_ascii_lowercase());
                out.push(c);
                i += 1;
            }
            ')' => {
                functions.pop();
                out.push(c);
                i += 1;
            }
            '#' => {
                let end = scan_while(&chars, i + 1, |ch| ch.is_ascii_alphanumeric());
                let hex: String = chars[i + 1..end].iter().collect();
                out.push('#');
                out.push_str(&shorten_hex(&hex));
                i = end;
            }
            '\\' => {
                out.push(c);
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                }
                i += 2;
            }
            _ if is_url_start(&chars, i, &out) => i = copy_url(&chars, i, &mut out),
            _ if starts_number(&chars, i, &out) => {
                let (number_end, unit_end) = scan_number(&chars, i);
                let number: String = chars[i..number_end].iter().collect();
                let unit: String = chars[number_end..unit_end].iter().collect();
                let number = shorten_number(&number);
                let is_zero = number == "0";
                let unit_is_length = LENGTH_UNITS.contains(&unit.to_ascii_lowercase().as_str());
                out.push_str(&number);
                if !(is_zero && unit_is_length && functions.is_empty() && !keep_zero_unit) {
                    out.push_str(&unit);
                }
                i = unit_end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }
    out
}

fn copy_string(chars: &[char], start: usize, out: &mut String) -> usize {
    let quote = chars[start];
    out.push(quote);
    let mut i = start + 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if c == '\\' {
            if let Some(&escaped) = chars.get(i) {
                out.push(escaped);
                i += 1;
            }
        } else if c == quote {
            break;
        }
    }
    i
}

fn is_url_start(chars: &[char], i: usize, out: &str) -> bool {
    let prefix: String = chars[i..chars.len().min(i + 4)].iter().collect();
    prefix.eq_ignore_ascii_case("url(") && !out.chars().last().is_some_and(is_ident_char)
}

/// Copies `url(...)` verbatim, quoted or not.
fn copy_url(chars: &[char], start: usize, out: &mut String) -> usize {
    let mut i = start;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '"' | '\'' => {
                i = copy_string(chars, i, out);
                continue;
            }
            '\\' => {
                out.push(c);
                if let Some(&escaped) = chars.get(i + 1) {
                    out.push(escaped);
                }
                i += 2;
                continue;
            }
            _ => out.push(c),
        }
        i += 1;
        if c == ')' {
            break;
        }
    }
    i
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn trailing_ident(out: &str) -> &str {
    let start = out
        .char_indices()
        .rev()
        .take_while(|&(_, c)| is_ident_char(c))
        .last()
        .map(|(index, _)| index)
        .unwrap_or(out.len());
    &out[start..]
}

fn scan_while(chars: &[char], start: usize, pred: impl Fn(char) -> bool) -> usize {
    let mut i = start;
    while i < chars.len() && pred(chars[i]) {
        i += 1;
    }
    i
}

/// A number starts at a token boundary with a digit, `.digit` or a sign before either.
fn starts_number(chars: &[char], i: usize, out: &str) -> bool {
    if out
        .chars()
        .last()
        .is_some_and(|p| is_ident_char(p) || p == '.' || p == '#')
    {
        return false;
    }
    let digit_at = |index: usize| chars.get(index).is_some_and(|c| c.is_ascii_digit());
    let number_at = |index: usize| {
        digit_at(index) || (chars.get(index) == Some(&'.') && digit_at(index + 1))
    };
    match chars[i] {
        '+' | '-' => number_at(i + 1),
        _ => number_at(i),
    }
}

/// Returns the end of the numeric part and the end of the unit that follows it.
fn scan_number(chars: &[char], start: usize) -> (usize, usize) {
    let mut i = start;
    if matches!(chars[i], '+' | '-') {
        i += 1;
    }
    i = scan_while(chars, i, |c| c.is_ascii_digit());
    if chars.get(i) == Some(&'.') && chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
        i = scan_while(chars, i + 1, |c| c.is_ascii_digit());
    }
    if matches!(chars.get(i), Some('e' | 'E')) {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+' | '-')) {
            j += 1;
        }
        if chars.get(j).is_some_and(|c| c.is_ascii_digit()) {
            i = scan_while(chars, j, |c| c.is_ascii_digit());
        }
    }
    let unit_end = if chars.get(i) == Some(&'%') {
        i + 1
    } else {
        scan_while(chars, i, is_ident_char)
    };
    (i, unit_end)
}

/// `0.50` -> `.5`, `-0.0` -> `0`, `010` -> `10`. Exponents are left alone.
pub(crate) fn shorten_number(number: &str) -> String {
    if number.contains(['e', 'E']) {
        return number.to_string();
    }
    let (sign, digits) = match number.as_bytes().first() {
        Some(b'-') => ("-", &number[1..]),
        Some(b'+') => ("", &number[1..]),
        _ => ("", number),
    };
    let (int, frac) = digits.split_once('.').unwrap_or((digits, ""));
    let int = int.trim_start_matches('0');
    let frac = frac.trim_end_matches('0');
    match (int.is_empty(), frac.is_empty()) {
        (true, true) => "0".to_string(),
        (false, true) => format!("{sign}{int}"),
        (true, false) => format!("{sign}.{frac}"),
        (false, false) => format!("{sign}{int}.{frac}"),
    }
}

/// Lowercases hex colors and folds `#aabbcc` to `#abc` where possible.
pub(crate) fn shorten_hex(hex: &str) -> String {
    if !matches!(hex.len(), 3 | 4 | 6 | 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return hex.to_string();
    }
    let lower = hex.to_ascii_lowercase();
    if matches!(lower.len(), 6 | 8) {
        let bytes = lower.as_bytes();
        if bytes.chunks(2).all(|pair| pair[0] == pair[1]) {
            return bytes.chunks(2).map(|pair| pair[0] as char).collect();
        }
    }
    lower
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_selector() {
        assert_eq!(compact_selector("a > b + c ~ d"), "a>b+c~d");
        assert_eq!(compact_selector("ul li"), "ul li");
        assert_eq!(compact_selector(":is(a, b) c"), ":is(a,b) c");
        assert_eq!(compact_selector("li:nth-child( 2n + 1 )"), "li:nth-child(2n + 1)");
        assert_eq!(compact_selector("[title=\"a > b\"]"), "[title=\"a > b\"]");
    }

    #[test]
    fn test_compact_prelude() {
        assert_eq!(compact_prelude("screen, print"), "screen,print");
        assert_eq!(
            compact_prelude("screen and (min-width: 10px)"),
            "screen and (min-width:10px)"
        );
        assert_eq!(
            compact_prelude("(display: grid) and (not (display: inline-grid))"),
            "(display:grid) and (not (display:inline-grid))"
        );
    }

    #[test]
    fn test_compact_value_numbers_and_units() {
        assert_eq!(compact_value("margin", "0px 0.50em 1.0rem 010px"), "0 .5em 1rem 10px");
        assert_eq!(compact_value("opacity", "0.0"), "0");
        assert_eq!(compact_value("top", "-0.5px"), "-.5px");
        assert_eq!(compact_value("width", "0%"), "0%");
        assert_eq!(compact_value("transition", "opacity 0s"), "opacity 0s");
    }

    #[test]
    fn test_compact_value_keeps_zero_units_where_required() {
        assert_eq!(compact_value("width", "calc(100% - 0px)"), "calc(100% - 0px)");
        assert_eq!(compact_value("flex", "1 1 0px"), "1 1 0px");
        assert_eq!(compact_value("flex-basis", "0px"), "0px");
    }

    #[test]
    fn test_compact_value_separators() {
        assert_eq!(
            compact_value("font-family", "Helvetica , Arial, sans-serif"),
            "Helvetica,Arial,sans-serif"
        );
        assert_eq!(compact_value("font", "12px / 1.5 serif"), "12px/1.5 serif");
        assert_eq!(compact_value("transform", "translate( 10px, 0 )"), "translate(10px,0)");
    }

    #[test]
    fn test_compact_value_leaves_identifiers_and_urls_alone() {
        assert_eq!(compact_value("transform", "translate3d(0, 0, 0)"), "translate3d(0,0,0)");
        assert_eq!(compact_value("grid-area", "a1 / b2"), "a1/b2");
        assert_eq!(
            compact_value("background", "url( \"a 0.50.png\" ) #FFFFFF"),
            "url( \"a 0.50.png\" ) #fff"
        );
        assert_eq!(compact_value("background", "url(img/0.50px.png)"), "url(img/0.50px.png)");
        assert_eq!(compact_value("content", "\"0.50px , x\""), "\"0.50px , x\"");
    }

    #[test]
    fn test_shorten_hex() {
        assert_eq!(shorten_hex("AABBCC"), "abc");
        assert_eq!(shorten_hex("aabbccdd"), "abcd");
        assert_eq!(shorten_hex("aabbcd"), "aabbcd");
        assert_eq!(shorten_hex("header"), "header");
    }

    #[test]
    fn test_shorten_number() {
        assert_eq!(shorten_number("0.50"), ".5");
        assert_eq!(shorten_number("-0.0"), "0");
        assert_eq!(shorten_number("+1.0"), "1");
        assert_eq!(shorten_number("1e3"), "1e3");
        assert_eq!(shorten_number("10"), "10");
    }
}
