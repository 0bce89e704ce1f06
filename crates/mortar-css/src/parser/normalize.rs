//! Whitespace and comment normalization for selectors, preludes and values.

use super::cursor::is_whitespace;

/// What an inline comment turns into when it is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Comments {
    /// `a/**/b` becomes `ab` (selectors, property names).
    Remove,
    /// `1px/**/solid` becomes `1px solid` (values, preludes).
    AsSpace,
}

/// Drops comments and collapses whitespace runs outside strings, trimming both ends.
pub(crate) fn collapse(raw: &str, comments: Comments) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut pending_space = false;

    let flush = |out: &mut String, pending: &mut bool| {
        if *pending && !out.is_empty() {
            out.push(' ');
        }
        *pending = false;
    };

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                flush(&mut out, &mut pending_space);
                out.push(c);
                while let Some(inner) = chars.next() {
                    out.push(inner);
                    if inner == '\\' {
                        if let Some(escaped) = chars.next() {
                            out.push(escaped);
                        }
                    } else if inner == c {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
                if comments == Comments::AsSpace {
                    pending_space = true;
                }
            }
            '\\' => {
                flush(&mut out, &mut pending_space);
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            c if is_whitespace(c) => pending_space = true,
            _ => {
                flush(&mut out, &mut pending_space);
                out.push(c);
            }
        }
    }
    out
}

/// Splits `s` on `separator` wherever it is outside strings, parentheses and brackets.
pub(crate) fn split_top_level(s: &str, separator: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;
    for index in top_level_indices(s, separator) {
        parts.push(s[start..index].trim().to_string());
        start = index + separator.len_utf8();
    }
    parts.push(s[start..].trim().to_string());
    parts
}

/// Byte index of the first top-level `needle`, skipping strings and comments.
pub(crate) fn find_top_level(s: &str, needle: char) -> Option<usize> {
    top_level_indices(s, needle).into_iter().next()
}

fn top_level_indices(s: &str, needle: char) -> Vec<usize> {
    let mut found = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut in_comment = false;
    let mut chars = s.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        if in_comment {
            if c == '*' && chars.peek().map(|&(_, n)| n) == Some('/') {
                chars.next();
                in_comment = false;
            }
            continue;
        }
        if let Some(q) = quote {
            if c == '\\' {
                chars.next();
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => quote = Some(c),
            '\\' => {
                chars.next();
            }
            '/' if chars.peek().map(|&(_, n)| n) == Some('*') => {
                chars.next();
                in_comment = true;
            }
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            c if c == needle && depth == 0 => found.push(index),
            _ => {}
        }
    }
    found
}
