//! Char cursor with line tracking.

use crate::ast::Position;

pub(crate) struct Cursor {
    chars: Vec<char>,
    pos: usize,
    /// Char index at which each line starts.
    line_starts: Vec<usize>,
}

impl Cursor {
    pub(crate) fn new(text: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(line_breaks(text).map(|(char_index, _)| char_index))
            .collect();
        Self {
            chars: text.chars().collect(),
            pos: 0,
            line_starts,
        }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn is_eof(&self) -> bool {
        self.pos >= self.chars.len()
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub(crate) fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    pub(crate) fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    pub(crate) fn advance(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.chars.len());
    }

    pub(crate) fn starts_with(&self, s: &str) -> bool {
        let mut i = self.pos;
        for expected in s.chars() {
            match self.chars.get(i) {
                Some(&c) if c == expected => i += 1,
                _ => return false,
            }
        }
        true
    }

    /// Case-insensitive variant of [`Cursor::starts_with`] for ASCII keywords.
    pub(crate) fn starts_with_ignore_case(&self, s: &str) -> bool {
        let mut i = self.pos;
        for expected in s.chars() {
            match self.chars.get(i) {
                Some(c) if c.eq_ignore_ascii_case(&expected) => i += 1,
                _ => return false,
            }
        }
        true
    }

    pub(crate) fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(is_whitespace) {
            self.pos += 1;
        }
    }

    pub(crate) fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end.min(self.chars.len())].iter().collect()
    }

    pub(crate) fn position_of(&self, index: usize) -> Position {
        let line = match self.line_starts.binary_search(&index) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        let column = index - self.line_starts[line];
        Position::new(line as u32 + 1, column as u32 + 1)
    }
}

/// Starts of every line after the first, as `(char index, byte index)`.
///
/// Lines end at `\n`, `\r\n`, a lone `\r` or a form feed.
pub(crate) fn line_breaks(text: &str) -> impl Iterator<Item = (usize, usize)> + '_ {
    let mut chars = text.char_indices().enumerate().peekable();
    std::iter::from_fn(move || {
        while let Some((index, (byte, c))) = chars.next() {
            let breaks = match c {
                '\n' | '\u{c}' => true,
                '\r' => chars.peek().map(|&(_, (_, next))| next) != Some('\n'),
                _ => false,
            };
            if breaks {
                return Some((index + 1, byte + c.len_utf8()));
            }
        }
        None
    })
}

/// Byte offsets of line starts, with the same line breaks as [`Cursor`].
///
/// Lines and columns are 1-based; columns count chars.
#[derive(Debug, Clone, Default)]
pub(crate) struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(text: &str) -> Self {
        Self {
            starts: std::iter::once(0)
                .chain(line_breaks(text).map(|(_, byte)| byte))
                .collect(),
        }
    }

    pub(crate) fn line_count(&self) -> u32 {
        self.starts.len() as u32
    }

    /// Byte offset where `line` starts.
    pub(crate) fn line_start(&self, line: u32) -> Option<usize> {
        self.starts.get(line.checked_sub(1)? as usize).copied()
    }

    /// Text of `line` without its terminator.
    pub(crate) fn line<'t>(&self, text: &'t str, line: u32) -> Option<&'t str> {
        let start = self.line_start(line)?;
        let end = self.starts.get(line as usize).copied().unwrap_or(text.len());
        Some(text.get(start..end)?.trim_end_matches(['\n', '\r', '\u{c}']))
    }

    /// Byte offset of a position, with the column clamped to its line.
    pub(crate) fn offset(&self, text: &str, line: u32, column: u32) -> Option<usize> {
        let start = self.line_start(line)?;
        let content = self.line(text, line)?;
        let within = content
            .char_indices()
            .nth(column.saturating_sub(1) as usize)
            .map_or(content.len(), |(byte, _)| byte);
        Some(start + within)
    }

    /// 0-based column of a position in UTF-16 code units.
    pub(crate) fn utf16_column(&self, text: &str, line: u32, column: u32) -> u32 {
        let chars = column.saturating_sub(1) as usize;
        match self.line(text, line) {
            Some(content) => content.chars().take(chars).map(char::len_utf16).sum::<usize>() as u32,
            None => chars as u32,
        }
    }
}

pub(crate) fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\u{c}')
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}
