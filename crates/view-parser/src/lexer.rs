//! Character cursor over template source.

use source_map::Span;

/// A cursor over template source, tracking a byte position.
pub struct Cursor<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at the start of the source.
    pub fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    /// Get the current position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Get the remaining source.
    pub fn remaining(&self) -> &'a str {
        &self.source[self.pos..]
    }

    /// Peek at the next character.
    pub fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Peek at the character after the next one.
    pub fn peek_second(&self) -> Option<char> {
        self.remaining().chars().nth(1)
    }

    /// Consume and return the next character.
    pub fn next_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skip whitespace and return the number of bytes skipped.
    pub fn skip_whitespace(&mut self) -> usize {
        let start = self.pos;
        self.consume_while(char::is_whitespace);
        self.pos - start
    }

    /// Check if the remaining source starts with the given string.
    pub fn starts_with(&self, s: &str) -> bool {
        self.remaining().starts_with(s)
    }

    /// Check, ignoring ASCII case, if the remaining source starts with `s`.
    pub fn starts_with_ignore_case(&self, s: &str) -> bool {
        self.remaining()
            .get(..s.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(s))
    }

    /// Consume a string if the remaining source starts with it.
    pub fn consume(&mut self, s: &str) -> bool {
        if self.starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate is true.
    pub fn consume_while<F>(&mut self, pred: F) -> &'a str
    where
        F: Fn(char) -> bool,
    {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if pred(c) {
                self.next_char();
            } else {
                break;
            }
        }
        &self.source[start..self.pos]
    }

    /// Consume up to (not including) `delimiter` and then the delimiter itself.
    ///
    /// Returns the consumed content, or `None` without moving if the delimiter
    /// never occurs.
    pub fn consume_through(&mut self, delimiter: &str) -> Option<&'a str> {
        let offset = self.remaining().find(delimiter)?;
        let content = &self.remaining()[..offset];
        self.pos += offset + delimiter.len();
        Some(content)
    }

    /// Read a tag name.
    pub fn read_tag_name(&mut self) -> Option<&'a str> {
        match self.peek_char() {
            Some(c) if c.is_ascii_alphabetic() => {}
            _ => return None,
        }
        Some(self.consume_while(|c| {
            c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':' || c == '.'
        }))
    }

    /// Read an attribute name.
    ///
    /// Attribute names are permissive: `:if`, `::raw`, `@click.prevent` and
    /// `x-on:click` are all single names.
    pub fn read_attr_name(&mut self) -> &'a str {
        self.consume_while(|c| {
            !c.is_whitespace() && !matches!(c, '=' | '>' | '/' | '"' | '\'' | '<')
        })
    }

    /// Read a quoted string value, returning `None` if it is unterminated.
    pub fn read_quoted_string(&mut self) -> Option<(&'a str, Span)> {
        let quote = self.peek_char()?;
        if quote != '"' && quote != '\'' {
            return None;
        }
        let value_start = self.pos + quote.len_utf8();
        let len = self.source[value_start..].find(quote)?;
        let value = &self.source[value_start..value_start + len];
        self.pos = value_start + len + 1;
        Some((value, Span::from_offsets(value_start, value_start + len)))
    }

    /// Read an unquoted attribute value.
    pub fn read_unquoted_value(&mut self) -> (&'a str, Span) {
        let start = self.pos;
        let value = self.consume_while(|c| !c.is_whitespace() && c != '>');
        (value, Span::from_offsets(start, self.pos))
    }

    /// Check if at end of input.
    pub fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    /// Get a span from start to current position.
    pub fn span_from(&self, start: usize) -> Span {
        Span::from_offsets(start, self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_tag_name() {
        let mut cursor = Cursor::new("x-base-layout>");
        assert_eq!(cursor.read_tag_name(), Some("x-base-layout"));
        assert_eq!(cursor.peek_char(), Some('>'));
    }

    #[test]
    fn test_read_attr_name() {
        let mut cursor = Cursor::new("x-on:click=\"foo\"");
        assert_eq!(cursor.read_attr_name(), "x-on:click");
        let mut cursor = Cursor::new("::escaped=\"foo\"");
        assert_eq!(cursor.read_attr_name(), "::escaped");
    }

    #[test]
    fn test_read_quoted_string() {
        let mut cursor = Cursor::new("\"$items as $item\" :if");
        let (value, span) = cursor.read_quoted_string().unwrap();
        assert_eq!(value, "$items as $item");
        assert_eq!(span, Span::new(1, 16));
        assert_eq!(cursor.remaining(), " :if");

        let mut cursor = Cursor::new("'never closed");
        assert!(cursor.read_quoted_string().is_none());
    }

    #[test]
    fn test_read_unquoted_value_keeps_slash() {
        let mut cursor = Cursor::new("/x/>");
        let (value, span) = cursor.read_unquoted_value();
        assert_eq!(value, "/x/");
        assert_eq!(span, Span::new(0, 3));
        assert!(cursor.starts_with(">"));

        let mut cursor = Cursor::new("bar />");
        assert_eq!(cursor.read_unquoted_value().0, "bar");
        assert!(cursor.starts_with(" />"));
    }

    #[test]
    fn test_consume_through() {
        let mut cursor = Cursor::new(" a comment --}}<p>");
        assert_eq!(cursor.consume_through("--}}"), Some(" a comment "));
        assert!(cursor.starts_with("<p>"));
        assert_eq!(cursor.consume_through("!!}"), None);
        assert_eq!(cursor.pos(), 15);
    }
}
