//! Byte cursor primitives
//!
//! The three operations the TMX loader is written against: match a
//! literal, take a span up to a delimiter, and read a decimal integer.
//! All of them are total over the buffer; a failed match leaves the
//! cursor untouched.

/// Forward-only cursor over a byte buffer.
pub struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// True when the cursor has reached the end of the buffer.
    pub fn is_done(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// The byte under the cursor, if any.
    pub fn peek(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    /// Advance the cursor by one byte.
    pub fn advance(&mut self) {
        if self.pos < self.data.len() {
            self.pos += 1;
        }
    }

    /// If the bytes at the cursor are exactly `literal`, consume them and
    /// return true. Otherwise the cursor is left where it was.
    pub fn eat_literal(&mut self, literal: &str) -> bool {
        let pat = literal.as_bytes();
        if self.data[self.pos.min(self.data.len())..].starts_with(pat) {
            self.pos += pat.len();
            true
        } else {
            false
        }
    }

    /// Take the span up to (not including) `delimiter` and leave the
    /// cursor just past it. Returns `None` with the cursor untouched if
    /// the delimiter never appears.
    pub fn take_until(&mut self, delimiter: u8) -> Option<&'a [u8]> {
        let rest = &self.data[self.pos.min(self.data.len())..];
        let end = rest.iter().position(|&b| b == delimiter)?;
        self.pos += end + 1;
        Some(&rest[..end])
    }

    /// Read a decimal integer: optional leading `-`, then ASCII digits.
    /// Returns 0 when no digits follow (the `-` is still consumed).
    pub fn take_integer(&mut self) -> i32 {
        let negative = self.eat_literal("-");
        let mut value: i64 = 0;
        while let Some(b @ b'0'..=b'9') = self.peek() {
            value = value.saturating_mul(10).saturating_add((b - b'0') as i64);
            self.advance();
        }
        if negative {
            value = -value;
        }
        value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    }
}
