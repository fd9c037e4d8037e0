use unicode_segmentation::UnicodeSegmentation;

/// Multi-line text with a cursor.
///
/// The cursor is a byte offset that always sits on a grapheme boundary, so a
/// "character" for movement and deletion is one grapheme cluster. Columns are
/// counted in graphemes from the start of the line. Every mutator returns
/// whether anything changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    cursor: usize,
}

impl TextBuffer {
    /// Cursor starts at the end of the seeded text.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn insert(&mut self, chunk: &str) -> bool {
        if chunk.is_empty() {
            return false;
        }
        self.text.insert_str(self.cursor, chunk);
        self.cursor += chunk.len();
        true
    }

    pub fn insert_char(&mut self, ch: char) -> bool {
        let mut scratch = [0u8; 4];
        self.insert(ch.encode_utf8(&mut scratch))
    }

    pub fn insert_newline(&mut self) -> bool {
        self.insert_char('\n')
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(&self.text, self.cursor);
        self.text.drain(prev..self.cursor);
        self.cursor = prev;
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(&self.text, self.cursor);
        true
    }

    pub fn move_right(&mut self) -> bool {
        let next = next_grapheme_boundary(&self.text, self.cursor);
        if next == self.cursor {
            return false;
        }
        self.cursor = next;
        true
    }

    pub fn move_home(&mut self) -> bool {
        let start = line_start(&self.text, self.cursor);
        if start == self.cursor {
            return false;
        }
        self.cursor = start;
        true
    }

    pub fn move_end(&mut self) -> bool {
        let end = line_end(&self.text, self.cursor);
        if end == self.cursor {
            return false;
        }
        self.cursor = end;
        true
    }

    /// No-op on the first line.
    pub fn move_up(&mut self) -> bool {
        let start = line_start(&self.text, self.cursor);
        if start == 0 {
            return false;
        }
        let column = column_at(&self.text, start, self.cursor);
        let prev_start = line_start(&self.text, start - 1);
        self.cursor = position_for_column(&self.text, prev_start, column);
        true
    }

    /// No-op on the last line.
    pub fn move_down(&mut self) -> bool {
        let end = line_end(&self.text, self.cursor);
        if end == self.text.len() {
            return false;
        }
        let column = column_at(&self.text, line_start(&self.text, self.cursor), self.cursor);
        self.cursor = position_for_column(&self.text, end + 1, column);
        true
    }

    /// Zero-based line index of the cursor.
    pub fn cursor_line(&self) -> usize {
        self.text[..self.cursor].matches('\n').count()
    }

    /// Grapheme column of the cursor within its line.
    pub fn cursor_column(&self) -> usize {
        column_at(&self.text, line_start(&self.text, self.cursor), self.cursor)
    }

    /// Text between the start of the cursor's line and the cursor, for
    /// measuring display width.
    pub fn line_prefix_before_cursor(&self) -> &str {
        &self.text[line_start(&self.text, self.cursor)..self.cursor]
    }
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[..cursor]
        .grapheme_indices(true)
        .next_back()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .graphemes(true)
        .next()
        .map(|grapheme| cursor + grapheme.len())
        .unwrap_or(text.len())
}

fn line_start(text: &str, cursor: usize) -> usize {
    text[..cursor].rfind('\n').map(|idx| idx + 1).unwrap_or(0)
}

fn line_end(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .find('\n')
        .map(|idx| cursor + idx)
        .unwrap_or(text.len())
}

fn column_at(text: &str, line_start: usize, cursor: usize) -> usize {
    text[line_start..cursor].graphemes(true).count()
}

fn position_for_column(text: &str, line_start: usize, column: usize) -> usize {
    let line_end = line_end(text, line_start);
    text[line_start..line_end]
        .grapheme_indices(true)
        .nth(column)
        .map(|(idx, _)| line_start + idx)
        .unwrap_or(line_end)
}

#[cfg(test)]
mod tests {
    use super::TextBuffer;

    #[test]
    fn new_buffer_places_cursor_at_end() {
        let buffer = TextBuffer::new("hello");
        assert_eq!(buffer.cursor(), 5);
        assert!(TextBuffer::default().is_empty());
    }

    #[test]
    fn insert_splices_at_cursor() {
        let mut buffer = TextBuffer::new("held");
        buffer.move_left();
        assert!(buffer.insert("lo wor"));
        assert_eq!(buffer.text(), "hello word");
        assert_eq!(buffer.cursor(), 9);
        assert!(!buffer.insert(""));
    }

    #[test]
    fn backspace_is_noop_at_start() {
        let mut buffer = TextBuffer::new("ab");
        assert!(buffer.backspace());
        assert!(buffer.backspace());
        assert!(!buffer.backspace());
        assert_eq!(buffer.text(), "");
        assert_eq!(buffer.cursor(), 0);
    }

    #[test]
    fn horizontal_moves_clamp() {
        let mut buffer = TextBuffer::new("é✓");
        assert!(!buffer.move_right());
        assert!(buffer.move_left());
        assert!(buffer.move_left());
        assert!(!buffer.move_left());
        assert_eq!(buffer.cursor(), 0);
        assert!(buffer.move_right());
        assert_eq!(buffer.cursor(), "é".len());
    }

    #[test]
    fn backspace_removes_whole_grapheme() {
        let mut buffer = TextBuffer::new("ae\u{301}");
        assert!(buffer.backspace());
        assert_eq!(buffer.text(), "a");
    }

    #[test]
    fn vertical_moves_clamp_column_to_line_length() {
        let mut buffer = TextBuffer::new("abcdef\nab\nabcd");
        // cursor at end of "abcd", column 4
        assert!(buffer.move_up());
        assert_eq!(buffer.cursor_line(), 1);
        assert_eq!(buffer.cursor_column(), 2);
        assert!(buffer.move_up());
        assert_eq!(buffer.cursor_line(), 0);
        assert_eq!(buffer.cursor_column(), 2);
        assert!(!buffer.move_up());
        assert_eq!(buffer.cursor(), 2);
    }

    #[test]
    fn move_down_is_noop_on_last_line() {
        let mut buffer = TextBuffer::new("one\ntwo");
        let before = buffer.cursor();
        assert!(!buffer.move_down());
        assert_eq!(buffer.cursor(), before);
    }

    #[test]
    fn down_then_up_restores_column() {
        let mut buffer = TextBuffer::new("first line\nsecond line");
        buffer.move_up();
        buffer.move_home();
        for _ in 0..4 {
            buffer.move_right();
        }
        assert_eq!(buffer.cursor_column(), 4);
        assert!(buffer.move_down());
        assert_eq!(buffer.cursor_column(), 4);
        assert!(buffer.move_up());
        assert_eq!(buffer.cursor_column(), 4);
        assert_eq!(buffer.cursor(), 4);
    }

    #[test]
    fn newline_splits_line_and_advances() {
        let mut buffer = TextBuffer::new("ab");
        buffer.move_left();
        assert!(buffer.insert_newline());
        assert_eq!(buffer.text(), "a\nb");
        assert_eq!(buffer.cursor(), 2);
        assert_eq!(buffer.cursor_line(), 1);
        assert_eq!(buffer.line_prefix_before_cursor(), "");
    }

    #[test]
    fn cursor_stays_in_bounds_across_edit_sequences() {
        let mut buffer = TextBuffer::default();
        let mut seed: u32 = 0x5eed;
        for _ in 0..2_000 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            match (seed >> 16) % 8 {
                0 => {
                    buffer.insert("x");
                }
                1 => {
                    buffer.insert("ü\n");
                }
                2 | 3 => {
                    buffer.backspace();
                }
                4 => {
                    buffer.move_left();
                }
                5 => {
                    buffer.move_right();
                }
                6 => {
                    buffer.move_up();
                }
                _ => {
                    buffer.move_down();
                }
            }
            assert!(buffer.cursor() <= buffer.len());
            assert!(buffer.text().is_char_boundary(buffer.cursor()));
        }
    }
}
