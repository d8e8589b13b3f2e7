use ropey::Rope;

/// A visible line span of an editor, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

impl LineRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn height(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn contains(&self, line: usize) -> bool {
        (self.start..=self.end).contains(&line)
    }
}

/// Text of one open document, backed by a Rope.
#[derive(Debug, Clone)]
pub struct Document {
    pub name: String,
    pub rope: Rope,
    /// Bumped on every edit.
    pub version: u64,
}

impl Document {
    pub fn new(name: impl Into<String>, text: &str) -> Self {
        Self {
            name: name.into(),
            rope: Rope::from_str(text),
            version: 0,
        }
    }

    /// Total number of lines in the document.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Get the text of a specific line (without trailing newline).
    pub fn line_text(&self, idx: usize) -> Option<String> {
        if idx >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(idx);
        let mut s: String = line.chunks().collect();
        if s.ends_with('\n') {
            s.pop();
        }
        if s.ends_with('\r') {
            s.pop();
        }
        Some(s)
    }

    /// Replace the text of line `idx`, keeping its line ending.
    ///
    /// Indices past the end append a new line.
    pub fn set_line(&mut self, idx: usize, text: &str) {
        if idx >= self.rope.len_lines() {
            let end = self.rope.len_chars();
            if end > 0 && self.rope.char(end - 1) != '\n' {
                self.rope.insert_char(end, '\n');
            }
            let end = self.rope.len_chars();
            self.rope.insert(end, text);
        } else {
            let start = self.rope.line_to_char(idx);
            let old_len = self.line_text(idx).map(|l| l.chars().count()).unwrap_or(0);
            self.rope.remove(start..start + old_len);
            self.rope.insert(start, text);
        }
        self.version += 1;
    }

    /// Insert a whole line before `idx`, shifting the rest down.
    pub fn insert_line(&mut self, idx: usize, text: &str) {
        if idx >= self.rope.len_lines() {
            self.set_line(idx, text);
            return;
        }
        let start = self.rope.line_to_char(idx);
        self.rope.insert(start, &format!("{text}\n"));
        self.version += 1;
    }
}
