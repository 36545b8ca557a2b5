//! Boundary hierarchy for recursive splitting

/// Semantic units the splitter may cut at, ordered by size
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Boundary {
    /// Any character (lowest, always applicable)
    Character = 1,
    /// Word boundary
    Word = 2,
    /// Line break
    Line = 3,
    /// Blank line between paragraphs (highest)
    Paragraph = 4,
}

impl Boundary {
    /// Default hierarchy, largest unit first
    pub const HIERARCHY: [Boundary; 4] = [
        Boundary::Paragraph,
        Boundary::Line,
        Boundary::Word,
        Boundary::Character,
    ];

    /// Separator text for this boundary; empty for per-character splitting
    pub fn separator(self) -> &'static str {
        match self {
            Boundary::Paragraph => "\n\n",
            Boundary::Line => "\n",
            Boundary::Word => " ",
            Boundary::Character => "",
        }
    }

    /// Whether text can be cut at this boundary
    pub fn occurs_in(self, text: &str) -> bool {
        let sep = self.separator();
        sep.is_empty() || text.contains(sep)
    }
}

/// Split `text` at every occurrence of the boundary's separator.
///
/// The separator stays attached to the start of the piece that follows it, so
/// concatenating the pieces gives back `text`. Empty pieces are dropped.
pub fn split_at_boundary(text: &str, boundary: Boundary) -> Vec<&str> {
    let separator = boundary.separator();
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (pos, _) in text.match_indices(separator) {
        if pos > start {
            pieces.push(&text[start..pos]);
        }
        start = pos;
    }
    if start < text.len() {
        pieces.push(&text[start..]);
    }

    pieces
}
