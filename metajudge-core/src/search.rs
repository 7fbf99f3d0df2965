//! Highlight search over workout history text.
//!
//! A reviewer selects a span in the insight or judge reasoning; the same text
//! is located in the workout history, case-insensitively, and the reviewer
//! steps through the matches with wrap-around.
//!
//! Offsets are character offsets into the original document. Characters are
//! folded one at a time, so folded and original offsets always coincide.

use std::ops::Range;

/// Shortest trimmed selection (in characters) that triggers a search.
pub const MIN_SELECTION_CHARS: usize = 2;

/// A located match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// Character offset of the first matched character
    pub start: usize,
    /// Character offset one past the last matched character
    pub end: usize,
    /// Equivalent byte range, for slicing the document
    pub byte_range: Range<usize>,
}

impl Occurrence {
    /// The matched text as it appears in `document`.
    pub fn text<'a>(&self, document: &'a str) -> &'a str {
        &document[self.byte_range.clone()]
    }
}

/// Lowercase a single character, leaving it untouched when its lowercase
/// form expands to more than one character.
fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Find every case-insensitive, non-overlapping occurrence of `query` in
/// `document`, in ascending start order.
///
/// An empty query matches nothing.
pub fn find_occurrences(query: &str, document: &str) -> Vec<Occurrence> {
    let needle: Vec<char> = query.chars().map(fold_char).collect();
    if needle.is_empty() {
        return Vec::new();
    }

    let hay: Vec<(usize, char)> = document
        .char_indices()
        .map(|(byte, c)| (byte, fold_char(c)))
        .collect();

    let mut occurrences = Vec::new();
    let mut pos = 0;
    while pos + needle.len() <= hay.len() {
        let window = &hay[pos..pos + needle.len()];
        if window.iter().map(|(_, c)| *c).eq(needle.iter().copied()) {
            let end = pos + needle.len();
            let byte_start = hay[pos].0;
            let byte_end = hay.get(end).map(|(b, _)| *b).unwrap_or(document.len());
            occurrences.push(Occurrence {
                start: pos,
                end,
                byte_range: byte_start..byte_end,
            });
            // Consume the match before looking for the next one
            pos = end;
        } else {
            pos += 1;
        }
    }

    occurrences
}

/// Search state for one document: the query, its matches, and a cursor.
#[derive(Debug, Clone, Default)]
pub struct HighlightSearch {
    query: String,
    occurrences: Vec<Occurrence>,
    current: Option<usize>,
}

impl HighlightSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute matches for `query`. The cursor lands on the first match.
    pub fn search(&mut self, query: &str, document: &str) -> &[Occurrence] {
        self.query = query.to_string();
        self.occurrences = find_occurrences(query, document);
        self.current = if self.occurrences.is_empty() {
            None
        } else {
            Some(0)
        };

        tracing::debug!(
            query = %self.query,
            matches = self.occurrences.len(),
            "Highlight search"
        );

        &self.occurrences
    }

    /// Handle a selection change in a source panel.
    ///
    /// The selection is trimmed; anything shorter than
    /// [`MIN_SELECTION_CHARS`] clears the search instead.
    pub fn on_selection(&mut self, selection: &str, document: &str) -> &[Occurrence] {
        let trimmed = selection.trim();
        if trimmed.chars().count() < MIN_SELECTION_CHARS {
            self.clear();
            return &self.occurrences;
        }
        self.search(trimmed, document)
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.occurrences.clear();
        self.current = None;
    }

    /// Move to the next match, wrapping to the first. No-op without matches.
    pub fn next(&mut self) -> Option<&Occurrence> {
        let len = self.occurrences.len();
        if len == 0 {
            return None;
        }
        let idx = self.current.map(|i| (i + 1) % len).unwrap_or(0);
        self.current = Some(idx);
        self.occurrences.get(idx)
    }

    /// Move to the previous match, wrapping to the last. No-op without matches.
    pub fn prev(&mut self) -> Option<&Occurrence> {
        let len = self.occurrences.len();
        if len == 0 {
            return None;
        }
        let idx = self.current.map(|i| (i + len - 1) % len).unwrap_or(0);
        self.current = Some(idx);
        self.occurrences.get(idx)
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn occurrences(&self) -> &[Occurrence] {
        &self.occurrences
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Occurrence> {
        self.current.and_then(|i| self.occurrences.get(i))
    }

    /// True when a query is set, whether or not it matched.
    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    /// "2/5 matches for 'squat'", "no matches for 'squat'", or None when idle.
    pub fn status_line(&self) -> Option<String> {
        if !self.is_active() {
            return None;
        }
        match self.current {
            Some(idx) => Some(format!(
                "{}/{} matches for '{}'",
                idx + 1,
                self.occurrences.len(),
                self.query
            )),
            None => Some(format!("no matches for '{}'", self.query)),
        }
    }
}

/// How a piece of the document should be drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    Plain,
    Match,
    CurrentMatch,
}

/// Split `document` into plain and highlighted pieces, in order.
pub fn highlight_segments<'a>(
    document: &'a str,
    occurrences: &[Occurrence],
    current: Option<usize>,
) -> Vec<(&'a str, SegmentKind)> {
    let mut segments = Vec::with_capacity(occurrences.len() * 2 + 1);
    let mut cursor = 0;
    for (idx, occ) in occurrences.iter().enumerate() {
        if occ.byte_range.start > cursor {
            segments.push((&document[cursor..occ.byte_range.start], SegmentKind::Plain));
        }
        let kind = if Some(idx) == current {
            SegmentKind::CurrentMatch
        } else {
            SegmentKind::Match
        };
        segments.push((occ.text(document), kind));
        cursor = occ.byte_range.end;
    }
    if cursor < document.len() {
        segments.push((&document[cursor..], SegmentKind::Plain));
    }
    segments
}
