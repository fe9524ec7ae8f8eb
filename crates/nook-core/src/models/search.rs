//! Case-insensitive note search with result snippets.

use serde::Serialize;

use super::Note;

const SNIPPET_CHARS_BEFORE: usize = 40;
const SNIPPET_CHARS_AFTER: usize = 80;
const SNIPPET_FALLBACK_CHARS: usize = 100;

/// A search query: whitespace-separated terms that must all occur in a
/// note's title or content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    terms: Vec<Vec<char>>,
}

impl SearchQuery {
    /// Split `query` into terms. Returns `None` when it has none.
    pub fn parse(query: &str) -> Option<Self> {
        let terms = query.split_whitespace().map(fold_case).collect::<Vec<_>>();
        if terms.is_empty() {
            None
        } else {
            Some(Self { terms })
        }
    }

    pub fn matches(&self, note: &Note) -> bool {
        let title = fold_case(&note.title);
        let content = fold_case(&note.content);
        self.terms
            .iter()
            .all(|term| find(&title, term).is_some() || find(&content, term).is_some())
    }

    /// Content around the first occurrence of the first term, on one line.
    ///
    /// Falls back to the start of the content when the term only matched
    /// the title.
    pub fn snippet(&self, content: &str) -> String {
        let chars = content.chars().collect::<Vec<_>>();
        let first_match = self
            .terms
            .first()
            .and_then(|term| find(&fold_case(content), term));

        let (start, end) = first_match.map_or_else(
            || (0, chars.len().min(SNIPPET_FALLBACK_CHARS)),
            |index| {
                (
                    index.saturating_sub(SNIPPET_CHARS_BEFORE),
                    chars.len().min(index + SNIPPET_CHARS_AFTER),
                )
            },
        );

        let mut snippet = String::new();
        if start > 0 {
            snippet.push_str("...");
        }
        snippet.extend(chars[start..end].iter().map(|&ch| match ch {
            '\n' | '\r' => ' ',
            ch => ch,
        }));
        if end < chars.len() {
            snippet.push_str("...");
        }
        snippet
    }

    /// Search hit for `note`, if it matches.
    pub fn hit(&self, note: Note) -> Option<SearchHit> {
        if !self.matches(&note) {
            return None;
        }
        let snippet = self.snippet(&note.content);
        Some(SearchHit { note, snippet })
    }
}

/// A note matching a search, with the text around the match
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub note: Note,
    pub snippet: String,
}

/// Lowercase one char per input char, so indexes line up with the original.
fn fold_case(text: &str) -> Vec<char> {
    text.chars()
        .map(|ch| ch.to_lowercase().next().unwrap_or(ch))
        .collect()
}

fn find(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
