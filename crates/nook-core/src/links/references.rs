//! Reference extraction

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]*))?\]\]").expect("Invalid reference regex")
});

/// An inline `[[Title]]` or `[[Title|Alias]]` token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Target note title, verbatim
    pub title: String,
    /// Display alias after `|`, if any
    pub alias: Option<String>,
}

/// Extract references from note content, in order of appearance.
///
/// # Examples
///
/// ```
/// use nook_core::links::extract_references;
///
/// let refs = extract_references("See [[Alpha|here]] and [[Beta]]");
/// assert_eq!(refs[0].title, "Alpha");
/// assert_eq!(refs[0].alias.as_deref(), Some("here"));
/// assert_eq!(refs[1].title, "Beta");
/// assert_eq!(refs[1].alias, None);
/// ```
#[must_use]
pub fn extract_references(content: &str) -> Vec<Reference> {
    REFERENCE_RE
        .captures_iter(content)
        .map(|cap| Reference {
            title: cap[1].to_string(),
            alias: cap.get(2).map(|alias| alias.as_str().to_string()),
        })
        .collect()
}
