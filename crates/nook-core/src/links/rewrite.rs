//! Rewriting inbound references after a title change

use regex::{Captures, Regex};

use crate::db::{NoteAccess, NoteStore};
use crate::error::{Error, Result};

/// Rewrites `[[Old]]` / `[[Old|Alias]]` to `[[New]]` / `[[New|Alias]]`.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    pattern: Regex,
    new_title: String,
}

impl LinkRewriter {
    /// Build a rewriter, or `None` when the rename cannot affect any reference
    /// (empty old title, or old and new titles equal).
    pub fn new(old_title: &str, new_title: &str) -> Result<Option<Self>> {
        if old_title.is_empty() || old_title == new_title {
            return Ok(None);
        }

        // The title is matched literally; unescaped metacharacters would
        // match unrelated text.
        let pattern = format!(r"\[\[{}(\|[^\]]*)?\]\]", regex::escape(old_title));
        let pattern = Regex::new(&pattern)
            .map_err(|error| Error::InvalidInput(format!("title cannot be matched: {error}")))?;

        Ok(Some(Self {
            pattern,
            new_title: new_title.to_string(),
        }))
    }

    /// Rewritten content, or `None` when `content` holds no matching reference.
    pub fn rewrite(&self, content: &str) -> Option<String> {
        if !self.pattern.is_match(content) {
            return None;
        }

        // Closure replacement inserts the title literally, `$` included.
        let rewritten = self.pattern.replace_all(content, |caps: &Captures<'_>| {
            let alias = caps.get(1).map_or("", |alias| alias.as_str());
            format!("[[{}{alias}]]", self.new_title)
        });
        Some(rewritten.into_owned())
    }
}

/// Rewrite inbound references of one owner's notes using an open transaction.
///
/// Only notes whose content changes are written, each with a bumped
/// `updated_at`. Returns the number of notes rewritten.
pub fn rewrite_references_in(
    tx: &dyn NoteAccess,
    owner_id: &str,
    old_title: &str,
    new_title: &str,
) -> Result<usize> {
    let Some(rewriter) = LinkRewriter::new(old_title, new_title)? else {
        return Ok(0);
    };

    let mut rewritten = 0;
    for mut note in tx.list_by_owner(owner_id)? {
        let Some(content) = rewriter.rewrite(&note.content) else {
            continue;
        };
        note.content = content;
        note.touch();
        tx.put(&note)?;
        rewritten += 1;
    }

    tracing::debug!(
        owner = owner_id,
        rewritten,
        "Rewrote references after title change"
    );
    Ok(rewritten)
}

/// Rewrite inbound references of one owner's notes as a single atomic transaction.
pub fn rewrite_references<S: NoteStore>(
    store: &S,
    owner_id: &str,
    old_title: &str,
    new_title: &str,
) -> Result<usize> {
    if LinkRewriter::new(old_title, new_title)?.is_none() {
        return Ok(0);
    }
    store.transaction(|tx| rewrite_references_in(tx, owner_id, old_title, new_title))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteNoteStore;
    use crate::models::Note;
    use pretty_assertions::assert_eq;

    fn rewriter(old: &str, new: &str) -> LinkRewriter {
        LinkRewriter::new(old, new).unwrap().unwrap()
    }

    #[test]
    fn rewrites_plain_and_aliased_references() {
        let rewritten = rewriter("Alpha", "Gamma")
            .rewrite("See [[Alpha|here]] and [[Beta]]")
            .unwrap();
        assert_eq!(rewritten, "See [[Gamma|here]] and [[Beta]]");
    }

    #[test]
    fn no_op_for_empty_or_unchanged_titles() {
        assert!(LinkRewriter::new("", "Gamma").unwrap().is_none());
        assert!(LinkRewriter::new("Alpha", "Alpha").unwrap().is_none());
    }

    #[test]
    fn escapes_regex_metacharacters_in_old_title() {
        let rewriter = rewriter("C++ (draft).*", "C++");
        assert_eq!(
            rewriter.rewrite("[[C++ (draft).*]] [[C++ (draft)x]] [[Cpp (draft)]]"),
            Some("[[C++]] [[C++ (draft)x]] [[Cpp (draft)]]".to_string())
        );
        assert_eq!(rewriter.rewrite("[[C (draft)]]"), None);
    }

    #[test]
    fn inserts_new_title_literally() {
        let rewritten = rewriter("Price", "Cost $1 ${x}").rewrite("[[Price|p]]").unwrap();
        assert_eq!(rewritten, "[[Cost $1 ${x}|p]]");
    }

    #[test]
    fn does_not_match_longer_titles() {
        assert_eq!(rewriter("Alpha", "Gamma").rewrite("[[Alphabet]] [[The Alpha]]"), None);
    }

    #[test]
    fn store_rewrite_updates_only_matching_notes() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        let target = Note::new("alice", "Alpha", "I am alpha");
        let mut referrer = Note::new("alice", "Y", "See [[Alpha|here]] and [[Beta]]");
        referrer.updated_at = 100;
        let mut bystander = Note::new("alice", "Z", "Nothing to see");
        bystander.updated_at = 100;
        let mut other_owner = Note::new("bob", "W", "[[Alpha]]");
        other_owner.updated_at = 100;
        for note in [&target, &referrer, &bystander, &other_owner] {
            store.put(note).unwrap();
        }

        let count = rewrite_references(&store, "alice", "Alpha", "Gamma").unwrap();
        assert_eq!(count, 1);

        let referrer_after = store.get("alice", &referrer.id).unwrap().unwrap();
        assert_eq!(referrer_after.content, "See [[Gamma|here]] and [[Beta]]");
        assert!(referrer_after.updated_at > 100);

        let bystander_after = store.get("alice", &bystander.id).unwrap().unwrap();
        assert_eq!(bystander_after, bystander);

        let other_after = store.get("bob", &other_owner.id).unwrap().unwrap();
        assert_eq!(other_after.content, "[[Alpha]]");
    }

    #[test]
    fn store_rewrite_is_idempotent() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        let referrer = Note::new("alice", "Y", "See [[Alpha|here]] and [[Beta]]");
        store.put(&referrer).unwrap();

        assert_eq!(rewrite_references(&store, "alice", "Alpha", "Gamma").unwrap(), 1);
        let first = store.get("alice", &referrer.id).unwrap().unwrap();

        assert_eq!(rewrite_references(&store, "alice", "Alpha", "Gamma").unwrap(), 0);
        let second = store.get("alice", &referrer.id).unwrap().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn failed_transaction_leaves_no_partial_rewrite() {
        let store = SqliteNoteStore::open_in_memory().unwrap();
        let first = Note::new("alice", "A", "[[Alpha]]");
        let second = Note::new("alice", "B", "[[Alpha|b]]");
        store.put(&first).unwrap();
        store.put(&second).unwrap();

        let result: Result<usize> = store.transaction(|tx| {
            let count = rewrite_references_in(tx, "alice", "Alpha", "Gamma")?;
            assert_eq!(count, 2);
            Err(Error::Database("simulated crash".into()))
        });
        assert!(result.is_err());

        assert_eq!(store.get("alice", &first.id).unwrap().unwrap().content, "[[Alpha]]");
        assert_eq!(store.get("alice", &second.id).unwrap().unwrap().content, "[[Alpha|b]]");
    }
}
