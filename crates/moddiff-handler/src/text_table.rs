//! Text table diff: compare two tables of localized text entries.
//!
//! Text tables are flat keyed records, so they are diffed by hand rather than
//! through the tree engine. Entries are matched by `key`; a key that appears
//! more than once is matched by its last occurrence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{HandlerError, HandlerResult};

/// One localized string: a lookup key, a stable guid, and its text per
/// language code.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEntry {
    pub key: String,
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub text: BTreeMap<String, String>,
}

impl TextEntry {
    pub fn new(key: impl Into<String>, guid: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            guid: guid.into(),
            text: BTreeMap::new(),
        }
    }

    pub fn with_text(mut self, lang: impl Into<String>, text: impl Into<String>) -> Self {
        self.text.insert(lang.into(), text.into());
        self
    }
}

/// The result of comparing two text tables.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextTableDiff {
    pub changes: Vec<TextChange>,
}

impl TextTableDiff {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn additions(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, TextChange::Added { .. }))
            .count()
    }

    pub fn removals(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, TextChange::Removed { .. }))
            .count()
    }

    pub fn modifications(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| matches!(c, TextChange::Modified { .. }))
            .count()
    }
}

/// A single change in a text table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TextChange {
    /// A new entry.
    Added { entry: TextEntry },
    /// The entry with this key was dropped.
    Removed { key: String },
    /// An existing entry changed. `guid` is set when the guid changed; each
    /// language maps to its new text, or `None` when that language was
    /// dropped.
    Modified {
        key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        guid: Option<String>,
        #[serde(default)]
        text: BTreeMap<String, Option<String>>,
    },
}

/// Compute the changes that turn the `target` table into `source`.
///
/// Additions and modifications follow source order; removals follow, in
/// target order.
pub fn diff_text_tables(target: &[TextEntry], source: &[TextEntry]) -> TextTableDiff {
    let old: BTreeMap<&str, &TextEntry> = target.iter().map(|e| (e.key.as_str(), e)).collect();
    let new: BTreeMap<&str, &TextEntry> = source.iter().map(|e| (e.key.as_str(), e)).collect();
    let mut changes = Vec::new();

    for (key, entry) in &new {
        match old.get(key) {
            None => changes.push(TextChange::Added {
                entry: (*entry).clone(),
            }),
            Some(current) => {
                if let Some(change) = diff_entry(current, entry) {
                    changes.push(change);
                }
            }
        }
    }
    // BTreeMap iteration is by key; restore source order for the output.
    let position: BTreeMap<&str, usize> = source
        .iter()
        .enumerate()
        .map(|(i, e)| (e.key.as_str(), i))
        .collect();
    changes.sort_by_key(|c| match c {
        TextChange::Added { entry } => position.get(entry.key.as_str()).copied(),
        TextChange::Modified { key, .. } => position.get(key.as_str()).copied(),
        TextChange::Removed { .. } => None,
    });

    let mut removed: Vec<&str> = Vec::new();
    for entry in target {
        let key = entry.key.as_str();
        if !new.contains_key(key) && !removed.contains(&key) {
            removed.push(key);
        }
    }
    changes.extend(removed.into_iter().map(|key| TextChange::Removed {
        key: key.to_string(),
    }));

    TextTableDiff { changes }
}

fn diff_entry(old: &TextEntry, new: &TextEntry) -> Option<TextChange> {
    let guid = (old.guid != new.guid).then(|| new.guid.clone());

    let mut text = BTreeMap::new();
    for (lang, value) in &new.text {
        if old.text.get(lang) != Some(value) {
            text.insert(lang.clone(), Some(value.clone()));
        }
    }
    for lang in old.text.keys() {
        if !new.text.contains_key(lang) {
            text.insert(lang.clone(), None);
        }
    }

    if guid.is_none() && text.is_empty() {
        return None;
    }
    Some(TextChange::Modified {
        key: new.key.clone(),
        guid,
        text,
    })
}

/// Apply a text table diff in place.
///
/// An added key that already exists replaces the existing entry, so later
/// bundles win. Removing a missing key is skipped. Modifying a missing key is
/// [`HandlerError::MissingTextEntry`].
pub fn apply_text_table_diff(
    table: &mut Vec<TextEntry>,
    diff: &TextTableDiff,
) -> HandlerResult<()> {
    for change in &diff.changes {
        match change {
            TextChange::Added { entry } => {
                match table.iter_mut().rev().find(|e| e.key == entry.key) {
                    Some(existing) => *existing = entry.clone(),
                    None => table.push(entry.clone()),
                }
            }
            TextChange::Removed { key } => {
                let before = table.len();
                table.retain(|e| &e.key != key);
                if table.len() == before {
                    debug!(key = %key, "text entry already absent");
                }
            }
            TextChange::Modified { key, guid, text } => {
                let entry = table
                    .iter_mut()
                    .rev()
                    .find(|e| &e.key == key)
                    .ok_or_else(|| HandlerError::MissingTextEntry(key.clone()))?;
                if let Some(guid) = guid {
                    entry.guid = guid.clone();
                }
                for (lang, value) in text {
                    match value {
                        Some(value) => {
                            entry.text.insert(lang.clone(), value.clone());
                        }
                        None => {
                            entry.text.remove(lang);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, en: &str) -> TextEntry {
        TextEntry::new(key, format!("guid-{key}")).with_text("en", en)
    }

    #[test]
    fn identical_tables_no_diff() {
        let table = vec![entry("a", "Apple"), entry("b", "Bread")];
        assert!(diff_text_tables(&table, &table).is_empty());
    }

    #[test]
    fn mixed_changes() {
        let old = vec![entry("keep", "k"), entry("modify", "old"), entry("remove", "r")];
        let new = vec![
            entry("added", "a"),
            entry("keep", "k"),
            entry("modify", "new").with_text("fr", "nouveau"),
        ];

        let diff = diff_text_tables(&old, &new);
        assert_eq!(diff.len(), 3);
        assert_eq!(diff.additions(), 1);
        assert_eq!(diff.removals(), 1);
        assert_eq!(diff.modifications(), 1);
        assert!(matches!(&diff.changes[0], TextChange::Added { entry } if entry.key == "added"));
        assert!(matches!(&diff.changes[2], TextChange::Removed { key } if key == "remove"));

        match &diff.changes[1] {
            TextChange::Modified { key, guid, text } => {
                assert_eq!(key, "modify");
                assert_eq!(*guid, None);
                assert_eq!(text.get("en"), Some(&Some("new".to_string())));
                assert_eq!(text.get("fr"), Some(&Some("nouveau".to_string())));
            }
            other => panic!("expected Modified, got {:?}", other),
        }
    }

    #[test]
    fn dropped_language_and_new_guid() {
        let old = vec![entry("a", "Apple").with_text("de", "Apfel")];
        let mut renamed = entry("a", "Apple");
        renamed.guid = "guid-new".into();

        let diff = diff_text_tables(&old, &[renamed]);
        assert_eq!(
            diff.changes,
            vec![TextChange::Modified {
                key: "a".into(),
                guid: Some("guid-new".into()),
                text: BTreeMap::from([("de".to_string(), None)]),
            }]
        );
    }

    #[test]
    fn apply_reproduces_source() {
        let old = vec![entry("keep", "k"), entry("modify", "old"), entry("remove", "r")];
        let new = vec![
            entry("keep", "k"),
            entry("modify", "new"),
            entry("added", "a"),
        ];
        let diff = diff_text_tables(&old, &new);

        let mut table = old.clone();
        apply_text_table_diff(&mut table, &diff).unwrap();
        assert_eq!(table, new);
    }

    #[test]
    fn modifying_missing_entry_fails() {
        let diff = TextTableDiff {
            changes: vec![TextChange::Modified {
                key: "ghost".into(),
                guid: None,
                text: BTreeMap::new(),
            }],
        };
        let err = apply_text_table_diff(&mut Vec::new(), &diff).unwrap_err();
        assert!(matches!(err, HandlerError::MissingTextEntry(key) if key == "ghost"));
    }

    #[test]
    fn serialized_form() {
        let diff = TextTableDiff {
            changes: vec![TextChange::Removed { key: "a".into() }],
        };
        assert_eq!(
            serde_json::to_string(&diff).unwrap(),
            r#"{"changes":[{"op":"removed","key":"a"}]}"#
        );
    }
}
