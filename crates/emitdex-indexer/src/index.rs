//! In-memory event index and the read-side queries.

use crate::scanner::Direction;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One recognized emit call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Resolved literal event name, never empty
    pub event_name: String,
    /// Symbolic reference the name was resolved from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
    /// Parameter hint taken from the comment above the call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_suggestion: Option<String>,
    /// `None` when no classification rule applied
    pub direction: Option<Direction>,
}

/// A parameter-list hint matched against the text of a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamSuggestion {
    /// Raw hint text from the comment
    pub hint: String,
    /// Variable name or event name that matched the line
    pub event: String,
    /// The hint rendered as a handler signature, `(<hint>) => {}`
    pub signature: String,
}

impl ParamSuggestion {
    fn new(hint: &str, event: &str) -> Self {
        Self {
            hint: hint.to_string(),
            event: event.to_string(),
            signature: format!("({}) => {{}}", hint),
        }
    }
}

/// File path to the ordered records found in it.
///
/// Files keep the position of their first insertion, so queries walk them in
/// discovery order. A file's record list is only ever swapped as a whole.
#[derive(Debug, Default)]
pub struct EventIndex {
    files: RwLock<Vec<(PathBuf, Vec<EventRecord>)>>,
}

impl EventIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the records of `path`.
    ///
    /// A file keeps its slot even when its list becomes empty, so a file
    /// that gains records again stays at its discovery position.
    pub fn upsert_file(&self, path: &Path, records: Vec<EventRecord>) {
        let mut files = self.files.write();

        match files.iter_mut().find(|(p, _)| p == path) {
            Some((_, slot)) => *slot = records,
            None => files.push((path.to_path_buf(), records)),
        }
    }

    /// Records currently stored for `path`.
    pub fn records_for(&self, path: &Path) -> Option<Vec<EventRecord>> {
        self.files
            .read()
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, records)| records.clone())
    }

    /// Snapshot of every file entry in discovery order.
    pub fn entries(&self) -> Vec<(PathBuf, Vec<EventRecord>)> {
        self.files.read().clone()
    }

    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }

    pub fn record_count(&self) -> usize {
        self.files.read().iter().map(|(_, r)| r.len()).sum()
    }

    /// Event names of every record with `direction`, duplicates included.
    pub fn query_by_direction(&self, direction: Direction) -> Vec<String> {
        self.files
            .read()
            .iter()
            .flat_map(|(_, records)| records.iter())
            .filter(|r| r.direction == Some(direction))
            .map(|r| r.event_name.clone())
            .collect()
    }

    /// Hints of every record whose variable name or event name occurs in
    /// `line`. The variable name is tried first; a record yields at most one
    /// suggestion.
    pub fn query_by_context(&self, line: &str) -> Vec<ParamSuggestion> {
        let files = self.files.read();
        let mut suggestions = Vec::new();

        for record in files.iter().flat_map(|(_, records)| records.iter()) {
            let Some(hint) = record.event_suggestion.as_deref() else {
                continue;
            };

            if let Some(variable) = record.variable_name.as_deref() {
                if line.contains(variable) {
                    suggestions.push(ParamSuggestion::new(hint, variable));
                    continue;
                }
            }

            if line.contains(record.event_name.as_str()) {
                suggestions.push(ParamSuggestion::new(hint, &record.event_name));
            }
        }

        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, direction: Option<Direction>) -> EventRecord {
        EventRecord {
            event_name: name.to_string(),
            variable_name: None,
            event_suggestion: None,
            direction,
        }
    }

    fn hinted(name: &str, variable: Option<&str>, hint: &str) -> EventRecord {
        EventRecord {
            event_name: name.to_string(),
            variable_name: variable.map(str::to_string),
            event_suggestion: Some(hint.to_string()),
            direction: Some(Direction::ToClient),
        }
    }

    #[test]
    fn test_upsert_replaces_whole_entry() {
        let index = EventIndex::new();
        let path = Path::new("server/index.ts");

        index.upsert_file(
            path,
            vec![
                record("a", Some(Direction::ToClient)),
                record("b", Some(Direction::ToClient)),
            ],
        );
        index.upsert_file(path, vec![record("c", Some(Direction::ToClient))]);

        let records = index.records_for(path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_name, "c");
        assert_eq!(index.file_count(), 1);
    }

    #[test]
    fn test_upsert_empty_keeps_slot() {
        let index = EventIndex::new();
        let path = Path::new("a.ts");

        index.upsert_file(path, vec![record("a", None)]);
        index.upsert_file(path, vec![]);

        assert_eq!(index.records_for(path), Some(vec![]));
        assert_eq!(index.file_count(), 1);
        assert_eq!(index.record_count(), 0);
    }

    #[test]
    fn test_emptied_file_keeps_discovery_position() {
        let index = EventIndex::new();
        let a = Path::new("server/a.ts");
        let b = Path::new("server/b.ts");

        index.upsert_file(a, vec![record("a1", Some(Direction::ServerOnly))]);
        index.upsert_file(b, vec![record("b1", Some(Direction::ServerOnly))]);
        assert_eq!(
            index.query_by_direction(Direction::ServerOnly),
            vec!["a1", "b1"]
        );

        index.upsert_file(a, vec![]);
        assert_eq!(index.query_by_direction(Direction::ServerOnly), vec!["b1"]);

        index.upsert_file(a, vec![record("a2", Some(Direction::ServerOnly))]);
        assert_eq!(
            index.query_by_direction(Direction::ServerOnly),
            vec!["a2", "b1"]
        );
    }

    #[test]
    fn test_query_by_direction_filters_and_keeps_order() {
        let index = EventIndex::new();
        index.upsert_file(
            Path::new("b.ts"),
            vec![
                record("one", Some(Direction::ToServer)),
                record("two", Some(Direction::ToClient)),
                record("three", Some(Direction::ToServer)),
            ],
        );
        index.upsert_file(
            Path::new("a.ts"),
            vec![
                record("one", Some(Direction::ToServer)),
                record("four", None),
            ],
        );

        assert_eq!(
            index.query_by_direction(Direction::ToServer),
            vec!["one", "three", "one"]
        );
        assert_eq!(index.query_by_direction(Direction::ToClient), vec!["two"]);
        assert!(index.query_by_direction(Direction::FromWebView).is_empty());
    }

    #[test]
    fn test_replaced_file_keeps_its_position() {
        let index = EventIndex::new();
        index.upsert_file(Path::new("a.ts"), vec![record("a", Some(Direction::ToServer))]);
        index.upsert_file(Path::new("b.ts"), vec![record("b", Some(Direction::ToServer))]);
        index.upsert_file(Path::new("a.ts"), vec![record("a2", Some(Direction::ToServer))]);

        assert_eq!(index.query_by_direction(Direction::ToServer), vec!["a2", "b"]);
    }

    #[test]
    fn test_query_by_context_matches_event_name() {
        let index = EventIndex::new();
        index.upsert_file(
            Path::new("server/index.ts"),
            vec![
                hinted("ban-player", None, "player id, reason"),
                record("no-hint", Some(Direction::ToClient)),
            ],
        );

        let hits = index.query_by_context("alt.on('ban-player', (");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].hint, "player id, reason");
        assert_eq!(hits[0].event, "ban-player");
        assert_eq!(hits[0].signature, "(player id, reason) => {}");

        assert!(index.query_by_context("alt.on('no-hint', (").is_empty());
    }

    #[test]
    fn test_query_by_context_prefers_variable_name() {
        let index = EventIndex::new();
        index.upsert_file(
            Path::new("client/index.ts"),
            vec![hinted("player:foo", Some("Events.foo"), "player")],
        );

        let hits = index.query_by_context("alt.onClient(Events.foo, (");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].event, "Events.foo");

        // The literal still matches when the variable is not on the line.
        let hits = index.query_by_context("alt.onClient('player:foo', (");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].event, "player:foo");
    }

    #[test]
    fn test_query_by_context_one_hit_per_record() {
        let index = EventIndex::new();
        index.upsert_file(
            Path::new("a.ts"),
            vec![hinted("foo", Some("Events.foo"), "x")],
        );

        // Both the variable and the literal occur; only one suggestion.
        let hits = index.query_by_context("Events.foo foo");
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_empty_index_queries() {
        let index = EventIndex::new();
        assert!(index.query_by_direction(Direction::ToClient).is_empty());
        assert!(index.query_by_context("anything").is_empty());
        assert_eq!(index.record_count(), 0);
    }
}
