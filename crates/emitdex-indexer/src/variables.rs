//! Variable resolution index.
//!
//! Maps dotted symbol paths (`Events.player.ban`) to the literal string
//! they were assigned in a definitions file, so that emit calls written
//! with an identifier can still be indexed by event name.

use crate::scanner::VariableLookup;
use crate::symbols::DocumentSymbol;
use parking_lot::RwLock;
use std::collections::HashMap;

const QUOTES: [char; 3] = ['\'', '"', '`'];

/// Flat key to literal value table. Later inserts for a key win.
#[derive(Debug, Default)]
pub struct VariableIndex {
    values: RwLock<HashMap<String, String>>,
}

impl VariableIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, name: &str) -> Option<String> {
        self.values.read().get(name).cloned()
    }

    /// Insert definitions in order; existing keys are overwritten.
    ///
    /// Returns true if any key was added or changed value.
    pub fn extend(&self, definitions: impl IntoIterator<Item = (String, String)>) -> bool {
        let mut values = self.values.write();
        let mut changed = false;
        for (key, value) in definitions {
            if values.get(&key) != Some(&value) {
                values.insert(key, value);
                changed = true;
            }
        }
        changed
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().is_empty()
    }

    /// Sorted snapshot of every definition.
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<_> = self
            .values
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort();
        entries
    }
}

impl VariableLookup for VariableIndex {
    fn resolve(&self, name: &str) -> Option<String> {
        VariableIndex::resolve(self, name)
    }
}

/// Walk an outline and collect `prefix.key -> value` pairs.
///
/// Interior nodes add their name to the prefix. Leaves are read from
/// `text` and kept only when they contain a quote.
pub fn collect_definitions(symbols: &[DocumentSymbol], text: &str) -> Vec<(String, String)> {
    let mut definitions = Vec::new();
    walk(None, symbols, text, &mut definitions);
    definitions
}

fn walk(
    prefix: Option<&str>,
    symbols: &[DocumentSymbol],
    text: &str,
    out: &mut Vec<(String, String)>,
) {
    for symbol in symbols {
        if !symbol.is_leaf() {
            let nested = join_key(prefix, &symbol.name);
            walk(Some(&nested), &symbol.children, text, out);
            continue;
        }

        let Some(source) = text.get(symbol.range.clone()) else {
            continue;
        };
        if !source.contains(QUOTES) {
            continue;
        }

        if let Some((key, value)) = split_definition(source) {
            out.push((join_key(prefix, &key), value));
        }
    }
}

fn join_key(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}.{}", prefix, key),
        None => key.to_string(),
    }
}

/// Byte offset of the `:` or `=` separating key from value.
///
/// Quoted text is skipped. An `=` (but not `=>`) before the value's opening
/// quote wins over an earlier `:`, so `name: string = 'v'` splits at `=`.
fn separator_index(source: &str) -> Option<usize> {
    let mut open_quote: Option<char> = None;
    let mut colon = None;

    for (i, c) in source.char_indices() {
        if let Some(q) = open_quote {
            if c == q {
                open_quote = None;
            }
            continue;
        }

        match c {
            '\'' | '"' | '`' if colon.is_some() => break,
            '\'' | '"' | '`' => open_quote = Some(c),
            '=' if !source[i + 1..].starts_with('>') => return Some(i),
            ':' if colon.is_none() => colon = Some(i),
            _ => {}
        }
    }

    colon
}

/// Parse `key: 'value'` or `key = 'value'` source text.
pub fn split_definition(source: &str) -> Option<(String, String)> {
    let sep = separator_index(source)?;
    let (key, value) = (&source[..sep], &source[sep + 1..]);

    let key = key.trim();
    let key = if key.starts_with(QUOTES) {
        key.trim_matches(QUOTES)
    } else {
        // Drop a type annotation
        key.split(':').next().unwrap_or(key).trim()
    };

    let value = value.trim().trim_end_matches([',', ';']).trim();
    let value = match value.chars().next() {
        Some(q) if QUOTES.contains(&q) && value.len() >= 2 && value.ends_with(q) => {
            value[1..value.len() - 1].to_string()
        }
        _ => value.replace(QUOTES, ""),
    };

    if key.is_empty() {
        return None;
    }

    Some((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::{outline, Dialect, SymbolKind};

    #[test]
    fn test_split_definition_forms() {
        assert_eq!(
            split_definition("foo: 'player:foo'"),
            Some(("foo".to_string(), "player:foo".to_string()))
        );
        assert_eq!(
            split_definition("LOGIN = \"auth:login\""),
            Some(("LOGIN".to_string(), "auth:login".to_string()))
        );
        assert_eq!(
            split_definition("'quoted-key': `tick`,"),
            Some(("quoted-key".to_string(), "tick".to_string()))
        );
        assert_eq!(
            split_definition("NAME: string = 'typed';"),
            Some(("NAME".to_string(), "typed".to_string()))
        );
    }

    #[test]
    fn test_split_definition_rejects_garbage() {
        assert_eq!(split_definition("'just a string'"), None);
        assert_eq!(split_definition(": 'no key'"), None);
    }

    #[test]
    fn test_split_definition_arrow_is_not_assignment() {
        let (key, _) = split_definition("make: () => 'x'").unwrap();
        assert_eq!(key, "make");
    }

    #[test]
    fn test_collect_definitions_from_outline() {
        let code = "export const Events = { foo: 'player:foo', nested: { bar: 'player:bar' } };\n\
                    export const LOGIN = 'auth:login';\n\
                    export const COUNT = 3;\n";
        let symbols = outline(code, Dialect::TypeScript).unwrap();
        let defs = collect_definitions(&symbols, code);

        assert_eq!(
            defs,
            vec![
                ("Events.foo".to_string(), "player:foo".to_string()),
                ("Events.nested.bar".to_string(), "player:bar".to_string()),
                ("LOGIN".to_string(), "auth:login".to_string()),
            ]
        );
    }

    #[test]
    fn test_collect_skips_out_of_range_symbols() {
        let symbols = vec![DocumentSymbol::leaf("X", SymbolKind::Constant, 0..500)];
        assert!(collect_definitions(&symbols, "X = 'short'").is_empty());
    }

    #[test]
    fn test_index_last_write_wins() {
        let index = VariableIndex::new();
        assert!(index.extend(vec![("Events.foo".to_string(), "one".to_string())]));
        assert!(index.extend(vec![("Events.foo".to_string(), "two".to_string())]));
        assert!(!index.extend(vec![("Events.foo".to_string(), "two".to_string())]));

        assert_eq!(index.resolve("Events.foo"), Some("two".to_string()));
        assert_eq!(index.len(), 1);
        assert_eq!(index.resolve("Events.bar"), None);
    }

    #[test]
    fn test_index_entries_sorted() {
        let index = VariableIndex::new();
        index.extend(vec![
            ("b".to_string(), "2".to_string()),
            ("a".to_string(), "1".to_string()),
        ]);

        assert_eq!(
            index.entries(),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }
}
