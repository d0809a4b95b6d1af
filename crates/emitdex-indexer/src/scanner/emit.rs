//! Line-oriented emit call detection.
//!
//! No syntax tree is built here. Each line is normalized, checked for an
//! emit call, and the first argument (or the second, for the relayed
//! `emitClient(recipient, name, ..)` form) is taken as the event name.
//! The only state carried between lines is [`LineScanState`].

use super::direction::{classify, LineContext, PathSide};
use crate::index::EventRecord;

/// Lines that mark a file as embedded-view markup for the rest of the file.
pub const WEBVIEW_MARKERS: &[&str] = &["'alt' in window", "<script>", "<html>"];

const QUOTES: [char; 3] = ['\'', '"', '`'];

/// Resolves a symbolic event name to its literal value.
pub trait VariableLookup {
    fn resolve(&self, name: &str) -> Option<String>;
}

impl VariableLookup for std::collections::HashMap<String, String> {
    fn resolve(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Event name token after quote handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameToken<'a> {
    /// Quoted at the call site
    Literal(String),
    /// Bare identifier path, needs resolving
    Symbol(&'a str),
}

/// Lookback carried from one line to the next.
#[derive(Debug, Clone, Default)]
pub struct LineScanState {
    /// Raw text of the previous line
    pub previous: Option<String>,
    pub likely_webview: bool,
}

/// Trim, drop a trailing `//` comment and one trailing `;`.
pub fn normalize_line(raw: &str) -> &str {
    let line = raw.trim();
    let line = match line.find("//") {
        Some(i) => &line[..i],
        None => line,
    };
    let line = line.trim_end();
    line.strip_suffix(';').unwrap_or(line).trim_end()
}

/// Whether a normalized line looks like an emit call.
pub fn is_emit_candidate(line: &str) -> bool {
    if line.is_empty() || !line.contains("emit") {
        return false;
    }

    if line.starts_with("//") || line.starts_with("/*") || line.starts_with('*') {
        return false;
    }

    // Listener registrations, not emissions
    !(line.contains("onServer") || line.contains("onClient"))
}

fn after_first_paren(line: &str) -> &str {
    line.split_once('(').map_or(line, |(_, rest)| rest)
}

/// Pull the raw event name argument out of a normalized emit line.
pub fn extract_name_token(line: &str) -> &str {
    let rest = if line.contains("emitClient") {
        // First argument is the recipient
        line.split_once(',')
            .map_or_else(|| after_first_paren(line), |(_, rest)| rest)
    } else {
        after_first_paren(line)
    };

    let end = rest.find([',', ')']).unwrap_or(rest.len());
    rest[..end].trim()
}

/// Strip quotes from a token, or mark it as a symbol if there were none.
pub fn classify_token(token: &str) -> NameToken<'_> {
    match QUOTES.iter().find(|q| token.contains(**q)) {
        Some(quote) => NameToken::Literal(token.replace(*quote, "")),
        None => NameToken::Symbol(token),
    }
}

/// Parameter hint from the line above an emit call.
pub fn comment_hint(previous: &str) -> Option<String> {
    if !previous.contains("//") {
        return None;
    }

    let hint: String = previous
        .replacen("//", "", 1)
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect();
    let hint = hint.trim_start();

    (!hint.is_empty()).then(|| hint.to_string())
}

/// Emit parser bound to one file's path side and a variable table.
pub struct EmitParser<'a> {
    side: PathSide,
    variables: &'a dyn VariableLookup,
}

impl<'a> EmitParser<'a> {
    pub fn new(side: PathSide, variables: &'a dyn VariableLookup) -> Self {
        Self { side, variables }
    }

    /// Process one raw line, advancing `state`.
    pub fn parse_line(&self, state: &mut LineScanState, raw: &str) -> Option<EventRecord> {
        let previous = state.previous.replace(raw.to_string());

        if WEBVIEW_MARKERS.iter().any(|m| raw.contains(m)) {
            state.likely_webview = true;
            return None;
        }

        let line = normalize_line(raw);
        if !is_emit_candidate(line) {
            return None;
        }

        let (event_name, variable_name) = match classify_token(extract_name_token(line)) {
            NameToken::Literal(name) => (name, None),
            NameToken::Symbol("") => return None,
            NameToken::Symbol(symbol) => {
                (self.variables.resolve(symbol)?, Some(symbol.to_string()))
            }
        };

        if event_name.is_empty() {
            return None;
        }

        let direction = classify(&LineContext {
            line,
            side: self.side,
            likely_webview: state.likely_webview,
        });

        Some(EventRecord {
            event_name,
            variable_name,
            event_suggestion: previous.as_deref().and_then(comment_hint),
            direction,
        })
    }

    /// Parse a whole file. Records come back in line order.
    pub fn parse(&self, content: &str) -> Vec<EventRecord> {
        let (_, records) = content.split('\n').fold(
            (LineScanState::default(), Vec::new()),
            |(mut state, mut records), raw| {
                records.extend(self.parse_line(&mut state, raw));
                (state, records)
            },
        );
        records
    }
}
