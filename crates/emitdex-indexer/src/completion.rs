//! Editor completion helpers on top of the query API.
//!
//! An editor host asks for event names when the user opens a string inside
//! a listener call, and for handler signatures after a `,`. The listener on
//! the line decides which emit direction feeds it.

use crate::engine::EventEngine;
use crate::scanner::{first_match, Direction, DirectionRule, LineContext};
use serde::Serialize;
use std::path::Path;

/// Characters that open an event-name completion.
pub const NAME_TRIGGER_CHARACTERS: &[char] = &['\'', '"', '`'];

/// Characters that open a parameter completion.
pub const PARAM_TRIGGER_CHARACTERS: &[char] = &[','];

/// Language ids event-name completion is offered for.
pub const NAME_LANGUAGES: &[&str] = &[
    "javascript",
    "typescript",
    "html",
    "jsx",
    "tsx",
    "vue",
    "svelte",
];

/// Language ids parameter completion is offered for.
pub const PARAM_LANGUAGES: &[&str] = &["javascript", "typescript"];

const WEBVIEW_DOCUMENT_MARKERS: &[&str] = &["in window", "<script>", "html"];

/// Precedence table for listener calls, highest first. The direction is the
/// one of the emits that reach the listener.
pub const LISTENER_RULES: &[DirectionRule] = &[
    DirectionRule {
        name: "client-on-server",
        direction: Direction::ToClient,
        applies: |c| c.side.is_client && c.has("onServer"),
    },
    DirectionRule {
        name: "server-alt-on-client",
        direction: Direction::ToServer,
        applies: |c| c.side.is_server && c.has("alt.onClient"),
    },
    DirectionRule {
        name: "server-alt-on",
        direction: Direction::ServerOnly,
        applies: |c| c.side.is_server && c.has("alt.on"),
    },
    DirectionRule {
        name: "client-view-on",
        direction: Direction::FromWebView,
        applies: |c| c.side.is_client && c.has("on") && !c.has("alt"),
    },
    DirectionRule {
        name: "webview-alt-on",
        direction: Direction::ToWebView,
        applies: |c| c.side.is_client && c.likely_webview && c.has("alt.on"),
    },
];

/// Whether a whole document looks like embedded-view markup.
pub fn is_webview_document(text: &str) -> bool {
    WEBVIEW_DOCUMENT_MARKERS
        .iter()
        .any(|marker| text.contains(marker))
}

/// Direction of the emits that feed the listener on `line`.
/// Falls back to [`Direction::ClientOnly`].
pub fn listener_direction(engine: &EventEngine, line: &str, path: &Path, document: &str) -> Direction {
    let ctx = LineContext {
        line,
        side: engine.path_side(path),
        likely_webview: is_webview_document(document),
    };

    first_match(LISTENER_RULES, &ctx)
        .map(|rule| rule.direction)
        .unwrap_or(Direction::ClientOnly)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionKind {
    Event,
    Method,
}

/// One completion entry handed to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insert_text: Option<String>,
}

/// Event names for the listener being typed on `line`, one per record.
///
/// `line` is the text up to the cursor; `document` is the full text of the
/// file at `path`.
pub fn event_name_completions(
    engine: &EventEngine,
    line: &str,
    path: &Path,
    document: &str,
) -> Vec<CompletionItem> {
    let direction = listener_direction(engine, line, path, document);

    engine
        .query_by_direction(direction)
        .into_iter()
        .map(|name| CompletionItem {
            label: name,
            kind: CompletionKind::Event,
            detail: None,
            insert_text: None,
        })
        .collect()
}

/// Handler signatures for events referenced on `line`.
pub fn param_completions(engine: &EventEngine, line: &str) -> Vec<CompletionItem> {
    engine
        .query_by_context(line)
        .into_iter()
        .map(|suggestion| CompletionItem {
            label: suggestion.signature.clone(),
            kind: CompletionKind::Method,
            detail: Some(format!("Use Parameters from Event: {}", suggestion.event)),
            insert_text: Some(suggestion.signature),
        })
        .collect()
}
