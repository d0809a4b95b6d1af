//! Direction classification for emit call sites.
//!
//! Classification is a fixed, ordered table of predicates. The first rule
//! whose predicate holds decides the direction; when none holds the call is
//! left unclassified.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who emits to whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    ToClient,
    ToServer,
    ServerOnly,
    ClientOnly,
    ToWebView,
    FromWebView,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::ToClient,
        Direction::ToServer,
        Direction::ServerOnly,
        Direction::ClientOnly,
        Direction::ToWebView,
        Direction::FromWebView,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ToClient => "to-client",
            Direction::ToServer => "to-server",
            Direction::ServerOnly => "server-only",
            Direction::ClientOnly => "client-only",
            Direction::ToWebView => "to-webview",
            Direction::FromWebView => "from-webview",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('_', "-");
        Direction::ALL
            .into_iter()
            .find(|d| d.as_str() == normalized || d.as_str().replace('-', "") == normalized)
            .ok_or_else(|| format!("unknown direction: {}", s))
    }
}

/// Which side of the boundary a file path belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathSide {
    pub is_server: bool,
    pub is_client: bool,
}

impl PathSide {
    /// Substring check of the path against the server and client markers.
    pub fn detect(path: &str, server_marker: &str, client_marker: &str) -> Self {
        Self {
            is_server: !server_marker.is_empty() && path.contains(server_marker),
            is_client: !client_marker.is_empty() && path.contains(client_marker),
        }
    }
}

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct LineContext<'a> {
    /// The normalized source line
    pub line: &'a str,
    pub side: PathSide,
    /// Sticky flag: the file looked like embedded-view markup earlier on
    pub likely_webview: bool,
}

impl LineContext<'_> {
    pub(crate) fn has(&self, token: &str) -> bool {
        self.line.contains(token)
    }
}

/// One entry of a precedence table.
#[derive(Clone, Copy)]
pub struct DirectionRule {
    pub name: &'static str,
    pub direction: Direction,
    pub applies: fn(&LineContext<'_>) -> bool,
}

impl fmt::Debug for DirectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectionRule")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .finish()
    }
}

/// Precedence table for emit calls, highest first.
pub const EMIT_RULES: &[DirectionRule] = &[
    DirectionRule {
        name: "emit-server-keyword",
        direction: Direction::ToServer,
        applies: |c| c.has("emitServer"),
    },
    DirectionRule {
        name: "server-alt-emit-client",
        direction: Direction::ToClient,
        applies: |c| c.side.is_server && c.has("alt.emitClient"),
    },
    DirectionRule {
        name: "server-alt-emit",
        direction: Direction::ServerOnly,
        applies: |c| c.side.is_server && c.has("alt.emit"),
    },
    DirectionRule {
        name: "webview-alt-emit",
        direction: Direction::FromWebView,
        applies: |c| c.side.is_client && c.likely_webview && c.has("alt.emit"),
    },
    DirectionRule {
        name: "client-bare-emit",
        direction: Direction::ToWebView,
        applies: |c| c.side.is_client && c.has("emit") && !c.has("alt"),
    },
    DirectionRule {
        name: "client-alt-emit",
        direction: Direction::ClientOnly,
        applies: |c| c.side.is_client && c.has("alt.emit"),
    },
    DirectionRule {
        name: "server-bare-emit",
        direction: Direction::ToClient,
        applies: |c| c.side.is_server && c.has("emit") && !c.has("alt.emit"),
    },
];

/// First matching rule of `rules`, if any.
pub fn first_match<'r>(
    rules: &'r [DirectionRule],
    ctx: &LineContext<'_>,
) -> Option<&'r DirectionRule> {
    rules.iter().find(|rule| (rule.applies)(ctx))
}

/// Classify an emit call. `None` means unclassified.
pub fn classify(ctx: &LineContext<'_>) -> Option<Direction> {
    first_match(EMIT_RULES, ctx).map(|rule| rule.direction)
}
