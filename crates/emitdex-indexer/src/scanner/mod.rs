//! Emit-call scanning.
//!
//! Provides workspace enumeration with gitignore support, size-based change
//! detection, direction classification and the line-by-line emit parser.

mod direction;
mod emit;
mod fingerprint;
mod walker;

pub use direction::{classify, first_match, Direction, DirectionRule, LineContext, PathSide, EMIT_RULES};
pub use emit::{
    classify_token, comment_hint, extract_name_token, is_emit_candidate, normalize_line,
    EmitParser, LineScanState, NameToken, VariableLookup, WEBVIEW_MARKERS,
};
pub use fingerprint::FingerprintCache;
pub use walker::{extension_patterns, FileEntry, Walker};
