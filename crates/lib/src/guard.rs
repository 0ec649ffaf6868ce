//! # DDL Safety Gate
//!
//! Classifies a generated statement as schema-mutating before anything is
//! sent to the executor. This is a textual heuristic, not a parser: a blocked
//! keyword inside a quoted string literal will still trip the gate. That
//! over-matching is accepted; the gate fails closed.

use regex::Regex;
use std::sync::OnceLock;

/// Message recorded in the result envelope when a statement is rejected.
pub const DDL_REJECTION_MESSAGE: &str = "DDL statements are not permitted.";

const DDL_PATTERN: &str = r"(?i)\b(?:CREATE|ALTER|DROP|TRUNCATE|RENAME)\b";

fn ddl_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(DDL_PATTERN).expect("DDL keyword pattern is valid"))
}

/// Whether the statement contains a whole-word DDL keyword,
/// case-insensitively.
pub fn is_ddl(sql: &str) -> bool {
    ddl_pattern().is_match(sql)
}
