//! Statement classification and execution-time hints.
//!
//! Read-only detection is purely lexical: after stripping leading whitespace
//! the statement must begin with `select` or `with`, ignoring case. The same
//! check gates row counting and hint injection.

use std::fmt;

/// Keywords that open a read-only statement.
const READ_ONLY_KEYWORDS: [&str; 2] = ["select", "with"];

/// Per-statement server-side execution limit.
///
/// Zero or negative inputs mean "disabled", never a zero-length limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryTimeout(Option<u64>);

impl QueryTimeout {
    /// No limit: no session variable is set and no hint is injected.
    pub const DISABLED: Self = Self(None);

    /// Builds a timeout from milliseconds; `ms <= 0` disables it.
    pub fn from_millis(ms: i64) -> Self {
        match u64::try_from(ms) {
            Ok(ms) if ms > 0 => Self(Some(ms)),
            _ => Self::DISABLED,
        }
    }

    /// Builds a timeout from whole seconds; `seconds <= 0` disables it.
    pub fn from_seconds(seconds: i64) -> Self {
        Self::from_millis(seconds.saturating_mul(1000))
    }

    /// The limit in milliseconds, or `None` when disabled.
    pub fn millis(self) -> Option<u64> {
        self.0
    }

    /// Returns true if a limit is configured.
    pub fn is_enabled(self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Display for QueryTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(ms) => write!(f, "{ms}ms"),
            None => write!(f, "disabled"),
        }
    }
}

/// Returns the byte length of the leading read-only keyword, if any.
///
/// The returned length is measured from the first non-whitespace character.
fn read_only_keyword_len(sql: &str) -> Option<usize> {
    let stripped = sql.trim_start();
    READ_ONLY_KEYWORDS
        .iter()
        .find(|kw| {
            stripped
                .get(..kw.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(kw))
        })
        .map(|kw| kw.len())
}

/// Returns true if the statement is classified as read-only.
pub fn is_read_only(sql: &str) -> bool {
    read_only_keyword_len(sql).is_some()
}

/// Injects a `MAX_EXECUTION_TIME` optimizer hint right after the leading keyword.
///
/// Leading whitespace and the keyword's original spelling are preserved.
/// Statements that are not read-only, or a disabled timeout, leave the text
/// untouched.
pub fn apply_execution_time_hint(sql: &str, timeout: QueryTimeout) -> String {
    let (Some(ms), Some(keyword_len)) = (timeout.millis(), read_only_keyword_len(sql)) else {
        return sql.to_string();
    };
    let stripped = sql.trim_start();
    let indent = &sql[..sql.len() - stripped.len()];
    let (keyword, rest) = stripped.split_at(keyword_len);
    format!("{indent}{keyword} /*+ MAX_EXECUTION_TIME({ms}) */{rest}")
}

/// The session statement that sets the server-wide fallback limit.
pub fn session_limit_statement(timeout: QueryTimeout) -> Option<String> {
    timeout
        .millis()
        .map(|ms| format!("SET SESSION max_execution_time = {ms}"))
}
