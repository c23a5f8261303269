//! Nickname format rules and the reserved self alias.

use std::sync::LazyLock;

use regex::Regex;

/// Reserved alias resolving to the caller's bound nickname.
pub const SELF_ALIAS: &str = "me";

/// Maximum nickname length in characters.
pub const MAX_NICKNAME_CHARS: usize = 32;

/// Letters, digits, `_`, `-`, `.` and `@` (console accounts carry an
/// `@psn` / `@live` suffix).
static NICKNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\p{L}\p{N}_\-.@]+$").expect("valid nickname regex"));

pub fn is_self_alias(value: &str) -> bool {
    value.trim() == SELF_ALIAS
}

/// Check that `nickname` is non-empty, bounded, and free of disallowed
/// characters.
pub fn is_valid_nickname(nickname: &str) -> bool {
    if nickname.is_empty() || nickname.chars().count() > MAX_NICKNAME_CHARS {
        return false;
    }
    NICKNAME_RE.is_match(nickname)
}
