//! User-facing status messages.
//!
//! These are the only texts end users ever see for failures. Internal
//! error detail goes to the logs, never into these strings.

pub const QUERY_RUNNING: &str = "Query is running, the result will be sent shortly";
pub const PROFILE_NOT_FOUND: &str = "Player not found, check nickname";
pub const QUERY_FAILED: &str = "Query failed, retry later";
pub const QUERY_TIMED_OUT: &str = "Query timed out, retry later";
pub const CANNOT_QUERY: &str = "Query could not be started, retry later";

pub const QUERIES_DISABLED: &str = "Queries are globally disabled";
pub const INVALID_NICKNAME: &str = "Invalid nickname";
pub const NO_BOUND_NICKNAME: &str = "No nickname is bound to your account";
pub const TOO_SOON_TO_REFRESH: &str = "Too soon to refresh this profile, retry later";

pub const BINDING_SUCCESS: &str = "Nickname bound";
pub const BINDING_EXISTS: &str = "A nickname is already bound, unbind it first";
pub const BINDING_UNKNOWN_NICKNAME: &str = "Nickname has no profile yet, query it first";
pub const UNBINDING_SUCCESS: &str = "Nickname unbound";

pub fn group_limit_reached(usage: i64, limit: i64) -> String {
    format!("This group reached its daily query limit ({usage}/{limit})")
}

pub fn user_limit_reached(usage: i64, limit: i64) -> String {
    format!("You reached your daily query limit ({usage}/{limit})")
}
