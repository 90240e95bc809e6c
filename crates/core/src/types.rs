/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Key used for preference storage when no authenticated user is present.
pub const ANONYMOUS_USER: &str = "anonymous";

/// Identifies whose preferences, counters, and schedules an operation
/// touches. Either an authenticated user id or [`ANONYMOUS_USER`].
pub type UserKey = String;

/// Normalize an optional user id into a storage key.
pub fn user_key(user_id: Option<&str>) -> UserKey {
    match user_id.map(str::trim) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => ANONYMOUS_USER.to_string(),
    }
}
