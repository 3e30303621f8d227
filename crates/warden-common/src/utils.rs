//! Utility functions for Warden
//!
//! Helpers for building and validating registry node paths.

use std::sync::LazyLock;

use crate::PATH_SEPARATOR;

/// Regex pattern for validating names that become a single path segment
static VALID_PATTERN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new("^[a-zA-Z0-9_.:-]+$").expect("Invalid regex pattern"));

/// Validate a non-empty name made only of allowed characters
///
/// Allowed characters: alphanumeric, underscore, dot, colon, hyphen.
/// Slashes are rejected so a name always maps to exactly one path segment.
///
/// # Examples
///
/// ```
/// use warden_common::is_valid_name;
///
/// assert!(is_valid_name("orders_table"));
/// assert!(is_valid_name("ds-0"));
/// assert!(!is_valid_name(""));
/// assert!(!is_valid_name("a/b"));
/// ```
pub fn is_valid_name(name: &str) -> bool {
    VALID_PATTERN.is_match(name)
}

/// Join a parent node path and a child segment
///
/// # Examples
///
/// ```
/// use warden_common::join_path;
///
/// assert_eq!(join_path("/demo/state", "datasources"), "/demo/state/datasources");
/// assert_eq!(join_path("/demo/state/", "datasources"), "/demo/state/datasources");
/// ```
pub fn join_path(parent: &str, child: &str) -> String {
    format!(
        "{}{}{}",
        parent.trim_end_matches(PATH_SEPARATOR),
        PATH_SEPARATOR,
        child.trim_start_matches(PATH_SEPARATOR)
    )
}
