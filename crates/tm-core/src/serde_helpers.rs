//! Shared serde helper functions used across multiple modules.

/// Serde default function that returns `true`.
///
/// Used for column nullability, which defaults to allowing NULL.
pub fn default_true() -> bool {
    true
}

/// Serde `skip_serializing_if` predicate for flags that default to `false`.
///
/// Unset flags stay out of a plan's canonical JSON and its checksum.
pub fn is_false(value: &bool) -> bool {
    !*value
}
