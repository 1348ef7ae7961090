#![allow(clippy::useless_conversion)]

use serde::{Deserialize, Deserializer};

pub mod shared_task;
pub mod task;

/// Keeps an explicit `null` apart from a missing field: missing is `None`,
/// `null` is `Some(None)`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Trims optional free text; blank input is stored as absent.
pub(crate) fn normalize_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::normalize_text;

    #[test]
    fn blank_text_is_absent() {
        assert_eq!(normalize_text(None), None);
        assert_eq!(normalize_text(Some("   ")), None);
        assert_eq!(normalize_text(Some(" milk ")), Some("milk".to_string()));
    }
}
