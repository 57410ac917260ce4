//! Shared types and result types for the database layer

pub mod errors;

pub use errors::StoreError;

pub type StoreResult<T> = Result<T, StoreError>;

/// Fixed-width RFC 3339 timestamp so stored values sort lexicographically.
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_fixed_width_and_ordered() {
        let first = timestamp();
        let second = timestamp();

        assert_eq!(first.len(), second.len());
        assert!(first.ends_with('Z'));
        assert!(first <= second);
    }
}
