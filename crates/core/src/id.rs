//! Incentive identifiers.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of the random suffix appended to generated ids.
const SUFFIX_LEN: usize = 6;

/// Opaque incentive identifier: `INC-<unix millis>-<random suffix>`.
///
/// The timestamp makes ids roughly sortable by creation time; the suffix
/// keeps ids minted in the same millisecond distinct.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct IncentiveId(String);

impl IncentiveId {
    /// Mint a fresh id.
    pub fn generate() -> Self {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SUFFIX_LEN)
            .map(char::from)
            .collect();
        Self(format!("INC-{}-{}", Utc::now().timestamp_millis(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IncentiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for IncentiveId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for IncentiveId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_carry_prefix_and_suffix() {
        let id = IncentiveId::generate();
        let parts: Vec<&str> = id.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "INC");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), SUFFIX_LEN);
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let a = IncentiveId::generate();
        let b = IncentiveId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = IncentiveId::from("INC-1700000000000-Ab3xYz");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"INC-1700000000000-Ab3xYz\"");
    }
}
