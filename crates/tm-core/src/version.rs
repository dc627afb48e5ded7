//! Plan version tags.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Monotonically increasing plan version tag such as `v1` or `v2.1`.
///
/// Ordered by its numeric segments, so `v10` sorts after `v9`. The original
/// tag text is kept for display and for backup table names.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlanVersion {
    tag: String,
    segments: Vec<u64>,
}

impl PlanVersion {
    /// The tag as written in the plan file.
    pub fn as_str(&self) -> &str {
        &self.tag
    }

    /// Numeric segments used for ordering.
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }
}

impl FromStr for PlanVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoreError::InvalidVersion {
            tag: s.to_string(),
            reason: reason.to_string(),
        };
        let tag = s.trim();
        let digits = tag
            .strip_prefix('v')
            .or_else(|| tag.strip_prefix('V'))
            .unwrap_or(tag);
        if digits.is_empty() {
            return Err(invalid("must contain at least one number"));
        }
        let segments = digits
            .split('.')
            .map(|seg| seg.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| invalid("expected dot-separated numbers, e.g. v2 or v2.1"))?;
        Ok(Self {
            tag: tag.to_string(),
            segments,
        })
    }
}

impl TryFrom<String> for PlanVersion {
    type Error = CoreError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<PlanVersion> for String {
    fn from(v: PlanVersion) -> Self {
        v.tag
    }
}

impl fmt::Display for PlanVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

impl PartialEq for PlanVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PlanVersion {}

impl PartialOrd for PlanVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PlanVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        // Trailing zero segments do not change the version: v2 == v2.0
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|i| {
                let a = self.segments.get(i).copied().unwrap_or(0);
                let b = other.segments.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

impl std::hash::Hash for PlanVersion {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        let end = self
            .segments
            .iter()
            .rposition(|s| *s != 0)
            .map_or(0, |i| i + 1);
        self.segments[..end].hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> PlanVersion {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(v("v2").to_string(), "v2");
        assert_eq!(v("3.1").segments(), &[3, 1]);
    }

    #[test]
    fn test_numeric_ordering() {
        assert!(v("v10") > v("v9"));
        assert!(v("v2.1") > v("v2"));
        assert!(v("v1") < v("v2"));
        assert_eq!(v("v2"), v("v2.0"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("latest".parse::<PlanVersion>().is_err());
        assert!("v".parse::<PlanVersion>().is_err());
        assert!("v1..2".parse::<PlanVersion>().is_err());
    }

    #[test]
    fn test_deserialize_from_yaml() {
        let version: PlanVersion = serde_yaml::from_str("v4").unwrap();
        assert_eq!(version, v("v4"));
    }
}
