use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque schema version string as reported by the install tooling, e.g. `12.2.0.1`.
/// Kept exactly as given; two versions are equal only if their text is.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaVersion(String);

impl SchemaVersion {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SchemaVersion {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SchemaVersion {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for SchemaVersion {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SchemaVersion {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::SchemaVersion;

    #[test]
    fn text_is_kept_verbatim() {
        let version = SchemaVersion::new(" 12.2.0.1\n");
        assert_eq!(version.as_str(), " 12.2.0.1\n");
        assert!(version != *"12.2.0.1");
        assert!(SchemaVersion::from("12.2.0.1") == *"12.2.0.1");
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&SchemaVersion::from("2.5.0")).unwrap();
        assert_eq!(json, "\"2.5.0\"");
    }
}
