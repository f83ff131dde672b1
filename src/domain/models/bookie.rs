//! Bookie identity.

use std::fmt;

/// Opaque address of a storage node ("bookie"), printable as `host:port`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub struct BookieId(String);

impl BookieId {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookieId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for BookieId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BookieId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_address() {
        let id = BookieId::new("10.0.0.1:3181");
        assert_eq!(id.to_string(), "10.0.0.1:3181");
        assert_eq!(id.as_str(), "10.0.0.1:3181");
    }

    #[test]
    fn equality_and_ordering_are_value_based() {
        let a = BookieId::from("a:1");
        let b = BookieId::from("a:1");
        let c = BookieId::from("b:1");
        assert_eq!(a, b);
        assert!(a < c);
    }
}
