//! Sensitive data marker for credential material
//!
//! Credential blobs and token values travel through backups and restores but
//! must never end up in log output. `Sensitive<T>` redacts itself in `Debug`
//! and `Display` while serializing transparently.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Wrapper for sensitive data that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use vgrant_core_types::Sensitive;
///
/// let creds = Sensitive::new("blinded-creds");
/// assert_eq!(format!("{:?}", creds), "***REDACTED***");
/// assert_eq!(creds.expose(), &"blinded-creds");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    /// Wrap a sensitive value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying value
    ///
    /// Only storage bindings and the sync payload should need this.
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Sensitive<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***REDACTED***")
    }
}

impl<T: Serialize> Serialize for Sensitive<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_debug_redaction() {
        let secret = Sensitive::new("signed-creds-blob");
        let debug_str = format!("{:?}", secret);
        assert_eq!(debug_str, "***REDACTED***");
        assert!(!debug_str.contains("signed-creds-blob"));
    }

    #[test]
    fn test_sensitive_display_redaction() {
        let secret = Sensitive::new("token-value-12345");
        assert_eq!(format!("{}", secret), "***REDACTED***");
    }

    #[test]
    fn test_sensitive_into_inner() {
        let secret = Sensitive::new(String::from("creds"));
        assert_eq!(secret.into_inner(), "creds");
    }

    #[test]
    fn test_sensitive_serializes_transparently() {
        let secret = Sensitive::new(String::from("token-value"));
        let json = serde_json::to_string(&secret).unwrap();
        assert_eq!(json, "\"token-value\"");

        let back: Sensitive<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, secret);
    }

    #[test]
    fn test_sensitive_with_struct() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Batch {
            creds_id: String,
            creds: Sensitive<String>,
        }

        let batch = Batch {
            creds_id: "b1".to_string(),
            creds: Sensitive::new("raw-creds".to_string()),
        };

        let debug_str = format!("{:?}", batch);
        assert!(debug_str.contains("b1"));
        assert!(debug_str.contains("***REDACTED***"));
        assert!(!debug_str.contains("raw-creds"));
    }
}
