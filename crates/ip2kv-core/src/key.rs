//! Registry key composition
//!
//! Keys have the layout `<base>/<identity>/ip`. The identity segment is
//! either a container name or its truncated ID; the truncation must stay
//! byte-for-byte stable so runs keep hitting the keys earlier runs wrote.

use std::fmt;

/// Maximum length of a truncated container ID
pub const SHORT_ID_LEN: usize = 12;

/// Leaf segment appended to every key
const LEAF_SEGMENT: &str = "ip";

/// Shorten a container ID to its leading run of up to 12 characters
/// drawn from `[A-Za-z0-9/]`
///
/// Returns an empty string when the first character is outside that
/// alphabet.
///
/// # Example
///
/// ```
/// use ip2kv_core::truncate_id;
///
/// assert_eq!(truncate_id("abc123def456789"), "abc123def456");
/// assert_eq!(truncate_id("web"), "web");
/// ```
pub fn truncate_id(id: &str) -> &str {
    let len = id
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '/')
        .take(SHORT_ID_LEN)
        .count();

    // Every accepted character is ASCII, so the count is a byte offset
    &id[..len]
}

/// A fully composed registry key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistryKey(String);

impl RegistryKey {
    /// Compose `base + "/" + identity + "/ip"`
    ///
    /// A trailing `/` on the base and a leading `/` on the identity are
    /// dropped so exactly one separator sits between segments.
    ///
    /// # Example
    ///
    /// ```
    /// use ip2kv_core::RegistryKey;
    ///
    /// assert_eq!(RegistryKey::compose("/net", "web").as_str(), "/net/web/ip");
    /// assert_eq!(RegistryKey::compose("/net/", "/web").as_str(), "/net/web/ip");
    /// ```
    pub fn compose(base: &str, identity: &str) -> Self {
        let base = base.trim_end_matches('/');
        let identity = identity.trim_start_matches('/');
        Self(format!("{}/{}/{}", base, identity, LEAF_SEGMENT))
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RegistryKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
