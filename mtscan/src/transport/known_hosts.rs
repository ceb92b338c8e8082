//! Trust stores for server host keys.

use std::path::PathBuf;

use russh::keys::{HashAlg, PublicKey};

use crate::error::VerifyError;

/// Outcome of looking a host key up in a trust store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMatch {
    /// The host is known with this key.
    Known,
    /// The host is not in the store.
    Unknown,
    /// The host is known with a different key.
    Changed { line: usize },
}

/// A persistent store of trusted host keys.
pub trait TrustStore: Send {
    /// Look up the key presented by `host:port`.
    fn check(&self, host: &str, port: u16, key: &PublicKey) -> Result<KeyMatch, VerifyError>;

    /// Trust `key` for `host:port` from now on.
    fn remember(&mut self, host: &str, port: u16, key: &PublicKey) -> Result<(), VerifyError>;
}

/// SHA-256 fingerprint in OpenSSH form (`SHA256:...`).
pub fn fingerprint(key: &PublicKey) -> String {
    key.fingerprint(HashAlg::Sha256).to_string()
}

/// OpenSSH `known_hosts` file.
#[derive(Debug, Clone, Default)]
pub struct KnownHostsFile {
    /// Path to the file, the user's default known_hosts when `None`.
    path: Option<PathBuf>,
}

impl KnownHostsFile {
    /// Use the user's default known_hosts file.
    pub fn new() -> Self {
        Self { path: None }
    }

    /// Use a specific known_hosts file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

impl TrustStore for KnownHostsFile {
    fn check(&self, host: &str, port: u16, key: &PublicKey) -> Result<KeyMatch, VerifyError> {
        let result = if let Some(ref path) = self.path {
            if !path.exists() {
                return Ok(KeyMatch::Unknown);
            }
            russh::keys::check_known_hosts_path(host, port, key, path)
        } else {
            russh::keys::check_known_hosts(host, port, key)
        };

        match result {
            Ok(true) => Ok(KeyMatch::Known),
            Ok(false) => Ok(KeyMatch::Unknown),
            Err(russh::keys::Error::KeyChanged { line }) => Ok(KeyMatch::Changed { line }),
            Err(e) => Err(VerifyError::Store(e.to_string())),
        }
    }

    fn remember(&mut self, host: &str, port: u16, key: &PublicKey) -> Result<(), VerifyError> {
        let result = if let Some(ref path) = self.path {
            russh::keys::known_hosts::learn_known_hosts_path(host, port, key, path)
        } else {
            russh::keys::known_hosts::learn_known_hosts(host, port, key)
        };

        result.map_err(|e| VerifyError::Write(e.to_string()))
    }
}

/// In-memory trust store.
///
/// Entries are numbered from 1 in insertion order, like file lines.
#[derive(Debug, Clone, Default)]
pub struct MemoryTrustStore {
    entries: Vec<(String, u16, PublicKey)>,
}

impl MemoryTrustStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of trusted entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TrustStore for MemoryTrustStore {
    fn check(&self, host: &str, port: u16, key: &PublicKey) -> Result<KeyMatch, VerifyError> {
        let mut result = KeyMatch::Unknown;
        for (index, (h, p, k)) in self.entries.iter().enumerate() {
            if h != host || *p != port {
                continue;
            }
            if k.key_data() == key.key_data() {
                return Ok(KeyMatch::Known);
            }
            result = KeyMatch::Changed { line: index + 1 };
        }
        Ok(result)
    }

    fn remember(&mut self, host: &str, port: u16, key: &PublicKey) -> Result<(), VerifyError> {
        self.entries.push((host.to_string(), port, key.clone()));
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const KEY_A: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAINLPZK7IwW+04Z9RC8/aHjD6CgM9iq1vjt0dssnv1fhc test1";
    pub(crate) const KEY_B: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIDMw51+da9J4SXKCvmKL0eHl61IMwJX2fyYitQarsiYU test2";

    pub(crate) fn key(text: &str) -> PublicKey {
        PublicKey::from_openssh(text).unwrap()
    }

    #[test]
    fn test_fingerprint() {
        assert_eq!(
            fingerprint(&key(KEY_A)),
            "SHA256:hzhgIBHJzpmHGj8aHRLPytw5txuPq4LB/nwilCRAa+o"
        );
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryTrustStore::new();
        let a = key(KEY_A);
        let b = key(KEY_B);

        assert_eq!(store.check("10.0.0.1", 22, &a).unwrap(), KeyMatch::Unknown);
        store.remember("10.0.0.1", 22, &a).unwrap();
        assert_eq!(store.check("10.0.0.1", 22, &a).unwrap(), KeyMatch::Known);
        assert_eq!(
            store.check("10.0.0.1", 22, &b).unwrap(),
            KeyMatch::Changed { line: 1 }
        );
        // Other port, other host entry
        assert_eq!(store.check("10.0.0.1", 2222, &b).unwrap(), KeyMatch::Unknown);
    }

    #[test]
    fn test_known_hosts_file() {
        let path = std::env::temp_dir().join(format!(
            "mtscan-known-hosts-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = std::fs::remove_file(&path);

        let mut store = KnownHostsFile::with_path(&path);
        let a = key(KEY_A);
        let b = key(KEY_B);

        assert_eq!(store.check("192.168.88.1", 22, &a).unwrap(), KeyMatch::Unknown);
        store.remember("192.168.88.1", 22, &a).unwrap();
        assert_eq!(store.check("192.168.88.1", 22, &a).unwrap(), KeyMatch::Known);
        assert!(matches!(
            store.check("192.168.88.1", 22, &b).unwrap(),
            KeyMatch::Changed { .. }
        ));

        let _ = std::fs::remove_file(&path);
    }
}
