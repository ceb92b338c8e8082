//! Session configuration.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Default handshake timeout.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration consumed by a scanner session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Target host (hostname or IP address).
    pub host: String,

    /// SSH port (default: 22).
    pub port: u16,

    /// Login name, without any console option suffix.
    pub login: String,

    /// Password for authentication, never read from or written to files.
    #[serde(skip)]
    pub password: SecretString,

    /// Wireless interface name on the device.
    pub interface: String,

    /// Scan duration in seconds, 0 scans until stopped.
    pub duration: u32,

    /// Keep scanning continuously, restarting whenever the scan ends.
    pub remote: bool,

    /// Run the scanner with `background=yes`.
    pub background: bool,

    /// Bound on TCP connect plus SSH handshake.
    #[serde(with = "duration_secs")]
    pub handshake_timeout: Duration,

    /// Path to known_hosts file, the user's OpenSSH file when `None`.
    pub known_hosts_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            login: String::new(),
            password: SecretString::from(String::new()),
            interface: "wlan1".to_string(),
            duration: 0,
            remote: false,
            background: false,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            known_hosts_path: None,
        }
    }
}

impl SessionConfig {
    /// Get the socket address for connection.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Reject values that cannot produce a working session.
    pub fn validate(&self) -> Result<(), TransportError> {
        let invalid = |option, message: &str| TransportError::InvalidOption {
            option,
            message: message.to_string(),
        };

        if self.host.trim().is_empty() {
            return Err(invalid("host", "host must not be empty"));
        }
        if self.port == 0 {
            return Err(invalid("port", "port must not be 0"));
        }
        if self.login.is_empty() {
            return Err(invalid("login", "login must not be empty"));
        }
        if self.login.contains('+') {
            return Err(invalid("login", "console options are appended automatically"));
        }
        if self.interface.is_empty() || self.interface.contains('"') {
            return Err(invalid("interface", "interface name is empty or contains a quote"));
        }
        Ok(())
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
