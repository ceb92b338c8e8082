//! SSH transport layer wrapping russh.
//!
//! Connection setup, host key verification, authentication and the
//! interactive shell channel.

pub mod config;
pub mod known_hosts;
pub(crate) mod ssh;
mod verify;

pub use config::SessionConfig;
pub use known_hosts::{KeyMatch, KnownHostsFile, MemoryTrustStore, TrustStore, fingerprint};
pub use ssh::{Shell, ShellRead, SshTransport};
pub use verify::{HostKeyVerifier, VERIFY_POLL};
