//! Builder for scanner sessions.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use log::debug;
use secrecy::SecretString;
use tokio::sync::mpsc::UnboundedReceiver;

use super::cancel::CancelFlag;
use super::command::CommandQueue;
use super::event::{Event, EventEmitter};
use super::handle::SessionHandle;
use super::worker::Worker;
use crate::error::{Result, TransportError};
use crate::transport::SessionConfig;
use crate::transport::known_hosts::{KnownHostsFile, TrustStore};

/// Builder for starting a scanner session.
///
/// # Example
///
/// ```rust,no_run
/// use mtscan::{Command, Event, SessionBuilder};
///
/// # fn example() -> Result<(), mtscan::Error> {
/// let (handle, mut events) = SessionBuilder::new("192.168.88.1")
///     .login("admin")
///     .password("secret")
///     .interface("wlan1")
///     .spawn()?;
///
/// handle.send(Command::Scan(None));
/// while let Some(event) = events.blocking_recv() {
///     println!("{:?}", event);
///     if event.is_terminal() {
///         break;
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct SessionBuilder {
    config: SessionConfig,
    trust_store: Option<Box<dyn TrustStore>>,
}

impl SessionBuilder {
    /// Create a new session builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            config: SessionConfig {
                host: host.into(),
                ..Default::default()
            },
            trust_store: None,
        }
    }

    /// Start from a complete configuration.
    pub fn from_config(config: SessionConfig) -> Self {
        Self {
            config,
            trust_store: None,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the login name.
    pub fn login(mut self, login: impl Into<String>) -> Self {
        self.config.login = login.into();
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = SecretString::from(password.into());
        self
    }

    /// Set the wireless interface (default: `wlan1`).
    pub fn interface(mut self, interface: impl Into<String>) -> Self {
        self.config.interface = interface.into();
        self
    }

    /// Set the scan duration in seconds, 0 scans until stopped.
    pub fn duration(mut self, seconds: u32) -> Self {
        self.config.duration = seconds;
        self
    }

    /// Keep scanning continuously once connected.
    pub fn remote(mut self, enabled: bool) -> Self {
        self.config.remote = enabled;
        self
    }

    /// Run the scanner in background mode.
    pub fn background(mut self, enabled: bool) -> Self {
        self.config.background = enabled;
        self
    }

    /// Set the handshake timeout (default: 30 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Use a specific known_hosts file.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.known_hosts_path = Some(path.into());
        self
    }

    /// Use a custom trust store instead of a known_hosts file.
    pub fn trust_store(mut self, store: impl TrustStore + 'static) -> Self {
        self.trust_store = Some(Box::new(store));
        self
    }

    /// The configuration assembled so far.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Validate the configuration and start the worker thread.
    pub fn spawn(self) -> Result<(SessionHandle, UnboundedReceiver<Event>)> {
        self.config.validate()?;

        let store: Box<dyn TrustStore> = match self.trust_store {
            Some(store) => store,
            None => match &self.config.known_hosts_path {
                Some(path) => Box::new(KnownHostsFile::with_path(path.clone())),
                None => Box::new(KnownHostsFile::new()),
            },
        };

        let queue = CommandQueue::new();
        let cancel = CancelFlag::new();
        let (events, rx) = EventEmitter::channel();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportError::Runtime)?;

        let name = format!("mtscan-{}", self.config.socket_addr());
        debug!("starting worker {}", name);
        let worker = Worker {
            config: self.config,
            queue: queue.clone(),
            cancel: cancel.clone(),
            events,
            store,
        };
        let thread = thread::Builder::new()
            .name(name)
            .spawn(move || runtime.block_on(worker.run()))
            .map_err(TransportError::Runtime)?;

        Ok((SessionHandle::new(queue, cancel, thread), rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_builder_config() {
        let builder = SessionBuilder::new("10.0.0.1")
            .port(2222)
            .login("admin")
            .interface("wlan2")
            .duration(10)
            .remote(true)
            .background(true)
            .timeout(Duration::from_secs(5));

        let config = builder.config();
        assert_eq!(config.socket_addr(), "10.0.0.1:2222");
        assert_eq!(config.login, "admin");
        assert_eq!(config.interface, "wlan2");
        assert_eq!(config.duration, 10);
        assert!(config.remote);
        assert!(config.background);
        assert_eq!(config.handshake_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_spawn_rejects_invalid_config() {
        let result = SessionBuilder::new("10.0.0.1").spawn();
        assert!(matches!(
            result,
            Err(Error::Transport(TransportError::InvalidOption { option: "login", .. }))
        ));
    }
}
