//! Error types for mtscan.

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for mtscan sessions.
///
/// Every variant except the device-reported failures (which never become an
/// `Error`, they are surfaced as [`Info::Failure`](crate::Info::Failure)) ends
/// the session and is reported exactly once through the terminal event.
#[derive(Error, Debug)]
pub enum Error {
    /// Network connection or SSH handshake errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Host key verification errors
    #[error("Verification error: {0}")]
    Verify(#[from] VerifyError),

    /// Authentication was rejected
    #[error("Authentication failed for user '{user}'")]
    Auth { user: String },

    /// Session channel, PTY or shell errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Wireless interface errors
    #[error("Interface error: {0}")]
    Interface(#[from] InterfaceError),

    /// The session was canceled by the caller
    #[error("Canceled")]
    Canceled,

    /// The remote side closed the shell
    #[error("Connection closed")]
    Closed,
}

impl Error {
    /// The distinct failure kind used for user-facing reporting.
    ///
    /// Returns `None` for [`Error::Canceled`] and [`Error::Closed`], which
    /// have their own terminal events.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Transport(TransportError::InvalidOption { .. }) => Some(ErrorKind::Options),
            Error::Transport(TransportError::Resolve { .. })
            | Error::Transport(TransportError::ConnectionFailed { .. })
            | Error::Transport(TransportError::Runtime(_)) => Some(ErrorKind::Init),
            Error::Transport(_) => Some(ErrorKind::Connect),
            Error::Verify(_) => Some(ErrorKind::Verify),
            Error::Auth { .. } => Some(ErrorKind::Auth),
            Error::Channel(ChannelError::AllocFailed(_)) => Some(ErrorKind::ChannelAlloc),
            Error::Channel(ChannelError::OpenFailed(_)) => Some(ErrorKind::ChannelOpen),
            Error::Channel(ChannelError::PtyFailed(_)) => Some(ErrorKind::PtySize),
            Error::Channel(ChannelError::ShellFailed(_)) => Some(ErrorKind::Shell),
            Error::Channel(ChannelError::Write(_)) => Some(ErrorKind::Connect),
            Error::Interface(_) => Some(ErrorKind::Interface),
            Error::Canceled | Error::Closed => None,
        }
    }
}

/// Transport layer errors (socket, SSH handshake).
#[derive(Error, Debug)]
pub enum TransportError {
    /// A configuration value cannot be used to connect
    #[error("Invalid option '{option}': {message}")]
    InvalidOption {
        option: &'static str,
        message: String,
    },

    /// Host name did not resolve to any address
    #[error("Cannot resolve {host}:{port}")]
    Resolve { host: String, port: u16 },

    /// Failed to open the TCP connection
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Handshake did not finish in time
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// The worker thread or its runtime could not be started
    #[error("Cannot start session worker: {0}")]
    Runtime(#[source] io::Error),
}

/// Host key verification errors.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The server host key was not received during the handshake
    #[error("Server host key was not received")]
    Fetch,

    /// Reading the trust store failed
    #[error("Cannot read known hosts: {0}")]
    Store(String),

    /// The host is known with a different key
    #[error("Host key for {host}:{port} has changed (known_hosts line {line})")]
    Changed { host: String, port: u16, line: usize },

    /// Writing the accepted key failed
    #[error("Cannot write known hosts: {0}")]
    Write(String),
}

/// Channel errors (session channel, PTY, shell).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// The session channel could not be allocated
    #[error("Failed to allocate session channel: {0}")]
    AllocFailed(#[source] russh::Error),

    /// The server refused to open the session channel
    #[error("Failed to open session channel: {0}")]
    OpenFailed(#[source] russh::Error),

    /// The PTY request failed
    #[error("Failed to request PTY: {0}")]
    PtyFailed(#[source] russh::Error),

    /// The shell request failed
    #[error("Failed to request shell: {0}")]
    ShellFailed(#[source] russh::Error),

    /// Writing to the shell failed
    #[error("Failed to write to shell: {0}")]
    Write(#[source] russh::Error),
}

/// Wireless interface errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InterfaceError {
    /// The device never reported a hardware address for the interface
    #[error("Interface '{interface}' not found")]
    NotFound { interface: String },
}

/// Distinct terminal failure kinds, one per connection step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ErrorKind {
    /// Configuration rejected before connecting.
    Options,
    /// Socket creation or TCP connect.
    Init,
    /// SSH handshake.
    Connect,
    /// Host key verification.
    Verify,
    /// Authentication.
    Auth,
    /// Session channel allocation.
    ChannelAlloc,
    /// Session channel open.
    ChannelOpen,
    /// PTY request.
    PtySize,
    /// Shell request.
    Shell,
    /// Wireless interface lookup.
    Interface,
}

impl ErrorKind {
    /// User-facing message for this failure kind.
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::Options => "Invalid connection settings",
            ErrorKind::Init => "Unable to connect to the host",
            ErrorKind::Connect => "SSH handshake failed",
            ErrorKind::Verify => "Host key verification failed",
            ErrorKind::Auth => "Authentication failed",
            ErrorKind::ChannelAlloc => "Unable to allocate a session channel",
            ErrorKind::ChannelOpen => "Unable to open a session channel",
            ErrorKind::PtySize => "Unable to request a terminal",
            ErrorKind::Shell => "Unable to start a shell",
            ErrorKind::Interface => "Wireless interface not found",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result type alias using mtscan's Error.
pub type Result<T> = std::result::Result<T, Error>;
