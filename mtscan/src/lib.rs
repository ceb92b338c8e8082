//! # mtscan
//!
//! Wireless scanner session engine for RouterOS devices, driven over the
//! SSH command line.
//!
//! The engine logs into the device console, finds the wireless interface,
//! reads its scan-list and then runs the scanner or the sniffer, turning
//! the console output into structured events.
//!
//! ## Features
//!
//! - Async SSH connection via russh on a dedicated worker thread
//! - Host key verification with an explicit caller decision for new keys
//! - Terminal framing with escape sequence stripping and prompt tracking
//! - Scanner frames parsed into [`NetworkRecord`]s, tolerant of column
//!   layout changes between firmware versions
//! - Sniffer statistics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mtscan::{Command, Event, Info, SessionBuilder};
//!
//! fn main() -> Result<(), mtscan::Error> {
//!     let (handle, mut events) = SessionBuilder::new("192.168.88.1")
//!         .login("admin")
//!         .password("secret")
//!         .spawn()?;
//!
//!     while let Some(event) = events.blocking_recv() {
//!         match event {
//!             Event::Info(Info::AuthVerify(fingerprint)) => {
//!                 println!("trusting {}", fingerprint);
//!                 handle.send(Command::Authenticate);
//!             }
//!             Event::Info(Info::Connected) => handle.send(Command::Scan(None)),
//!             Event::Network(record) => println!("{} {}", record.ssid, record.frequency),
//!             event if event.is_terminal() => break,
//!             _ => {}
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod parser;
pub mod platform;
pub mod transport;

// Re-export main types for convenience
pub use driver::{
    CancelFlag, Command, CommandQueue, Event, EventEmitter, Info, Session, SessionBuilder,
    SessionHandle, SessionState,
};
pub use error::{Error, ErrorKind, Result};
pub use parser::{NetworkFlags, NetworkRecord, SnifferStats};
pub use transport::{KnownHostsFile, MemoryTrustStore, SessionConfig, TrustStore};
