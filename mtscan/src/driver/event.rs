//! Events from the session worker to the caller.

use log::trace;
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::error::{Error, ErrorKind};
use crate::parser::{NetworkRecord, SnifferStats};

/// Progress and status notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Info {
    Connecting,
    Authenticating,
    /// The host key is unknown; the caller must confirm the fingerprint
    /// with [`Command::Authenticate`](super::Command::Authenticate).
    AuthVerify(String),
    Connected,
    CheckingInterface,
    /// Hardware address of the wireless interface.
    InterfaceFound(String),
    /// Current scan-list.
    ScanList(String),
    /// A complete scanner frame was received.
    Heartbeat,
    /// Failure reported by the device, verbatim.
    Failure(String),
    ScannerStarted,
    ScannerStopped,
    SnifferStarted,
    SnifferStopped,
}

/// Everything the session reports, in processing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Event {
    Info(Info),
    Network(NetworkRecord),
    Sniffer(SnifferStats),
    /// The device closed the session.
    Closed,
    /// The caller canceled the session.
    Canceled,
    /// The session failed.
    ConnectError { kind: ErrorKind, detail: String },
}

impl Event {
    /// Whether this is the last event of a session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Event::Closed | Event::Canceled | Event::ConnectError { .. }
        )
    }

    /// The terminal event reporting how a session ended.
    pub fn finished(reason: &Error) -> Self {
        match (reason, reason.kind()) {
            (Error::Canceled, _) => Event::Canceled,
            (Error::Closed, _) | (_, None) => Event::Closed,
            (error, Some(kind)) => Event::ConnectError {
                kind,
                detail: error.to_string(),
            },
        }
    }
}

/// Delivers events to the caller.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    tx: UnboundedSender<Event>,
}

impl EventEmitter {
    /// Create an emitter and the receiving end handed to the caller.
    pub fn channel() -> (Self, UnboundedReceiver<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: Event) {
        if self.tx.send(event).is_err() {
            trace!("event receiver dropped");
        }
    }

    pub fn info(&self, info: Info) {
        self.emit(Event::Info(info));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{InterfaceError, VerifyError};

    #[test]
    fn test_finished_events() {
        assert_eq!(Event::finished(&Error::Canceled), Event::Canceled);
        assert_eq!(Event::finished(&Error::Closed), Event::Closed);

        let event = Event::finished(&Error::Verify(VerifyError::Fetch));
        assert!(matches!(
            event,
            Event::ConnectError {
                kind: ErrorKind::Verify,
                ..
            }
        ));
        assert!(event.is_terminal());

        let event = Event::finished(
            &InterfaceError::NotFound {
                interface: "wlan1".into(),
            }
            .into(),
        );
        assert_eq!(
            event,
            Event::ConnectError {
                kind: ErrorKind::Interface,
                detail: "Interface error: Interface 'wlan1' not found".into(),
            }
        );
    }

    #[test]
    fn test_emit_in_order() {
        let (emitter, mut rx) = EventEmitter::channel();
        emitter.info(Info::Connecting);
        emitter.info(Info::Connected);
        assert_eq!(rx.try_recv().unwrap(), Event::Info(Info::Connecting));
        assert_eq!(rx.try_recv().unwrap(), Event::Info(Info::Connected));
        assert!(!Event::Info(Info::Heartbeat).is_terminal());

        drop(rx);
        // Receiver gone: emitting is a no-op
        emitter.info(Info::Heartbeat);
    }
}
