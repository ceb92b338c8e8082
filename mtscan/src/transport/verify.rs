//! Host key verification with a caller decision for unknown keys.

use std::time::Duration;

use log::{info, warn};
use russh::keys::PublicKey;

use super::known_hosts::{KeyMatch, TrustStore, fingerprint};
use crate::driver::{CancelFlag, CommandQueue, EventEmitter, Info};
use crate::error::VerifyError;

/// Interval between queue polls while waiting for a decision.
pub const VERIFY_POLL: Duration = Duration::from_millis(10);

/// Checks server keys against a trust store.
///
/// An unknown key is reported as [`Info::AuthVerify`] and the worker waits
/// until the caller queues [`Command::Authenticate`](crate::Command::Authenticate)
/// or cancels the session.
#[derive(Debug, Clone)]
pub struct HostKeyVerifier {
    queue: CommandQueue,
    cancel: CancelFlag,
    events: EventEmitter,
    poll: Duration,
}

impl HostKeyVerifier {
    pub fn new(queue: CommandQueue, cancel: CancelFlag, events: EventEmitter) -> Self {
        Self {
            queue,
            cancel,
            events,
            poll: VERIFY_POLL,
        }
    }

    /// Verify `key` for `host:port`.
    ///
    /// Returns `Ok(true)` to proceed and `Ok(false)` if the session was
    /// canceled while waiting; nothing is written to the store in that case.
    pub async fn verify(
        &self,
        store: &mut dyn TrustStore,
        host: &str,
        port: u16,
        key: &PublicKey,
    ) -> Result<bool, VerifyError> {
        match store.check(host, port, key)? {
            KeyMatch::Known => return Ok(true),
            KeyMatch::Changed { line } => {
                warn!("host key for {}:{} has changed", host, port);
                return Err(VerifyError::Changed {
                    host: host.to_string(),
                    port,
                    line,
                });
            }
            KeyMatch::Unknown => {}
        }

        let fingerprint = fingerprint(key);
        info!("unknown host key for {}:{}: {}", host, port, fingerprint);
        self.events.info(Info::AuthVerify(fingerprint));

        loop {
            if self.cancel.is_canceled() {
                info!("host key verification canceled");
                return Ok(false);
            }
            if self.queue.take_authenticate() {
                store.remember(host, port, key)?;
                info!("host key for {}:{} accepted", host, port);
                return Ok(true);
            }
            tokio::time::sleep(self.poll).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Command, Event};
    use crate::transport::known_hosts::MemoryTrustStore;
    use crate::transport::known_hosts::tests::{KEY_A, KEY_B, key};

    fn verifier() -> (
        HostKeyVerifier,
        CommandQueue,
        CancelFlag,
        tokio::sync::mpsc::UnboundedReceiver<Event>,
    ) {
        let queue = CommandQueue::new();
        let cancel = CancelFlag::new();
        let (events, rx) = EventEmitter::channel();
        (
            HostKeyVerifier::new(queue.clone(), cancel.clone(), events),
            queue,
            cancel,
            rx,
        )
    }

    #[test]
    fn test_known_key_proceeds() {
        let (verifier, _, _, mut rx) = verifier();
        let mut store = MemoryTrustStore::new();
        store.remember("10.0.0.1", 22, &key(KEY_A)).unwrap();

        let verified = tokio_test::block_on(verifier.verify(&mut store, "10.0.0.1", 22, &key(KEY_A)));
        assert!(verified.unwrap());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_changed_key_fails_without_prompt() {
        let (verifier, _, _, mut rx) = verifier();
        let mut store = MemoryTrustStore::new();
        store.remember("10.0.0.1", 22, &key(KEY_A)).unwrap();

        let err = tokio_test::block_on(verifier.verify(&mut store, "10.0.0.1", 22, &key(KEY_B)))
            .unwrap_err();
        assert!(matches!(err, VerifyError::Changed { line: 1, .. }));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unknown_key_accepted() {
        let (verifier, queue, _, mut rx) = verifier();
        let mut store = MemoryTrustStore::new();
        queue.push(Command::Scan(None));

        let caller = queue.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            caller.push(Command::Authenticate);
        });

        assert!(verifier.verify(&mut store, "10.0.0.1", 22, &key(KEY_A)).await.unwrap());
        assert_eq!(store.len(), 1);
        assert_eq!(
            rx.try_recv().unwrap(),
            Event::Info(Info::AuthVerify(fingerprint(&key(KEY_A))))
        );
        // Other commands stay queued for the session loop
        assert_eq!(queue.drain(), vec![Command::Scan(None)]);
    }

    #[tokio::test]
    async fn test_cancel_during_wait_writes_nothing() {
        let (verifier, _, cancel, mut rx) = verifier();
        let mut store = MemoryTrustStore::new();

        let flag = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            flag.cancel();
        });

        assert!(!verifier.verify(&mut store, "10.0.0.1", 22, &key(KEY_A)).await.unwrap());
        assert!(store.is_empty());
        assert!(matches!(
            rx.try_recv().unwrap(),
            Event::Info(Info::AuthVerify(_))
        ));
    }
}
