//! The session worker: connection sequence and read loop.

use std::time::Duration;

use log::{debug, info, warn};

use super::cancel::CancelFlag;
use super::command::CommandQueue;
use super::event::{Event, EventEmitter, Info};
use super::session::Session;
use crate::error::{Error, Result};
use crate::transport::known_hosts::TrustStore;
use crate::transport::ssh::{Shell, ShellRead, SshTransport, check_cancel};
use crate::transport::{HostKeyVerifier, SessionConfig};

/// Bound on one wait for terminal output.
///
/// Keeps the loop responsive to commands and cancellation; it is not a
/// protocol timeout.
pub const READ_WAIT: Duration = Duration::from_millis(100);

/// Owns everything one session needs on the worker thread.
pub(crate) struct Worker {
    pub(crate) config: SessionConfig,
    pub(crate) queue: CommandQueue,
    pub(crate) cancel: CancelFlag,
    pub(crate) events: EventEmitter,
    pub(crate) store: Box<dyn TrustStore>,
}

impl Worker {
    /// Run the session to completion and emit its terminal event.
    pub(crate) async fn run(mut self) {
        let reason = match self.connect_and_drive().await {
            Ok(()) => Error::Closed,
            Err(e) => e,
        };
        match &reason {
            Error::Closed | Error::Canceled => info!("session {}: {}", self.config.socket_addr(), reason),
            e => warn!("session {} failed: {}", self.config.socket_addr(), e),
        }
        self.events.emit(Event::finished(&reason));
    }

    async fn connect_and_drive(&mut self) -> Result<()> {
        self.events.info(Info::Connecting);
        let mut transport = SshTransport::connect(&self.config, &self.cancel).await?;

        let result = self.drive(&mut transport).await;
        if let Err(e) = transport.close().await {
            debug!("error closing transport: {}", e);
        }
        result
    }

    async fn drive(&mut self, transport: &mut SshTransport) -> Result<()> {
        let key = transport.server_key()?;
        let verifier =
            HostKeyVerifier::new(self.queue.clone(), self.cancel.clone(), self.events.clone());
        let accepted = verifier
            .verify(self.store.as_mut(), &self.config.host, self.config.port, &key)
            .await?;
        if !accepted {
            return Err(Error::Canceled);
        }

        self.events.info(Info::Authenticating);
        transport.authenticate(&self.config, &self.cancel).await?;

        let mut shell = transport.open_shell(&self.cancel).await?;
        info!("connected to {}", self.config.socket_addr());
        self.events.info(Info::Connected);

        let mut session = Session::new(&self.config, self.cancel.clone(), self.events.clone());
        self.read_loop(&mut session, &mut shell).await
    }

    async fn read_loop(&self, session: &mut Session, shell: &mut Shell) -> Result<()> {
        loop {
            // A latched failure explains a cancellation it caused.
            if let Some(fatal) = session.take_fatal() {
                return Err(fatal);
            }
            check_cancel(&self.cancel)?;

            for command in self.queue.drain() {
                session.apply(command);
            }
            session.dispatch();

            for text in session.take_outbox() {
                if self.cancel.is_canceled() {
                    break;
                }
                shell.send(&text).await?;
            }

            match shell.read(READ_WAIT).await {
                ShellRead::Data(data) => session.feed(&data),
                ShellRead::Idle => session.idle(),
                ShellRead::Closed => {
                    debug!("shell closed in {:?}", session.state());
                    return session.take_fatal().map_or(Ok(()), Err);
                }
            }
        }
    }
}
