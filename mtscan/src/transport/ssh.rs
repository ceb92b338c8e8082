//! SSH transport implementation using russh.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use log::{debug, trace};
use russh::client::{self, Handle, Msg};
use russh::keys::PublicKey;
use russh::{Channel, ChannelMsg};
use secrecy::ExposeSecret;
use tokio::net::TcpStream;

use super::config::SessionConfig;
use crate::driver::CancelFlag;
use crate::error::{ChannelError, Error, Result, TransportError, VerifyError};
use crate::platform::routeros::{TERMINAL_HEIGHT, TERMINAL_TYPE, TERMINAL_WIDTH, ssh_login};

/// Interval between SSH keepalives while the console is idle.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Fail with [`Error::Canceled`] once the flag is set.
pub(crate) fn check_cancel(cancel: &CancelFlag) -> Result<()> {
    if cancel.is_canceled() {
        return Err(Error::Canceled);
    }
    Ok(())
}

/// SSH transport wrapping russh client.
pub struct SshTransport {
    /// The russh session handle.
    session: Handle<SshHandler>,

    /// Host key presented during the handshake.
    server_key: Arc<Mutex<Option<PublicKey>>>,
}

impl SshTransport {
    /// Open the TCP connection and run the SSH handshake.
    ///
    /// The host key is captured but not judged here; call
    /// [`server_key`](Self::server_key) and verify it before authenticating.
    pub async fn connect(config: &SessionConfig, cancel: &CancelFlag) -> Result<Self> {
        config.validate()?;
        check_cancel(cancel)?;

        let timeout = config.handshake_timeout;
        let stream = tokio::time::timeout(timeout, Self::open_socket(config))
            .await
            .map_err(|_| TransportError::Timeout(timeout))??;
        check_cancel(cancel)?;

        let ssh_config = Arc::new(client::Config {
            inactivity_timeout: None,
            keepalive_interval: Some(KEEPALIVE_INTERVAL),
            ..Default::default()
        });

        let server_key: Arc<Mutex<Option<PublicKey>>> = Arc::new(Mutex::new(None));
        let handler = SshHandler {
            server_key: server_key.clone(),
        };

        let session = tokio::time::timeout(
            timeout,
            client::connect_stream(ssh_config, stream, handler),
        )
        .await
        .map_err(|_| TransportError::Timeout(timeout))?
        .map_err(TransportError::Ssh)?;
        check_cancel(cancel)?;

        debug!("handshake with {} complete", config.socket_addr());
        Ok(Self {
            session,
            server_key,
        })
    }

    async fn open_socket(config: &SessionConfig) -> Result<TcpStream> {
        let resolve_error = || TransportError::Resolve {
            host: config.host.clone(),
            port: config.port,
        };

        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((config.host.as_str(), config.port))
            .await
            .map_err(|_| resolve_error())?
            .collect();
        if addrs.is_empty() {
            return Err(resolve_error().into());
        }

        let stream = TcpStream::connect(&addrs[..]).await.map_err(|source| {
            TransportError::ConnectionFailed {
                host: config.host.clone(),
                port: config.port,
                source,
            }
        })?;
        Ok(stream)
    }

    /// The host key the server presented.
    pub fn server_key(&self) -> std::result::Result<PublicKey, VerifyError> {
        self.server_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(VerifyError::Fetch)
    }

    /// Authenticate with the configured password.
    ///
    /// The console option suffix is appended to the login name.
    pub async fn authenticate(&mut self, config: &SessionConfig, cancel: &CancelFlag) -> Result<()> {
        check_cancel(cancel)?;
        let user = ssh_login(&config.login);
        let success = self
            .session
            .authenticate_password(user.as_str(), config.password.expose_secret())
            .await
            .map_err(TransportError::Ssh)?
            .success();
        check_cancel(cancel)?;

        if !success {
            return Err(Error::Auth {
                user: config.login.clone(),
            });
        }
        Ok(())
    }

    /// Open a session channel with a PTY and a shell.
    pub async fn open_shell(&self, cancel: &CancelFlag) -> Result<Shell> {
        check_cancel(cancel)?;
        let channel = self
            .session
            .channel_open_session()
            .await
            .map_err(|e| match e {
                russh::Error::ChannelOpenFailure(_) => ChannelError::OpenFailed(e),
                e => ChannelError::AllocFailed(e),
            })?;
        check_cancel(cancel)?;

        channel
            .request_pty(
                true,
                TERMINAL_TYPE,
                TERMINAL_WIDTH,
                TERMINAL_HEIGHT,
                0,
                0,
                &[],
            )
            .await
            .map_err(ChannelError::PtyFailed)?;
        check_cancel(cancel)?;

        channel
            .request_shell(true)
            .await
            .map_err(ChannelError::ShellFailed)?;
        check_cancel(cancel)?;

        Ok(Shell { channel })
    }

    /// Close the connection.
    pub async fn close(self) -> Result<()> {
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// Outcome of one bounded wait on the shell.
#[derive(Debug)]
pub enum ShellRead {
    /// Terminal output arrived.
    Data(Vec<u8>),
    /// Nothing arrived before the timeout.
    Idle,
    /// The channel was closed by the remote side.
    Closed,
}

/// Interactive shell channel.
pub struct Shell {
    channel: Channel<Msg>,
}

impl Shell {
    /// Transmit raw text.
    pub async fn send(&self, text: &str) -> Result<()> {
        trace!("send: {:?}", text);
        self.channel
            .data(text.as_bytes())
            .await
            .map_err(ChannelError::Write)?;
        Ok(())
    }

    /// Wait up to `timeout` for the next channel message.
    pub async fn read(&mut self, timeout: Duration) -> ShellRead {
        loop {
            let msg = match tokio::time::timeout(timeout, self.channel.wait()).await {
                Err(_) => return ShellRead::Idle,
                Ok(None) => return ShellRead::Closed,
                Ok(Some(msg)) => msg,
            };
            match msg {
                ChannelMsg::Data { data } | ChannelMsg::ExtendedData { data, .. } => {
                    return ShellRead::Data(data.to_vec());
                }
                ChannelMsg::Eof | ChannelMsg::Close => return ShellRead::Closed,
                other => trace!("ignoring channel message: {:?}", other),
            }
        }
    }
}

/// SSH client handler for russh.
struct SshHandler {
    /// Receives the host key so it can be verified after the handshake.
    server_key: Arc<Mutex<Option<PublicKey>>>,
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        *self.server_key.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(server_public_key.clone());
        Ok(true)
    }
}
