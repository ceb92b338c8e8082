//! Session driver: the worker, its state machine and the caller API.
//!
//! A session is started with [`SessionBuilder::spawn`]. The worker thread
//! owns the transport and the [`Session`] state machine; the caller talks
//! to it through the [`SessionHandle`] and the event receiver.

mod builder;
mod cancel;
mod command;
mod dispatch;
mod event;
mod handle;
mod session;
mod worker;

pub use builder::SessionBuilder;
pub use cancel::CancelFlag;
pub use command::{Command, CommandQueue};
pub use event::{Event, EventEmitter, Info};
pub use handle::SessionHandle;
pub use session::{Session, SessionState};
pub use worker::READ_WAIT;
