//! Caller-side handle to a running session.

use std::thread::{self, JoinHandle};

use super::cancel::CancelFlag;
use super::command::{Command, CommandQueue};

/// Handle to a session running on its worker thread.
///
/// The handle only shares the command queue and the cancellation flag with
/// the worker. Events arrive on the receiver returned by
/// [`SessionBuilder::spawn`](super::SessionBuilder::spawn); the terminal
/// event is always the last one.
pub struct SessionHandle {
    queue: CommandQueue,
    cancel: CancelFlag,
    thread: JoinHandle<()>,
}

impl SessionHandle {
    pub(crate) fn new(queue: CommandQueue, cancel: CancelFlag, thread: JoinHandle<()>) -> Self {
        Self {
            queue,
            cancel,
            thread,
        }
    }

    /// Queue a command for the worker.
    ///
    /// Commands are applied in order at the top of the next loop iteration.
    pub fn send(&self, command: Command) {
        self.queue.push(command);
    }

    /// Ask the worker to stop. The session ends with
    /// [`Event::Canceled`](super::Event::Canceled) unless an earlier
    /// failure explains the stop.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }

    /// Whether the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the worker thread to exit.
    pub fn join(self) -> thread::Result<()> {
        self.thread.join()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_shares_queue_and_flag() {
        let queue = CommandQueue::new();
        let cancel = CancelFlag::new();
        let worker_flag = cancel.clone();
        let thread = thread::spawn(move || {
            while !worker_flag.is_canceled() {
                thread::yield_now();
            }
        });

        let handle = SessionHandle::new(queue.clone(), cancel, thread);
        handle.send(Command::Sniff);
        handle.send(Command::Stop);
        assert_eq!(queue.drain(), vec![Command::Sniff, Command::Stop]);

        assert!(!handle.is_canceled());
        handle.cancel();
        assert!(handle.is_canceled());
        assert!(handle.join().is_ok());
    }
}
