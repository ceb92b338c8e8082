//! Commands from the caller to the session worker.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A request from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Accept the unknown host key currently awaiting a decision.
    Authenticate,
    /// Replace the scan-list (comma-separated frequencies or `default`).
    SetScanlist(String),
    /// Stop the scanner or sniffer.
    Stop,
    /// Start scanning, optionally overriding the configured duration
    /// (0 scans until stopped).
    Scan(Option<u32>),
    /// Start the sniffer.
    Sniff,
}

/// Thread-safe FIFO of commands, shared between caller and worker.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    inner: Arc<Mutex<VecDeque<Command>>>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command.
    pub fn push(&self, command: Command) {
        self.lock().push_back(command);
    }

    /// Remove and return every queued command, oldest first.
    pub fn drain(&self) -> Vec<Command> {
        self.lock().drain(..).collect()
    }

    /// Remove the oldest [`Command::Authenticate`], leaving every other
    /// command queued. Returns whether one was found.
    pub fn take_authenticate(&self) -> bool {
        let mut queue = self.lock();
        match queue.iter().position(|c| *c == Command::Authenticate) {
            Some(index) => {
                queue.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Command>> {
        // A panicking pusher cannot leave the deque half-modified.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let queue = CommandQueue::new();
        queue.push(Command::Scan(None));
        queue.push(Command::SetScanlist("default".into()));
        queue.push(Command::Stop);

        assert_eq!(
            queue.drain(),
            vec![
                Command::Scan(None),
                Command::SetScanlist("default".into()),
                Command::Stop
            ]
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_take_authenticate_keeps_others() {
        let queue = CommandQueue::new();
        queue.push(Command::Scan(Some(10)));
        queue.push(Command::Authenticate);
        queue.push(Command::Sniff);

        assert!(queue.take_authenticate());
        assert!(!queue.take_authenticate());
        assert_eq!(queue.drain(), vec![Command::Scan(Some(10)), Command::Sniff]);
    }

    #[test]
    fn test_shared_between_threads() {
        let queue = CommandQueue::new();
        let producer = queue.clone();
        std::thread::spawn(move || producer.push(Command::Stop))
            .join()
            .unwrap();
        assert_eq!(queue.len(), 1);
    }
}
