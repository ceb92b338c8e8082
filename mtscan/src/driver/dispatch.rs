//! Request dispatch at the idle prompt.

use log::trace;

use super::event::Info;
use super::session::{Activity, Session, SessionState};
use crate::platform::routeros;

impl Session {
    /// Send the highest-priority pending request.
    ///
    /// Runs only while the console is idle and performs at most one action.
    /// Returns `true` if a command was queued for transmission.
    pub fn dispatch(&mut self) -> bool {
        if self.state != SessionState::Prompt || self.cancel.is_canceled() {
            return false;
        }
        if self.identity().is_none() {
            trace!("device identity unknown, nothing dispatched");
            return false;
        }

        if self.pending.interface_check {
            self.pending.interface_check = false;
            self.events.info(Info::CheckingInterface);
            self.send_line(routeros::interface_check(&self.interface));
            self.state = SessionState::Interface;
            return true;
        }

        if let Some(scanlist) = self.pending.scanlist_set.take() {
            self.send_line(routeros::scanlist_set(&self.interface, &scanlist));
            self.pending.scanlist_get = true;
            self.state = SessionState::WaitingForPrompt;
            return true;
        }

        if self.pending.scanlist_get {
            self.pending.scanlist_get = false;
            self.scanlist_lines.clear();
            self.send_line(routeros::scanlist_get(&self.interface));
            self.state = SessionState::Scanlist;
            return true;
        }

        if self.pending.scan || self.continuous {
            self.pending.scan = false;
            let command = routeros::scan(&self.interface, self.scan_duration, self.background);
            self.reset_frames();
            self.send_line(command);
            self.running = Some(Activity::Scanner);
            self.state = SessionState::WaitingForScan;
            self.events.info(Info::ScannerStarted);
            return true;
        }

        if self.pending.sniff {
            self.pending.sniff = false;
            self.reset_frames();
            self.send_line(routeros::sniff(&self.interface));
            self.running = Some(Activity::Sniffer);
            self.state = SessionState::Sniffing;
            self.events.info(Info::SnifferStarted);
            return true;
        }

        false
    }
}
