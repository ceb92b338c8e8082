//! Console protocol state machine.
//!
//! The session classifies every console line and moves between a small set
//! of states. It performs no I/O: lines come in through [`Session::feed`],
//! commands to transmit accumulate in an outbox drained by the worker, and
//! structured results leave through the [`EventEmitter`].
//!
//! # State Graph
//!
//! ```text
//!                 prompt              dispatch
//! waiting_for_prompt ──────► prompt ──────────► interface ─────┐
//!        ▲      ▲                │              scanlist        │
//!        │      │                │              waiting_for_scan│
//!        │      │                │              sniffing        │
//!        │      └────────────────┼──────────────────────────────┘
//!        │                       │  interrupt / device failure
//! waiting_for_prompt_dirty ◄─────┘
//! ```

use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, trace, warn};
use regex::Regex;

use super::cancel::CancelFlag;
use super::command::Command;
use super::event::{Event, EventEmitter, Info};
use crate::channel::{LineFramer, LineKind, PromptTracker};
use crate::error::{Error, InterfaceError};
use crate::parser::{
    ScanHeader, SnifferAccumulator, format_hw_address, parse_hw_address, parse_row,
};
use crate::platform::routeros::{
    self, DEFAULT_SCANLIST, DeviceFailure, FRAME_END, FRAME_START, INTERRUPT, SCAN_RESTART_ROWS,
};
use crate::transport::SessionConfig;

/// Hardware address anywhere in a line.
static HW_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9A-Fa-f]{2}(?:[:-][0-9A-Fa-f]{2}){5}").expect("hardware address pattern")
});

/// Console session states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for the console to become idle.
    WaitingForPrompt,
    /// Waiting for the prompt after an interrupt or a device failure.
    WaitingForPromptDirty,
    /// The console is idle and a command may be dispatched.
    Prompt,
    /// Waiting for the interface hardware address.
    Interface,
    /// Collecting the scan-list.
    Scanlist,
    /// Scanner started, no frame header seen yet.
    WaitingForScan,
    /// Receiving scanner frames.
    Scanning,
    /// Receiving sniffer statistics.
    Sniffing,
}

impl SessionState {
    /// States in which a device command is running.
    fn is_running(self) -> bool {
        matches!(
            self,
            SessionState::WaitingForScan | SessionState::Scanning | SessionState::Sniffing
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Activity {
    Scanner,
    Sniffer,
}

/// Requests waiting for the next idle prompt.
#[derive(Debug)]
pub(crate) struct Pending {
    pub(crate) interface_check: bool,
    pub(crate) scanlist_set: Option<String>,
    pub(crate) scanlist_get: bool,
    pub(crate) scan: bool,
    pub(crate) sniff: bool,
}

/// One console session, owned by the worker.
pub struct Session {
    pub(crate) interface: String,
    pub(crate) background: bool,
    pub(crate) remote: bool,
    /// Duration of the next scan.
    pub(crate) scan_duration: u32,

    pub(crate) state: SessionState,
    framer: LineFramer,
    prompt: PromptTracker,
    /// A transmitted command whose echo has not been seen yet.
    echo_pending: bool,

    pub(crate) hw_address: Option<u64>,
    pub(crate) pending: Pending,
    /// Continuous remote scanning is on.
    pub(crate) continuous: bool,
    pub(crate) running: Option<Activity>,

    header: Option<ScanHeader>,
    /// No row seen yet in the open frame, a header may still follow.
    header_expected: bool,
    frame_open: bool,
    frame_rows: usize,
    pub(crate) scanlist_lines: Vec<String>,
    scanlist: Option<String>,
    sniffer: SnifferAccumulator,

    outbox: Vec<String>,
    pub(crate) cancel: CancelFlag,
    fatal: Option<Error>,
    pub(crate) events: EventEmitter,
}

impl Session {
    pub fn new(config: &SessionConfig, cancel: CancelFlag, events: EventEmitter) -> Self {
        Self {
            interface: config.interface.clone(),
            background: config.background,
            remote: config.remote,
            scan_duration: config.duration,
            state: SessionState::WaitingForPrompt,
            framer: LineFramer::new(),
            prompt: PromptTracker::new(config.login.clone()),
            echo_pending: false,
            hw_address: None,
            pending: Pending {
                interface_check: true,
                scanlist_set: None,
                scanlist_get: true,
                scan: false,
                sniff: false,
            },
            continuous: config.remote,
            running: None,
            header: None,
            header_expected: false,
            frame_open: false,
            frame_rows: 0,
            scanlist_lines: Vec::new(),
            scanlist: None,
            sniffer: SnifferAccumulator::new(),
            outbox: Vec::new(),
            cancel,
            fatal: None,
            events,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Device identity from the prompt.
    pub fn identity(&self) -> Option<&str> {
        self.prompt.identity()
    }

    /// Hardware address of the wireless interface.
    pub fn hw_address(&self) -> Option<u64> {
        self.hw_address
    }

    /// Last scan-list read from the device.
    pub fn scanlist(&self) -> Option<&str> {
        self.scanlist.as_deref()
    }

    /// Text waiting to be transmitted, oldest first.
    pub fn take_outbox(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outbox)
    }

    /// A fatal error latched while processing output.
    pub fn take_fatal(&mut self) -> Option<Error> {
        self.fatal.take()
    }

    /// Apply a caller command. Device-facing effects wait for the prompt,
    /// except interrupts.
    pub fn apply(&mut self, command: Command) {
        debug!("command: {:?}", command);
        match command {
            Command::Authenticate => debug!("no host key decision pending"),
            Command::SetScanlist(scanlist) => {
                if !routeros::is_valid_scanlist(&scanlist) {
                    warn!("rejecting scan-list {:?}", scanlist);
                    self.events
                        .info(Info::Failure(format!("invalid scan-list: {scanlist:?}")));
                    return;
                }
                self.pending.scanlist_set = Some(scanlist);
                if self.running == Some(Activity::Scanner) {
                    self.interrupt();
                    self.pending.scan = true;
                }
            }
            Command::Stop => {
                self.pending.scan = false;
                self.pending.sniff = false;
                self.continuous = false;
                if self.running.is_some() {
                    self.interrupt();
                }
            }
            Command::Scan(duration) => {
                if let Some(duration) = duration {
                    self.scan_duration = duration;
                }
                self.pending.scan = true;
                self.pending.sniff = false;
                self.continuous = self.remote;
                if self.running.is_some() {
                    self.interrupt();
                }
            }
            Command::Sniff => {
                self.pending.sniff = true;
                self.pending.scan = false;
                self.continuous = false;
                if self.running.is_some() {
                    self.interrupt();
                }
            }
        }
    }

    /// Process raw terminal output.
    pub fn feed(&mut self, data: &[u8]) {
        for line in self.framer.push(data) {
            self.process_line(&line);
        }
    }

    /// Called when a read wait ended without data.
    ///
    /// A prompt the console left without a line terminator is only
    /// recognized here.
    pub fn idle(&mut self) {
        let prompt = &self.prompt;
        if let Some(line) = self.framer.take_tail_if(|tail| prompt.is_bare_prompt(tail)) {
            self.process_line(&line);
        }
    }

    /// Classify one console line and drive the state machine.
    pub fn process_line(&mut self, line: &str) {
        trace!("[{:?}] {:?}", self.state, line);
        match self.prompt.classify(line) {
            LineKind::Prompt => self.on_prompt(),
            LineKind::Input(input) => {
                if self.echo_pending {
                    trace!("echo: {:?}", input);
                    self.echo_pending = false;
                }
            }
            LineKind::Output if self.echo_pending => {
                trace!("echo: {:?}", line);
                self.echo_pending = false;
            }
            LineKind::Output => self.on_output(line),
        }
    }

    /// Queue a command line for transmission.
    pub(crate) fn send_line(&mut self, command: String) {
        debug!("dispatch: {}", command);
        self.outbox.push(format!("{command}\r"));
        self.echo_pending = true;
    }

    /// Interrupt the running command.
    fn interrupt(&mut self) {
        debug!("interrupt in {:?}", self.state);
        self.outbox.push(INTERRUPT.to_string());
        self.state = SessionState::WaitingForPromptDirty;
    }

    /// Reset frame tracking before a new scanner or sniffer run.
    pub(crate) fn reset_frames(&mut self) {
        self.frame_open = false;
        self.header_expected = false;
        self.frame_rows = 0;
        self.sniffer.finish();
    }

    fn on_prompt(&mut self) {
        match self.state {
            SessionState::Prompt => return,
            // A prompt before the echo predates the last command.
            _ if self.echo_pending && self.state != SessionState::WaitingForPromptDirty => {
                trace!("stale prompt");
                return;
            }
            SessionState::Interface => {
                warn!("interface {} not found", self.interface);
                self.fatal = Some(
                    InterfaceError::NotFound {
                        interface: self.interface.clone(),
                    }
                    .into(),
                );
                self.cancel.cancel();
                self.state = SessionState::WaitingForPrompt;
                return;
            }
            SessionState::Scanlist => {
                let scanlist = self.scanlist_lines.drain(..).collect::<Vec<_>>().join(",");
                let scanlist = scanlist.replace(';', ",");
                debug!("scan-list: {}", scanlist);
                self.scanlist = Some(scanlist.clone());
                self.events.info(Info::ScanList(scanlist));
            }
            _ => {}
        }

        self.echo_pending = false;
        self.state = SessionState::Prompt;

        if let Some(activity) = self.running.take() {
            self.reset_frames();
            self.events.info(match activity {
                Activity::Scanner => Info::ScannerStopped,
                Activity::Sniffer => Info::SnifferStopped,
            });
        }
    }

    fn on_output(&mut self, line: &str) {
        match self.state {
            SessionState::Interface => self.on_interface(line),
            SessionState::Scanlist => {
                let text = line.trim();
                if !text.is_empty() {
                    self.scanlist_lines.push(text.to_string());
                }
            }
            state if state.is_running() => {
                // Scanner rows carry network names, which may contain any text.
                let in_frame = self.frame_open && state != SessionState::Sniffing;
                if !in_frame {
                    if let Some(failure) = routeros::detect_failure(line) {
                        self.on_failure(line, failure);
                        return;
                    }
                }
                match state {
                    SessionState::WaitingForScan => self.on_waiting_for_scan(line),
                    SessionState::Scanning => self.on_scanning(line),
                    _ => self.on_sniffing(line),
                }
            }
            _ => trace!("ignored: {:?}", line),
        }
    }

    fn on_interface(&mut self, line: &str) {
        let Some(address) = HW_ADDRESS
            .find(line)
            .and_then(|m| parse_hw_address(m.as_str()))
        else {
            return;
        };

        let text = format_hw_address(address);
        info!("interface {} found: {}", self.interface, text);
        self.hw_address = Some(address);
        self.events.info(Info::InterfaceFound(text));
        self.state = SessionState::WaitingForPrompt;
    }

    fn on_failure(&mut self, line: &str, failure: DeviceFailure) {
        let message = line.trim().to_string();
        warn!("device failure in {:?}: {}", self.state, message);

        self.state = SessionState::WaitingForPromptDirty;
        self.frame_open = false;
        self.header_expected = false;
        self.frame_rows = 0;

        if failure == DeviceFailure::ScanListEmpty {
            info!("scan-list empty, restoring {:?}", DEFAULT_SCANLIST);
            self.pending.scanlist_set = Some(DEFAULT_SCANLIST.to_string());
        }
        self.events.info(Info::Failure(message));
    }

    fn on_waiting_for_scan(&mut self, line: &str) {
        if line.starts_with(FRAME_START) {
            self.open_frame();
            return;
        }
        if !self.frame_open {
            return;
        }
        if let Some(header) = self.take_header(line) {
            debug!("scan header: {:?}", header);
            self.header = Some(header);
            self.state = SessionState::Scanning;
        }
    }

    fn on_scanning(&mut self, line: &str) {
        if line.starts_with(FRAME_START) {
            self.open_frame();
            return;
        }
        if line == FRAME_END {
            self.close_frame();
            return;
        }
        if !self.frame_open {
            return;
        }
        if let Some(header) = self.take_header(line) {
            self.header = Some(header);
            return;
        }

        self.frame_rows += 1;
        let Some(header) = &self.header else {
            return;
        };
        if let Some(record) = parse_row(header, line, unix_now()) {
            self.events.emit(Event::Network(record));
        }
    }

    fn open_frame(&mut self) {
        self.frame_open = true;
        self.header_expected = true;
        self.frame_rows = 0;
    }

    /// A header line, accepted only before the first row of a frame.
    fn take_header(&mut self, line: &str) -> Option<ScanHeader> {
        if !self.header_expected {
            return None;
        }
        if HW_ADDRESS.is_match(line) {
            self.header_expected = false;
            return None;
        }
        let header = ScanHeader::parse(line)?;
        self.header_expected = false;
        Some(header)
    }

    fn close_frame(&mut self) {
        if !self.frame_open {
            return;
        }
        self.frame_open = false;
        self.header_expected = false;
        let rows = std::mem::take(&mut self.frame_rows);
        self.events.info(Info::Heartbeat);

        // The device stops refreshing frames taller than the terminal.
        if rows > SCAN_RESTART_ROWS && !self.continuous {
            info!("scan frame of {} rows is too long, restarting", rows);
            self.interrupt();
            self.pending.scan = true;
        }
    }

    fn on_sniffing(&mut self, line: &str) {
        if line == FRAME_END {
            if let Some(stats) = self.sniffer.finish() {
                self.events.emit(Event::Sniffer(stats));
            }
            return;
        }
        if !self.sniffer.feed(line) {
            trace!("ignored sniffer line: {:?}", line);
        }
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
