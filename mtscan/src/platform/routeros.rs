//! MikroTik RouterOS console definition.
//!
//! Everything here is tied to the exact wording and layout of the RouterOS
//! CLI. The values are observed device behavior and are kept literal.
//!
//! # Prompt Examples
//!
//! ```text
//! [admin@MikroTik] >                    # idle prompt, identity "MikroTik"
//! [admin@MikroTik] > :put [/interf...   # prompt followed by echoed input
//! ```
//!
//! # Scanner Frame
//!
//! ```text
//! Flags: A - active, P - privacy, R - routeros-network, N - nstreme, T - tdma, W - wds, B - bridge
//!       ADDRESS           SSID             CHANNEL          SIG  NF SNR RADIO-NAME   ROUTEROS-VERSION
//! AP R  AA:BB:CC:DD:EE:FF MyWifi           2437/20/g        -62 -105 43 Router1      6.48.6
//! --
//! ```

/// Terminal columns requested for the PTY.
///
/// Wide enough that the scanner never wraps a row.
pub const TERMINAL_WIDTH: u32 = 65535;

/// Terminal rows requested for the PTY.
///
/// RouterOS stops refreshing a scanner frame correctly once it no longer fits
/// this many rows.
pub const TERMINAL_HEIGHT: u32 = 100;

/// Terminal type requested for the PTY.
pub const TERMINAL_TYPE: &str = "vt100";

/// A scan frame with more rows than this is restarted.
///
/// Half the terminal height, matching what real devices tolerate.
pub const SCAN_RESTART_ROWS: usize = (TERMINAL_HEIGHT / 2) as usize;

/// Console options appended to the login name: no colors, no terminal
/// detection.
pub const LOGIN_SUFFIX: &str = "+ct";

/// First line of every scanner frame.
pub const FRAME_START: &str = "Flags:";

/// Last line of every scanner and sniffer frame.
pub const FRAME_END: &str = "-- ";

/// Control character sent to interrupt a running command.
pub const INTERRUPT: &str = "\x03";

/// Literal scan-list value restoring the factory channel set.
pub const DEFAULT_SCANLIST: &str = "default";

/// Login name sent to the SSH server.
pub fn ssh_login(login: &str) -> String {
    format!("{login}{LOGIN_SUFFIX}")
}

/// Prompt printed by the console for a login and a discovered identity.
///
/// Without an identity only the fixed prefix is known.
pub fn prompt_for(login: &str, identity: Option<&str>) -> String {
    match identity {
        Some(identity) => format!("[{login}@{identity}{PROMPT_SUFFIX}"),
        None => format!("[{login}@"),
    }
}

/// Text that closes the identity in the prompt.
pub const PROMPT_SUFFIX: &str = "] > ";

/// Print the hardware address of the wireless interface.
pub fn interface_check(interface: &str) -> String {
    format!(":put [/interface get [find name=\"{interface}\"] mac-address]")
}

/// Print the configured scan-list.
pub fn scanlist_get(interface: &str) -> String {
    format!(":put [/interface wireless get [find name=\"{interface}\"] scan-list]")
}

/// Replace the configured scan-list.
pub fn scanlist_set(interface: &str, scanlist: &str) -> String {
    format!("/interface wireless set [find name=\"{interface}\"] scan-list=\"{scanlist}\"")
}

/// Whether `scanlist` is safe to pass to [`scanlist_set`].
///
/// Accepts comma-separated entries, each `default`, a frequency in MHz
/// (`2412`, `2412.5`) or a frequency range (`5180-5320`).
pub fn is_valid_scanlist(scanlist: &str) -> bool {
    !scanlist.is_empty()
        && scanlist.split(',').all(|entry| {
            entry == DEFAULT_SCANLIST
                || match entry.split_once('-') {
                    Some((low, high)) => is_frequency(low) && is_frequency(high),
                    None => is_frequency(entry),
                }
        })
}

fn is_frequency(text: &str) -> bool {
    let (whole, fraction) = text.split_once('.').unwrap_or((text, "0"));
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && digits(fraction)
}

/// Start the scanner. A `duration` of 0 scans until interrupted.
pub fn scan(interface: &str, duration: u32, background: bool) -> String {
    let mut command = format!("/interface wireless scan \"{interface}\"");
    if background {
        command.push_str(" background=yes");
    }
    if duration > 0 {
        command.push_str(&format!(" duration={duration}"));
    }
    command
}

/// Start the sniffer statistics view.
pub fn sniff(interface: &str) -> String {
    format!("/interface wireless sniffer sniff \"{interface}\"")
}

/// Device-reported failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFailure {
    /// The interface has no usable scan-list.
    ScanListEmpty,
    /// The scanner or sniffer is not running.
    NotRunning,
    /// The configured channel is not supported.
    BadChannel,
    /// Command syntax rejected.
    ExpectedEnd,
    /// Referenced item does not exist.
    NoSuchItem,
    /// Any other `failure:` message.
    Other,
}

/// Substrings identifying device failures, most specific first.
pub const FAILURE_PATTERNS: &[(&str, DeviceFailure)] = &[
    ("scan-list empty", DeviceFailure::ScanListEmpty),
    ("not running", DeviceFailure::NotRunning),
    ("bad channel", DeviceFailure::BadChannel),
    ("expected end of command", DeviceFailure::ExpectedEnd),
    ("no such item", DeviceFailure::NoSuchItem),
    ("failure:", DeviceFailure::Other),
];

/// Classify a console line as a device failure.
pub fn detect_failure(line: &str) -> Option<DeviceFailure> {
    FAILURE_PATTERNS
        .iter()
        .find(|(pattern, _)| line.contains(pattern))
        .map(|(_, failure)| *failure)
}
