//! Scanner row parsing.
//!
//! Rows are cut at the offsets discovered by [`ScanHeader`]. Numeric values
//! are not fixed-width, so they are searched for in a small window starting
//! at the column offset.

use std::fmt;

use log::trace;
use serde::Serialize;

use super::header::{Column, ScanHeader};

/// Characters preceding the address column that hold the flag codes.
pub const FLAGS_WIDTH: usize = 7;

/// Characters searched for the start of a numeric value.
pub const NUMBER_WINDOW: usize = 5;

/// Maximum SSID length.
pub const SSID_WIDTH: usize = 32;

/// Maximum radio name length.
pub const RADIO_NAME_WIDTH: usize = 32;

/// Maximum firmware version length.
pub const VERSION_WIDTH: usize = 16;

/// Flags printed in front of each scanner row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkFlags {
    pub active: bool,
    pub privacy: bool,
    pub routeros: bool,
    pub nstreme: bool,
    pub tdma: bool,
    pub wds: bool,
    pub bridge: bool,
}

impl NetworkFlags {
    /// Collect flags from their single-character codes.
    ///
    /// Characters that are not flag codes are ignored.
    pub fn from_codes(codes: impl IntoIterator<Item = char>) -> Self {
        let mut flags = Self::default();
        for code in codes {
            match code {
                'A' => flags.active = true,
                'P' => flags.privacy = true,
                'R' => flags.routeros = true,
                'N' => flags.nstreme = true,
                'T' => flags.tdma = true,
                'W' => flags.wds = true,
                'B' => flags.bridge = true,
                _ => {}
            }
        }
        flags
    }
}

/// One network seen by the scanner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkRecord {
    /// 48-bit hardware address.
    pub address: u64,
    pub flags: NetworkFlags,
    /// Center frequency in kHz, 0 when unknown.
    pub frequency: u32,
    /// Channel width, as printed (`20`, `20/40-Ce`, ...).
    pub channel: String,
    /// Wireless mode (`g`, `ac`, `b/g/n`, ...).
    pub mode: String,
    pub ssid: String,
    pub radio_name: String,
    /// Signal level in dBm.
    pub signal: Option<i32>,
    /// Noise floor in dBm.
    pub noise: Option<i32>,
    /// RouterOS version announced by the network.
    pub firmware: String,
    /// Unix time the row was parsed.
    pub timestamp: i64,
}

/// Parse one scanner row.
///
/// Returns `None` for rows without the active flag and for rows whose
/// address is malformed.
pub fn parse_row(header: &ScanHeader, line: &str, timestamp: i64) -> Option<NetworkRecord> {
    let row: Vec<char> = line.chars().collect();
    let address_offset = header.offset(Column::Address)?;

    let flags_start = address_offset.saturating_sub(FLAGS_WIDTH);
    let flags = NetworkFlags::from_codes(
        row.get(flags_start..address_offset.min(row.len()))
            .unwrap_or_default()
            .iter()
            .copied(),
    );
    if !flags.active {
        trace!("skipping inactive row: {:?}", line);
        return None;
    }

    let Some(address) = address_at(&row, address_offset) else {
        trace!("skipping row with malformed address: {:?}", line);
        return None;
    };

    let mut record = NetworkRecord {
        address,
        flags,
        frequency: 0,
        channel: String::new(),
        mode: String::new(),
        ssid: text_field(header, &row, Column::Ssid, SSID_WIDTH),
        radio_name: text_field(header, &row, Column::RadioName, RADIO_NAME_WIDTH),
        signal: number_field(header, &row, Column::Signal),
        noise: number_field(header, &row, Column::NoiseFloor),
        firmware: text_field(header, &row, Column::Version, VERSION_WIDTH),
        timestamp,
    };

    if let Some(offset) = header.offset(Column::Channel) {
        let (frequency, width, mode) = parse_channel(&word_at(&row, offset));
        record.frequency = frequency;
        record.channel = width;
        record.mode = mode;
    } else {
        if let Some(offset) = header.offset(Column::Frequency) {
            record.frequency = parse_frequency(&word_at(&row, offset));
        }
        if let Some(offset) = header.offset(Column::ChannelWidth) {
            record.channel = word_at(&row, offset);
        }
        if let Some(offset) = header.offset(Column::Band) {
            let band = word_at(&row, offset);
            record.mode = band
                .split_once('-')
                .map(|(_, mode)| mode.to_string())
                .unwrap_or_default();
        }
    }

    if record.noise.is_none() {
        let snr = number_field(header, &row, Column::Snr);
        if let (Some(signal), Some(snr)) = (record.signal, snr) {
            record.noise = Some(signal - snr);
        }
    }

    Some(record)
}

/// Split a `frequency/width/mode` channel value.
///
/// Missing segments are left empty.
pub fn parse_channel(value: &str) -> (u32, String, String) {
    let mut parts = value.splitn(3, '/');
    let frequency = parts.next().map(parse_frequency).unwrap_or(0);
    let width = parts.next().unwrap_or_default().to_string();
    let mode = parts.next().unwrap_or_default().to_string();
    (frequency, width, mode)
}

/// Parse a frequency in MHz (optionally fractional) into kHz.
pub fn parse_frequency(value: &str) -> u32 {
    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    let Ok(mhz) = whole.parse::<u32>() else {
        return 0;
    };

    let mut khz = 0;
    let mut scale = 100;
    for digit in fraction.chars().take(3) {
        match digit.to_digit(10) {
            Some(d) => khz += d * scale,
            None => break,
        }
        scale /= 10;
    }
    mhz.saturating_mul(1000).saturating_add(khz)
}

/// Decode twelve hex digits laid out as six separated byte pairs.
pub fn parse_hw_address(text: &str) -> Option<u64> {
    let chars: Vec<char> = text.chars().collect();
    address_at(&chars, 0)
}

/// Format a hardware address as `AA:BB:CC:DD:EE:FF`.
pub fn format_hw_address(address: u64) -> String {
    HwAddress(address).to_string()
}

struct HwAddress(u64);

impl fmt::Display for HwAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in (0..6).rev() {
            write!(f, "{:02X}", (self.0 >> (i * 8)) & 0xff)?;
            if i > 0 {
                f.write_str(":")?;
            }
        }
        Ok(())
    }
}

fn address_at(row: &[char], offset: usize) -> Option<u64> {
    let mut address = 0u64;
    for pair in 0..6 {
        let at = offset + pair * 3;
        let high = row.get(at)?.to_digit(16)?;
        let low = row.get(at + 1)?.to_digit(16)?;
        address = (address << 8) | u64::from(high << 4 | low);
    }
    Some(address)
}

/// Right-trimmed text from a column offset, bounded by the next column and
/// the declared maximum width.
fn text_field(header: &ScanHeader, row: &[char], column: Column, width: usize) -> String {
    let Some(start) = header.offset(column) else {
        return String::new();
    };
    if start >= row.len() {
        return String::new();
    }

    let mut end = (start + width).min(row.len());
    if let Some(next) = header.next_offset(start) {
        end = end.min(next);
    }
    row[start..end].iter().collect::<String>().trim_end().to_string()
}

/// First number found in the window starting at a column offset.
fn number_field(header: &ScanHeader, row: &[char], column: Column) -> Option<i32> {
    let start = header.offset(column)?;
    let window = row.get(start..(start + NUMBER_WINDOW).min(row.len()))?;
    let skip = window
        .iter()
        .position(|c| c.is_ascii_digit() || *c == '-')?;

    let mut chars = row[start + skip..].iter().peekable();
    let negative = chars.next_if_eq(&&'-').is_some();
    let digits: String = chars
        .take_while(|c| c.is_ascii_digit())
        .collect();
    let value: i32 = digits.parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Text from a column offset up to the next blank.
fn word_at(row: &[char], offset: usize) -> String {
    row.get(offset..)
        .unwrap_or_default()
        .iter()
        .take_while(|c| **c != ' ')
        .collect()
}
