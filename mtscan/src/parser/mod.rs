//! Parsers for scanner and sniffer console output.

mod header;
mod scan;
mod sniffer;

pub use header::{Column, ScanHeader};
pub use scan::{
    NetworkFlags, NetworkRecord, format_hw_address, parse_channel, parse_frequency,
    parse_hw_address, parse_row,
};
pub use sniffer::{SnifferAccumulator, SnifferStats};
