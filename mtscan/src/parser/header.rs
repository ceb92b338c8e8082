//! Scanner column header discovery.
//!
//! RouterOS changed the scanner columns between firmware versions (older
//! releases print `BAND`, `CHANNEL-WIDTH` and `FREQ`, newer ones a single
//! `CHANNEL`). Rather than switching on a version number, the header line is
//! searched for every known token and whatever is present is used.

use indexmap::IndexMap;

/// A scanner column recognized in the header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Address,
    Ssid,
    Band,
    ChannelWidth,
    Frequency,
    Channel,
    Signal,
    NoiseFloor,
    Snr,
    RadioName,
    Version,
}

impl Column {
    /// Every column, in the order tokens are searched.
    pub const ALL: [Column; 11] = [
        Column::Address,
        Column::Ssid,
        Column::Band,
        Column::ChannelWidth,
        Column::Frequency,
        Column::Channel,
        Column::Signal,
        Column::NoiseFloor,
        Column::Snr,
        Column::RadioName,
        Column::Version,
    ];

    /// Header token printed by the device.
    pub fn token(self) -> &'static str {
        match self {
            Column::Address => "ADDRESS",
            Column::Ssid => "SSID",
            Column::Band => "BAND",
            Column::ChannelWidth => "CHANNEL-WIDTH",
            Column::Frequency => "FREQ",
            Column::Channel => "CHANNEL",
            Column::Signal => "SIG",
            Column::NoiseFloor => "NF",
            Column::Snr => "SNR",
            Column::RadioName => "RADIO-NAME",
            Column::Version => "ROUTEROS-VERSION",
        }
    }
}

/// Column offsets discovered from a scanner header line.
///
/// Offsets count characters from the start of the line. Columns are kept in
/// on-screen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHeader {
    columns: IndexMap<Column, usize>,
}

impl ScanHeader {
    /// Derive column offsets from a header line.
    ///
    /// Returns `None` unless the line has an `ADDRESS` column, since rows
    /// cannot be parsed without it. Unknown words are ignored and missing
    /// tokens are simply absent.
    pub fn parse(line: &str) -> Option<Self> {
        let words = words(line);

        let mut found: Vec<(Column, usize)> = Column::ALL
            .iter()
            .filter_map(|column| {
                words
                    .iter()
                    .find(|(_, word)| *word == column.token())
                    .map(|(offset, _)| (*column, *offset))
            })
            .collect();

        if !found.iter().any(|(column, _)| *column == Column::Address) {
            return None;
        }

        found.sort_by_key(|(_, offset)| *offset);
        Some(Self {
            columns: found.into_iter().collect(),
        })
    }

    /// Offset of a column, if the header has it.
    pub fn offset(&self, column: Column) -> Option<usize> {
        self.columns.get(&column).copied()
    }

    /// Offset of the first column starting after `offset`.
    pub fn next_offset(&self, offset: usize) -> Option<usize> {
        self.columns.values().copied().find(|o| *o > offset)
    }

    /// Whether the header has a column.
    pub fn has(&self, column: Column) -> bool {
        self.columns.contains_key(&column)
    }

    /// Columns in on-screen order.
    pub fn columns(&self) -> impl Iterator<Item = (Column, usize)> + '_ {
        self.columns.iter().map(|(column, offset)| (*column, *offset))
    }
}

/// Blank-separated words with their character offsets.
fn words(line: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start: Option<(usize, usize)> = None;

    for (index, (byte, c)) in line.char_indices().enumerate() {
        match (c == ' ', start) {
            (true, Some((offset, from))) => {
                words.push((offset, &line[from..byte]));
                start = None;
            }
            (false, None) => start = Some((index, byte)),
            _ => {}
        }
    }
    if let Some((offset, from)) = start {
        words.push((offset, &line[from..]));
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEW_HEADER: &str =
        "      ADDRESS           SSID             CHANNEL          SIG  NF SNR RADIO-NAME   ROUTEROS-VERSION";
    const OLD_HEADER: &str =
        "      ADDRESS           SSID             BAND       CHANNEL-WIDTH FREQ SIG NF SNR RADIO-NAME";

    #[test]
    fn test_new_firmware_header() {
        let header = ScanHeader::parse(NEW_HEADER).unwrap();
        assert_eq!(header.offset(Column::Address), Some(6));
        assert_eq!(header.offset(Column::Ssid), Some(24));
        assert_eq!(header.offset(Column::Channel), Some(41));
        assert_eq!(header.offset(Column::Signal), Some(58));
        assert!(header.has(Column::Version));
        assert!(!header.has(Column::Band));
        assert!(!header.has(Column::ChannelWidth));
        assert_eq!(header.next_offset(24), Some(41));
    }

    #[test]
    fn test_old_firmware_header() {
        let header = ScanHeader::parse(OLD_HEADER).unwrap();
        assert!(header.has(Column::Band));
        assert!(header.has(Column::ChannelWidth));
        assert!(header.has(Column::Frequency));
        // CHANNEL-WIDTH must not be taken for CHANNEL
        assert!(!header.has(Column::Channel));
        assert!(!header.has(Column::Version));
    }

    #[test]
    fn test_derivation_is_stable() {
        let first = ScanHeader::parse(NEW_HEADER).unwrap();
        let second = ScanHeader::parse(NEW_HEADER).unwrap();
        assert_eq!(first, second);

        let order: Vec<Column> = first.columns().map(|(c, _)| c).collect();
        assert_eq!(order.first(), Some(&Column::Address));
        assert_eq!(order.last(), Some(&Column::Version));
    }

    #[test]
    fn test_requires_address() {
        assert!(ScanHeader::parse("  SSID   CHANNEL").is_none());
        assert!(ScanHeader::parse("").is_none());
    }
}
