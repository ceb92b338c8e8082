//! Sniffer statistics parsing.

use serde::Serialize;

/// Counters printed by the sniffer between two frame sentinels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnifferStats {
    pub processed_packets: u64,
    pub memory_size: u64,
    pub memory_saved_packets: u64,
    pub memory_over_limit_packets: u64,
    pub stream_dropped_packets: u64,
    pub stream_sent_packets: u64,
    pub real_file_limit: u64,
    pub real_memory_limit: u64,
}

/// Accumulates `key: value` lines of one sniffer frame.
#[derive(Debug, Default)]
pub struct SnifferAccumulator {
    stats: SnifferStats,
    lines: usize,
}

impl SnifferAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one statistics line. Returns `false` if the line was not a
    /// known counter.
    pub fn feed(&mut self, line: &str) -> bool {
        let Some((key, value)) = line.split_once(':') else {
            return false;
        };
        let Some(value) = leading_number(value.trim()) else {
            return false;
        };

        let slot = match key.trim() {
            "processed-packets" => &mut self.stats.processed_packets,
            "memory-size" => &mut self.stats.memory_size,
            "memory-saved-packets" => &mut self.stats.memory_saved_packets,
            "memory-over-limit-packets" => &mut self.stats.memory_over_limit_packets,
            "stream-dropped-packets" => &mut self.stats.stream_dropped_packets,
            "stream-sent-packets" => &mut self.stats.stream_sent_packets,
            "real-file-limit" => &mut self.stats.real_file_limit,
            "real-memory-limit" => &mut self.stats.real_memory_limit,
            _ => return false,
        };
        *slot = value;
        self.lines += 1;
        true
    }

    /// Close the frame, returning the counters and resetting.
    ///
    /// A frame without any counter yields `None`.
    pub fn finish(&mut self) -> Option<SnifferStats> {
        let lines = std::mem::take(&mut self.lines);
        let stats = std::mem::take(&mut self.stats);
        (lines > 0).then_some(stats)
    }
}

/// Digits at the start of a value, units dropped (`1024KiB` is 1024).
fn leading_number(value: &str) -> Option<u64> {
    let end = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_and_resets() {
        let mut acc = SnifferAccumulator::new();
        assert!(acc.feed("        processed-packets: 1520"));
        assert!(acc.feed("              memory-size: 1024KiB"));
        assert!(acc.feed("     memory-saved-packets: 12"));
        assert!(acc.feed("   stream-dropped-packets: 3"));
        assert!(!acc.feed("                  unknown: 9"));
        assert!(!acc.feed("garbage"));

        let stats = acc.finish().unwrap();
        assert_eq!(stats.processed_packets, 1520);
        assert_eq!(stats.memory_size, 1024);
        assert_eq!(stats.memory_saved_packets, 12);
        assert_eq!(stats.stream_dropped_packets, 3);
        assert_eq!(stats.stream_sent_packets, 0);

        assert_eq!(acc.finish(), None);
    }

    #[test]
    fn test_non_numeric_value_ignored() {
        let mut acc = SnifferAccumulator::new();
        assert!(!acc.feed("processed-packets: n/a"));
        assert_eq!(acc.finish(), None);
    }
}
