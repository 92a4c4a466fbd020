//! Console reporting of dataref changes
//!
//! Text mode prints one human-readable line per change, JSON mode prints one
//! JSON object per line.

use crate::config::OutputFormat;
use std::io::{self, Write};
use xplane_rref::{DatarefChange, DispatchStats};

pub struct Reporter<W: Write> {
    format: OutputFormat,
    out: W,
}

impl<W: Write> Reporter<W> {
    pub fn new(format: OutputFormat, out: W) -> Self {
        Self { format, out }
    }

    pub fn report(&mut self, change: &DatarefChange) -> io::Result<()> {
        match self.format {
            OutputFormat::Text => writeln!(
                self.out,
                "{} {}",
                change.timestamp().format("%H:%M:%S%.3f"),
                change
            )?,
            OutputFormat::Json => {
                serde_json::to_writer(&mut self.out, change)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()
    }

    pub fn summary(&mut self, stats: &DispatchStats) -> io::Result<()> {
        if self.format == OutputFormat::Json {
            return Ok(());
        }
        writeln!(self.out, "\n=== SESSION SUMMARY ===")?;
        writeln!(self.out, "Packets received:  {}", stats.packets)?;
        writeln!(self.out, "Packets ignored:   {}", stats.ignored_packets)?;
        writeln!(self.out, "Values decoded:    {}", stats.updates)?;
        writeln!(self.out, "Changes reported:  {}", stats.changes)?;
        writeln!(self.out, "Requests sent:     {}", stats.requests_sent)
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn light() -> DatarefChange {
        DatarefChange::Light {
            timestamp: DateTime::from_timestamp(3_600 + 120 + 5, 250_000_000).unwrap(),
            index: 4,
            on: false,
            raw: 0.25,
        }
    }

    #[test]
    fn test_text_line() {
        let mut reporter = Reporter::new(OutputFormat::Text, Vec::new());
        reporter.report(&light()).unwrap();

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(output, "01:02:05.250 [light] index 4: OFF (raw 0.25)\n");
    }

    #[test]
    fn test_json_line() {
        let mut reporter = Reporter::new(OutputFormat::Json, Vec::new());
        reporter
            .report(&DatarefChange::Gear {
                timestamp: DateTime::from_timestamp(0, 0).unwrap(),
                gear: 1,
                ratio: 0.5,
            })
            .unwrap();

        let output = String::from_utf8(reporter.into_inner()).unwrap();
        let value: serde_json::Value = serde_json::from_str(output.trim()).unwrap();
        assert_eq!(value["kind"], "gear");
        assert_eq!(value["gear"], 1);
        assert_eq!(value["ratio"], 0.5);
        assert_eq!(value["timestamp"], "1970-01-01T00:00:00Z");
    }

    #[test]
    fn test_summary_text_only() {
        let stats = DispatchStats {
            packets: 3,
            changes: 2,
            ..Default::default()
        };

        let mut json = Reporter::new(OutputFormat::Json, Vec::new());
        json.summary(&stats).unwrap();
        assert!(json.into_inner().is_empty());

        let mut text = Reporter::new(OutputFormat::Text, Vec::new());
        text.summary(&stats).unwrap();
        let output = String::from_utf8(text.into_inner()).unwrap();
        assert!(output.contains("Changes reported:  2"));
    }
}
