//! CSV and JSON counter exporters used by `collect`.

use super::CounterSample;
use crate::error::Result;
use chrono::{DateTime, Local};
use clap::ValueEnum;
use serde::Serialize;
use std::fmt;
use std::io::Write;
use std::path::PathBuf;

/// Timestamp layout shared by both formats.
const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Serialization used by `collect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    /// Parse a configured value, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value.trim(), true).ok()
    }

    /// Open an exporter of this format over `writer`.
    pub fn exporter<W: Write + 'static>(
        self,
        writer: W,
        process_name: &str,
        start: DateTime<Local>,
    ) -> Result<Box<dyn CounterExporter>> {
        Ok(match self {
            ExportFormat::Csv => Box::new(CsvExporter::new(writer)?),
            ExportFormat::Json => Box::new(JsonExporter::new(writer, process_name, start)?),
        })
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// The file `collect` writes to: `output` with the format's extension
/// appended unless it is already there.
pub fn export_path(output: &str, format: ExportFormat) -> PathBuf {
    let suffix = format!(".{}", format.extension());
    if output.to_ascii_lowercase().ends_with(&suffix) {
        PathBuf::from(output)
    } else {
        PathBuf::from(format!("{}{}", output, suffix))
    }
}

/// Streams samples to an output file.
pub trait CounterExporter {
    fn write_samples(&mut self, samples: &[CounterSample]) -> Result<()>;

    /// Complete the document and flush. Called exactly once.
    fn finish(&mut self) -> Result<()>;
}

pub struct CsvExporter<W: Write> {
    writer: W,
}

impl<W: Write> CsvExporter<W> {
    pub fn new(mut writer: W) -> Result<Self> {
        writeln!(writer, "Timestamp,Provider,Counter Name,Counter Type,Mean/Increment")?;
        Ok(Self { writer })
    }
}

impl<W: Write> CounterExporter for CsvExporter<W> {
    fn write_samples(&mut self, samples: &[CounterSample]) -> Result<()> {
        for sample in samples {
            writeln!(
                self.writer,
                "{},{},{},{},{}",
                sample.timestamp.format(TIMESTAMP_FORMAT),
                csv_field(&sample.provider),
                csv_field(&sample.label()),
                sample.kind.label(),
                sample.value
            )?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonEvent<'a> {
    timestamp: String,
    provider: &'a str,
    name: String,
    tags: &'a str,
    counter_type: &'static str,
    value: f64,
}

/// Writes `{"TargetProcess": .., "StartTime": .., "Events": [..]}`,
/// streaming events as they arrive.
pub struct JsonExporter<W: Write> {
    writer: W,
    events_written: usize,
}

impl<W: Write> JsonExporter<W> {
    pub fn new(mut writer: W, process_name: &str, start: DateTime<Local>) -> Result<Self> {
        write!(
            writer,
            "{{\"TargetProcess\": {}, \"StartTime\": {}, \"Events\": [",
            serde_json::to_string(process_name)?,
            serde_json::to_string(&start.format(TIMESTAMP_FORMAT).to_string())?
        )?;
        Ok(Self {
            writer,
            events_written: 0,
        })
    }
}

impl<W: Write> CounterExporter for JsonExporter<W> {
    fn write_samples(&mut self, samples: &[CounterSample]) -> Result<()> {
        for sample in samples {
            let event = JsonEvent {
                timestamp: sample.timestamp.format(TIMESTAMP_FORMAT).to_string(),
                provider: &sample.provider,
                name: sample.label(),
                tags: "",
                counter_type: sample.kind.label(),
                value: sample.value,
            };
            if self.events_written > 0 {
                write!(self.writer, ",")?;
            }
            write!(self.writer, "\n  {}", serde_json::to_string(&event)?)?;
            self.events_written += 1;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        writeln!(self.writer, "\n]}}")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::sample;
    use crate::engine::CounterKind;
    use std::cell::RefCell;
    use std::io;
    use std::rc::Rc;

    /// A cloneable in-memory writer so tests can read what a boxed exporter wrote.
    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuf {
        fn text(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).unwrap()
        }
    }

    #[test]
    fn test_export_format_parse_is_case_insensitive() {
        assert_eq!(ExportFormat::parse("json"), Some(ExportFormat::Json));
        assert_eq!(ExportFormat::parse(" CSV "), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::parse("xml"), None);
        assert_eq!(ExportFormat::parse(""), None);
    }

    #[test]
    fn test_export_path_appends_missing_extension() {
        assert_eq!(export_path("counter", ExportFormat::Csv), PathBuf::from("counter.csv"));
        assert_eq!(export_path("trace.json", ExportFormat::Json), PathBuf::from("trace.json"));
        assert_eq!(
            export_path("trace.csv", ExportFormat::Json),
            PathBuf::from("trace.csv.json")
        );
    }

    #[test]
    fn test_csv_exporter_writes_header_and_rows() {
        let buf = SharedBuf::default();
        let mut exporter = ExportFormat::Csv
            .exporter(buf.clone(), "webapp", Local::now())
            .unwrap();

        let mut rate = sample("Microsoft.AspNetCore.Hosting", "requests-per-second", 40.0);
        rate.kind = CounterKind::Increment;
        rate.display_name = "Request Rate, total".to_string();
        exporter.write_samples(&[rate]).unwrap();
        exporter.finish().unwrap();

        let text = buf.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Timestamp,Provider,Counter Name,Counter Type,Mean/Increment");
        assert!(lines[1].ends_with(",Microsoft.AspNetCore.Hosting,\"Request Rate, total\",Rate,40"));
    }

    #[test]
    fn test_json_exporter_produces_valid_document() {
        let buf = SharedBuf::default();
        let mut exporter = ExportFormat::Json
            .exporter(buf.clone(), "web\"app", Local::now())
            .unwrap();

        exporter
            .write_samples(&[
                sample("System.Runtime", "cpu-usage", 3.5),
                sample("System.Runtime", "working-set", 120.0),
            ])
            .unwrap();
        exporter.write_samples(&[]).unwrap();
        exporter.finish().unwrap();

        let doc: serde_json::Value = serde_json::from_str(&buf.text()).unwrap();
        assert_eq!(doc["TargetProcess"], "web\"app");
        let events = doc["Events"].as_array().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0]["provider"], "System.Runtime");
        assert_eq!(events[0]["counterType"], "Metric");
        assert_eq!(events[1]["value"], 120.0);
    }
}
