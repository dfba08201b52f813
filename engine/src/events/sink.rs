//! Event sink trait and writer-backed implementations

use crate::models::{Event, EventLog};
use std::io::{self, Write};

/// Destination for engine events
///
/// Sinks may fail (I/O); the engine surfaces the failure as
/// `EngineError::Sink` after the iteration's state change is complete.
pub trait EventSink {
    fn record(&mut self, event: &Event) -> io::Result<()>;
}

impl EventSink for EventLog {
    fn record(&mut self, event: &Event) -> io::Result<()> {
        self.log(event.clone());
        Ok(())
    }
}

impl<S: EventSink + ?Sized> EventSink for &mut S {
    fn record(&mut self, event: &Event) -> io::Result<()> {
        (**self).record(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn record(&mut self, event: &Event) -> io::Result<()> {
        (**self).record(event)
    }
}

/// Sink that drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&mut self, _event: &Event) -> io::Result<()> {
        Ok(())
    }
}

const TSV_HEADER: &str =
    "iteration\tmean_gap\ttrust_region\treplications\twithin_variance\tbetween_variance\tdf_t_statistic";

/// Tab-separated iteration records
///
/// Only [`Event::IterationRecord`] produces a row; the header is written
/// before the first row. Missing estimates are written as empty cells.
///
/// # Example
/// ```
/// use replanner_core_rs::events::{EventSink, TsvSink};
/// use replanner_core_rs::models::Event;
///
/// let mut sink = TsvSink::new(Vec::new());
/// sink.record(&Event::IterationRecord {
///     iteration: 0,
///     mean_gap: 1.5,
///     trust_region: 4,
///     replications: 2,
///     within_variance: None,
///     between_variance: None,
///     t_statistic: None,
/// }).unwrap();
///
/// let text = String::from_utf8(sink.into_inner()).unwrap();
/// assert_eq!(text.lines().count(), 2);
/// ```
pub struct TsvSink<W: Write> {
    writer: W,
    header_written: bool,
}

impl<W: Write> TsvSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            header_written: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl<W: Write> EventSink for TsvSink<W> {
    fn record(&mut self, event: &Event) -> io::Result<()> {
        if let Event::IterationRecord {
            iteration,
            mean_gap,
            trust_region,
            replications,
            within_variance,
            between_variance,
            t_statistic,
        } = event
        {
            if !self.header_written {
                writeln!(self.writer, "{}", TSV_HEADER)?;
                self.header_written = true;
            }
            writeln!(
                self.writer,
                "{}\t{}\t{}\t{}\t{}\t{}\t{}",
                iteration,
                mean_gap,
                trust_region,
                replications,
                cell(*within_variance),
                cell(*between_variance),
                cell(*t_statistic),
            )?;
        }
        Ok(())
    }
}

/// Every event as a single JSON line
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn record(&mut self, event: &Event) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")
    }
}
