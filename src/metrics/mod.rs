//! Training observability.
//!
//! Scalars flow through a [`Recorder`] handed to the trainer; nothing here is
//! process-global. [`EpisodeTracker`] keeps the episode scores and their
//! moving average.

pub mod scalar_writer;
pub mod tracker;

pub use scalar_writer::ScalarWriter;
pub use tracker::EpisodeTracker;

use tracing::debug;

use crate::error::Result;

/// Sink for named scalar metrics.
pub trait Recorder {
    fn record(&mut self, name: &str, value: f32, step: u64) -> Result<()>;

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<R: Recorder + ?Sized> Recorder for &mut R {
    fn record(&mut self, name: &str, value: f32, step: u64) -> Result<()> {
        (**self).record(name, value, step)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<R: Recorder + ?Sized> Recorder for Box<R> {
    fn record(&mut self, name: &str, value: f32, step: u64) -> Result<()> {
        (**self).record(name, value, step)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

impl Recorder for NullRecorder {
    fn record(&mut self, _name: &str, _value: f32, _step: u64) -> Result<()> {
        Ok(())
    }
}

/// Emits every scalar as a `debug` event on the `metrics` target.
///
/// The loss arrives once per environment step; `info` is left to the
/// trainer's periodic progress reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingRecorder;

impl Recorder for TracingRecorder {
    fn record(&mut self, name: &str, value: f32, step: u64) -> Result<()> {
        debug!(target: "metrics", metric = name, value, step);
        Ok(())
    }
}

/// One recorded scalar.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub value: f32,
    pub step: u64,
}

/// Keeps every record in memory. Mostly useful in tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecorder {
    records: Vec<Record>,
}

impl InMemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Values recorded under `name`, in recording order.
    pub fn values(&self, name: &str) -> Vec<(u64, f32)> {
        self.records
            .iter()
            .filter(|r| r.name == name)
            .map(|r| (r.step, r.value))
            .collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

impl Recorder for InMemoryRecorder {
    fn record(&mut self, name: &str, value: f32, step: u64) -> Result<()> {
        self.records.push(Record { name: name.to_string(), value, step });
        Ok(())
    }
}

/// Forwards to several recorders in order.
#[derive(Default)]
pub struct MultiRecorder {
    sinks: Vec<Box<dyn Recorder>>,
}

impl MultiRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Box<dyn Recorder>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl Recorder for MultiRecorder {
    fn record(&mut self, name: &str, value: f32, step: u64) -> Result<()> {
        for sink in &mut self.sinks {
            sink.record(name, value, step)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        for sink in &mut self.sinks {
            sink.flush()?;
        }
        Ok(())
    }
}
