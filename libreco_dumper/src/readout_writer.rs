use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::error::WriterError;
use super::ncv_position::UNKNOWN_NCV_POSITION;
use super::pulse::ReadoutRecord;

/// This is the version of the output format
const FORMAT_VERSION: &str = "1.0";

/// Destination for the records of a run
pub trait ReadoutWriter {
    /// Write the record of one accepted event
    fn write_record(&mut self, record: &ReadoutRecord) -> Result<(), WriterError>;

    /// Note an event which was rejected and not written
    fn reject_event(&mut self);

    /// Write run level information and finish
    fn close(self) -> Result<RunSummary, WriterError>;
}

/// One pulse of a record, flattened for output
#[derive(Debug, Clone, Serialize)]
struct PulseRow {
    card: u32,
    channel: u32,
    minibuffer: usize,
    start_time_ns: u64,
    peak_time_ns: u64,
    baseline: f64,
    sigma_baseline: f64,
    raw_area: f64,
    raw_amplitude: u16,
    amplitude: f64,
    charge: f64,
}

#[derive(Debug, Clone, Serialize)]
struct RecordDocument {
    run_number: u32,
    subrun_number: u32,
    event_number: u32,
    hefty_mode: bool,
    ncv_position: i32,
    hefty_trigger_masks: Vec<i32>,
    pulses: Vec<PulseRow>,
}

impl From<&ReadoutRecord> for RecordDocument {
    fn from(record: &ReadoutRecord) -> Self {
        let pulses = record
            .reco_readout
            .iter()
            .map(|(address, pulse)| PulseRow {
                card: address.card,
                channel: address.channel,
                minibuffer: address.minibuffer,
                start_time_ns: pulse.start_time_ns,
                peak_time_ns: pulse.peak_time_ns,
                baseline: pulse.baseline,
                sigma_baseline: pulse.sigma_baseline,
                raw_area: pulse.raw_area,
                raw_amplitude: pulse.raw_amplitude,
                amplitude: pulse.amplitude,
                charge: pulse.charge,
            })
            .collect();
        Self {
            run_number: record.run_number,
            subrun_number: record.subrun_number,
            event_number: record.event_number,
            hefty_mode: record.hefty_mode,
            ncv_position: record.ncv_position,
            hefty_trigger_masks: record.hefty_trigger_masks.clone(),
            pulses,
        }
    }
}

/// Run level bookkeeping, written next to the records when the writer is closed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub version: String,
    pub events_read: u64,
    pub events_written: u64,
    pub events_rejected: u64,
    pub pulses_written: u64,
    pub first_event: Option<u32>,
    pub last_event: Option<u32>,
    pub ncv_position: i32,
}

impl Default for RunSummary {
    fn default() -> Self {
        Self {
            version: format!("{}:{}", env!("CARGO_PKG_NAME"), FORMAT_VERSION),
            events_read: 0,
            events_written: 0,
            events_rejected: 0,
            pulses_written: 0,
            first_event: None,
            last_event: None,
            ncv_position: UNKNOWN_NCV_POSITION,
        }
    }
}

/// Writes records as a multi-document YAML stream, one document per event
#[derive(Debug)]
pub struct YamlWriter {
    file_handle: BufWriter<File>,
    summary_path: PathBuf,
    summary: RunSummary,
}

impl YamlWriter {
    /// Create the writer, opening a file at path for the records. The run summary is
    /// written to summary_path on close.
    pub fn new(path: &Path, summary_path: &Path) -> Result<Self, WriterError> {
        let file_handle = BufWriter::new(File::create(path)?);
        Ok(Self {
            file_handle,
            summary_path: summary_path.to_path_buf(),
            summary: RunSummary::default(),
        })
    }
}

impl ReadoutWriter for YamlWriter {
    fn write_record(&mut self, record: &ReadoutRecord) -> Result<(), WriterError> {
        let document = RecordDocument::from(record);
        self.file_handle.write_all(b"---\n")?;
        self.file_handle
            .write_all(serde_yaml::to_string(&document)?.as_bytes())?;

        if self.summary.first_event.is_none() {
            self.summary.first_event = Some(record.event_number);
        }
        self.summary.last_event = Some(record.event_number);
        self.summary.ncv_position = record.ncv_position;
        self.summary.events_read += 1;
        self.summary.events_written += 1;
        self.summary.pulses_written += document.pulses.len() as u64;
        Ok(())
    }

    fn reject_event(&mut self) {
        self.summary.events_read += 1;
        self.summary.events_rejected += 1;
    }

    fn close(mut self) -> Result<RunSummary, WriterError> {
        self.file_handle.flush()?;
        let mut summary_file = File::create(&self.summary_path)?;
        summary_file.write_all(serde_yaml::to_string(&self.summary)?.as_bytes())?;
        spdlog::info!(
            "{} events read, {} written, {} rejected. {} pulses written.",
            self.summary.events_read,
            self.summary.events_written,
            self.summary.events_rejected,
            self.summary.pulses_written
        );
        Ok(self.summary)
    }
}
