use std::sync::mpsc::Sender;

use super::channel_map::ChannelMap;
use super::config::Config;
use super::error::{EventFileError, ProcessorError};
use super::event_file::EventFile;
use super::readout_builder::ReadoutBuilder;
use super::readout_writer::{ReadoutWriter, RunSummary, YamlWriter};
use super::worker_status::WorkerStatus;

/// Build and write the records of every event in an event file.
///
/// Rejected events are logged and skipped; only IO failures abort the run. The
/// `report` callback is handed the fraction of events processed so far.
pub fn process_events<W: ReadoutWriter>(
    event_file: &EventFile,
    channel_map: &ChannelMap,
    mut writer: W,
    mut report: impl FnMut(f32, u64) -> Result<(), ProcessorError>,
) -> Result<RunSummary, ProcessorError> {
    let builder = ReadoutBuilder::new(channel_map);
    if event_file.is_empty() {
        spdlog::warn!("Event file {:?} holds no events", event_file.get_filename());
    }
    let total_events = event_file.len().max(1);
    let flush_frac: f32 = 0.01;
    let flush_val = ((total_events as f32 * flush_frac) as usize).max(1);
    let mut rejected: u64 = 0;

    for (idx, event) in event_file.events().enumerate() {
        match event {
            Ok(event) => match builder.build(&event) {
                Ok(record) => writer.write_record(&record)?,
                Err(e) => {
                    spdlog::warn!("Rejected event at position {idx}: {e}");
                    writer.reject_event();
                    rejected += 1;
                }
            },
            Err(EventFileError::Unreadable(parsed, e)) => {
                spdlog::error!(
                    "Event file {:?} is unreadable after {parsed} events, the rest of the file is skipped: {e}",
                    event_file.get_filename()
                );
                writer.reject_event();
                rejected += 1;
            }
            Err(e) => {
                spdlog::warn!("Could not read event at position {idx}: {e}");
                writer.reject_event();
                rejected += 1;
            }
        }

        if (idx + 1) % flush_val == 0 {
            report((idx + 1) as f32 / total_events as f32, rejected)?;
        }
    }

    Ok(writer.close()?)
}

/// The main loop of the dumper for a single run.
///
/// Reads the run's events, builds a record for each, and writes them out.
pub fn process_run(
    config: &Config,
    channel_map: &ChannelMap,
    run_number: i32,
    tx: &Sender<WorkerStatus>,
    worker_id: &usize,
) -> Result<RunSummary, ProcessorError> {
    let event_file = EventFile::new(&config.get_input_file_name(run_number))?;
    spdlog::info!(
        "Reading {:?}, total run size: {}, {} events",
        event_file.get_filename(),
        human_bytes::human_bytes(event_file.get_size_bytes() as f64),
        event_file.len()
    );

    let writer = YamlWriter::new(
        &config.get_output_file_name(run_number)?,
        &config.get_summary_file_name(run_number)?,
    )?;

    tx.send(WorkerStatus::new(0.0, run_number, *worker_id, 0))?;
    let summary = process_events(&event_file, channel_map, writer, |progress, rejected| {
        tx.send(WorkerStatus::new(
            progress,
            run_number,
            *worker_id,
            rejected,
        ))?;
        Ok(())
    })?;
    tx.send(WorkerStatus::new(
        1.0,
        run_number,
        *worker_id,
        summary.events_rejected,
    ))?;

    if summary.events_rejected > 0 {
        spdlog::warn!(
            "Run {} had {} rejected events; see the log for details",
            run_number,
            summary.events_rejected
        );
    }
    Ok(summary)
}

/// Process a subset of runs
pub fn process_subset(
    config: Config,
    tx: Sender<WorkerStatus>,
    worker_id: usize,
    subset: Vec<i32>,
) -> Result<(), ProcessorError> {
    let channel_map = ChannelMap::new(&config.channel_map_path)?;
    for run in subset {
        if config.does_run_exist(run) {
            spdlog::info!("Processing run {}...", run);
            process_run(&config, &channel_map, run, &tx, &worker_id)?;
            spdlog::info!("Finished processing run {}.", run);
        } else {
            spdlog::info!("Run {} does not exist, skipping...", run);
        }
    }
    Ok(())
}

/// Divide a run range in to a set of subranges (per thread/worker)
pub fn create_subsets(config: &Config) -> Vec<Vec<i32>> {
    let mut subsets: Vec<Vec<i32>> = vec![Vec::new(); config.n_threads.max(1) as usize];
    let n_subsets = subsets.len();

    for (idx, run) in (config.first_run_number..(config.last_run_number + 1)).enumerate() {
        subsets[idx % n_subsets].push(run)
    }

    subsets
}
