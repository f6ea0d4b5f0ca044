//! # reco_dumper
//!
//! reco_dumper is the ANNIE reco readout dumper, written in Rust. It takes the contents of
//! the ANNIE event store after ADC hit reconstruction (minibuffer labels, beam statuses,
//! Hefty mode timing or minibuffer timestamps, and reconstructed ADC pulses) and reduces
//! each event to a single readout record, with beam quality cuts applied and pulse times
//! corrected.
//!
//! ## Building & Install
//!
//! To build and install the CLI use `cargo install --path ./reco_dumper_cli` from the top
//! level repository. The binary will be installed to your cargo install location
//! (typically something like `~/.cargo/bin/`).
//!
//! ## Configuration
//!
//! The YAML format of a configuration file is as follows:
//!
//! ```yml
//! input_path: None
//! output_path: None
//! channel_map_path: None
//! first_run_number: 0
//! last_run_number: 0
//! n_threads: 1
//! ```
//!
//! - input_path: directory containing the event files, one per run, named `run_####.yml`
//! - output_path: directory to which the records and run summaries are written
//! - channel_map_path: CSV file mapping detector elements to digitizer cards and channels
//! - first_run_number/last_run_number: the run range (inclusive)
//! - n_threads: number of worker threads the run range is divided amongst. Must be at
//! least 1.
//!
//! ### Channel Map Format
//!
//! The channel map is a CSV file with *no* whitespaces and a header line. The columns are:
//!
//! ```csv
//! detector_element_index,card,channel
//! ```
//!
//! Every detector element must map to exactly one card and channel and vice versa.
//!
//! ## Processing
//!
//! For every event:
//!
//! - The acquisition mode is Hefty if the event has a `HeftyInfo` entry, otherwise the
//! `MinibufferTimestamps` are used.
//! - In Hefty mode, if the readout was flagged with `more`, the last beam or source
//! minibuffer and everything after it are dropped since that Hefty window is incomplete.
//! - A bad or missing beam status activates the beam quality veto, which stays active
//! until a minibuffer with good beam status is seen. While active, beam and Hefty window
//! minibuffers are skipped.
//! - In Hefty mode, pulses in Hefty window minibuffers are shifted by the time since the
//! beam (or source) trigger. All other pulse times are relative to the start of their
//! minibuffer.
//!
//! Events missing required entries, or with pulses on channels absent from the channel
//! map, are rejected as a whole and logged. Processing continues with the next event.
//! A YAML syntax error in an event file ends that file: the events before it are kept,
//! the error counts as one rejected event.
//!
//! ## Output
//!
//! For each run two files are written: `run_####_reco.yml`, a YAML stream with one
//! document per accepted event, and `run_####_summary.yml` with the run bookkeeping.
//!
//! ```text
//! run_0640_reco.yml
//! --- run_number, subrun_number, event_number, hefty_mode, ncv_position, hefty_trigger_masks
//! |---- pulses - card, channel, minibuffer, start_time_ns, peak_time_ns, baseline,
//! |              sigma_baseline, raw_area, raw_amplitude, amplitude, charge
//! run_0640_summary.yml - version, events_read, events_written, events_rejected,
//!                        pulses_written, first_event, last_event, ncv_position
//! ```
pub mod annie_event;
pub mod beam_veto;
pub mod channel_map;
pub mod config;
pub mod error;
pub mod event_file;
pub mod hardware_id;
pub mod minibuffer;
pub mod ncv_position;
pub mod process;
pub mod pulse;
pub mod readout_builder;
pub mod readout_writer;
pub mod worker_status;
