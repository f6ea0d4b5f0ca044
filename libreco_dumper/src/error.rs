use std::path::PathBuf;
use thiserror::Error;

use super::worker_status::WorkerStatus;

/// Errors which reject a single event. None of these are fatal to the run; the event is
/// dropped and processing continues with the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DumperError {
    #[error("Found an empty HeftyInfo entry; Hefty mode events need at least one minibuffer")]
    EmptyHeftyData,
    #[error("Found an empty MinibufferTimestamps entry")]
    EmptyTimestampData,
    #[error("Could not find the {0} entry in the event store")]
    MissingRequiredInput(&'static str),
    #[error("Found an empty {0} entry in the event store")]
    EmptyRequiredCollection(&'static str),
    #[error("Detector element {0} has no entry in the card/channel map")]
    UnknownChannelMapping(u32),
    #[error("The {collection} entry covers {found} minibuffers but {needed} are required")]
    MinibufferCountMismatch {
        collection: String,
        found: usize,
        needed: usize,
    },
}

#[derive(Debug, Error)]
pub enum HeftyInfoError {
    #[error("HeftyInfo has mismatched per-minibuffer lengths -- time: {0}, label: {1}, t_since_beam: {2}")]
    MismatchedLengths(usize, usize, usize),
}

#[derive(Debug, Error)]
pub enum ChannelKeyError {
    #[error("Found invalid subdetector keyword: {0}")]
    InvalidSubdetector(String),
    #[error("Channel key {0} is not of the form SUBDETECTOR:INDEX")]
    BadFormat(String),
    #[error("Channel key failed to parse an integer: {0}")]
    ParsingError(#[from] std::num::ParseIntError),
}

#[derive(Debug, Error)]
pub enum ChannelMapError {
    #[error("ChannelMap failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("ChannelMap failed to parse an integer: {0}")]
    ParsingError(#[from] std::num::ParseIntError),
    #[error("ChannelMap was given a file with the incorrect format; most likely the number of columns is incorrect")]
    BadFileFormat,
    #[error("ChannelMap found detector element {0} more than once")]
    DuplicateElement(u32),
    #[error("ChannelMap found card {0} channel {1} more than once")]
    DuplicateCardChannel(u32, u32),
}

#[derive(Debug, Error)]
pub enum EventFileError {
    #[error("Could not open event file because file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Event file failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Event file failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Event file is unreadable after document {0}: {1}")]
    Unreadable(usize, String),
}

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("ReadoutWriter failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("ReadoutWriter failed to convert to yaml: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to EventFile error: {0}")]
    EventFileError(#[from] EventFileError),
    #[error("Processor failed due to ReadoutWriter error: {0}")]
    WriterError(#[from] WriterError),
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to ChannelMap error: {0}")]
    MapError(#[from] ChannelMapError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
}
