use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::annie_event::AnnieEvent;
use super::error::EventFileError;

/// The events of one run, stored as a multi-document YAML stream with one AnnieEvent per
/// document.
///
/// The stream is split into documents once when the file is opened. A syntax error ends
/// the stream: everything up to it is kept, the rest of the file is unreadable.
#[derive(Debug)]
pub struct EventFile {
    path: PathBuf,
    documents: Vec<serde_yaml::Value>,
    stream_error: Option<String>,
    size_bytes: u64,
}

impl EventFile {
    /// Open and read an event file
    pub fn new(path: &Path) -> Result<Self, EventFileError> {
        if !path.exists() {
            return Err(EventFileError::BadFilePath(path.to_path_buf()));
        }
        let size_bytes = path.metadata()?.len();
        let contents = std::fs::read_to_string(path)?;

        let mut documents = Vec::new();
        let mut stream_error = None;
        for document in serde_yaml::Deserializer::from_str(&contents) {
            // Any YAML parses into a Value, so a failure here is a syntax error. The
            // deserializer would keep returning it, so stop.
            match serde_yaml::Value::deserialize(document) {
                Ok(value) => documents.push(value),
                Err(e) => {
                    stream_error = Some(e.to_string());
                    break;
                }
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
            documents,
            stream_error,
            size_bytes,
        })
    }

    /// Iterate over the events in the file.
    ///
    /// A document which does not describe an event only produces an error for that event.
    /// A syntax error produces one final error, after the documents before it.
    pub fn events(&self) -> impl Iterator<Item = Result<AnnieEvent, EventFileError>> + '_ {
        let parsed = self.documents.len();
        self.documents
            .iter()
            .map(|value| {
                serde_yaml::from_value::<AnnieEvent>(value.clone()).map_err(EventFileError::from)
            })
            .chain(
                self.stream_error
                    .iter()
                    .map(move |e| Err(EventFileError::Unreadable(parsed, e.clone()))),
            )
    }

    /// Number of items `events` yields
    pub fn len(&self) -> usize {
        self.documents.len() + usize::from(self.stream_error.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_filename(&self) -> &Path {
        &self.path
    }

    pub fn get_size_bytes(&self) -> u64 {
        self.size_bytes
    }
}
