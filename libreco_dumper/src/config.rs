use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::ConfigError;

/// Structure representing the application configuration. Contains pathing and run information
/// Configs are seralizable and deserializable to YAML using serde and serde_yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub channel_map_path: PathBuf,
    pub first_run_number: i32,
    pub last_run_number: i32,
    pub n_threads: i32,
}

impl Default for Config {
    /// Generate a new Config object. All fields will be empty/invalid
    fn default() -> Self {
        Self {
            input_path: PathBuf::from("None"),
            output_path: PathBuf::from("None"),
            channel_map_path: PathBuf::from("None"),
            first_run_number: 0,
            last_run_number: 0,
            n_threads: 1,
        }
    }
}

impl Config {
    /// Read the configuration in a YAML file
    /// Returns a Config if successful
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }

        let yaml_str = std::fs::read_to_string(config_path)?;

        Ok(serde_yaml::from_str::<Self>(&yaml_str)?)
    }

    /// Check if a specific run exists by evaluating the existance of its event file
    pub fn does_run_exist(&self, run_number: i32) -> bool {
        self.get_input_file_name(run_number).exists()
    }

    /// Get the path to the event file of a run
    pub fn get_input_file_name(&self, run_number: i32) -> PathBuf {
        self.input_path
            .join(format!("{}.yml", self.get_run_str(run_number)))
    }

    /// Get the path to the output readout file
    pub fn get_output_file_name(&self, run_number: i32) -> Result<PathBuf, ConfigError> {
        self.get_output_path(run_number, "reco")
    }

    /// Get the path to the output run summary file
    pub fn get_summary_file_name(&self, run_number: i32) -> Result<PathBuf, ConfigError> {
        self.get_output_path(run_number, "summary")
    }

    fn get_output_path(&self, run_number: i32, suffix: &str) -> Result<PathBuf, ConfigError> {
        let file_path = self
            .output_path
            .join(format!("{}_{suffix}.yml", self.get_run_str(run_number)));
        if self.output_path.exists() {
            Ok(file_path)
        } else {
            Err(ConfigError::BadFilePath(self.output_path.clone()))
        }
    }

    /// Construct the run string, zero padded to four digits
    fn get_run_str(&self, run_number: i32) -> String {
        format!("run_{run_number:0>4}")
    }

    pub fn is_n_threads_valid(&self) -> bool {
        self.n_threads >= 1
    }
}
