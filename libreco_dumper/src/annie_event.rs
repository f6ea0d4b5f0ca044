use serde::Deserialize;
use std::collections::BTreeMap;

use super::error::DumperError;
use super::hardware_id::ChannelKey;
use super::minibuffer::{BeamStatus, HeftyInfo, MinibufferLabel, MinibufferTiming};
use super::pulse::AdcPulse;

pub const MINIBUFFER_LABELS: &str = "MinibufferLabels";
pub const HEFTY_INFO: &str = "HeftyInfo";
pub const MINIBUFFER_TIMESTAMPS: &str = "MinibufferTimestamps";
pub const BEAM_STATUSES: &str = "BeamStatuses";
pub const RUN_NUMBER: &str = "RunNumber";
pub const SUBRUN_NUMBER: &str = "SubRunNumber";
pub const EVENT_NUMBER: &str = "EventNumber";
pub const RECO_ADC_HITS: &str = "RecoADCHits";

/// Reconstructed pulses of one channel: one list of pulses per minibuffer
pub type MinibufferPulses = Vec<Vec<AdcPulse>>;

/// The per-event store handed to the dumper.
///
/// Every entry is optional; whether an entry is required depends on the acquisition mode.
/// Use the `get_*` methods, which report absent and empty entries as distinct errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnieEvent {
    #[serde(rename = "MinibufferLabels")]
    pub minibuffer_labels: Option<Vec<MinibufferLabel>>,
    #[serde(rename = "HeftyInfo")]
    pub hefty_info: Option<HeftyInfo>,
    #[serde(rename = "MinibufferTimestamps")]
    pub minibuffer_timestamps: Option<Vec<u64>>,
    #[serde(rename = "BeamStatuses")]
    pub beam_statuses: Option<Vec<BeamStatus>>,
    #[serde(rename = "RunNumber")]
    pub run_number: Option<u32>,
    #[serde(rename = "SubRunNumber")]
    pub subrun_number: Option<u32>,
    #[serde(rename = "EventNumber")]
    pub event_number: Option<u32>,
    #[serde(rename = "RecoADCHits")]
    pub reco_adc_hits: Option<BTreeMap<ChannelKey, MinibufferPulses>>,
}

trait Collection {
    fn is_empty_collection(&self) -> bool;
}

impl<T> Collection for Vec<T> {
    fn is_empty_collection(&self) -> bool {
        self.is_empty()
    }
}

impl<K, V> Collection for BTreeMap<K, V> {
    fn is_empty_collection(&self) -> bool {
        self.is_empty()
    }
}

fn get_object<'a, T>(label: &'static str, obj: Option<&'a T>) -> Result<&'a T, DumperError> {
    obj.ok_or(DumperError::MissingRequiredInput(label))
}

fn get_non_empty<'a, T: Collection>(
    label: &'static str,
    obj: Option<&'a T>,
) -> Result<&'a T, DumperError> {
    let obj = get_object(label, obj)?;
    if obj.is_empty_collection() {
        Err(DumperError::EmptyRequiredCollection(label))
    } else {
        Ok(obj)
    }
}

impl AnnieEvent {
    pub fn has_hefty_info(&self) -> bool {
        self.hefty_info.is_some()
    }

    pub fn get_minibuffer_labels(&self) -> Result<&[MinibufferLabel], DumperError> {
        get_non_empty(MINIBUFFER_LABELS, self.minibuffer_labels.as_ref()).map(|v| v.as_slice())
    }

    /// Pick the timing source of the event. The presence of HeftyInfo decides the mode;
    /// without it the minibuffer timestamps are required.
    pub fn get_minibuffer_timing(&self) -> Result<MinibufferTiming<'_>, DumperError> {
        if let Some(info) = self.hefty_info.as_ref() {
            return Ok(MinibufferTiming::Hefty(info));
        }
        let stamps = get_object(MINIBUFFER_TIMESTAMPS, self.minibuffer_timestamps.as_ref())?;
        if stamps.is_empty() {
            return Err(DumperError::EmptyTimestampData);
        }
        Ok(MinibufferTiming::Timestamps(stamps))
    }

    pub fn get_beam_statuses(&self) -> Result<&[BeamStatus], DumperError> {
        get_non_empty(BEAM_STATUSES, self.beam_statuses.as_ref()).map(|v| v.as_slice())
    }

    pub fn get_run_number(&self) -> Result<u32, DumperError> {
        get_object(RUN_NUMBER, self.run_number.as_ref()).copied()
    }

    pub fn get_subrun_number(&self) -> Result<u32, DumperError> {
        get_object(SUBRUN_NUMBER, self.subrun_number.as_ref()).copied()
    }

    pub fn get_event_number(&self) -> Result<u32, DumperError> {
        get_object(EVENT_NUMBER, self.event_number.as_ref()).copied()
    }

    pub fn get_reco_adc_hits(
        &self,
    ) -> Result<&BTreeMap<ChannelKey, MinibufferPulses>, DumperError> {
        get_non_empty(RECO_ADC_HITS, self.reco_adc_hits.as_ref())
    }
}
