use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::hardware_id::CardChannel;

/// A pulse found by the ADC hit reconstruction. Times are relative to the start of the
/// minibuffer the pulse was found in.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AdcPulse {
    pub start_time_ns: u64,
    #[serde(default)]
    pub peak_time_ns: u64,
    pub baseline: f64,
    pub sigma_baseline: f64,
    pub raw_area: f64,
    pub raw_amplitude: u16,
    pub amplitude: f64,
    pub charge: f64,
}

/// A pulse as stored in the output readout, with its time corrected
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecoPulse {
    pub start_time_ns: u64,
    pub peak_time_ns: u64,
    pub baseline: f64,
    pub sigma_baseline: f64,
    pub raw_area: f64,
    pub raw_amplitude: u16,
    pub amplitude: f64,
    pub charge: f64,
}

impl RecoPulse {
    /// Make the output pulse for an input pulse at a corrected start time.
    ///
    /// The peak time is not propagated and is always 0.
    pub fn from_adc_pulse(pulse: &AdcPulse, start_time_ns: u64) -> Self {
        Self {
            start_time_ns,
            peak_time_ns: 0,
            baseline: pulse.baseline,
            sigma_baseline: pulse.sigma_baseline,
            raw_area: pulse.raw_area,
            raw_amplitude: pulse.raw_amplitude,
            amplitude: pulse.amplitude,
            charge: pulse.charge,
        }
    }
}

/// Where a pulse lives in the readout: card, channel and minibuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PulseAddress {
    pub card: u32,
    pub channel: u32,
    pub minibuffer: usize,
}

impl PulseAddress {
    pub fn new(address: CardChannel, minibuffer: usize) -> Self {
        Self {
            card: address.card,
            channel: address.channel,
            minibuffer,
        }
    }
}

/// All of the reconstructed pulses of one event, keyed by card, channel and minibuffer
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecoReadout {
    pub event_number: u32,
    pulses: BTreeMap<PulseAddress, Vec<RecoPulse>>,
}

impl RecoReadout {
    pub fn new(event_number: u32) -> Self {
        Self {
            event_number,
            pulses: BTreeMap::new(),
        }
    }

    pub fn add_pulse(&mut self, address: CardChannel, minibuffer: usize, pulse: RecoPulse) {
        self.pulses
            .entry(PulseAddress::new(address, minibuffer))
            .or_default()
            .push(pulse);
    }

    /// Pulses for a card, channel and minibuffer, in the order they were added
    pub fn get_pulses(&self, card: u32, channel: u32, minibuffer: usize) -> &[RecoPulse] {
        let address = PulseAddress {
            card,
            channel,
            minibuffer,
        };
        self.pulses
            .get(&address)
            .map(|p| p.as_slice())
            .unwrap_or_default()
    }

    /// Iterate over every pulse in address order
    pub fn iter(&self) -> impl Iterator<Item = (&PulseAddress, &RecoPulse)> {
        self.pulses
            .iter()
            .flat_map(|(address, pulses)| pulses.iter().map(move |p| (address, p)))
    }

    pub fn total_pulses(&self) -> usize {
        self.pulses.values().map(|p| p.len()).sum()
    }
}

/// The output record of one event: the readout plus its run metadata
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadoutRecord {
    pub reco_readout: RecoReadout,
    pub run_number: u32,
    pub subrun_number: u32,
    pub event_number: u32,
    pub hefty_mode: bool,
    pub ncv_position: i32,
    /// Hefty trigger mask per minibuffer index, vetoed ones included (0 outside of Hefty
    /// mode)
    pub hefty_trigger_masks: Vec<i32>,
}
