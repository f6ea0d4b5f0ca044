use serde::{Deserialize, Deserializer, Serialize};

use super::error::{DumperError, HeftyInfoError};

/// The kind of data recorded in a minibuffer, as assigned by the raw loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MinibufferLabel {
    #[default]
    Unknown,
    Beam,
    Source,
    Cosmic,
    #[serde(rename = "LED")]
    Led,
    Hefty,
}

impl MinibufferLabel {
    /// Beam spills and source triggers anchor the timing of the Hefty window that follows them
    pub fn is_trigger_anchor(&self) -> bool {
        matches!(self, Self::Beam | Self::Source)
    }

    /// Minibuffers belonging to the beam "macroevent". These are the only ones the beam
    /// quality veto can suppress.
    pub fn is_beam_macroevent(&self) -> bool {
        matches!(self, Self::Beam | Self::Hefty)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeamCondition {
    Ok,
    Bad,
    Missing,
}

impl BeamCondition {
    pub fn is_bad_or_missing(&self) -> bool {
        matches!(self, Self::Bad | Self::Missing)
    }
}

/// Beam quality information for a single minibuffer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamStatus {
    pub condition: BeamCondition,
    #[serde(default)]
    pub pot: f64,
}

impl BeamStatus {
    pub fn new(condition: BeamCondition) -> Self {
        Self { condition, pot: 0.0 }
    }

    pub fn condition(&self) -> BeamCondition {
        self.condition
    }
}

#[derive(Debug, Clone, Deserialize)]
struct HeftyInfoRecord {
    time: Vec<u64>,
    label: Vec<i32>,
    t_since_beam: Vec<i64>,
    #[serde(default)]
    more: bool,
}

/// Per-minibuffer timing and trigger information recorded in Hefty mode.
///
/// The three per-minibuffer sequences always have the same length; deserialization
/// fails otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeftyInfo {
    time: Vec<u64>,
    label: Vec<i32>,
    t_since_beam: Vec<i64>,
    more: bool,
}

impl<'de> Deserialize<'de> for HeftyInfo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = HeftyInfoRecord::deserialize(deserializer)?;
        Self::new(record.time, record.label, record.t_since_beam, record.more)
            .map_err(serde::de::Error::custom)
    }
}

impl HeftyInfo {
    pub fn new(
        time: Vec<u64>,
        label: Vec<i32>,
        t_since_beam: Vec<i64>,
        more: bool,
    ) -> Result<Self, HeftyInfoError> {
        if time.len() != label.len() || time.len() != t_since_beam.len() {
            return Err(HeftyInfoError::MismatchedLengths(
                time.len(),
                label.len(),
                t_since_beam.len(),
            ));
        }
        Ok(Self {
            time,
            label,
            t_since_beam,
            more,
        })
    }

    pub fn num_minibuffers(&self) -> usize {
        self.time.len()
    }

    /// True when the readout ended with extra Hefty window self-triggers that could not
    /// be recorded
    pub fn more(&self) -> bool {
        self.more
    }

    /// Trigger mask of a minibuffer. Out of range indices give 0.
    pub fn label(&self, minibuffer: usize) -> i32 {
        self.label.get(minibuffer).copied().unwrap_or(0)
    }

    /// Time in ns since the most recent beam spill or source trigger. Out of range
    /// indices give 0.
    pub fn t_since_beam(&self, minibuffer: usize) -> i64 {
        self.t_since_beam.get(minibuffer).copied().unwrap_or(0)
    }
}

/// The source of minibuffer timing for an event. Hefty and non-Hefty acquisition are
/// mutually exclusive, so an event carries exactly one of these.
#[derive(Debug, Clone, Copy)]
pub enum MinibufferTiming<'a> {
    Hefty(&'a HeftyInfo),
    Timestamps(&'a [u64]),
}

impl MinibufferTiming<'_> {
    pub fn is_hefty(&self) -> bool {
        matches!(self, Self::Hefty(_))
    }

    /// Resolve how many minibuffers of the event should be processed.
    ///
    /// In Hefty mode, when the readout is flagged with `more`, the last beam or source
    /// minibuffer and everything after it are dropped since its Hefty window is
    /// incomplete.
    pub fn resolve_minibuffer_count(
        &self,
        labels: &[MinibufferLabel],
    ) -> Result<usize, DumperError> {
        match self {
            Self::Hefty(info) => {
                let count = info.num_minibuffers();
                if count == 0 {
                    return Err(DumperError::EmptyHeftyData);
                }
                if !info.more() {
                    return Ok(count);
                }
                if labels.len() < count {
                    return Err(DumperError::MinibufferCountMismatch {
                        collection: String::from("MinibufferLabels"),
                        found: labels.len(),
                        needed: count,
                    });
                }
                // Index 0 is never inspected; if nothing is found no minibuffer is processed
                Ok((1..count)
                    .rev()
                    .find(|mb| labels[*mb].is_trigger_anchor())
                    .unwrap_or(0))
            }
            Self::Timestamps(stamps) => {
                if stamps.is_empty() {
                    Err(DumperError::EmptyTimestampData)
                } else {
                    Ok(stamps.len())
                }
            }
        }
    }

    /// Hefty trigger mask of a minibuffer; always 0 outside of Hefty mode
    pub fn trigger_mask(&self, minibuffer: usize) -> i32 {
        match self {
            Self::Hefty(info) => info.label(minibuffer),
            Self::Timestamps(_) => 0,
        }
    }

    /// Resolve the time of a pulse from its time relative to the start of its minibuffer.
    ///
    /// Only Hefty window minibuffers in Hefty mode are shifted (by the time since the
    /// beam or source trigger). Every other pulse keeps its minibuffer relative time and
    /// so cannot be compared across minibuffers.
    pub fn resolve_pulse_time(
        &self,
        label: MinibufferLabel,
        minibuffer: usize,
        raw_start_time_ns: u64,
    ) -> u64 {
        match self {
            Self::Hefty(info) if label == MinibufferLabel::Hefty => {
                raw_start_time_ns.saturating_add_signed(info.t_since_beam(minibuffer))
            }
            _ => raw_start_time_ns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minibuffer::MinibufferLabel::*;

    fn hefty(t_since_beam: Vec<i64>, more: bool) -> HeftyInfo {
        let n = t_since_beam.len();
        HeftyInfo::new(vec![0; n], (0..n as i32).collect(), t_since_beam, more).unwrap()
    }

    #[test]
    fn test_non_hefty_time_is_identity() {
        let stamps = [100, 200, 300];
        let timing = MinibufferTiming::Timestamps(&stamps);
        for label in [Unknown, Beam, Source, Cosmic, Led, Hefty] {
            for mb in 0..3 {
                assert_eq!(timing.resolve_pulse_time(label, mb, 1234), 1234);
            }
        }
    }

    #[test]
    fn test_hefty_window_time_offset() {
        let info = hefty(vec![0, 5_000, 12_000, -40], false);
        let timing = MinibufferTiming::Hefty(&info);
        assert_eq!(timing.resolve_pulse_time(Hefty, 1, 80), 5_080);
        assert_eq!(timing.resolve_pulse_time(Hefty, 2, 80), 12_080);
        assert_eq!(timing.resolve_pulse_time(Hefty, 3, 80), 40);
        for label in [Unknown, Beam, Source, Cosmic, Led] {
            for mb in 0..4 {
                assert_eq!(timing.resolve_pulse_time(label, mb, 80), 80);
            }
        }
    }

    #[test]
    fn test_hefty_time_saturates() {
        let info = hefty(vec![-1_000], false);
        let timing = MinibufferTiming::Hefty(&info);
        assert_eq!(timing.resolve_pulse_time(Hefty, 0, 10), 0);
    }

    #[test]
    fn test_hefty_count() {
        let info = hefty(vec![0; 4], false);
        let labels = [Beam, Hefty, Hefty, Cosmic];
        let timing = MinibufferTiming::Hefty(&info);
        assert_eq!(timing.resolve_minibuffer_count(&labels), Ok(4));
    }

    #[test]
    fn test_hefty_truncation() {
        let info = hefty(vec![0; 4], true);
        let labels = [Beam, Hefty, Hefty, Cosmic];
        let timing = MinibufferTiming::Hefty(&info);
        assert_eq!(timing.resolve_minibuffer_count(&labels), Ok(0));

        let info = hefty(vec![0; 6], true);
        let labels = [Beam, Hefty, Cosmic, Source, Hefty, Hefty];
        let timing = MinibufferTiming::Hefty(&info);
        assert_eq!(timing.resolve_minibuffer_count(&labels), Ok(3));
    }

    #[test]
    fn test_empty_hefty() {
        let info = HeftyInfo::default();
        let timing = MinibufferTiming::Hefty(&info);
        assert_eq!(
            timing.resolve_minibuffer_count(&[Beam]),
            Err(DumperError::EmptyHeftyData)
        );
    }

    #[test]
    fn test_timestamp_count() {
        let stamps = [10, 20];
        assert_eq!(
            MinibufferTiming::Timestamps(&stamps).resolve_minibuffer_count(&[Beam, Beam]),
            Ok(2)
        );
        assert_eq!(
            MinibufferTiming::Timestamps(&[]).resolve_minibuffer_count(&[Beam]),
            Err(DumperError::EmptyTimestampData)
        );
    }

    #[test]
    fn test_trigger_mask() {
        let info = hefty(vec![0; 3], false);
        assert_eq!(MinibufferTiming::Hefty(&info).trigger_mask(2), 2);
        assert_eq!(MinibufferTiming::Timestamps(&[1, 2, 3]).trigger_mask(2), 0);
    }

    #[test]
    fn test_hefty_info_lengths() {
        assert!(HeftyInfo::new(vec![0, 1], vec![0], vec![0, 0], false).is_err());
        let yaml = "time: [1, 2]\nlabel: [4]\nt_since_beam: [0, 0]\n";
        assert!(serde_yaml::from_str::<HeftyInfo>(yaml).is_err());
        let yaml = "time: [1, 2]\nlabel: [4, 8]\nt_since_beam: [0, 300]\nmore: true\n";
        let info = serde_yaml::from_str::<HeftyInfo>(yaml).unwrap();
        assert_eq!(info.num_minibuffers(), 2);
        assert_eq!(info.t_since_beam(1), 300);
        assert!(info.more());
    }
}
