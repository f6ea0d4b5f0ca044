use super::error::ChannelKeyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subdetector {
    Adc,
    Tdc,
    Lappd,
}

impl FromStr for Subdetector {
    type Err = ChannelKeyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "ADC" {
            Ok(Self::Adc)
        } else if s == "TDC" {
            Ok(Self::Tdc)
        } else if s == "LAPPD" {
            Ok(Self::Lappd)
        } else {
            Err(ChannelKeyError::InvalidSubdetector(s.to_string()))
        }
    }
}

impl fmt::Display for Subdetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Adc => write!(f, "ADC"),
            Self::Tdc => write!(f, "TDC"),
            Self::Lappd => write!(f, "LAPPD"),
        }
    }
}

/// Identifies a physical detector element (PMT, paddle, ...) independent of the
/// electronics it is read out by.
///
/// Serialized as `SUBDETECTOR:INDEX`, e.g. `ADC:12`, so that it can be used as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelKey {
    pub subdetector: Subdetector,
    pub detector_element_index: u32,
}

impl ChannelKey {
    pub fn new(subdetector: Subdetector, detector_element_index: u32) -> Self {
        Self {
            subdetector,
            detector_element_index,
        }
    }

    pub fn adc(detector_element_index: u32) -> Self {
        Self::new(Subdetector::Adc, detector_element_index)
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subdetector, self.detector_element_index)
    }
}

impl FromStr for ChannelKey {
    type Err = ChannelKeyError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((det, index)) => Ok(Self::new(det.parse()?, index.parse()?)),
            None => Err(ChannelKeyError::BadFormat(s.to_string())),
        }
    }
}

impl TryFrom<String> for ChannelKey {
    type Error = ChannelKeyError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelKey> for String {
    fn from(value: ChannelKey) -> Self {
        value.to_string()
    }
}

/// Electronics address of a channel: digitizer card and channel on that card
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CardChannel {
    pub card: u32,
    pub channel: u32,
}

impl CardChannel {
    pub fn new(card: u32, channel: u32) -> Self {
        Self { card, channel }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_key_text() {
        let key: ChannelKey = "ADC:42".parse().unwrap();
        assert_eq!(key, ChannelKey::adc(42));
        assert_eq!(key.to_string(), "ADC:42");
        let key: ChannelKey = "LAPPD:3".parse().unwrap();
        assert_eq!(key.subdetector, Subdetector::Lappd);
        assert!("ADC42".parse::<ChannelKey>().is_err());
        assert!("PMT:4".parse::<ChannelKey>().is_err());
        assert!("ADC:x".parse::<ChannelKey>().is_err());
    }

    #[test]
    fn test_channel_key_order() {
        // Ordered by subdetector first, then index
        assert!(ChannelKey::adc(100) < ChannelKey::new(Subdetector::Tdc, 1));
        assert!(ChannelKey::adc(1) < ChannelKey::adc(2));
    }
}
