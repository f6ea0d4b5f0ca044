// Detector element index <-> (card, channel) lookup. The table is a bijection: every
// detector element is read out by exactly one card channel and vice versa. Loaded once at
// startup and then only ever read, so workers share it by reference.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use fxhash::FxHashMap;

use super::error::{ChannelMapError, DumperError};
use super::hardware_id::CardChannel;

const ENTRIES_PER_LINE: usize = 3; //Number of elements in a single row in the CSV file

/// ChannelMap contains the mapping of detector element indices (PMT IDs) to the digitizer
/// card and channel which reads them out.
///
/// The map is read from a CSV file where each row contains 3 elements: detector element
/// index, card, channel. The first line is a header and is skipped.
#[derive(Debug, Clone, Default)]
pub struct ChannelMap {
    element_to_card: FxHashMap<u32, CardChannel>,
    card_to_element: FxHashMap<CardChannel, u32>,
}

impl ChannelMap {
    /// Create a new ChannelMap from a CSV file
    pub fn new(path: &Path) -> Result<Self, ChannelMapError> {
        let mut contents = String::new();
        let mut file = File::open(path)?;
        file.read_to_string(&mut contents)?;
        Self::from_csv_str(&contents)
    }

    /// Create a new ChannelMap from the contents of a CSV file
    pub fn from_csv_str(contents: &str) -> Result<Self, ChannelMapError> {
        let mut map = ChannelMap::default();

        let mut lines = contents.lines();
        lines.next(); // Skip the header
        for line in lines.filter(|l| !l.is_empty()) {
            let entries: Vec<&str> = line.split_terminator(",").collect();
            if entries.len() != ENTRIES_PER_LINE {
                return Err(ChannelMapError::BadFileFormat);
            }

            let element: u32 = entries[0].parse()?;
            let address = CardChannel::new(entries[1].parse()?, entries[2].parse()?);
            map.insert(element, address)?;
        }

        Ok(map)
    }

    /// Add an entry, rejecting anything that would break the one-to-one mapping
    pub fn insert(&mut self, element: u32, address: CardChannel) -> Result<(), ChannelMapError> {
        if self.element_to_card.contains_key(&element) {
            return Err(ChannelMapError::DuplicateElement(element));
        }
        if self.card_to_element.contains_key(&address) {
            return Err(ChannelMapError::DuplicateCardChannel(
                address.card,
                address.channel,
            ));
        }
        self.element_to_card.insert(element, address);
        self.card_to_element.insert(address, element);
        Ok(())
    }

    /// Get the card and channel reading out a detector element.
    ///
    /// If returns None the element does not exist in the map
    pub fn get_card_channel(&self, element: u32) -> Option<&CardChannel> {
        self.element_to_card.get(&element)
    }

    /// Same as [`ChannelMap::get_card_channel`] but failing the event when the element is unknown
    pub fn require_card_channel(&self, element: u32) -> Result<CardChannel, DumperError> {
        self.get_card_channel(element)
            .copied()
            .ok_or(DumperError::UnknownChannelMapping(element))
    }

    /// Get the detector element read out by a card and channel
    pub fn get_detector_element(&self, card: u32, channel: u32) -> Option<u32> {
        self.card_to_element
            .get(&CardChannel::new(card, channel))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.element_to_card.len()
    }

    pub fn is_empty(&self) -> bool {
        self.element_to_card.is_empty()
    }
}
