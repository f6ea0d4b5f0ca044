use super::annie_event::{
    AnnieEvent, BEAM_STATUSES, HEFTY_INFO, MINIBUFFER_LABELS, MINIBUFFER_TIMESTAMPS,
    RECO_ADC_HITS,
};
use super::beam_veto::{veto_decisions, VetoDecision};
use super::channel_map::ChannelMap;
use super::error::DumperError;
use super::minibuffer::{BeamStatus, MinibufferLabel, MinibufferTiming};
use super::ncv_position::get_ncv_position;
use super::pulse::{ReadoutRecord, RecoPulse, RecoReadout};

/// Everything the builder needs to know about one minibuffer of an event, resolved once
/// per event and shared by all channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinibufferStep {
    pub label: MinibufferLabel,
    pub trigger_mask: i32,
    pub decision: VetoDecision,
}

/// Resolve label, trigger mask and veto decision for minibuffers `0..num_minibuffers`,
/// in order. The labels and beam statuses must cover `num_minibuffers`.
pub fn plan_minibuffers(
    timing: &MinibufferTiming<'_>,
    labels: &[MinibufferLabel],
    beam_statuses: &[BeamStatus],
    num_minibuffers: usize,
) -> Vec<MinibufferStep> {
    let decisions = veto_decisions(
        beam_statuses
            .iter()
            .zip(labels)
            .take(num_minibuffers)
            .map(|(status, label)| (status.condition(), *label)),
    );
    decisions
        .into_iter()
        .enumerate()
        .map(|(mb, decision)| MinibufferStep {
            label: labels[mb],
            trigger_mask: timing.trigger_mask(mb),
            decision,
        })
        .collect()
}

fn check_coverage(collection: &str, found: usize, needed: usize) -> Result<(), DumperError> {
    if found < needed {
        Err(DumperError::MinibufferCountMismatch {
            collection: collection.to_string(),
            found,
            needed,
        })
    } else {
        Ok(())
    }
}

/// ReadoutBuilder takes the contents of an event store and composes them into a
/// ReadoutRecord.
///
/// Pulses in minibuffers rejected by the beam quality veto are dropped, the remaining
/// pulses get their times corrected and are filed under the card and channel reading out
/// their detector element. Any error rejects the whole event; nothing partial is returned.
#[derive(Debug)]
pub struct ReadoutBuilder<'a> {
    channel_map: &'a ChannelMap,
}

impl<'a> ReadoutBuilder<'a> {
    /// Create a new ReadoutBuilder.
    ///
    /// Requires a ChannelMap
    pub fn new(channel_map: &'a ChannelMap) -> Self {
        Self { channel_map }
    }

    pub fn build(&self, event: &AnnieEvent) -> Result<ReadoutRecord, DumperError> {
        let labels = event.get_minibuffer_labels()?;
        let timing = event.get_minibuffer_timing()?;
        let num_minibuffers = timing.resolve_minibuffer_count(labels)?;

        let beam_statuses = event.get_beam_statuses()?;
        let run_number = event.get_run_number()?;
        let subrun_number = event.get_subrun_number()?;
        let event_number = event.get_event_number()?;
        let adc_hits = event.get_reco_adc_hits()?;

        check_coverage(MINIBUFFER_LABELS, labels.len(), num_minibuffers)?;
        check_coverage(BEAM_STATUSES, beam_statuses.len(), num_minibuffers)?;

        let plan = plan_minibuffers(&timing, labels, beam_statuses, num_minibuffers);

        let mut readout = RecoReadout::new(event_number);
        for (channel_key, minibuffer_pulses) in adc_hits {
            let element = channel_key.detector_element_index;

            for (mb, step) in plan.iter().enumerate() {
                if step.decision == VetoDecision::Skip {
                    continue;
                }
                // Only kept minibuffers need a pulse list
                let pulses = minibuffer_pulses.get(mb).ok_or_else(|| {
                    DumperError::MinibufferCountMismatch {
                        collection: format!("{RECO_ADC_HITS}[{channel_key}]"),
                        found: minibuffer_pulses.len(),
                        needed: mb + 1,
                    }
                })?;
                for pulse in pulses {
                    let start_time_ns =
                        timing.resolve_pulse_time(step.label, mb, pulse.start_time_ns);
                    let address = self.channel_map.require_card_channel(element)?;
                    readout.add_pulse(
                        address,
                        mb,
                        RecoPulse::from_adc_pulse(pulse, start_time_ns),
                    );
                    spdlog::trace!(
                        "Found pulse on channel {} in run {} subrun {} event {} in minibuffer {} at {} ns",
                        element,
                        run_number,
                        subrun_number,
                        event_number,
                        mb,
                        start_time_ns
                    );
                }
            }
        }

        let vetoed = plan
            .iter()
            .filter(|step| step.decision == VetoDecision::Skip)
            .count();
        spdlog::debug!(
            "Event {} of run {} ({} timing): {} pulses kept, {} of {} minibuffers vetoed",
            event_number,
            run_number,
            if timing.is_hefty() {
                HEFTY_INFO
            } else {
                MINIBUFFER_TIMESTAMPS
            },
            readout.total_pulses(),
            vetoed,
            num_minibuffers
        );

        Ok(ReadoutRecord {
            reco_readout: readout,
            run_number,
            subrun_number,
            event_number,
            hefty_mode: timing.is_hefty(),
            ncv_position: get_ncv_position(run_number),
            hefty_trigger_masks: plan.iter().map(|step| step.trigger_mask).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annie_event::RUN_NUMBER;
    use crate::hardware_id::ChannelKey;
    use crate::minibuffer::{BeamCondition, HeftyInfo};
    use crate::pulse::AdcPulse;
    use std::collections::BTreeMap;
    use crate::minibuffer::BeamCondition::*;
    use crate::minibuffer::MinibufferLabel::*;

    const MAP: &str = "detector_element_index,card,channel\n\
                       1,3,0\n\
                       2,3,1\n\
                       3,5,2\n";

    fn adc(start_time_ns: u64, charge: f64) -> AdcPulse {
        AdcPulse {
            start_time_ns,
            charge,
            ..Default::default()
        }
    }

    fn statuses(conditions: &[BeamCondition]) -> Vec<BeamStatus> {
        conditions.iter().map(|c| BeamStatus::new(*c)).collect()
    }

    /// Three minibuffers, non-Hefty, good beam throughout, two channels with pulses
    fn base_event() -> AnnieEvent {
        let mut hits = BTreeMap::new();
        hits.insert(
            ChannelKey::adc(1),
            vec![vec![adc(10, 1.0)], vec![adc(20, 2.0), adc(30, 3.0)], vec![]],
        );
        hits.insert(
            ChannelKey::adc(3),
            vec![vec![], vec![adc(40, 4.0)], vec![adc(50, 5.0)]],
        );
        AnnieEvent {
            minibuffer_labels: Some(vec![Beam, Hefty, Beam]),
            hefty_info: None,
            minibuffer_timestamps: Some(vec![0, 1_000, 2_000]),
            beam_statuses: Some(statuses(&[Ok, Ok, Ok])),
            run_number: Some(704),
            subrun_number: Some(1),
            event_number: Some(9),
            reco_adc_hits: Some(hits),
        }
    }

    #[test]
    fn test_build_non_hefty() {
        let map = ChannelMap::from_csv_str(MAP).unwrap();
        let record = ReadoutBuilder::new(&map).build(&base_event()).unwrap();

        assert_eq!(record.run_number, 704);
        assert_eq!(record.subrun_number, 1);
        assert_eq!(record.event_number, 9);
        assert_eq!(record.reco_readout.event_number, 9);
        assert_eq!(record.ncv_position, 2);
        assert!(!record.hefty_mode);
        assert_eq!(record.hefty_trigger_masks, vec![0, 0, 0]);

        let readout = &record.reco_readout;
        assert_eq!(readout.total_pulses(), 5);
        let times: Vec<u64> = readout
            .get_pulses(3, 0, 1)
            .iter()
            .map(|p| p.start_time_ns)
            .collect();
        assert_eq!(times, vec![20, 30]);
        assert_eq!(readout.get_pulses(3, 0, 0)[0].charge, 1.0);
        assert_eq!(readout.get_pulses(5, 2, 1)[0].start_time_ns, 40);
        assert_eq!(readout.get_pulses(5, 2, 2)[0].start_time_ns, 50);
    }

    #[test]
    fn test_build_applies_veto() {
        let map = ChannelMap::from_csv_str(MAP).unwrap();
        let mut event = base_event();
        event.beam_statuses = Some(statuses(&[Ok, Bad, Ok]));
        let record = ReadoutBuilder::new(&map).build(&event).unwrap();

        let readout = &record.reco_readout;
        // Only minibuffer 1 is dropped
        assert_eq!(readout.total_pulses(), 2);
        assert!(readout.get_pulses(3, 0, 1).is_empty());
        assert!(readout.get_pulses(5, 2, 1).is_empty());
        assert_eq!(readout.get_pulses(3, 0, 0).len(), 1);
        assert_eq!(readout.get_pulses(5, 2, 2).len(), 1);
        assert!(readout.iter().all(|(address, _)| address.minibuffer != 1));
    }

    #[test]
    fn test_veto_spares_cosmics() {
        let map = ChannelMap::from_csv_str(MAP).unwrap();
        let mut event = base_event();
        event.minibuffer_labels = Some(vec![Beam, Cosmic, Hefty]);
        event.beam_statuses = Some(statuses(&[Bad, Missing, Missing]));
        let record = ReadoutBuilder::new(&map).build(&event).unwrap();

        let readout = &record.reco_readout;
        assert_eq!(readout.total_pulses(), 3);
        assert!(readout.iter().all(|(address, _)| address.minibuffer == 1));
    }

    #[test]
    fn test_build_hefty() {
        let map = ChannelMap::from_csv_str(MAP).unwrap();
        let mut event = base_event();
        event.minibuffer_timestamps = None;
        event.hefty_info = Some(
            HeftyInfo::new(vec![0, 0, 0], vec![1, 8, 1], vec![0, 3_000, 0], false).unwrap(),
        );
        let record = ReadoutBuilder::new(&map).build(&event).unwrap();

        assert!(record.hefty_mode);
        assert_eq!(record.hefty_trigger_masks, vec![1, 8, 1]);
        let readout = &record.reco_readout;
        let times: Vec<u64> = readout
            .get_pulses(3, 0, 1)
            .iter()
            .map(|p| p.start_time_ns)
            .collect();
        assert_eq!(times, vec![3_020, 3_030]);
        assert_eq!(readout.get_pulses(5, 2, 1)[0].start_time_ns, 3_040);
        // Beam minibuffers are not shifted
        assert_eq!(readout.get_pulses(3, 0, 0)[0].start_time_ns, 10);
        assert_eq!(readout.get_pulses(5, 2, 2)[0].start_time_ns, 50);
    }

    #[test]
    fn test_hefty_masks_indexed_by_minibuffer() {
        let map = ChannelMap::from_csv_str(MAP).unwrap();
        let mut event = base_event();
        event.minibuffer_timestamps = None;
        event.beam_statuses = Some(statuses(&[Ok, Bad, Ok]));
        event.hefty_info = Some(
            HeftyInfo::new(vec![0, 0, 0], vec![1, 8, 1], vec![0, 3_000, 0], false).unwrap(),
        );
        let record = ReadoutBuilder::new(&map).build(&event).unwrap();

        // The vetoed window keeps its slot so masks line up with minibuffer indices
        assert_eq!(record.hefty_trigger_masks, vec![1, 8, 1]);
        assert!(record.reco_readout.get_pulses(3, 0, 1).is_empty());
        assert_eq!(record.reco_readout.total_pulses(), 2);
    }

    #[test]
    fn test_build_hefty_truncated() {
        let map = ChannelMap::from_csv_str(MAP).unwrap();
        let mut event = base_event();
        event.minibuffer_timestamps = None;
        event.minibuffer_labels = Some(vec![Beam, Hefty, Beam]);
        event.hefty_info =
            Some(HeftyInfo::new(vec![0, 0, 0], vec![1, 8, 1], vec![0, 3_000, 0], true).unwrap());
        let record = ReadoutBuilder::new(&map).build(&event).unwrap();

        // The last beam minibuffer (index 2) starts an incomplete window
        assert_eq!(record.hefty_trigger_masks, vec![1, 8]);
        assert_eq!(record.reco_readout.total_pulses(), 4);
        assert!(record
            .reco_readout
            .iter()
            .all(|(address, _)| address.minibuffer < 2));
    }

    #[test]
    fn test_empty_hefty_rejected() {
        let map = ChannelMap::from_csv_str(MAP).unwrap();
        let mut event = base_event();
        event.hefty_info = Some(HeftyInfo::default());
        assert_eq!(
            ReadoutBuilder::new(&map).build(&event),
            Err(DumperError::EmptyHeftyData)
        );
    }

    #[test]
    fn test_missing_and_empty_inputs() {
        let map = ChannelMap::from_csv_str(MAP).unwrap();
        let builder = ReadoutBuilder::new(&map);

        let mut event = base_event();
        event.minibuffer_labels = Some(vec![]);
        assert_eq!(
            builder.build(&event),
            Err(DumperError::EmptyRequiredCollection(MINIBUFFER_LABELS))
        );

        let mut event = base_event();
        event.beam_statuses = Some(vec![]);
        assert_eq!(
            builder.build(&event),
            Err(DumperError::EmptyRequiredCollection(BEAM_STATUSES))
        );

        let mut event = base_event();
        event.reco_adc_hits = Some(BTreeMap::new());
        assert_eq!(
            builder.build(&event),
            Err(DumperError::EmptyRequiredCollection(RECO_ADC_HITS))
        );

        let mut event = base_event();
        event.run_number = None;
        assert_eq!(
            builder.build(&event),
            Err(DumperError::MissingRequiredInput(RUN_NUMBER))
        );

        let mut event = base_event();
        event.minibuffer_timestamps = None;
        assert_eq!(
            builder.build(&event),
            Err(DumperError::MissingRequiredInput(MINIBUFFER_TIMESTAMPS))
        );

        let mut event = base_event();
        event.minibuffer_timestamps = Some(vec![]);
        assert_eq!(builder.build(&event), Err(DumperError::EmptyTimestampData));
    }

    #[test]
    fn test_unknown_channel_rejected() {
        let map = ChannelMap::from_csv_str(MAP).unwrap();
        let mut event = base_event();
        if let Some(hits) = event.reco_adc_hits.as_mut() {
            hits.insert(ChannelKey::adc(77), vec![vec![adc(5, 0.1)], vec![], vec![]]);
        }
        assert_eq!(
            ReadoutBuilder::new(&map).build(&event),
            Err(DumperError::UnknownChannelMapping(77))
        );
    }

    #[test]
    fn test_short_collections_rejected() {
        let map = ChannelMap::from_csv_str(MAP).unwrap();
        let builder = ReadoutBuilder::new(&map);

        let mut event = base_event();
        event.beam_statuses = Some(statuses(&[Ok, Ok]));
        assert_eq!(
            builder.build(&event),
            Err(DumperError::MinibufferCountMismatch {
                collection: String::from(BEAM_STATUSES),
                found: 2,
                needed: 3,
            })
        );

        let mut event = base_event();
        if let Some(hits) = event.reco_adc_hits.as_mut() {
            hits.insert(ChannelKey::adc(2), vec![vec![]]);
        }
        assert_eq!(
            builder.build(&event),
            Err(DumperError::MinibufferCountMismatch {
                collection: String::from("RecoADCHits[ADC:2]"),
                found: 1,
                needed: 2,
            })
        );
    }

    #[test]
    fn test_short_pulse_lists_cover_kept_minibuffers() {
        let map = ChannelMap::from_csv_str(MAP).unwrap();
        let mut hits = BTreeMap::new();
        hits.insert(ChannelKey::adc(1), vec![vec![adc(10, 1.0)]]);
        let mut event = base_event();
        event.minibuffer_labels = Some(vec![Beam, Hefty, Hefty]);
        event.beam_statuses = Some(statuses(&[Ok, Bad, Missing]));
        event.reco_adc_hits = Some(hits);

        let record = ReadoutBuilder::new(&map).build(&event).unwrap();
        assert_eq!(record.reco_readout.total_pulses(), 1);
        assert_eq!(record.reco_readout.get_pulses(3, 0, 0)[0].start_time_ns, 10);
    }

    #[test]
    fn test_unknown_channel_in_vetoed_minibuffer() {
        let map = ChannelMap::from_csv_str(MAP).unwrap();
        let mut event = base_event();
        event.beam_statuses = Some(statuses(&[Ok, Bad, Ok]));
        if let Some(hits) = event.reco_adc_hits.as_mut() {
            hits.insert(ChannelKey::adc(77), vec![vec![], vec![adc(5, 0.1)], vec![]]);
        }
        let record = ReadoutBuilder::new(&map).build(&event).unwrap();
        assert_eq!(record.reco_readout.total_pulses(), 2);
    }

    #[test]
    fn test_plan_minibuffers() {
        let info = HeftyInfo::new(vec![0; 3], vec![1, 8, 16], vec![0; 3], false).unwrap();
        let plan = plan_minibuffers(
            &MinibufferTiming::Hefty(&info),
            &[Beam, Hefty, Beam],
            &statuses(&[Ok, Bad, Ok]),
            3,
        );
        let decisions: Vec<VetoDecision> = plan.iter().map(|s| s.decision).collect();
        assert_eq!(
            decisions,
            vec![VetoDecision::Keep, VetoDecision::Skip, VetoDecision::Keep]
        );
        assert_eq!(plan[1].trigger_mask, 8);
        assert_eq!(plan[2].label, Beam);
    }
}
