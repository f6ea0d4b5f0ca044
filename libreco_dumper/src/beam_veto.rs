use super::minibuffer::{BeamCondition, MinibufferLabel};

/// What to do with the pulses of a minibuffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VetoDecision {
    Keep,
    Skip,
}

/// Beam quality veto.
///
/// A bad or missing beam spill activates the veto, and it stays active until a minibuffer
/// with good beam status is seen. While active, beam and Hefty window minibuffers are
/// skipped. Other minibuffers (cosmics, LED, ...) are not part of the beam macroevent and
/// are always kept.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BeamVeto {
    active: bool,
}

impl BeamVeto {
    /// A fresh veto, inactive. Use one per event.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advance the veto by one minibuffer.
    ///
    /// The veto is cleared before the skip check, so a good minibuffer directly after a
    /// bad one is itself kept.
    pub fn step(self, condition: BeamCondition, label: MinibufferLabel) -> (Self, VetoDecision) {
        let active = if condition.is_bad_or_missing() {
            true
        } else if self.active && condition == BeamCondition::Ok {
            false
        } else {
            self.active
        };

        let decision = if active && label.is_beam_macroevent() {
            VetoDecision::Skip
        } else {
            VetoDecision::Keep
        };

        (Self { active }, decision)
    }
}

/// Run a fresh veto over an ordered sequence of (condition, label) pairs
pub fn veto_decisions<I>(minibuffers: I) -> Vec<VetoDecision>
where
    I: IntoIterator<Item = (BeamCondition, MinibufferLabel)>,
{
    let mut veto = BeamVeto::new();
    minibuffers
        .into_iter()
        .map(|(condition, label)| {
            let (next, decision) = veto.step(condition, label);
            veto = next;
            decision
        })
        .collect()
}
