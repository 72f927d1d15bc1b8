use std::collections::HashMap;

use alloy_primitives::B256;
use checkpointz_consensus::checkpoint::Finality;

use crate::error::{Error, Result};

/// Decides the finality triple agreed on by strictly more than half of the
/// reporting upstreams.
///
/// Grouping keys on the composite `(finalized, current_justified,
/// previous_justified)` root triple, so upstreams only count together when
/// they agree on the whole triple. Equal halves produce no majority. The
/// decider is pure: identical inputs always yield identical outputs.
#[derive(Debug, Default)]
pub struct MajorityDecider;

impl MajorityDecider {
    pub fn new() -> Self {
        Self
    }

    pub fn decide(&self, finalities: &[Finality]) -> Result<Finality> {
        let mut groups: HashMap<(B256, B256, B256), (Finality, usize)> = HashMap::new();

        for finality in finalities {
            let key = (
                finality.finalized.root,
                finality.current_justified.root,
                finality.previous_justified.root,
            );

            groups
                .entry(key)
                .and_modify(|(_, count)| *count += 1)
                .or_insert((*finality, 1));
        }

        groups
            .into_values()
            .find(|(_, count)| *count > finalities.len() / 2)
            .map(|(finality, _)| finality)
            .ok_or(Error::NoMajority)
    }
}

#[cfg(test)]
mod tests {
    use checkpointz_consensus::checkpoint::Checkpoint;

    use super::*;

    fn finality(finalized: u8, justified: u8, previous_justified: u8) -> Finality {
        Finality {
            finalized: Checkpoint::new(100, B256::repeat_byte(finalized)),
            current_justified: Checkpoint::new(101, B256::repeat_byte(justified)),
            previous_justified: Checkpoint::new(100, B256::repeat_byte(previous_justified)),
        }
    }

    #[test]
    fn test_empty_input_has_no_majority() {
        assert!(matches!(
            MajorityDecider::new().decide(&[]),
            Err(Error::NoMajority)
        ));
    }

    #[test]
    fn test_two_of_three_form_a_quorum() {
        let agreed = finality(0x11, 0x22, 0x22);
        let result = MajorityDecider::new()
            .decide(&[agreed, agreed, finality(0x33, 0x44, 0x44)])
            .expect("majority exists");

        assert_eq!(result, agreed);
    }

    #[test]
    fn test_exact_half_is_not_a_majority() {
        let first = finality(0x11, 0x22, 0x22);
        let second = finality(0x33, 0x44, 0x44);

        assert!(matches!(
            MajorityDecider::new().decide(&[first, first, second, second]),
            Err(Error::NoMajority)
        ));
    }

    #[test]
    fn test_single_input_is_unanimous() {
        let only = finality(0x11, 0x22, 0x22);

        assert_eq!(MajorityDecider::new().decide(&[only]).unwrap(), only);
    }

    #[test]
    fn test_agreement_requires_the_whole_triple() {
        // Same finalized root, different justified roots: no shared group.
        let first = finality(0x11, 0x22, 0x22);
        let second = finality(0x11, 0x33, 0x33);
        let third = finality(0x11, 0x44, 0x44);

        assert!(matches!(
            MajorityDecider::new().decide(&[first, second, third]),
            Err(Error::NoMajority)
        ));
    }

    #[test]
    fn test_decider_is_pure() {
        let inputs = [
            finality(0x11, 0x22, 0x22),
            finality(0x11, 0x22, 0x22),
            finality(0x33, 0x44, 0x44),
        ];

        let decider = MajorityDecider::new();
        assert_eq!(
            decider.decide(&inputs).unwrap(),
            decider.decide(&inputs).unwrap()
        );
    }
}
