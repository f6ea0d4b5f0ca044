use std::ops::Range;

/// Position code used for runs outside of any known NCV deployment
pub const UNKNOWN_NCV_POSITION: i32 = 0;

/// Run ranges (end exclusive) of each NCV deployment position. Ranges do not overlap.
const NCV_POSITIONS: [(Range<u32>, i32); 8] = [
    (635..704, 1),
    (704..802, 2),
    (802..808, 3),
    (808..813, 4),
    (813..814, 5),
    (814..815, 6),
    (815..825, 7),
    (825..883, 8),
];

/// Get the position of the neutron capture volume during a run
pub fn get_ncv_position(run_number: u32) -> i32 {
    NCV_POSITIONS
        .iter()
        .find(|(runs, _)| runs.contains(&run_number))
        .map(|(_, position)| *position)
        .unwrap_or(UNKNOWN_NCV_POSITION)
}
