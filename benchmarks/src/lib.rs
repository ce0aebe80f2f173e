//! Synthetic inputs shared by the benches.

use frame_catalog::CornerCoordinates;

/// Gray values and alpha for a `side` x `side` warp covering the columns
/// `from..to`.
pub fn column_strip(side: usize, from: usize, to: usize, value: u8) -> (Vec<u8>, Vec<u8>) {
    let alpha = (0..side * side)
        .map(|i| if (from..to).contains(&(i % side)) { 255 } else { 0 })
        .collect();
    (vec![value; side * side], alpha)
}

pub fn sample_corners() -> CornerCoordinates {
    CornerCoordinates {
        upper_left: (2.2921, 48.8774),
        lower_left: (2.2905, 48.7993),
        lower_right: (2.4488, 48.7981),
        upper_right: (2.4510, 48.8762),
    }
}
