//! How the tick interval shrinks each time the snake eats.

/// Interval the game starts (and restarts) at.
pub const INITIAL_SPEED_MILLIS: u64 = 200;
/// Below this the interval no longer shrinks.
pub const MIN_SPEED_MILLIS: u64 = 25;

/// Returns the interval to use after one apple is eaten at `interval` millis.
#[must_use]
pub fn next_speed(interval: u64) -> u64 {
    match interval {
        i if i > 150 => i - 5,
        i if i > 100 => i - 3,
        i if i > 50 => i - 2,
        i if i > MIN_SPEED_MILLIS => i - 1,
        i => i,
    }
}
