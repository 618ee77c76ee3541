//! Default constants for item scoring.

/// Fixed-point scale of the learning model.
///
/// Scores are integers in units of `1 / SCALE`; the hit reward and the sibling
/// penalty are both exactly one `SCALE`.
pub const SCALE: u64 = 100;

/// Reward subtracted from an item's score on a hit.
pub const HIT_REWARD: i64 = SCALE as i64;

/// Penalty subtracted from a sibling shadow shown not to have been worth keeping.
pub const SHADOW_PENALTY: i64 = SCALE as i64;
