use crate::types::{Difficulty, Direction};

/// Columns reserved left of the maze for line numbers.
pub const GUTTER_WIDTH: i32 = 2;

pub const TICK_MS: u64 = 5;

pub const MAX_COUNT: u32 = 9_999;

pub const SEEKER_SENTINEL_DISTANCE: f64 = 1000.0;
pub const EXTRA_ROTATION_CHANCE: f32 = 0.1;
pub const PHASE_THROUGH_WALL_CHANCE: f32 = 0.05;
pub const DORMANT_ACTIVATION_RADIUS: f64 = 5.0;
pub const MAX_HEADING_ROTATIONS: usize = 4;
pub const DEFAULT_HEADING: Direction = Direction::Up;

pub const STARTING_LIVES: i32 = 3;
pub const LIFE_BONUS_EVERY: u32 = 3;
pub const CAMPAIGN_LOOP_SPEEDUP: f64 = 0.8;
/// Highest `map{n}.txt` index; the campaign wraps after it.
pub const DEFAULT_LAST_LEVEL: u32 = 12;

pub fn get_think_multiplier(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Hard => 1.0,
        Difficulty::Normal => 1.2,
    }
}

pub fn think_interval_ms(think_seconds: f64, multiplier: f64) -> u64 {
    let ms = think_seconds * multiplier * 1000.0;
    if !ms.is_finite() || ms <= 0.0 {
        return 0;
    }
    ms.round() as u64
}
