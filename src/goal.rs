use crate::user::{ActivityLevel, Gender};

pub const GOAL_FLOOR_ML: u32 = 1200;
pub const GOAL_CEILING_ML: u32 = 5000;

/// Recommended daily water intake in millilitres.
///
/// Base is 30 ml per kilogram, reduced by 10% for women, plus a flat
/// activity bonus. The result is clamped to a sane range.
pub fn daily_goal_ml(gender: Gender, weight_kg: u32, activity_level: ActivityLevel) -> u32 {
    let mut base = weight_kg * 30;
    if gender == Gender::Female {
        base = (f64::from(base) * 0.9).floor() as u32;
    }

    let activity_bonus = match activity_level {
        ActivityLevel::Low => 0,
        ActivityLevel::Medium => 300,
        ActivityLevel::High => 600,
    };

    (base + activity_bonus).clamp(GOAL_FLOOR_ML, GOAL_CEILING_ML)
}
