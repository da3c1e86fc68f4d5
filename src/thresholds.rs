use crate::models::{Alert, DailyGoals, Metric, Progress, ProgressLevel, Totals};

const WARNING_FRACTION: f64 = 0.8;

/// One alert per ceiling metric whose total is above its goal. Water is a
/// minimum target and never alerts.
pub fn evaluate(totals: &Totals, goals: &DailyGoals) -> Vec<Alert> {
    [
        (Metric::Calories, totals.calories, goals.calories),
        (Metric::Carbs, totals.carbs, goals.carbs),
        (Metric::Protein, totals.protein, goals.protein),
    ]
    .into_iter()
    .filter(|(_, total, goal)| total > goal)
    .map(|(metric, total, goal)| Alert {
        metric,
        over_by: total - goal,
    })
    .collect()
}

/// `current / goal` clamped to `[0, 1]`. A non-positive goal counts as met
/// as soon as anything has been logged.
pub fn progress_fraction(current: f64, goal: f64) -> f64 {
    if goal <= 0.0 {
        return if current > 0.0 { 1.0 } else { 0.0 };
    }
    (current / goal).clamp(0.0, 1.0)
}

pub fn progress_level(current: f64, goal: f64) -> ProgressLevel {
    if goal <= 0.0 {
        return if current > 0.0 {
            ProgressLevel::Over
        } else {
            ProgressLevel::Normal
        };
    }
    let ratio = current / goal;
    if ratio > 1.0 {
        ProgressLevel::Over
    } else if ratio > WARNING_FRACTION {
        ProgressLevel::Warning
    } else {
        ProgressLevel::Normal
    }
}

pub fn progress(totals: &Totals, water_glasses: u32, goals: &DailyGoals) -> Vec<Progress> {
    [
        (Metric::Calories, totals.calories, goals.calories),
        (Metric::Carbs, totals.carbs, goals.carbs),
        (Metric::Protein, totals.protein, goals.protein),
        (Metric::Water, f64::from(water_glasses), f64::from(goals.water)),
    ]
    .into_iter()
    .map(|(metric, current, goal)| Progress {
        metric,
        current,
        goal,
        fraction: progress_fraction(current, goal),
        level: progress_level(current, goal),
    })
    .collect()
}
