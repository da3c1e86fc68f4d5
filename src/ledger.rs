//! Pure mutations over a single day's ledger.
//!
//! Each operation takes a ledger by value and hands back the next one; the
//! caller decides when to persist.

use crate::errors::ValidationError;
use crate::models::{coerce_number, DailyLedger, FoodEntry, FoodInput};
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;

pub fn add_food(
    mut ledger: DailyLedger,
    candidate: &FoodInput,
    logged_at: DateTime<Utc>,
) -> Result<DailyLedger, ValidationError> {
    let name = candidate.name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingName);
    }
    let calories =
        coerce_number(candidate.calories.as_ref()).ok_or(ValidationError::MissingCalories)?;

    let entry = FoodEntry {
        id: next_id(&ledger, logged_at),
        name: name.to_string(),
        calories,
        carbs: coerce_number(candidate.carbs.as_ref()).unwrap_or(0.0),
        protein: coerce_number(candidate.protein.as_ref()).unwrap_or(0.0),
        timestamp: logged_at,
    };
    ledger.foods.push(entry);
    Ok(ledger)
}

pub fn remove_food(mut ledger: DailyLedger, id: &str) -> DailyLedger {
    ledger.foods.retain(|food| food.id != id);
    ledger
}

pub fn add_water(mut ledger: DailyLedger) -> DailyLedger {
    ledger.water_glasses = ledger.water_glasses.saturating_add(1);
    ledger
}

pub fn remove_water(mut ledger: DailyLedger) -> DailyLedger {
    ledger.water_glasses = ledger.water_glasses.saturating_sub(1);
    ledger
}

/// Millisecond timestamp of the entry, bumped past any id already in the
/// ledger so two entries logged within the same millisecond stay distinct.
/// An id already at `i64::MAX` falls back to the first free value from the
/// timestamp on.
fn next_id(ledger: &DailyLedger, logged_at: DateTime<Utc>) -> String {
    let candidate = logged_at.timestamp_millis();
    let taken: BTreeSet<i64> = ledger
        .foods
        .iter()
        .filter_map(|food| food.id.parse::<i64>().ok())
        .collect();
    let next = match taken.last() {
        Some(&highest) if highest >= candidate => highest
            .checked_add(1)
            .or_else(|| (candidate..i64::MAX).find(|id| !taken.contains(id)))
            .unwrap_or(candidate),
        _ => candidate,
    };
    next.to_string()
}
