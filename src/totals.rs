use crate::models::{DailyLedger, Totals};

pub fn compute_totals(ledger: &DailyLedger) -> Totals {
    ledger.foods.iter().fold(Totals::default(), |acc, food| Totals {
        calories: acc.calories + food.calories,
        carbs: acc.carbs + food.carbs,
        protein: acc.protein + food.protein,
    })
}
