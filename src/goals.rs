use crate::errors::StorageError;
use crate::models::{coerce_number, DailyGoals, GoalsInput};
use crate::storage::GoalRepository;
use serde_json::Value;
use tracing::info;

/// The user's targets, loaded once and handed to whoever owns app state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalStore {
    goals: DailyGoals,
    first_run: bool,
}

impl GoalStore {
    /// Saved goals, or the built-in defaults with `first_run` set.
    pub async fn load<R: GoalRepository + ?Sized>(repo: &R) -> Self {
        match repo.load_goals().await {
            Some(goals) => Self {
                goals,
                first_run: false,
            },
            None => Self {
                goals: DailyGoals::default(),
                first_run: true,
            },
        }
    }

    pub fn goals(&self) -> &DailyGoals {
        &self.goals
    }

    /// No goals have ever been saved; the setup step should run before tracking.
    pub fn is_first_run(&self) -> bool {
        self.first_run
    }

    /// Replaces all four goals at once. Persists before the new value takes effect.
    pub async fn save<R: GoalRepository + ?Sized>(
        &mut self,
        repo: &mut R,
        input: &GoalsInput,
    ) -> Result<DailyGoals, StorageError> {
        let next = coerce_goals(&self.goals, input);
        repo.save_goals(&next).await?;
        info!(
            calories = next.calories,
            carbs = next.carbs,
            protein = next.protein,
            water = next.water,
            "goals updated"
        );
        self.goals = next;
        self.first_run = false;
        Ok(next)
    }
}

/// Values that are non-numeric or not positive keep their current goal.
pub fn coerce_goals(current: &DailyGoals, input: &GoalsInput) -> DailyGoals {
    let positive = |value: &Value, fallback: f64| match coerce_number(Some(value)) {
        Some(n) if n > 0.0 => n,
        _ => fallback,
    };
    let water = match coerce_number(Some(&input.water)) {
        Some(n) if n.round() >= 1.0 => n.round().min(f64::from(u32::MAX)) as u32,
        _ => current.water,
    };

    DailyGoals {
        calories: positive(&input.calories, current.calories),
        carbs: positive(&input.carbs, current.carbs),
        protein: positive(&input.protein, current.protein),
        water,
    }
}
