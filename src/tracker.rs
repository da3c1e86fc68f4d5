use crate::errors::{StorageError, ValidationError};
use crate::goals::GoalStore;
use crate::ledger;
use crate::models::{
    date_key, Alert, DailyGoals, DailyLedger, FoodInput, GoalsInput, LedgerView, Notification,
    Totals,
};
use crate::storage::{GoalRepository, LedgerRepository};
use crate::thresholds::{evaluate, progress};
use crate::totals::compute_totals;
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, PartialEq)]
struct Evaluated {
    date: String,
    totals: Totals,
    goals: DailyGoals,
}

/// Owns the goals, the day being viewed and the store behind them. Every
/// command persists the changed ledger before it returns.
pub struct Tracker<S> {
    store: S,
    goals: GoalStore,
    viewed: NaiveDate,
    ledger: DailyLedger,
    last_evaluated: Option<Evaluated>,
}

impl<S> Tracker<S>
where
    S: LedgerRepository + GoalRepository,
{
    pub async fn open(store: S, now: DateTime<Local>) -> Self {
        let goals = GoalStore::load(&store).await;
        let viewed = now.date_naive();
        let ledger = store.load_ledger(&date_key(viewed)).await;
        let mut tracker = Self {
            store,
            goals,
            viewed,
            ledger,
            last_evaluated: None,
        };
        tracker.last_evaluated = Some(tracker.evaluated());
        tracker
    }

    pub fn goals(&self) -> &GoalStore {
        &self.goals
    }

    pub fn ledger(&self) -> &DailyLedger {
        &self.ledger
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn totals(&self) -> Totals {
        compute_totals(&self.ledger)
    }

    pub fn alerts(&self) -> Vec<Alert> {
        evaluate(&self.totals(), self.goals.goals())
    }

    pub fn view(&self, now: DateTime<Local>) -> LedgerView {
        let totals = self.totals();
        let goals = *self.goals.goals();
        LedgerView {
            date: self.ledger.date.clone(),
            is_today: self.viewed == now.date_naive(),
            foods: self.ledger.foods.clone(),
            water_glasses: self.ledger.water_glasses,
            progress: progress(&totals, self.ledger.water_glasses, &goals),
            alerts: evaluate(&totals, &goals),
            totals,
            goals,
        }
    }

    pub async fn set_goals(
        &mut self,
        input: &GoalsInput,
        now: DateTime<Local>,
    ) -> Result<Vec<Notification>, StorageError> {
        let goals = self.goals.save(&mut self.store, input).await?;
        let mut notices = vec![Notification::GoalUpdated { goals }];
        notices.extend(self.threshold_notices(now));
        Ok(notices)
    }

    /// Switches the viewed day, creating an empty ledger for days never logged.
    pub async fn select_date(&mut self, date: NaiveDate, now: DateTime<Local>) -> Vec<Notification> {
        if date != self.viewed {
            self.ledger = self.store.load_ledger(&date_key(date)).await;
            self.viewed = date;
        }
        self.threshold_notices(now)
    }

    pub async fn add_food(
        &mut self,
        input: &FoodInput,
        now: DateTime<Local>,
    ) -> Result<Vec<Notification>, CommandError> {
        let next = ledger::add_food(self.ledger.clone(), input, self.logged_at(now))?;
        self.commit(next).await?;

        let mut notices = Vec::new();
        if let Some(food) = self.ledger.foods.last() {
            info!(date = %self.ledger.date, id = %food.id, name = %food.name, "food added");
            notices.push(Notification::FoodAdded {
                id: food.id.clone(),
                name: food.name.clone(),
                calories: food.calories,
            });
        }
        notices.extend(self.threshold_notices(now));
        Ok(notices)
    }

    pub async fn remove_food(
        &mut self,
        id: &str,
        now: DateTime<Local>,
    ) -> Result<Vec<Notification>, StorageError> {
        let next = ledger::remove_food(self.ledger.clone(), id);
        if !self.commit(next).await? {
            return Ok(Vec::new());
        }

        info!(date = %self.ledger.date, id, "food removed");
        let mut notices = vec![Notification::FoodRemoved { id: id.to_string() }];
        notices.extend(self.threshold_notices(now));
        Ok(notices)
    }

    pub async fn add_water(&mut self) -> Result<Vec<Notification>, StorageError> {
        let next = ledger::add_water(self.ledger.clone());
        self.water_changed(next).await
    }

    pub async fn remove_water(&mut self) -> Result<Vec<Notification>, StorageError> {
        let next = ledger::remove_water(self.ledger.clone());
        self.water_changed(next).await
    }

    async fn water_changed(&mut self, next: DailyLedger) -> Result<Vec<Notification>, StorageError> {
        if !self.commit(next).await? {
            return Ok(Vec::new());
        }
        info!(date = %self.ledger.date, glasses = self.ledger.water_glasses, "water changed");
        Ok(vec![Notification::WaterChanged {
            water_glasses: self.ledger.water_glasses,
        }])
    }

    /// Persists `next` if it differs from the current ledger. The in-memory
    /// ledger only moves forward once the save succeeded.
    async fn commit(&mut self, next: DailyLedger) -> Result<bool, StorageError> {
        if next == self.ledger {
            return Ok(false);
        }
        self.store.save_ledger(&next).await?;
        self.ledger = next;
        Ok(true)
    }

    /// Entries land on the viewed day. For past days the wall-clock time is
    /// kept but moved onto that date.
    fn logged_at(&self, now: DateTime<Local>) -> DateTime<Utc> {
        if self.viewed == now.date_naive() {
            return now.with_timezone(&Utc);
        }
        let time = now.time();
        resolve_on_day(self.viewed, time, |naive| {
            naive
                .and_local_timezone(Local)
                .earliest()
                .map(|local| local.with_timezone(&Utc))
        })
        .unwrap_or_else(|| self.viewed.and_time(time).and_utc())
    }

    fn evaluated(&self) -> Evaluated {
        Evaluated {
            date: self.ledger.date.clone(),
            totals: self.totals(),
            goals: *self.goals.goals(),
        }
    }

    /// Alerts are raised for today only, and only when totals or goals moved
    /// since the last evaluation.
    fn threshold_notices(&mut self, now: DateTime<Local>) -> Vec<Notification> {
        let current = self.evaluated();
        if self.last_evaluated.as_ref() == Some(&current) {
            return Vec::new();
        }
        let alerts = if self.viewed == now.date_naive() {
            evaluate(&current.totals, &current.goals)
        } else {
            Vec::new()
        };
        self.last_evaluated = Some(current);

        alerts
            .into_iter()
            .map(|alert| {
                info!(metric = ?alert.metric, over_by = alert.over_by, "goal exceeded");
                Notification::ThresholdExceeded {
                    metric: alert.metric,
                    over_by: alert.over_by,
                }
            })
            .collect()
    }
}

/// `time` on `date` if the zone can represent it, else the next representable
/// quarter hour that day, else midnight. Never leaves `date`.
fn resolve_on_day<F>(date: NaiveDate, time: NaiveTime, resolve: F) -> Option<DateTime<Utc>>
where
    F: Fn(NaiveDateTime) -> Option<DateTime<Utc>>,
{
    let start = date.and_time(time);
    (0i64..)
        .map(|step| start + Duration::minutes(15 * step))
        .take_while(|candidate| candidate.date() == date)
        .chain(std::iter::once(date.and_time(NaiveTime::MIN)))
        .find_map(resolve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Metric;
    use crate::storage::{JsonFileStore, MemoryStore};
    use chrono::TimeZone;
    use serde_json::json;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap()
    }

    fn food(name: &str, calories: f64, carbs: f64, protein: f64) -> FoodInput {
        FoodInput {
            name: name.into(),
            calories: Some(json!(calories)),
            carbs: Some(json!(carbs)),
            protein: Some(json!(protein)),
        }
    }

    async fn tracker() -> Tracker<MemoryStore> {
        Tracker::open(MemoryStore::new(), noon()).await
    }

    #[tokio::test]
    async fn opens_on_today_with_default_goals() {
        let tracker = tracker().await;
        assert!(tracker.goals().is_first_run());
        assert_eq!(tracker.ledger(), &DailyLedger::empty("2026-01-05"));
        assert_eq!(tracker.totals(), Totals::default());
        assert!(tracker.view(noon()).is_today);
    }

    #[tokio::test]
    async fn add_food_persists_and_notifies() {
        let mut tracker = tracker().await;
        let notices = tracker.add_food(&food("Egg", 78.0, 0.6, 6.0), noon()).await.unwrap();

        assert!(matches!(
            notices.as_slice(),
            [Notification::FoodAdded { name, calories, .. }] if name == "Egg" && *calories == 78.0
        ));
        let stored = &tracker.store().data().days["2026-01-05"];
        assert_eq!(stored, tracker.ledger());
        assert_eq!(stored.foods[0].timestamp, noon().with_timezone(&Utc));
    }

    #[tokio::test]
    async fn invalid_food_leaves_ledger_untouched() {
        let mut tracker = tracker().await;
        let err = tracker
            .add_food(&FoodInput { name: "Egg".into(), ..FoodInput::default() }, noon())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Validation(ValidationError::MissingCalories)));
        assert!(tracker.ledger().foods.is_empty());
        assert!(tracker.store().data().days.is_empty());
    }

    #[tokio::test]
    async fn crossing_a_goal_alerts_once() {
        let mut tracker = tracker().await;
        tracker.add_food(&food("Pizza", 1500.0, 150.0, 60.0), noon()).await.unwrap();

        let notices = tracker.add_food(&food("Cake", 700.0, 50.0, 40.0), noon()).await.unwrap();
        let alerts: Vec<_> = notices
            .iter()
            .filter_map(|n| match n {
                Notification::ThresholdExceeded { metric, over_by } => Some((*metric, *over_by)),
                _ => None,
            })
            .collect();
        assert_eq!(alerts, vec![(Metric::Calories, 200.0)]);

        // Water leaves totals alone, so nothing is re-raised.
        let notices = tracker.add_water().await.unwrap();
        assert_eq!(notices, vec![Notification::WaterChanged { water_glasses: 1 }]);
        assert_eq!(tracker.alerts().len(), 1);
    }

    #[tokio::test]
    async fn past_days_do_not_raise_alerts() {
        let mut tracker = tracker().await;
        let yesterday = noon().date_naive() - Duration::days(1);
        tracker.select_date(yesterday, noon()).await;

        let notices = tracker.add_food(&food("Feast", 3000.0, 0.0, 0.0), noon()).await.unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(tracker.alerts().len(), 1);

        let logged = tracker.ledger().foods[0].timestamp.with_timezone(&Local);
        assert_eq!(logged.date_naive(), yesterday);
    }

    #[tokio::test]
    async fn select_date_loads_lazily() {
        let mut tracker = tracker().await;
        tracker.add_water().await.unwrap();

        let other = NaiveDate::from_ymd_opt(2025, 12, 24).unwrap();
        tracker.select_date(other, noon()).await;
        assert_eq!(tracker.ledger(), &DailyLedger::empty("2025-12-24"));
        assert!(!tracker.view(noon()).is_today);
        assert!(!tracker.store().data().days.contains_key("2025-12-24"));

        tracker.select_date(noon().date_naive(), noon()).await;
        assert_eq!(tracker.ledger().water_glasses, 1);
    }

    #[tokio::test]
    async fn no_op_commands_are_silent() {
        let mut tracker = tracker().await;
        assert!(tracker.remove_water().await.unwrap().is_empty());
        assert!(tracker.remove_food("nope", noon()).await.unwrap().is_empty());
        assert!(tracker.store().data().days.is_empty());
    }

    #[tokio::test]
    async fn remove_food_updates_totals() {
        let mut tracker = tracker().await;
        tracker.add_food(&food("Egg", 78.0, 0.6, 6.0), noon()).await.unwrap();
        tracker.add_food(&food("Toast", 80.0, 15.0, 3.0), noon()).await.unwrap();
        let egg = tracker.ledger().foods[0].id.clone();

        let notices = tracker.remove_food(&egg, noon()).await.unwrap();
        assert_eq!(notices, vec![Notification::FoodRemoved { id: egg }]);
        assert_eq!(tracker.totals().calories, 80.0);
        assert_eq!(tracker.store().data().days["2026-01-05"].foods.len(), 1);
    }

    #[tokio::test]
    async fn lowering_goals_re_evaluates() {
        let mut tracker = tracker().await;
        tracker.add_food(&food("Steak", 900.0, 0.0, 80.0), noon()).await.unwrap();

        let input = GoalsInput {
            calories: json!(2000),
            carbs: json!(250),
            protein: json!(50),
            water: json!(8),
        };
        let notices = tracker.set_goals(&input, noon()).await.unwrap();
        assert!(matches!(notices[0], Notification::GoalUpdated { .. }));
        assert!(notices.contains(&Notification::ThresholdExceeded {
            metric: Metric::Protein,
            over_by: 30.0,
        }));
        assert!(!tracker.goals().is_first_run());
        assert_eq!(tracker.goals().goals().calories, 2000.0);
    }

    fn unwritable_path() -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let mut path = std::env::temp_dir();
        path.push(format!("calorie_tracker_missing_{}_{}", std::process::id(), nanos));
        path.push("state.json");
        path
    }

    #[tokio::test]
    async fn failed_save_rolls_nothing_forward() {
        let store = JsonFileStore::open(unwritable_path()).await;
        let mut tracker = Tracker::open(store, noon()).await;

        let err = tracker
            .add_food(&food("Egg", 78.0, 0.6, 6.0), noon())
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Storage(_)));
        assert!(tracker.ledger().foods.is_empty());

        assert!(tracker.add_water().await.is_err());
        assert_eq!(tracker.ledger().water_glasses, 0);

        // Reloading the day must not resurrect the rejected entry.
        let other = NaiveDate::from_ymd_opt(2025, 12, 24).unwrap();
        tracker.select_date(other, noon()).await;
        tracker.select_date(noon().date_naive(), noon()).await;
        assert_eq!(tracker.ledger(), &DailyLedger::empty("2026-01-05"));

        let input = GoalsInput {
            calories: json!(1200),
            carbs: json!(100),
            protein: json!(60),
            water: json!(6),
        };
        assert!(tracker.set_goals(&input, noon()).await.is_err());
        assert!(tracker.goals().is_first_run());
        assert_eq!(*tracker.goals().goals(), DailyGoals::default());
        assert!(tracker.store().load_goals().await.is_none());
    }

    #[test]
    fn gap_moves_forward_within_the_day() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 29).unwrap();
        let gap_start = NaiveTime::from_hms_opt(2, 0, 0).unwrap();
        let gap_end = NaiveTime::from_hms_opt(3, 0, 0).unwrap();
        let resolve = |naive: NaiveDateTime| {
            (naive.time() < gap_start || naive.time() >= gap_end).then(|| naive.and_utc())
        };

        let at = resolve_on_day(day, NaiveTime::from_hms_opt(2, 30, 0).unwrap(), resolve).unwrap();
        assert_eq!(at.date_naive(), day);
        assert_eq!(at.time(), gap_end);

        let at = resolve_on_day(day, NaiveTime::from_hms_opt(9, 5, 0).unwrap(), resolve).unwrap();
        assert_eq!(at.time(), NaiveTime::from_hms_opt(9, 5, 0).unwrap());
    }

    #[test]
    fn gap_at_end_of_day_falls_back_to_midnight() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 4).unwrap();
        let late = NaiveTime::from_hms_opt(23, 0, 0).unwrap();
        let resolve = |naive: NaiveDateTime| (naive.time() < late).then(|| naive.and_utc());

        let at = resolve_on_day(day, NaiveTime::from_hms_opt(23, 50, 0).unwrap(), resolve).unwrap();
        assert_eq!(at, day.and_time(NaiveTime::MIN).and_utc());
    }
}
