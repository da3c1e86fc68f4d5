use crate::errors::AppError;
use crate::models::{
    parse_date_key, Alert, CommandResponse, FoodInput, GoalsInput, GoalsResponse, LedgerView,
    Notification, SelectDateRequest, Totals,
};
use crate::state::AppState;
use crate::storage::JsonFileStore;
use crate::tracker::Tracker;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Local;

pub async fn get_goals(State(state): State<AppState>) -> Json<GoalsResponse> {
    let tracker = state.tracker.lock().await;
    let goals = tracker.goals();
    Json(GoalsResponse {
        goals: *goals.goals(),
        first_run: goals.is_first_run(),
    })
}

pub async fn set_goals(
    State(state): State<AppState>,
    Json(payload): Json<GoalsInput>,
) -> Result<Json<CommandResponse>, AppError> {
    let now = Local::now();
    let mut tracker = state.tracker.lock().await;
    let notifications = tracker.set_goals(&payload, now).await?;
    Ok(respond(&tracker, notifications))
}

pub async fn get_ledger(State(state): State<AppState>) -> Json<LedgerView> {
    let tracker = state.tracker.lock().await;
    Json(tracker.view(Local::now()))
}

pub async fn select_date(
    State(state): State<AppState>,
    Json(payload): Json<SelectDateRequest>,
) -> Result<Json<CommandResponse>, AppError> {
    let date = parse_date_key(&payload.date)
        .ok_or_else(|| AppError::bad_request("date must be formatted as YYYY-MM-DD"))?;

    let now = Local::now();
    let mut tracker = state.tracker.lock().await;
    let notifications = tracker.select_date(date, now).await;
    Ok(respond(&tracker, notifications))
}

pub async fn add_food(
    State(state): State<AppState>,
    Json(payload): Json<FoodInput>,
) -> Result<Json<CommandResponse>, AppError> {
    let now = Local::now();
    let mut tracker = state.tracker.lock().await;
    let notifications = tracker.add_food(&payload, now).await?;
    Ok(respond(&tracker, notifications))
}

pub async fn remove_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CommandResponse>, AppError> {
    let now = Local::now();
    let mut tracker = state.tracker.lock().await;
    let notifications = tracker.remove_food(&id, now).await?;
    Ok(respond(&tracker, notifications))
}

pub async fn add_water(State(state): State<AppState>) -> Result<Json<CommandResponse>, AppError> {
    let mut tracker = state.tracker.lock().await;
    let notifications = tracker.add_water().await?;
    Ok(respond(&tracker, notifications))
}

pub async fn remove_water(
    State(state): State<AppState>,
) -> Result<Json<CommandResponse>, AppError> {
    let mut tracker = state.tracker.lock().await;
    let notifications = tracker.remove_water().await?;
    Ok(respond(&tracker, notifications))
}

pub async fn get_totals(State(state): State<AppState>) -> Json<Totals> {
    let tracker = state.tracker.lock().await;
    Json(tracker.totals())
}

pub async fn get_alerts(State(state): State<AppState>) -> Json<Vec<Alert>> {
    let tracker = state.tracker.lock().await;
    Json(tracker.alerts())
}

fn respond(
    tracker: &Tracker<JsonFileStore>,
    notifications: Vec<Notification>,
) -> Json<CommandResponse> {
    Json(CommandResponse {
        ledger: tracker.view(Local::now()),
        notifications,
    })
}
