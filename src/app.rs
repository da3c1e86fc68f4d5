use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/goals", get(handlers::get_goals).put(handlers::set_goals))
        .route("/api/ledger", get(handlers::get_ledger))
        .route("/api/date", post(handlers::select_date))
        .route("/api/foods", post(handlers::add_food))
        .route("/api/foods/:id", delete(handlers::remove_food))
        .route("/api/water/add", post(handlers::add_water))
        .route("/api/water/remove", post(handlers::remove_water))
        .route("/api/totals", get(handlers::get_totals))
        .route("/api/alerts", get(handlers::get_alerts))
        .with_state(state)
}
