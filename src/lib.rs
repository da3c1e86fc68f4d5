pub mod app;
pub mod config;
pub mod errors;
pub mod goals;
pub mod handlers;
pub mod ledger;
pub mod models;
pub mod state;
pub mod storage;
pub mod thresholds;
pub mod totals;
pub mod tracker;

pub use app::router;
pub use config::AppConfig;
pub use state::AppState;
pub use storage::JsonFileStore;
pub use tracker::Tracker;
