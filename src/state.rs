use crate::storage::JsonFileStore;
use crate::tracker::Tracker;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<Mutex<Tracker<JsonFileStore>>>,
}

impl AppState {
    pub fn new(tracker: Tracker<JsonFileStore>) -> Self {
        Self {
            tracker: Arc::new(Mutex::new(tracker)),
        }
    }
}
