use std::sync::Arc;

use slate_db::Database;
use slate_engine::LifecycleEngine;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub engine: LifecycleEngine,
}

impl AppStateInner {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            engine: LifecycleEngine::new(db.clone()),
            db,
        }
    }
}
