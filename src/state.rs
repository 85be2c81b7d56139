use crate::config::Config;
use crate::storage::RowStore;
use crate::view::ViewController;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RowStore>,
    pub controller: Arc<Mutex<ViewController>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: RowStore, controller: ViewController, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            controller: Arc::new(Mutex::new(controller)),
            config: Arc::new(config),
        }
    }
}
