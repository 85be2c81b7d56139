pub mod app;
pub mod chart;
pub mod client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod state;
pub mod stats;
pub mod storage;
pub mod ui;
pub mod view;

pub use app::router;
pub use client::ApiClient;
pub use config::Config;
pub use state::AppState;
pub use storage::{RowStore, load_store};
pub use view::ViewController;
