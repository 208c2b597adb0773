pub mod api;
pub mod catalog;
pub mod catches;
pub mod config;
pub mod db;
pub mod ui;

pub use db::DbPool;

use config::Config;

pub struct AppState {
    pub config: Config,
    pub db: DbPool,
}

impl AppState {
    pub fn new(config: Config, db: DbPool) -> Self {
        Self { config, db }
    }
}
