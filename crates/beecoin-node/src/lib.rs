pub mod api;
pub mod config;
mod constants;
pub mod peers;
pub mod state;

pub use api::router;
pub use config::NodeConfig;
pub use state::AppState;
