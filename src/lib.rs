pub mod api;
pub mod args;
pub mod config;
pub mod dashboard;
pub mod domain;
pub mod error;
pub mod render;
pub mod session;
pub mod transform;
pub mod utils;
pub mod view;

pub use args::Args;
pub use config::Config;
pub use dashboard::{Dashboard, Outcome};
pub use error::{ApiError, SessionError};
pub use session::{SessionRecord, SessionStore};
pub use transform::{transform, EngineStats, HistoryPoint, ViewModelItem};
pub use view::DashboardView;
