// Infrastructure module - Background services and utilities
pub mod http;
pub mod task_manager;
pub mod timer;

pub use http::{ApiClient, api_base_url};
pub use task_manager::TaskManager;
pub use timer::Timer;
