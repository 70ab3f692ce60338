//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels.

pub mod http;
pub mod tick;
pub mod wifi;

pub use http::http_task;
pub use tick::app_task;
pub use wifi::{net_task, wifi_task};
