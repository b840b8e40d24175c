//! HTTP request handlers for Agent Host.

pub mod health;
pub mod me;
pub mod metrics;
pub mod register;
pub mod status;

pub use health::health_check;
pub use me::get_me;
pub use metrics::metrics_handler;
pub use register::register;
pub use status::get_status;
