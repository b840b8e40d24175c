//! Middleware for Agent Host.
//!
//! # Components
//!
//! - `auth` - Access decision gate for protected routes

pub mod auth;

pub use auth::{access_gate, GateState};
