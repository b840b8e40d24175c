//! Agent Host Service Library
//!
//! Core functionality for the agent host - a small HTTP service that gates
//! every protected request behind bearer-token authentication:
//!
//! - Key set cache over the authority's JWKS discovery endpoint
//! - RS256 token validation (signature, expiry, audience, issuer)
//! - Process-local session state (registered, trusted token/identity pair)
//! - Access decision gate combining session state and request headers
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> middleware/auth.rs -> auth/validator.rs -> auth/keyset.rs
//! ```
//!
//! # Modules
//!
//! - `auth` - Key set cache, token validator, claims, session state
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `handlers` - HTTP request handlers
//! - `middleware` - The access decision gate
//! - `observability` - Metrics definitions
//! - `routes` - Axum router setup

pub mod auth;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod routes;
