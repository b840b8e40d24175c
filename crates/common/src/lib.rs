//! Common utilities shared across Agent Host components.

#![warn(clippy::pedantic)]

/// Module for JWT utilities (header inspection, size limits)
pub mod jwt;
