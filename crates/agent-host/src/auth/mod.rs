//! Authentication subsystem.
//!
//! Leaf-first: [`keyset`] caches the authority's published signing keys,
//! [`validator`] verifies bearer tokens against them, [`claims`] carries the
//! verified payload and its identity projection, and [`session`] tracks the
//! process-local registered/trusted state consumed by the access gate.

pub mod claims;
pub mod keyset;
pub mod session;
pub mod validator;

pub use claims::{Claims, UserInfo};
pub use keyset::{KeySet, KeySetCache, KeySetError};
pub use session::{Session, SessionSnapshot};
pub use validator::TokenValidator;
