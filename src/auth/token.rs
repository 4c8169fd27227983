//! Cached token entities, secrets, and expiry evaluation.

pub mod entity;
pub mod expiry;
pub mod secret;
