//! Domain workflows behind the REST handlers.
//!
//! Functions here take store trait objects rather than `AppState`, so each
//! workflow can be exercised against the in-memory stores directly.

pub mod complaints;
pub mod help_requests;
pub mod media;
pub mod moderation;
pub mod profiles;
pub mod submission;
