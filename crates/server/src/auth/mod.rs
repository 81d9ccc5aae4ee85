//! Bearer-token authentication.
//!
//! Tokens are issued by the external identity provider and signed with a
//! shared HS256 secret. The middleware only attaches [`jwt::Claims`] to the
//! request; the extractors decide what each handler requires.

pub mod extractors;
pub mod jwt;
pub mod middleware;
