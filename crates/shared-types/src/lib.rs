pub mod error;
pub mod settings;

// Platform domain modules
pub mod chat;
pub mod common;
pub mod complaint;
pub mod geocode;
pub mod help_request;
pub mod map;
pub mod profile;

pub use error::*;
pub use settings::*;

pub use chat::*;
pub use common::*;
pub use complaint::*;
pub use geocode::*;
pub use help_request::*;
pub use map::*;
pub use profile::*;
