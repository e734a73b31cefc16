//! Engineer portal client core (session, gateway, auth gate, tasks).

pub mod api;
pub mod config;
pub mod error;
pub mod gate;
pub mod gateway;
pub mod logging;
pub mod portal;
pub mod prober;
pub mod session;
pub mod stats;
pub mod tasks;

pub use error::{ApiError, ApiErrorKind};
pub use portal::Portal;
