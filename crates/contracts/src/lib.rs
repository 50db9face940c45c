//! # Contracts
//!
//! Shared interface contracts for every pipeline crate: the [`Message`] that
//! flows through all stages, the typed payloads stages produce, the [`Stage`]
//! trait and the pipeline blueprint. Business crates depend on this crate,
//! never the other way around.
//!
//! ## Time Model
//! - Timestamps are wall-clock epoch seconds (`f64`), the same clock the wire
//!   formats carry as `*_timestamp` numbers
//! - A stage's duration is only defined once both start and completion exist

mod blueprint;
mod error;
mod message;
mod payload;
mod stage;

pub use blueprint::*;
pub use error::*;
pub use message::*;
pub use payload::*;
pub use stage::*;
