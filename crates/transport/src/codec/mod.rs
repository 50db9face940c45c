//! Message codecs
//!
//! Both forms are lossy in one direction only: anything that fails to parse
//! on the way in becomes an absent field, never an error.

mod dict;
mod schema;

pub use dict::{from_dict, timestamps_from_value, timestamps_to_dict, to_dict};
pub use schema::{from_proto, to_proto};

/// Round to two decimals (durations on the wire)
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
