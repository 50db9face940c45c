//! # Timeline
//!
//! Per-stage execution timeline.
//!
//! - [`TimelineTracker`] stamps received/started/completed times onto a
//!   message for a named stage; every call re-stamps, nothing is duplicated
//! - [`render`] / [`display`] build the human-readable execution report

mod report;
mod tracker;

pub use report::{display, format_instant, format_rfc3339, format_time_of_day, render};
pub use tracker::TimelineTracker;
