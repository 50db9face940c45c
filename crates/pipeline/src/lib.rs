//! # Pipeline
//!
//! Orchestration core.
//!
//! Responsibilities:
//! - Bind each stage name to a local implementation or a remote stub
//! - Run the top-level chain one stage at a time, stamping the timeline
//! - Fan out to the four content sub-stages and merge their results
//!
//! ## Usage Example
//!
//! ```ignore
//! use contracts::{Message, PipelineBlueprint};
//! use pipeline::Pipeline;
//!
//! let pipeline = Pipeline::from_blueprint(&PipelineBlueprint::default())?;
//! let message = pipeline.run(Message::new("A space adventure about robots")).await?;
//! timeline::display(&message);
//! ```

mod binding;
mod error;
mod hub;
mod runner;

pub use binding::{hosted_stage, resolve_binding, StageBinding};
pub use error::PipelineError;
pub use hub::ParallelHub;
pub use runner::Pipeline;
