//! Publishing pipeline.
//!
//! [`Publisher`] drives a run from configuration editing to supersedence;
//! [`decide`] holds the publish-or-skip policy on its own so it can be
//! exercised without the rest of the pipeline.

mod decision;
mod orchestrator;
mod report;

pub use decision::{DecisionReason, PublishDecision, decide, tracked};
pub use orchestrator::Publisher;
pub use report::{PipelineStage, PublishReport};
