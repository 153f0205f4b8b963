pub mod context;
pub mod context_data;
pub mod control;
pub mod step;

pub use context::Handler;
pub use context_data::ContextData;
pub use control::{PipelineControl, PipelineResult, RunSummary, SoftFailure};
pub use step::{SkipCondition, StepDef};
