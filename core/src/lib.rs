// knit-flow/src/lib.rs

//! knit-flow: a small asynchronous step-pipeline engine.
//!
//! A pipeline is an ordered list of named steps. Each step can carry
//! `before`, `on` and `after` handlers that run against a shared,
//! lockable context (`ContextData<T>`). Handlers decide whether the run
//! continues or stops, and may fail with the pipeline's error type.
//!
//! Steps marked optional are best-effort: a failing handler on an optional
//! step is logged and recorded in the [`RunSummary`] instead of aborting
//! the run. This is what the storefront checkout uses for the order
//! confirmation email, which must never undo a placed order.

pub mod core;
pub mod error;
pub mod pipeline;

// --- Re-exports for the Public API ---

pub use crate::core::context::Handler;
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult, RunSummary, SoftFailure};
pub use crate::core::step::{SkipCondition, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};
