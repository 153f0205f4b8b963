// knit-flow/src/pipeline/mod.rs

//! The `Pipeline` type: definition, hook registration and execution.

pub mod definition;
pub mod execution;
pub mod hooks;

pub use definition::Pipeline;
