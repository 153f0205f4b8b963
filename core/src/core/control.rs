// knit-flow/src/core/control.rs

//! Signals for controlling pipeline flow and the outcome of a pipeline run.

/// Signal from a handler indicating whether the pipeline should continue or stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineControl {
  /// Continue with the remaining handlers and steps.
  Continue,
  /// Halt the pipeline. No further handlers in this step or later steps run.
  Stop,
}

/// How a pipeline run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineResult {
  /// Every non-skipped step ran to completion.
  Completed,
  /// A handler returned `PipelineControl::Stop`.
  Stopped,
}

/// A handler failure on an optional step, recorded instead of aborting the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftFailure {
  pub step_name: String,
  pub message: String,
}

/// Report returned by `Pipeline::run`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
  pub result: PipelineResult,
  /// Steps whose handlers ran (in order), excluding skipped ones.
  pub executed_steps: Vec<String>,
  pub skipped_steps: Vec<String>,
  pub soft_failures: Vec<SoftFailure>,
}

impl RunSummary {
  pub(crate) fn new() -> Self {
    Self {
      result: PipelineResult::Completed,
      executed_steps: Vec::new(),
      skipped_steps: Vec::new(),
      soft_failures: Vec::new(),
    }
  }

  pub fn is_completed(&self) -> bool {
    self.result == PipelineResult::Completed
  }

  pub fn soft_failure_for(&self, step_name: &str) -> Option<&SoftFailure> {
    self.soft_failures.iter().find(|f| f.step_name == step_name)
  }
}
