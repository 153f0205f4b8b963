// tests/common/mod.rs
#![allow(dead_code)]

use knit_flow::{ContextData, FlowError, PipelineControl};
use tracing::Level;

/// A stand-in for an order workflow context: each handler records itself.
#[derive(Clone, Debug, Default)]
pub struct OrderFlowContext {
  pub counter: i32,
  pub trail: String,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow error: {0}")]
  Flow(String), // FlowError is not PartialEq, keep its Debug text

  #[error("handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{:?}", fe))
  }
}

pub fn recording_handler(
  step_name: &'static str,
  trail_piece: &'static str,
) -> knit_flow::Handler<OrderFlowContext, TestError> {
  Box::new(move |ctx: ContextData<OrderFlowContext>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.trail.push_str(trail_piece);
      guard.steps_executed.push(step_name.to_string());
      tracing::debug!(target: "test_handlers", step = step_name, counter = guard.counter, "executed");
      if guard.should_stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> knit_flow::Handler<OrderFlowContext, TestError> {
  Box::new(move |ctx: ContextData<OrderFlowContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      tracing::warn!(target: "test_handlers", step = step_name, "failing with: '{}'", error_message);
      Err(TestError::Handler(error_message.to_string()))
    })
  })
}

use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
