// tests/pipeline_execution_tests.rs
mod common;

use common::*;
use knit_flow::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult};
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
async fn test_pipeline_runs_steps_in_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<OrderFlowContext, TestError>::new(&[
    ("customer", false, None),
    ("order", false, None),
    ("items", false, None),
  ]);

  pipeline.on_handler("customer", recording_handler("customer", " C"));
  pipeline.on_handler("order", recording_handler("order", " O"));
  pipeline.on_handler("items", recording_handler("items", " I"));

  let ctx = ContextData::new(OrderFlowContext::default());
  let summary = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(summary.result, PipelineResult::Completed);
  assert_eq!(summary.executed_steps, vec!["customer", "order", "items"]);
  assert!(summary.soft_failures.is_empty());

  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.trail, " C O I");
}

#[tokio::test]
#[serial]
async fn test_pipeline_stops_on_pipeline_control_stop() {
  setup_tracing();
  let mut pipeline = Pipeline::<OrderFlowContext, TestError>::new(&[
    ("stepA", false, None),
    ("stopStep", false, None),
    ("stepC", false, None),
  ]);

  pipeline.on_handler("stepA", recording_handler("stepA", "A"));
  pipeline.on_root("stopStep", |ctx: ContextData<OrderFlowContext>| {
    Box::pin(async move {
      ctx.write().steps_executed.push("stopStep".to_string());
      Ok::<PipelineControl, FlowError>(PipelineControl::Stop)
    })
  });
  pipeline.on_handler("stepC", recording_handler("stepC", "C"));

  let ctx = ContextData::new(OrderFlowContext::default());
  let summary = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(summary.result, PipelineResult::Stopped);
  let guard = ctx.read();
  assert_eq!(guard.trail, "A");
  assert_eq!(guard.steps_executed, vec!["stepA", "stopStep"]);
}

#[tokio::test]
#[serial]
async fn test_pipeline_propagates_handler_error_from_required_step() {
  setup_tracing();
  let mut pipeline = Pipeline::<OrderFlowContext, TestError>::new(&[
    ("good_step", false, None),
    ("bad_step", false, None),
    ("never_step", false, None),
  ]);

  pipeline.on_handler("good_step", recording_handler("good_step", "Good"));
  pipeline.on_handler("bad_step", failing_handler("bad_step", "insert rejected"));
  pipeline.on_handler("never_step", recording_handler("never_step", "Never"));

  let ctx = ContextData::new(OrderFlowContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("insert rejected".to_string()));
  let guard = ctx.read();
  assert_eq!(guard.trail, "Good");
  assert_eq!(guard.steps_executed, vec!["good_step", "bad_step"]);
}

#[tokio::test]
#[serial]
async fn test_optional_step_failure_is_recorded_and_run_continues() {
  setup_tracing();
  let mut pipeline = Pipeline::<OrderFlowContext, TestError>::new(&[
    ("place", false, None),
    ("notify", true, None),
    ("finish", false, None),
  ]);

  pipeline.on_handler("place", recording_handler("place", "P"));
  pipeline.on_handler("notify", failing_handler("notify", "mail transport down"));
  pipeline.after_root("notify", |ctx: ContextData<OrderFlowContext>| {
    Box::pin(async move {
      // Must not run: the optional step already failed in its `on` phase.
      ctx.write().trail.push_str("!");
      Ok::<_, TestError>(PipelineControl::Continue)
    })
  });
  pipeline.on_handler("finish", recording_handler("finish", "F"));

  let ctx = ContextData::new(OrderFlowContext::default());
  let summary = pipeline.run(ctx.clone()).await.unwrap();

  assert!(summary.is_completed());
  assert_eq!(summary.soft_failures.len(), 1);
  let failure = summary.soft_failure_for("notify").unwrap();
  assert!(failure.message.contains("mail transport down"));
  assert_eq!(ctx.read().trail, "PF");
}

#[tokio::test]
#[serial]
async fn test_pipeline_skips_step_if_condition_met() {
  setup_tracing();
  let mut pipeline = Pipeline::<OrderFlowContext, TestError>::new(&[
    ("step1", false, None),
    (
      "step_to_skip",
      false,
      Some(Arc::new(|ctx: ContextData<OrderFlowContext>| ctx.read().counter > 0)),
    ),
    ("step3", false, None),
  ]);

  pipeline.on_handler("step1", recording_handler("step1", " S1"));
  pipeline.on_handler("step_to_skip", recording_handler("step_to_skip", " SKIPPED"));
  pipeline.on_handler("step3", recording_handler("step3", " S3"));

  let ctx = ContextData::new(OrderFlowContext::default());
  let summary = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(summary.skipped_steps, vec!["step_to_skip"]);
  assert_eq!(ctx.read().trail, " S1 S3");
}

#[tokio::test]
#[serial]
async fn test_optional_step_missing_handler_succeeds() {
  setup_tracing();
  let pipeline = Pipeline::<OrderFlowContext, TestError>::new(&[("optional_step_no_handler", true, None)]);

  let summary = pipeline.run(ContextData::new(OrderFlowContext::default())).await.unwrap();

  assert_eq!(summary.result, PipelineResult::Completed);
  assert_eq!(summary.skipped_steps, vec!["optional_step_no_handler"]);
}

#[tokio::test]
#[serial]
async fn test_before_on_after_execution_order() {
  setup_tracing();
  let mut pipeline = Pipeline::<OrderFlowContext, TestError>::new(&[("main_step", false, None)]);

  pipeline.before_root("main_step", recording_handler("before_main", "Before;"));
  pipeline.on_root("main_step", recording_handler("on_main", "On;"));
  pipeline.after_root("main_step", recording_handler("after_main", "After;"));

  let ctx = ContextData::new(OrderFlowContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  let guard = ctx.read();
  assert_eq!(guard.trail, "Before;On;After;");
  assert_eq!(guard.steps_executed, vec!["before_main", "on_main", "after_main"]);
}

#[tokio::test]
#[serial]
async fn test_structural_changes_reorder_execution() {
  setup_tracing();
  let mut pipeline = Pipeline::<OrderFlowContext, TestError>::new(&[("a", false, None), ("c", false, None)]);
  pipeline.insert_after_step("a", "b", false, None).unwrap();
  pipeline.insert_before_step("a", "zero", true, None).unwrap();
  assert_eq!(pipeline.step_names(), vec!["zero", "a", "b", "c"]);

  pipeline.on_handler("a", recording_handler("a", "a"));
  pipeline.on_handler("b", recording_handler("b", "b"));
  pipeline.on_handler("c", recording_handler("c", "c"));
  pipeline.remove_step("c");

  let ctx = ContextData::new(OrderFlowContext::default());
  let summary = pipeline.run(ctx.clone()).await.unwrap();

  assert_eq!(summary.executed_steps, vec!["a", "b"]);
  assert_eq!(ctx.read().trail, "ab");
}
