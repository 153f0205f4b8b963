// knit-flow/src/pipeline/execution.rs

//! `Pipeline::run()`: executes the steps and handlers in order.

use crate::core::context::Handler;
use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult, RunSummary, SoftFailure};
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, span, Instrument, Level};

enum PhaseOutcome<Err> {
  Continue,
  Stop,
  Failed(Err),
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Executes the pipeline against the shared context `ctx_data`.
  ///
  /// A failing handler on a non-optional step ends the run with that error.
  /// On an optional step the failure is recorded in the returned
  /// [`RunSummary`] and the run moves on to the next step.
  #[instrument(
        name = "Pipeline::run",
        skip_all,
        fields(
            context_type = %std::any::type_name::<TData>(),
            num_steps = self.steps.len(),
        ),
        err(Display)
    )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<RunSummary, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");
    let mut summary = RunSummary::new();

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name = step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      if let Some(skip_cond_fn) = &step_def.skip_if {
        if skip_cond_fn(ctx_data.clone()) {
          step_span.in_scope(|| event!(Level::INFO, "Step skipped by its skip condition."));
          summary.skipped_steps.push(step_def.name.clone());
          continue;
        }
      }

      let phases = [
        ("before", self.before.get(step_name)),
        ("on", self.on.get(step_name)),
        ("after", self.after.get(step_name)),
      ];

      if phases.iter().all(|(_, handlers)| handlers.map_or(true, |v| v.is_empty())) {
        if step_def.optional {
          step_span.in_scope(|| event!(Level::DEBUG, "Optional step has no handlers, skipping."));
          summary.skipped_steps.push(step_def.name.clone());
          continue;
        }
        step_span.in_scope(|| event!(Level::ERROR, "Non-optional step has no handlers."));
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      summary.executed_steps.push(step_def.name.clone());

      for (phase_name, handlers) in phases {
        let Some(handlers) = handlers else { continue };
        let outcome = Self::run_phase(phase_name, handlers, &ctx_data)
          .instrument(step_span.clone())
          .await;

        match outcome {
          PhaseOutcome::Continue => {}
          PhaseOutcome::Stop => {
            step_span.in_scope(|| event!(Level::INFO, phase = phase_name, "Pipeline stopped by a handler."));
            summary.result = PipelineResult::Stopped;
            return Ok(summary);
          }
          PhaseOutcome::Failed(e) if step_def.optional => {
            step_span.in_scope(|| event!(Level::WARN, error = %e, "Optional step failed; continuing."));
            summary.soft_failures.push(SoftFailure {
              step_name: step_def.name.clone(),
              message: e.to_string(),
            });
            // Remaining phases of a failed optional step are not run.
            break;
          }
          PhaseOutcome::Failed(e) => {
            step_span.in_scope(|| event!(Level::ERROR, error = %e, phase = phase_name, "Step failed."));
            return Err(e);
          }
        }
      }
      step_span.in_scope(|| event!(Level::DEBUG, "Step finished."));
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(summary)
  }

  async fn run_phase(
    phase_name: &'static str,
    handlers: &[Handler<TData, Err>],
    ctx_data: &ContextData<TData>,
  ) -> PhaseOutcome<Err> {
    for (handler_idx, handler_fn) in handlers.iter().enumerate() {
      let handler_span = span!(Level::DEBUG, "handler", phase = phase_name, handler_index = handler_idx);
      match handler_fn(ctx_data.clone()).instrument(handler_span).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => return PhaseOutcome::Stop,
        Err(e) => return PhaseOutcome::Failed(e),
      }
    }
    PhaseOutcome::Continue
  }
}
