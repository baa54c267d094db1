//! Sequential pipeline execution.

use super::run::{NotificationSource, PipelineRunner, RunHandle};
use super::{ContextPolicy, PipelineBuilder, PipelineConfig};
use crate::cancellation::CancellationToken;
use crate::core::{Prompt, RunOutput, StageEvent, StageRecord};
use crate::errors::{panic_message, PipelineError, PipelineValidationError};
use crate::events::{ChannelEventSink, EventSink};
use crate::generation::TextGenerator;
use crate::stages::{GenerationStage, PreviousOutput, Stage, StageContext};
use crate::utils::elapsed_ms;
use async_trait::async_trait;
use futures::{FutureExt, StreamExt};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, info_span, warn, Instrument};

/// Name of the built-in three-stage pipeline.
pub const PLAN_ACT_REFLECT: &str = "plan_act_reflect";

/// An ordered, validated list of stages.
///
/// Cheap to clone; stages are shared across runs.
#[derive(Clone)]
pub struct Pipeline {
    name: Arc<str>,
    stages: Arc<[Arc<dyn Stage>]>,
    config: PipelineConfig,
}

impl Pipeline {
    pub(crate) fn from_parts(
        name: String,
        stages: Vec<Arc<dyn Stage>>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            name: name.into(),
            stages: stages.into(),
            config,
        }
    }

    /// The plan, act, reflect pipeline over a shared generator.
    ///
    /// # Errors
    ///
    /// Returns an error if the stages fail builder validation.
    pub fn plan_act_reflect(
        generator: Arc<dyn TextGenerator>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineValidationError> {
        PipelineBuilder::new(PLAN_ACT_REFLECT)
            .stage(Arc::new(GenerationStage::plan(Arc::clone(&generator))))?
            .stage(Arc::new(GenerationStage::act(Arc::clone(&generator))))?
            .stage(Arc::new(GenerationStage::reflect(generator)))?
            .with_config(config)
            .build()
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[Arc<dyn Stage>] {
        &self.stages
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Returns the execution settings.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs every stage in order, emitting progress to `sink`.
    ///
    /// Stops at the first failing stage. Cancellation is observed between
    /// stages and while a stage is waiting on generation.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure, a timeout, or [`PipelineError::Cancelled`].
    pub async fn execute(
        &self,
        run_id: &str,
        prompt: &Prompt,
        sink: &dyn EventSink,
        cancel: &CancellationToken,
    ) -> Result<RunOutput, PipelineError> {
        let start = Instant::now();
        sink.emit(StageEvent::pipeline_started(&self.name, run_id, &self.stage_names()));

        let mut records: Vec<StageRecord> = Vec::with_capacity(self.stages.len());

        for (index, stage) in self.stages.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(cancelled_error(cancel));
            }

            let stage_name = stage.name();
            let previous = match self.config.context_policy {
                ContextPolicy::Isolated => None,
                ContextPolicy::Threaded => records.last().map(|r| PreviousOutput {
                    stage: &r.name,
                    output: &r.output,
                }),
            };
            let ctx = StageContext::new(run_id, stage_name, prompt).with_previous(previous);

            sink.emit(StageEvent::started(stage_name, index));
            let stage_start = Instant::now();
            let result = self.run_stage(stage.as_ref(), &ctx, cancel).await;
            let duration_ms = elapsed_ms(stage_start);

            match result {
                Ok(output) => {
                    debug!(stage = stage_name, duration_ms, "Stage completed");
                    sink.emit(StageEvent::completed(stage_name, duration_ms, &output));
                    records.push(StageRecord::new(stage_name, output, duration_ms));
                }
                Err(err) if err.is_cancelled() => {
                    debug!(stage = stage_name, "Stage interrupted by cancellation");
                    return Err(err);
                }
                Err(err) => {
                    warn!(stage = stage_name, error = %err, "Stage failed");
                    sink.emit(StageEvent::failed(stage_name, &err.to_string()));
                    return Err(err);
                }
            }
        }

        let duration_ms = elapsed_ms(start);
        sink.emit(StageEvent::pipeline_completed(&self.name, duration_ms));
        info!(pipeline = %self.name, duration_ms, "Pipeline completed");

        Ok(RunOutput::from_stages(run_id, records, duration_ms))
    }

    async fn run_stage(
        &self,
        stage: &dyn Stage,
        ctx: &StageContext<'_>,
        cancel: &CancellationToken,
    ) -> Result<String, PipelineError> {
        let work = async {
            match self.config.stage_timeout() {
                Some(limit) => match tokio::time::timeout(limit, stage.execute(ctx)).await {
                    Ok(result) => result,
                    Err(_) => Err(PipelineError::Timeout {
                        stage: stage.name().to_string(),
                        timeout_seconds: limit.as_secs_f64(),
                    }),
                },
                None => stage.execute(ctx).await,
            }
        };

        cancel
            .run_until_cancelled(work)
            .await
            .unwrap_or_else(|| Err(cancelled_error(cancel)))
    }

    /// Starts the pipeline on a background task.
    ///
    /// Notifications arrive wrapped in an envelope and end when the task
    /// finishes. A panic inside the task settles the result as
    /// [`PipelineError::Aborted`].
    #[must_use]
    pub fn spawn_run(
        &self,
        run_id: impl Into<String>,
        prompt: Prompt,
        cancel: Arc<CancellationToken>,
    ) -> RunHandle {
        let run_id = run_id.into();
        let (sink, rx) = ChannelEventSink::new();
        let pipeline = self.clone();
        let task_run_id = run_id.clone();
        let span = info_span!("pipeline_run", run_id = %run_id, pipeline = %self.name);

        let task = tokio::spawn(
            async move {
                let output = pipeline.execute(&task_run_id, &prompt, &sink, &cancel).await?;
                Ok::<_, PipelineError>(serde_json::to_value(output)?)
            }
            .instrument(span),
        );

        let result = async move {
            match task.await {
                Ok(result) => result,
                Err(err) if err.is_panic() => {
                    Err(PipelineError::Aborted(panic_message(err.into_panic().as_ref())))
                }
                Err(err) => Err(PipelineError::Aborted(err.to_string())),
            }
        }
        .boxed();

        let notifications =
            NotificationSource::wrapped(UnboundedReceiverStream::new(rx).map(Ok).boxed());

        RunHandle::new(run_id, notifications, result)
    }
}

fn cancelled_error(cancel: &CancellationToken) -> PipelineError {
    PipelineError::Cancelled(cancel.reason().unwrap_or_else(|| "cancelled".to_string()))
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .field("config", &self.config)
            .finish()
    }
}

#[async_trait]
impl PipelineRunner for Pipeline {
    async fn start(
        &self,
        run_id: &str,
        prompt: Prompt,
        cancel: Arc<CancellationToken>,
    ) -> Result<RunHandle, PipelineError> {
        Ok(self.spawn_run(run_id, prompt, cancel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GenerationError;
    use crate::events::CollectingEventSink;
    use crate::generation::{EchoGenerator, MockTextGenerator};
    use crate::pipeline::SourceShape;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    /// Records every instruction and answers with a numbered reply.
    #[derive(Default)]
    struct Recorder {
        instructions: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextGenerator for Recorder {
        async fn generate(&self, instruction: &str) -> Result<String, GenerationError> {
            let mut seen = self.instructions.lock();
            seen.push(instruction.to_string());
            Ok(format!("reply {}", seen.len()))
        }
    }

    struct Stalled;

    #[async_trait]
    impl TextGenerator for Stalled {
        async fn generate(&self, _instruction: &str) -> Result<String, GenerationError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("too late".to_string())
        }
    }

    #[test]
    fn test_plan_act_reflect_shape() {
        let pipeline =
            Pipeline::plan_act_reflect(Arc::new(EchoGenerator::new()), PipelineConfig::new()).unwrap();

        assert_eq!(pipeline.name(), PLAN_ACT_REFLECT);
        assert_eq!(pipeline.stage_names(), vec!["plan", "act", "reflect"]);
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let pipeline = Pipeline::plan_act_reflect(Arc::new(Recorder::default()), PipelineConfig::new()).unwrap();
        let sink = CollectingEventSink::new();
        let cancel = CancellationToken::new();

        let output = pipeline
            .execute("run-1", &Prompt::new("Write a haiku"), &sink, &cancel)
            .await
            .unwrap();

        assert_eq!(
            output.stages.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            vec!["plan", "act", "reflect"]
        );
        assert_eq!(output.output, "reply 3");
        assert_eq!(
            sink.event_types(),
            vec![
                "pipeline.started",
                "stage.started",
                "stage.completed",
                "stage.started",
                "stage.completed",
                "stage.started",
                "stage.completed",
                "pipeline.completed",
            ]
        );
    }

    #[tokio::test]
    async fn test_isolated_policy_uses_prompt_only() {
        let recorder = Arc::new(Recorder::default());
        let pipeline = Pipeline::plan_act_reflect(
            recorder.clone(),
            PipelineConfig::new().with_context_policy(ContextPolicy::Isolated),
        )
        .unwrap();

        pipeline
            .execute("run-1", &Prompt::new("topic"), &CollectingEventSink::new(), &CancellationToken::new())
            .await
            .unwrap();

        let seen = recorder.instructions.lock();
        assert_eq!(seen.len(), 3);
        assert!(seen.iter().all(|i| i.contains("topic")));
        assert!(seen.iter().all(|i| !i.contains("Output of the")));
    }

    #[tokio::test]
    async fn test_threaded_policy_passes_previous_output() {
        let recorder = Arc::new(Recorder::default());
        let pipeline = Pipeline::plan_act_reflect(
            recorder.clone(),
            PipelineConfig::new().with_context_policy(ContextPolicy::Threaded),
        )
        .unwrap();

        pipeline
            .execute("run-1", &Prompt::new("topic"), &CollectingEventSink::new(), &CancellationToken::new())
            .await
            .unwrap();

        let seen = recorder.instructions.lock();
        assert!(!seen[0].contains("Output of the"));
        assert!(seen[1].contains("Output of the plan stage:\nreply 1"));
        assert!(seen[2].contains("Output of the act stage:\nreply 2"));
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_stages() {
        let mut generator = MockTextGenerator::new();
        let mut calls = 0;
        generator.expect_generate().times(2).returning(move |_| {
            calls += 1;
            if calls == 2 {
                Err(GenerationError::new("model overloaded").with_name("HttpError"))
            } else {
                Ok("plan text".to_string())
            }
        });

        let pipeline = Pipeline::plan_act_reflect(Arc::new(generator), PipelineConfig::new()).unwrap();
        let sink = CollectingEventSink::new();

        let err = pipeline
            .execute("run-1", &Prompt::new("x"), &sink, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err.stage_name(), Some("act"));
        assert_eq!(err.name(), "HttpError");
        let failed = sink.matching("stage.failed");
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].stage(), Some("act"));
        assert!(sink.matching("pipeline.completed").is_empty());
    }

    #[tokio::test]
    async fn test_stage_timeout() {
        let pipeline = Pipeline::plan_act_reflect(
            Arc::new(Stalled),
            PipelineConfig::new().with_stage_timeout_seconds(Some(0.05)),
        )
        .unwrap();

        let err = pipeline
            .execute("run-1", &Prompt::new("x"), &CollectingEventSink::new(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Timeout { ref stage, .. } if stage == "plan"));
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let pipeline = Pipeline::plan_act_reflect(Arc::new(EchoGenerator::new()), PipelineConfig::new()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel("client went away");
        let sink = CollectingEventSink::new();

        let err = pipeline
            .execute("run-1", &Prompt::new("x"), &sink, &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(sink.matching("stage.").is_empty());
    }

    #[tokio::test]
    async fn test_cancel_interrupts_running_stage() {
        let pipeline = Pipeline::plan_act_reflect(Arc::new(Stalled), PipelineConfig::new()).unwrap();
        let cancel = Arc::new(CancellationToken::new());
        let sink = CollectingEventSink::new();

        let trigger = Arc::clone(&cancel);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel("client went away");
        });

        let started = Instant::now();
        let err = pipeline
            .execute("run-1", &Prompt::new("x"), &sink, &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(sink.matching("stage.failed").is_empty());
    }

    #[tokio::test]
    async fn test_spawn_run_streams_then_settles() {
        let pipeline = Pipeline::plan_act_reflect(Arc::new(EchoGenerator::new()), PipelineConfig::new()).unwrap();
        let handle = pipeline.spawn_run("run-7", Prompt::new("hello"), Arc::new(CancellationToken::new()));

        assert_eq!(handle.run_id, "run-7");
        assert_eq!(handle.notifications.shape(), SourceShape::Wrapped);

        let notifications: Vec<_> = handle.notifications.into_stream().collect().await;
        assert_eq!(notifications.len(), 8);
        assert!(notifications.iter().all(Result::is_ok));

        let result = handle.result.await.unwrap();
        assert_eq!(result["run_id"], "run-7");
        assert!(result["output"].as_str().unwrap().starts_with("[echo]"));
    }

    #[tokio::test]
    async fn test_runner_start_uses_pipeline() {
        let pipeline = Pipeline::plan_act_reflect(Arc::new(EchoGenerator::new()), PipelineConfig::new()).unwrap();
        let runner: Arc<dyn PipelineRunner> = Arc::new(pipeline);

        let handle = runner
            .start("run-2", Prompt::new("hi"), Arc::new(CancellationToken::new()))
            .await
            .unwrap();
        let _ = handle.notifications.into_stream().count().await;

        assert!(handle.result.await.is_ok());
    }
}
