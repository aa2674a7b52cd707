//! Render step - hands the timeline to the render engine.
//!
//! Writes the styled subtitle script into the artifact directory, renders,
//! and retries once with fades in place of motion effects when the engine
//! reports an entrance/exit failure. Artifacts are released once the output
//! exists.

use std::path::PathBuf;

use crate::engine::{FilterGraph, RenderOutput, RenderRequest};
use crate::error::ComposeError;
use crate::orchestrator::errors::{StepError, StepResult};
use crate::orchestrator::step::PipelineStep;
use crate::orchestrator::types::{Context, JobState, RenderedOutput, StepOutcome};
use crate::subtitles::{save_ass, save_srt};
use crate::transitions::fade_fallback;

/// Final render of the composition.
pub struct RenderStep;

impl RenderStep {
    pub fn new() -> Self {
        Self
    }

    fn write_subtitles(&self, ctx: &Context, state: &JobState) -> StepResult<Option<PathBuf>> {
        let Some(timeline) = state.timeline.as_ref() else {
            return Ok(None);
        };
        if timeline.phrases.is_empty() {
            return Ok(None);
        }

        let path = ctx.artifacts.path_for("subtitles.ass");
        save_ass(
            &path,
            &timeline.phrases,
            &ctx.settings.subtitles,
            timeline.resolution,
        )?;
        ctx.logger.debug(&format!(
            "Wrote {} subtitle span(s) to {}",
            timeline.phrases.len(),
            path.display()
        ));
        Ok(Some(path))
    }
}

/// Render, keeping the engine's error text in the logger's tail buffer.
fn render_logged(ctx: &Context, request: &RenderRequest) -> Result<RenderOutput, ComposeError> {
    ctx.engines.renderer.render(request).map_err(|e| {
        for line in e.to_string().lines() {
            ctx.logger.output_line(line, true);
        }
        e
    })
}

impl Default for RenderStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineStep for RenderStep {
    fn name(&self) -> &str {
        "Render"
    }

    fn description(&self) -> &str {
        "Composite and encode the output file"
    }

    fn validate_input(&self, ctx: &Context) -> StepResult<()> {
        if let Some(parent) = ctx.spec.output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StepError::io_error("creating output directory", e))?;
            }
        }
        Ok(())
    }

    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<StepOutcome> {
        let timeline = state
            .timeline
            .clone()
            .ok_or_else(|| StepError::precondition_failed("Timeline has not been assembled"))?;

        let subtitles = self.write_subtitles(ctx, state)?;
        let renderer = ctx.engines.renderer.as_ref();

        let mut request = RenderRequest {
            timeline,
            output: ctx.spec.output.clone(),
            subtitles,
            encode: ctx.settings.output.clone(),
            subtitle_style: ctx.settings.subtitles.clone(),
        };

        ctx.logger.info(&format!(
            "Rendering {:.3}s at {} with {}",
            request.timeline.duration,
            request.timeline.resolution,
            renderer.name()
        ));
        if ctx.settings.logging.show_filter_graph {
            match FilterGraph::build(&request) {
                Ok(graph) => ctx.logger.info(&format!("Filter graph: {}", graph.graph())),
                Err(e) => ctx.logger.warn(&format!("Could not build filter graph: {}", e)),
            }
        }

        let mut fallback_used = false;
        let rendered = match render_logged(ctx, &request) {
            Ok(out) => out,
            Err(ComposeError::TransitionRender { kind, message }) => {
                ctx.logger.warn(&format!(
                    "Transition '{}' failed ({}); retrying with fades",
                    kind, message
                ));
                request.timeline.transitions = fade_fallback(&request.timeline.transitions);
                fallback_used = true;
                render_logged(ctx, &request)?
            }
            Err(e) => return Err(e.into()),
        };
        ctx.logger.command(&rendered.command);

        let srt_path = match &ctx.srt_output {
            Some(path) => {
                save_srt(path, &request.timeline.phrases)?;
                ctx.logger
                    .info(&format!("Subtitles exported to {}", path.display()));
                Some(path.clone())
            }
            None => None,
        };

        if let Err(e) = ctx.artifacts.release() {
            ctx.logger
                .warn(&format!("Could not remove temporary files: {}", e));
        }

        state.render = Some(RenderedOutput {
            output_path: rendered.output_path,
            command: rendered.command,
            transitions: request.timeline.transitions,
            fallback_used,
            srt_path,
        });
        Ok(StepOutcome::Success)
    }

    fn validate_output(&self, _ctx: &Context, state: &JobState) -> StepResult<()> {
        let render = state
            .render
            .as_ref()
            .ok_or_else(|| StepError::invalid_output("Render results not recorded"))?;

        if !render.output_path.exists() {
            return Err(StepError::invalid_output(format!(
                "Output file was not created: {}",
                render.output_path.display()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::{FakeRenderer, FakeTts};
    use crate::models::TransitionKind;
    use crate::orchestrator::steps::{MixStep, NarrateStep, ReconcileStep, SequenceStep, TransitionsStep};
    use crate::orchestrator::test_support::TestRun;

    fn prepare(ctx: &Context) -> JobState {
        let mut state = JobState::new("render");
        SequenceStep::new().execute(ctx, &mut state).unwrap();
        NarrateStep::new().execute(ctx, &mut state).unwrap();
        ReconcileStep::new().execute(ctx, &mut state).unwrap();
        MixStep::new().execute(ctx, &mut state).unwrap();
        TransitionsStep::new().execute(ctx, &mut state).unwrap();
        state
    }

    #[test]
    fn renders_with_subtitles_and_releases_artifacts() {
        let run = TestRun::new();
        let ctx = run.context(run.spec().with_script("Hello there. Nice day."));
        let mut state = prepare(&ctx);

        RenderStep::new().validate_input(&ctx).unwrap();
        RenderStep::new().execute(&ctx, &mut state).unwrap();
        RenderStep::new().validate_output(&ctx, &state).unwrap();

        let requests = run.renderer.requests.lock();
        assert_eq!(requests.len(), 1);
        let subtitles = requests[0].subtitles.clone().unwrap();
        assert!(subtitles.ends_with("subtitles.ass"));
        assert!(ctx.artifacts.is_released());
        assert!(!state.render.unwrap().fallback_used);
    }

    #[test]
    fn motion_failure_falls_back_to_fades() {
        let renderer = FakeRenderer {
            fail_motion: true,
            ..Default::default()
        };
        let mut run = TestRun::with_engines(FakeTts::new(0.1), renderer);
        run.settings.transitions.start = TransitionKind::ZoomIn;
        run.settings.transitions.end = TransitionKind::Fade;
        let ctx = run.context(run.spec());
        let mut state = prepare(&ctx);

        RenderStep::new().execute(&ctx, &mut state).unwrap();

        let render = state.render.unwrap();
        assert!(render.fallback_used);
        let entrance = render.transitions.entrance.unwrap();
        assert_eq!(entrance.kind, TransitionKind::Fade);
        assert_eq!(run.renderer.requests.lock().len(), 2);
    }

    #[test]
    fn other_render_failures_are_fatal() {
        let renderer = FakeRenderer {
            fail_always: true,
            ..Default::default()
        };
        let run = TestRun::with_engines(FakeTts::new(0.1), renderer);
        let ctx = run.context(run.spec());
        let mut state = prepare(&ctx);

        let err = RenderStep::new().execute(&ctx, &mut state).unwrap_err();
        assert!(matches!(err, StepError::Compose(ComposeError::Render(_))));
        assert_eq!(run.renderer.requests.lock().len(), 1);
        assert!(ctx.logger.tail().iter().any(|l| l.contains("encoder crashed")));
    }

    #[test]
    fn exports_srt_sidecar() {
        let run = TestRun::new();
        let srt = run.dir.path().join("short.srt");
        let ctx = run
            .context(run.spec().with_script("Hello there. Nice day."))
            .with_srt_output(&srt);
        let mut state = prepare(&ctx);

        RenderStep::new().execute(&ctx, &mut state).unwrap();
        let content = std::fs::read_to_string(&srt).unwrap();
        assert!(content.starts_with("1\n00:00:00,000 --> "));
        assert_eq!(state.render.unwrap().srt_path, Some(srt));
    }
}
