//! Pipeline step trait definition.
//!
//! All pipeline steps implement this trait, providing a consistent
//! interface for validation and execution.

use async_trait::async_trait;

use super::errors::StepResult;
use super::types::{Context, SessionState, StepOutcome};

/// Trait for pipeline steps.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - Check preconditions before execution
/// 2. `execute` - Perform the step's work
/// 3. `validate_output` - Verify the step produced valid output
///
/// Validation is synchronous; only `execute` touches the network or
/// spawns subprocesses.
#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// Get the step name (for logging and error context).
    fn name(&self) -> &str;

    /// Validate inputs before execution.
    fn validate_input(&self, ctx: &Context, state: &SessionState) -> StepResult<()>;

    /// Execute the step's main work.
    ///
    /// Returns `StepOutcome::Success` on completion, or
    /// `StepOutcome::Skipped` if the step determined it should be
    /// skipped (not an error).
    async fn execute(&self, ctx: &Context, state: &mut SessionState) -> StepResult<StepOutcome>;

    /// Validate outputs after execution.
    ///
    /// Called after `execute` returns `Success`.
    fn validate_output(&self, ctx: &Context, state: &SessionState) -> StepResult<()>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Step that counts executions and optionally skips or fails.
    pub struct ScriptedStep {
        pub step_name: &'static str,
        pub executions: Arc<AtomicUsize>,
        pub skip_reason: Option<String>,
        pub fail_message: Option<String>,
    }

    impl ScriptedStep {
        pub fn succeeding(name: &'static str, counter: Arc<AtomicUsize>) -> Self {
            Self {
                step_name: name,
                executions: counter,
                skip_reason: None,
                fail_message: None,
            }
        }
    }

    #[async_trait]
    impl PipelineStep for ScriptedStep {
        fn name(&self) -> &str {
            self.step_name
        }

        fn validate_input(&self, _ctx: &Context, _state: &SessionState) -> StepResult<()> {
            Ok(())
        }

        async fn execute(
            &self,
            _ctx: &Context,
            _state: &mut SessionState,
        ) -> StepResult<StepOutcome> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            if let Some(message) = &self.fail_message {
                return Err(crate::orchestrator::StepError::invalid_input(message.clone()));
            }
            if let Some(reason) = &self.skip_reason {
                return Ok(StepOutcome::Skipped(reason.clone()));
            }
            Ok(StepOutcome::Success)
        }

        fn validate_output(&self, _ctx: &Context, _state: &SessionState) -> StepResult<()> {
            Ok(())
        }
    }
}
