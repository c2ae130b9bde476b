use super::step::{ExecutionResult, PlanStep};

/// The person running a plan.
///
/// Execution pauses on the operator for manual steps and after any failed
/// step. The progress hooks default to no-ops.
pub trait Operator {
    /// Ask whether a manual step was completed. `true` means done.
    fn confirm_manual(&mut self, step: &PlanStep) -> bool;

    /// Ask whether to keep going after `failed`. Answering `false` stops the run.
    fn confirm_continue(&mut self, failed: &ExecutionResult) -> bool;

    fn on_step_start(&mut self, _step: &PlanStep, _index: usize, _total: usize) {}

    fn on_step_finish(&mut self, _result: &ExecutionResult) {}
}

/// An [`Operator`] with fixed answers.
///
/// Used for `--non-interactive` runs and in tests. Every question asked is
/// recorded by step number.
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    pub manual_answer: bool,
    pub continue_answer: bool,
    pub manual_asked: Vec<u32>,
    pub continue_asked: Vec<u32>,
}

impl ScriptedOperator {
    /// Decline everything: manual steps are skipped and the first failure stops the run.
    pub fn declining() -> Self {
        Self::default()
    }

    pub fn accepting() -> Self {
        Self {
            manual_answer: true,
            continue_answer: true,
            ..Default::default()
        }
    }
}

impl Operator for ScriptedOperator {
    fn confirm_manual(&mut self, step: &PlanStep) -> bool {
        self.manual_asked.push(step.number);
        self.manual_answer
    }

    fn confirm_continue(&mut self, failed: &ExecutionResult) -> bool {
        self.continue_asked.push(failed.step.number);
        self.continue_answer
    }
}
