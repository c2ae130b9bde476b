use serde::{Deserialize, Serialize};

use super::executor::StepExecutor;
use super::operator::Operator;
use super::step::{ExecutionResult, PlanStep};

/// Aggregate of one plan run.
///
/// Counters are always derived from `results`; rebuilding the summary from
/// the same results gives the same numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSummary {
    pub results: Vec<ExecutionResult>,
    pub success_count: usize,
    pub failure_count: usize,
    /// The operator stopped the run after a failed step.
    pub aborted: bool,
    pub total_duration_ms: u64,
}

impl PlanSummary {
    pub fn from_results(results: Vec<ExecutionResult>, aborted: bool) -> Self {
        let success_count = results.iter().filter(|r| r.success).count();
        let failure_count = results.len() - success_count;
        let total_duration_ms = results.iter().map(|r| r.duration_ms).sum();
        Self {
            results,
            success_count,
            failure_count,
            aborted,
            total_duration_ms,
        }
    }

    /// Steps never attempted because the run stopped early.
    pub fn skipped(&self, total_steps: usize) -> usize {
        total_steps.saturating_sub(self.results.len())
    }

    /// No step failed and the run was not stopped.
    pub fn all_succeeded(&self) -> bool {
        self.failure_count == 0 && !self.aborted
    }
}

/// Execute `steps` in sequence order.
///
/// Execution order is the slice order; `PlanStep::number` is only used for
/// messages. After a failed step the operator decides whether to continue;
/// declining stops the run and returns the partial results.
pub fn run_plan(
    steps: &[PlanStep],
    executor: &StepExecutor,
    operator: &mut dyn Operator,
) -> PlanSummary {
    let total = steps.len();
    let mut results = Vec::with_capacity(total);
    let mut aborted = false;

    for (index, step) in steps.iter().enumerate() {
        operator.on_step_start(step, index, total);
        let result = executor.execute_step(step, index + 1, operator);
        operator.on_step_finish(&result);

        let stop = !result.success && !operator.confirm_continue(&result);
        results.push(result);

        if stop {
            tracing::info!(step = index + 1, remaining = total - index - 1, "plan run stopped after failure");
            aborted = true;
            break;
        }
    }

    PlanSummary::from_results(results, aborted)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlanConfig;
    use crate::plan::operator::ScriptedOperator;
    use crate::plan::step::StepType;
    use chrono::Utc;
    use tempfile::TempDir;

    fn executor(dir: &TempDir) -> StepExecutor {
        StepExecutor::new(dir.path(), &PlanConfig::default())
    }

    fn cmd(n: u32, command: &str) -> PlanStep {
        PlanStep::new(n, format!("step {n}"), StepType::Command).with_command(command)
    }

    fn result(success: bool, duration_ms: u64) -> ExecutionResult {
        ExecutionResult {
            step: PlanStep::new(1, "x", StepType::Manual),
            success,
            output: None,
            error: None,
            duration_ms,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn all_steps_succeed() {
        let dir = TempDir::new().unwrap();
        let steps = vec![cmd(1, "echo a"), cmd(2, "echo b"), cmd(3, "echo c")];
        let mut op = ScriptedOperator::declining();
        let summary = run_plan(&steps, &executor(&dir), &mut op);
        assert_eq!(summary.results.len(), 3);
        assert_eq!(summary.success_count, 3);
        assert_eq!(summary.failure_count, 0);
        assert!(!summary.aborted);
        assert!(summary.all_succeeded());
        assert!(op.continue_asked.is_empty());
    }

    #[test]
    fn failure_stops_when_operator_declines() {
        let dir = TempDir::new().unwrap();
        let steps = vec![cmd(1, "echo a"), cmd(2, "exit 1"), cmd(3, "touch never")];
        let mut op = ScriptedOperator::declining();
        let summary = run_plan(&steps, &executor(&dir), &mut op);
        assert_eq!(summary.results.len(), 2);
        assert_eq!(summary.success_count, 1);
        assert_eq!(summary.failure_count, 1);
        assert!(summary.aborted);
        assert_eq!(summary.skipped(steps.len()), 1);
        assert_eq!(op.continue_asked, [2]);
        assert!(!dir.path().join("never").exists());
    }

    #[test]
    fn failure_continues_when_operator_agrees() {
        let dir = TempDir::new().unwrap();
        let steps = vec![cmd(1, "exit 1"), cmd(2, "exit 3"), cmd(3, "touch reached")];
        let mut op = ScriptedOperator::accepting();
        let summary = run_plan(&steps, &executor(&dir), &mut op);
        assert_eq!(summary.results.len(), 3);
        assert_eq!(summary.failure_count, 2);
        assert!(!summary.aborted);
        assert!(!summary.all_succeeded());
        assert_eq!(op.continue_asked, [1, 2]);
        assert!(dir.path().join("reached").exists());
    }

    #[test]
    fn runs_in_sequence_order_not_number_order() {
        let dir = TempDir::new().unwrap();
        let steps = vec![cmd(2, "echo first >> log"), cmd(1, "echo second >> log")];
        run_plan(&steps, &executor(&dir), &mut ScriptedOperator::declining());
        let log = std::fs::read_to_string(dir.path().join("log")).unwrap();
        assert_eq!(log, "first\nsecond\n");
    }

    #[test]
    fn unknown_type_participates_in_continue_flow() {
        let dir = TempDir::new().unwrap();
        let steps = vec![
            PlanStep::new(1, "Deploy", StepType::Unknown("deploy".into())),
            cmd(2, "echo ok"),
        ];
        let mut op = ScriptedOperator::accepting();
        let summary = run_plan(&steps, &executor(&dir), &mut op);
        assert_eq!(summary.results.len(), 2);
        assert_eq!(summary.success_count, 1);
        assert_eq!(
            summary.results[0].error.as_deref(),
            Some("Unknown step type: deploy")
        );
    }

    #[test]
    fn empty_plan_is_empty_summary() {
        let dir = TempDir::new().unwrap();
        let summary = run_plan(&[], &executor(&dir), &mut ScriptedOperator::declining());
        assert!(summary.results.is_empty());
        assert_eq!(summary.success_count + summary.failure_count, 0);
        assert!(!summary.aborted);
    }

    #[test]
    fn summary_counts_always_add_up() {
        let patterns: [&[bool]; 5] = [
            &[],
            &[true],
            &[false],
            &[true, false, true, true],
            &[false, false, false],
        ];
        for pattern in patterns {
            let results: Vec<_> = pattern.iter().map(|&ok| result(ok, 5)).collect();
            let summary = PlanSummary::from_results(results.clone(), false);
            assert_eq!(summary.success_count + summary.failure_count, pattern.len());
            assert_eq!(
                summary.success_count,
                pattern.iter().filter(|&&ok| ok).count()
            );
            assert_eq!(summary.total_duration_ms, 5 * pattern.len() as u64);
            assert_eq!(PlanSummary::from_results(results, false), summary);
        }
    }

    #[test]
    fn create_then_delete_leaves_no_trace() {
        let dir = TempDir::new().unwrap();
        let steps = vec![
            PlanStep::new(1, "Create", StepType::CreateFile)
                .with_file_path("scratch/tmp.txt")
                .with_content("hello"),
            PlanStep::new(2, "Delete", StepType::DeleteFile).with_file_path("scratch/tmp.txt"),
        ];
        let summary = run_plan(&steps, &executor(&dir), &mut ScriptedOperator::declining());
        assert_eq!(summary.success_count, 2);
        assert!(!dir.path().join("scratch/tmp.txt").exists());
    }

    #[test]
    fn summary_json_is_camel_case_throughout() {
        let summary = PlanSummary::from_results(vec![result(true, 1)], false);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["successCount"], 1);
        assert_eq!(json["failureCount"], 0);
        assert_eq!(json["aborted"], false);
        assert!(json["totalDurationMs"].is_u64());
        let first = &json["results"][0];
        assert!(first["duration"].is_u64());
        assert!(first.get("duration_ms").is_none());
        assert!(first["step"]["type"].is_string());
    }
}
