use inquire::Confirm;

use prflow_core::plan::{ExecutionResult, Operator, PlanStep, ScriptedOperator};

use crate::output::one_line;

/// Terminal operator for `prflow plan run`.
///
/// Interactive runs ask with `inquire` (default No). Non-interactive runs
/// use fixed "no" answers. Progress lines go to stderr unless `quiet`.
pub struct ConsoleOperator {
    interactive: bool,
    quiet: bool,
    fallback: ScriptedOperator,
}

impl ConsoleOperator {
    pub fn new(interactive: bool, quiet: bool) -> Self {
        Self {
            interactive,
            quiet,
            fallback: ScriptedOperator::declining(),
        }
    }

    fn ask(&self, question: &str) -> bool {
        match Confirm::new(question).with_default(false).prompt() {
            Ok(answer) => answer,
            Err(e) => {
                // Ctrl-C, Esc or no TTY all count as "no"
                tracing::debug!(error = %e, "confirmation prompt failed");
                false
            }
        }
    }
}

impl Operator for ConsoleOperator {
    fn confirm_manual(&mut self, step: &PlanStep) -> bool {
        if !self.interactive {
            return self.fallback.confirm_manual(step);
        }
        if let Some(desc) = step.description.as_deref().filter(|d| !d.is_empty()) {
            eprintln!("{desc}");
        }
        self.ask(&format!("Step {} is manual: \"{}\". Done?", step.number, step.title))
    }

    fn confirm_continue(&mut self, failed: &ExecutionResult) -> bool {
        if !self.interactive {
            return self.fallback.confirm_continue(failed);
        }
        self.ask(&format!(
            "Step {} failed. Continue with the remaining steps?",
            failed.step.number
        ))
    }

    fn on_step_start(&mut self, step: &PlanStep, index: usize, total: usize) {
        if !self.quiet {
            eprintln!("[{}/{}] {} ({})", index + 1, total, step.title, step.step_type);
        }
    }

    fn on_step_finish(&mut self, result: &ExecutionResult) {
        if self.quiet {
            return;
        }
        if result.success {
            let detail = result.output.as_deref().map(|o| one_line(o, 80)).unwrap_or_default();
            eprintln!("  ok   {}ms  {detail}", result.duration_ms);
        } else {
            eprintln!(
                "  FAIL {}ms  {}",
                result.duration_ms,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
