//! Markdown implementation plans → ordered [`PlanStep`]s.
//!
//! The parser is a line scanner with two states: looking for step content,
//! or inside a fenced code block. Step fields are written in the order lines
//! are encountered, so a fence closing after a "create file" line replaces
//! the type that line inferred, and vice versa.

use regex::Regex;
use std::sync::OnceLock;

use super::step::{PlanStep, StepType};

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

fn numbered_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*\d+\.\s").unwrap())
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^#{2,}\s*(step\s*)?(\d+|\w+)").unwrap())
}

fn bullet_step_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\s*[-*+]\s+(\*\*)?step\s*\d+").unwrap())
}

fn step_label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\**\s*step\s*\d+\s*\**\s*[:.)\-]?\s*\**").unwrap())
}

fn list_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(#+\s*|[-*+]\s+)?(\d+\.\s*)?").unwrap())
}

fn file_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:create|edit|modify|update)\s+(?:file\s+)?`?([\w./-]+\.\w+)`?").unwrap()
    })
}

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

fn is_step_boundary(line: &str) -> bool {
    numbered_re().is_match(line) || heading_re().is_match(line) || bullet_step_re().is_match(line)
}

/// Language tag of a fence line, lowercased (`""` when absent).
fn fence_language(line: &str) -> Option<String> {
    let rest = line.trim_start().strip_prefix("```")?;
    Some(
        rest.split_whitespace()
            .next()
            .unwrap_or("")
            .to_lowercase(),
    )
}

/// Strip heading, list and "Step N:" markup from a boundary line.
fn step_title(line: &str) -> String {
    let unlisted = list_marker_re().replace(line, "");
    let unlabelled = step_label_re().replace(&unlisted, "");
    let title = unlabelled.trim().trim_matches('*').trim();
    if !title.is_empty() {
        return title.to_string();
    }
    // "## Step 3" on its own: keep the label as the title
    unlisted.trim().trim_matches('*').trim().to_string()
}

/// Infer a step type from a closed fence.
///
/// Only shell fences are inspected; checks run in priority order.
pub fn infer_step_type(language: &str, command: &str) -> StepType {
    if !matches!(language, "bash" | "sh" | "shell") {
        return StepType::Command;
    }
    let cmd = command.trim().to_lowercase();
    if cmd.starts_with("git ") {
        StepType::Git
    } else if cmd.starts_with("npm ") || cmd.starts_with("yarn ") || cmd.starts_with("pnpm ") {
        StepType::Npm
    } else if cmd.contains("test") || cmd.contains("jest") || cmd.contains("vitest") {
        StepType::Test
    } else if cmd.contains("build") || cmd.contains("webpack") || cmd.contains("vite") {
        StepType::Build
    } else if cmd.starts_with("mkdir") {
        StepType::Mkdir
    } else {
        StepType::Command
    }
}

// ---------------------------------------------------------------------------
// Scanner state
// ---------------------------------------------------------------------------

enum ScanState {
    ScanningForStep,
    InCodeFence { language: String, body: Vec<String> },
}

#[derive(Default)]
struct StepBuilder {
    title: String,
    description: Vec<String>,
    step_type: Option<StepType>,
    command: Option<String>,
    file_path: Option<String>,
}

impl StepBuilder {
    fn new(title: String) -> Self {
        Self {
            title,
            ..Default::default()
        }
    }

    fn absorb_line(&mut self, line: &str) {
        let text = line.trim();
        if text.is_empty() {
            // paragraph break, only once there is something to separate
            if !self.description.is_empty() {
                self.description.push(String::new());
            }
            return;
        }
        self.description.push(text.to_string());

        if let Some(caps) = file_ref_re().captures(text) {
            self.file_path = Some(caps[1].to_string());
            self.step_type = Some(if text.to_lowercase().contains("create") {
                StepType::CreateFile
            } else {
                StepType::EditFile
            });
        }
    }

    fn close_fence(&mut self, language: &str, body: &[String]) {
        let command = body.join("\n").trim().to_string();
        self.step_type = Some(infer_step_type(language, &command));
        self.command = Some(command);
    }

    fn finish(mut self, number: u32) -> Option<PlanStep> {
        if self.title.is_empty() {
            return None;
        }
        while self.description.last().is_some_and(|l| l.is_empty()) {
            self.description.pop();
        }
        let description = self.description.join("\n");
        Some(PlanStep {
            number,
            title: self.title,
            description: (!description.is_empty()).then_some(description),
            step_type: self.step_type.unwrap_or(StepType::Manual),
            command: self.command,
            file_path: self.file_path,
            content: None,
            params: None,
        })
    }
}

fn finalize(steps: &mut Vec<PlanStep>, builder: Option<StepBuilder>) {
    let number = steps.len() as u32 + 1;
    if let Some(step) = builder.and_then(|b| b.finish(number)) {
        steps.push(step);
    }
}

// ---------------------------------------------------------------------------
// parse_markdown_plan
// ---------------------------------------------------------------------------

/// Parse a markdown plan into steps numbered from 1.
///
/// Returns an empty vec when the document has no step boundaries.
pub fn parse_markdown_plan(markdown: &str) -> Vec<PlanStep> {
    let mut steps: Vec<PlanStep> = Vec::new();
    let mut current: Option<StepBuilder> = None;
    let mut state = ScanState::ScanningForStep;

    for line in markdown.lines() {
        state = match state {
            ScanState::InCodeFence { language, mut body } => {
                if fence_language(line).is_some() {
                    // a fence with no open step is dropped
                    if let Some(step) = current.as_mut() {
                        step.close_fence(&language, &body);
                    }
                    ScanState::ScanningForStep
                } else {
                    body.push(line.to_string());
                    ScanState::InCodeFence { language, body }
                }
            }
            ScanState::ScanningForStep => {
                if let Some(language) = fence_language(line) {
                    ScanState::InCodeFence {
                        language,
                        body: Vec::new(),
                    }
                } else if is_step_boundary(line) {
                    finalize(&mut steps, current.take());
                    current = Some(StepBuilder::new(step_title(line)));
                    ScanState::ScanningForStep
                } else {
                    if let Some(step) = current.as_mut() {
                        step.absorb_line(line);
                    }
                    ScanState::ScanningForStep
                }
            }
        };
    }

    if let ScanState::InCodeFence { language, .. } = &state {
        tracing::warn!(language = %language, "unterminated code fence at end of plan; ignored");
    }
    finalize(&mut steps, current.take());

    tracing::debug!(steps = steps.len(), "parsed markdown plan");
    steps
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const INSTALL_AND_TEST: &str = "1. Install dependency
Run the install command
```bash
npm install lodash
```
2. Run tests
```bash
npm test
```
";

    #[test]
    fn numbered_steps_with_fences() {
        let steps = parse_markdown_plan(INSTALL_AND_TEST);
        assert_eq!(steps.len(), 2);

        assert_eq!(steps[0].number, 1);
        assert_eq!(steps[0].title, "Install dependency");
        assert_eq!(steps[0].description.as_deref(), Some("Run the install command"));
        assert_eq!(steps[0].step_type, StepType::Npm);
        assert_eq!(steps[0].command.as_deref(), Some("npm install lodash"));

        assert_eq!(steps[1].number, 2);
        assert_eq!(steps[1].title, "Run tests");
        assert_eq!(steps[1].command.as_deref(), Some("npm test"));
    }

    #[test]
    fn npm_prefix_wins_over_test_keyword() {
        let steps = parse_markdown_plan(INSTALL_AND_TEST);
        assert_eq!(steps[1].step_type, StepType::Npm);
    }

    #[test]
    fn no_boundaries_yields_no_steps() {
        let md = "# My plan\n\nJust some prose.\n\n```bash\nls\n```\n";
        assert!(parse_markdown_plan(md).is_empty());
        assert!(parse_markdown_plan("").is_empty());
    }

    #[test]
    fn heading_steps_strip_step_label() {
        let md = "# Plan\n\n## Step 1: Set up project\nSome context.\n\n### Step 2 - Write code\n";
        let steps = parse_markdown_plan(md);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].title, "Set up project");
        assert_eq!(steps[1].title, "Write code");
    }

    #[test]
    fn heading_with_numbered_title() {
        let steps = parse_markdown_plan("## 1. Setup\n## 2. **Deploy**\n");
        assert_eq!(steps[0].title, "Setup");
        assert_eq!(steps[1].title, "Deploy");
    }

    #[test]
    fn any_level_two_heading_is_a_boundary() {
        let steps = parse_markdown_plan("## Overview\nWhat we will do.\n");
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].title, "Overview");
        assert_eq!(steps[0].step_type, StepType::Manual);
    }

    #[test]
    fn bulleted_step_indicator() {
        let md = "- **Step 1**: Create branch\n```bash\ngit checkout -b feat/x\n```\n* Step 2. Review\n";
        let steps = parse_markdown_plan(md);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].title, "Create branch");
        assert_eq!(steps[0].step_type, StepType::Git);
        assert_eq!(steps[1].title, "Review");
    }

    #[test]
    fn plain_bullets_are_description() {
        let md = "1. Prepare\n- check node version\n- check disk space\n";
        let steps = parse_markdown_plan(md);
        assert_eq!(steps.len(), 1);
        assert_eq!(
            steps[0].description.as_deref(),
            Some("- check node version\n- check disk space")
        );
    }

    #[test]
    fn bare_step_label_keeps_label_as_title() {
        let steps = parse_markdown_plan("## Step 3\nDo the thing\n");
        assert_eq!(steps[0].title, "Step 3");
    }

    #[test]
    fn empty_title_step_is_dropped_and_numbering_stays_sequential() {
        let md = "1. \n2. Real step\n3. Another\n";
        let steps = parse_markdown_plan(md);
        let titles: Vec<_> = steps.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["Real step", "Another"]);
        let numbers: Vec<_> = steps.iter().map(|s| s.number).collect();
        assert_eq!(numbers, [1, 2]);
    }

    #[test]
    fn fence_before_first_step_is_discarded() {
        let md = "```bash\nrm -rf /\n```\n1. Safe step\n";
        let steps = parse_markdown_plan(md);
        assert_eq!(steps.len(), 1);
        assert!(steps[0].command.is_none());
        assert_eq!(steps[0].step_type, StepType::Manual);
    }

    #[test]
    fn fence_contents_are_not_boundaries() {
        let md = "1. Write list\n```text\n1. not a step\n## nor this\n```\n";
        let steps = parse_markdown_plan(md);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].command.as_deref(), Some("1. not a step\n## nor this"));
        assert_eq!(steps[0].step_type, StepType::Command);
    }

    #[test]
    fn unterminated_fence_is_ignored() {
        let md = "1. Start\n```bash\necho never closed\n";
        let steps = parse_markdown_plan(md);
        assert_eq!(steps.len(), 1);
        assert!(steps[0].command.is_none());
    }

    #[test]
    fn description_keeps_inner_paragraph_breaks() {
        let md = "1. Explain\n\nFirst paragraph.\n\nSecond paragraph.\n\n\n2. Next\n";
        let steps = parse_markdown_plan(md);
        assert_eq!(
            steps[0].description.as_deref(),
            Some("First paragraph.\n\nSecond paragraph.")
        );
    }

    #[test]
    fn file_reference_creates() {
        let md = "1. Add helper\nCreate file `src/utils/format.ts` with the helper.\n";
        let steps = parse_markdown_plan(md);
        assert_eq!(steps[0].step_type, StepType::CreateFile);
        assert_eq!(steps[0].file_path.as_deref(), Some("src/utils/format.ts"));
    }

    #[test]
    fn file_reference_edits() {
        let md = "1. Wire it\nModify src/index.ts to import the helper.\n";
        let steps = parse_markdown_plan(md);
        assert_eq!(steps[0].step_type, StepType::EditFile);
        assert_eq!(steps[0].file_path.as_deref(), Some("src/index.ts"));
    }

    #[test]
    fn later_fence_overwrites_file_inferred_type() {
        let md = "1. Add module\nCreate file `lib/a.py`\n```python\nprint('hi')\n```\n";
        let steps = parse_markdown_plan(md);
        assert_eq!(steps[0].step_type, StepType::Command);
        assert_eq!(steps[0].command.as_deref(), Some("print('hi')"));
        assert_eq!(steps[0].file_path.as_deref(), Some("lib/a.py"));
    }

    #[test]
    fn later_file_reference_overwrites_fence_type() {
        let md = "1. Scaffold\n```bash\nmkdir -p src\n```\nThen update `src/main.rs` accordingly.\n";
        let steps = parse_markdown_plan(md);
        assert_eq!(steps[0].step_type, StepType::EditFile);
        assert_eq!(steps[0].command.as_deref(), Some("mkdir -p src"));
    }

    #[test]
    fn fence_type_inference_table() {
        assert_eq!(infer_step_type("bash", "git commit -m x"), StepType::Git);
        assert_eq!(infer_step_type("sh", "yarn add react"), StepType::Npm);
        assert_eq!(infer_step_type("shell", "pnpm i"), StepType::Npm);
        assert_eq!(infer_step_type("bash", "cargo test"), StepType::Test);
        assert_eq!(infer_step_type("bash", "npx vitest run"), StepType::Test);
        assert_eq!(infer_step_type("bash", "npx webpack"), StepType::Build);
        assert_eq!(infer_step_type("bash", "cargo build --release"), StepType::Build);
        assert_eq!(infer_step_type("bash", "mkdir -p out"), StepType::Mkdir);
        assert_eq!(infer_step_type("bash", "ls -la"), StepType::Command);
        assert_eq!(infer_step_type("bash", "GIT status"), StepType::Git);
        assert_eq!(infer_step_type("python", "git push"), StepType::Command);
        assert_eq!(infer_step_type("", "npm test"), StepType::Command);
    }

    #[test]
    fn fence_language_is_case_insensitive() {
        let md = "1. Push\n```Bash\ngit push\n```\n";
        assert_eq!(parse_markdown_plan(md)[0].step_type, StepType::Git);
    }

    #[test]
    fn multiple_fences_last_one_wins() {
        let md = "1. Build and test\n```bash\nnpm run build\n```\n```bash\ngit status\n```\n";
        let steps = parse_markdown_plan(md);
        assert_eq!(steps[0].step_type, StepType::Git);
        assert_eq!(steps[0].command.as_deref(), Some("git status"));
    }
}
