use std::path::Path;

use super::json::parse_json_plan;
use super::markdown::parse_markdown_plan;
use super::runner::PlanSummary;
use super::step::PlanStep;
use crate::error::{PrflowError, Result};
use crate::io::{atomic_write, read_optional};

/// Read a plan file. `.json` files are parsed as JSON plans, everything
/// else as markdown.
pub fn load_plan(path: &Path) -> Result<Vec<PlanStep>> {
    let text = read_optional(path)?
        .ok_or_else(|| PrflowError::InvalidPlan(format!("plan file not found: {}", path.display())))?;
    if is_json_path(path) {
        parse_json_plan(&text)
    } else {
        Ok(parse_markdown_plan(&text))
    }
}

/// Write `steps` as a pretty-printed JSON array.
pub fn save_plan(path: &Path, steps: &[PlanStep]) -> Result<()> {
    let json = serde_json::to_string_pretty(steps)?;
    atomic_write(path, json.as_bytes())
}

/// Write a run summary as pretty-printed JSON.
pub fn save_results(path: &Path, summary: &PlanSummary) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    atomic_write(path, json.as_bytes())
}

/// `.json` extension, any case.
pub fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
