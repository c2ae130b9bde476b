use serde::Deserialize;

use super::step::PlanStep;
use crate::error::{PrflowError, Result};

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonPlan {
    Steps(Vec<PlanStep>),
    Wrapped { steps: Vec<PlanStep> },
}

/// Parse a JSON plan out of AI output.
///
/// Accepts a bare array of steps or an object with a `steps` array, either
/// raw or inside a ```` ```json ```` fence with surrounding prose. Steps are
/// renumbered 1..n in array order. Unknown `type` names are kept and fail
/// when executed.
pub fn parse_json_plan(raw: &str) -> Result<Vec<PlanStep>> {
    let body = extract_json(raw)
        .ok_or_else(|| PrflowError::InvalidPlan("no JSON plan found in input".to_string()))?;
    let plan: JsonPlan = serde_json::from_str(&body)
        .map_err(|e| PrflowError::InvalidPlan(format!("malformed JSON plan: {e}")))?;
    let mut steps = match plan {
        JsonPlan::Steps(s) | JsonPlan::Wrapped { steps: s } => s,
    };
    for (i, step) in steps.iter_mut().enumerate() {
        step.number = i as u32 + 1;
        if step.title.trim().is_empty() {
            step.title = format!("Step {}", step.number);
        }
    }
    Ok(steps)
}

/// Locate the JSON document.
///
/// Input that already starts with `[`/`{` is taken whole, so fences inside
/// string values are left alone. Otherwise the first ```` ```json ```` (or
/// untagged) fence whose body looks like JSON wins, then the span from the
/// first `[`/`{` to the matching last `]`/`}`.
fn extract_json(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with(['[', '{']) {
        return Some(trimmed.to_string());
    }
    if let Some(body) = json_fence(trimmed) {
        return Some(body);
    }

    let open = trimmed.find(['[', '{'])?;
    let close_char = if trimmed[open..].starts_with('[') { ']' } else { '}' };
    let close = trimmed.rfind(close_char)?;
    (close > open).then(|| trimmed[open..=close].to_string())
}

/// Body of the first closed fence tagged `json` or untagged that starts
/// like a JSON document.
fn json_fence(text: &str) -> Option<String> {
    let mut fence: Option<(String, Vec<&str>)> = None;
    for line in text.lines() {
        let marker = line.trim_start().strip_prefix("```");
        fence = match (fence, marker) {
            (None, Some(tag)) => Some((tag.trim().to_lowercase(), Vec::new())),
            (None, None) => None,
            (Some((tag, body)), Some(_)) => {
                let body = body.join("\n");
                let body = body.trim();
                if matches!(tag.as_str(), "json" | "") && body.starts_with(['[', '{']) {
                    return Some(body.to_string());
                }
                None
            }
            (Some((tag, mut body)), None) => {
                body.push(line);
                Some((tag, body))
            }
        };
    }
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
