use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ---------------------------------------------------------------------------
// StepType
// ---------------------------------------------------------------------------

/// How a plan step is executed.
///
/// Unrecognised type names (e.g. from an AI-generated JSON plan) are kept
/// as [`StepType::Unknown`] so that they fail when executed instead of when
/// the plan is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepType {
    Command,
    CreateFile,
    EditFile,
    DeleteFile,
    Mkdir,
    Git,
    Npm,
    Test,
    Build,
    Manual,
    Unknown(String),
}

impl StepType {
    pub fn all() -> &'static [StepType] {
        &[
            StepType::Command,
            StepType::CreateFile,
            StepType::EditFile,
            StepType::DeleteFile,
            StepType::Mkdir,
            StepType::Git,
            StepType::Npm,
            StepType::Test,
            StepType::Build,
            StepType::Manual,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            StepType::Command => "command",
            StepType::CreateFile => "create-file",
            StepType::EditFile => "edit-file",
            StepType::DeleteFile => "delete-file",
            StepType::Mkdir => "mkdir",
            StepType::Git => "git",
            StepType::Npm => "npm",
            StepType::Test => "test",
            StepType::Build => "build",
            StepType::Manual => "manual",
            StepType::Unknown(s) => s,
        }
    }
}

impl From<String> for StepType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "command" => StepType::Command,
            "create-file" => StepType::CreateFile,
            "edit-file" => StepType::EditFile,
            "delete-file" => StepType::DeleteFile,
            "mkdir" => StepType::Mkdir,
            "git" => StepType::Git,
            "npm" => StepType::Npm,
            "test" => StepType::Test,
            "build" => StepType::Build,
            "manual" => StepType::Manual,
            _ => StepType::Unknown(s),
        }
    }
}

impl From<StepType> for String {
    fn from(t: StepType) -> Self {
        match t {
            StepType::Unknown(s) => s,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PlanStep
// ---------------------------------------------------------------------------

/// One step of an implementation plan. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    /// 1-based position assigned by the parser.
    #[serde(default)]
    pub number: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type", default = "default_step_type")]
    pub step_type: StepType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<HashMap<String, serde_json::Value>>,
}

fn default_step_type() -> StepType {
    StepType::Manual
}

impl PlanStep {
    pub fn new(number: u32, title: impl Into<String>, step_type: StepType) -> Self {
        Self {
            number,
            title: title.into(),
            description: None,
            step_type,
            command: None,
            file_path: None,
            content: None,
            params: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// `command` with surrounding whitespace removed, if non-empty.
    pub fn trimmed_command(&self) -> Option<&str> {
        self.command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Text to write for file steps: `content`, falling back to `command`.
    pub fn body(&self) -> &str {
        self.content
            .as_deref()
            .filter(|c| !c.is_empty())
            .or(self.command.as_deref())
            .unwrap_or("")
    }
}

// ---------------------------------------------------------------------------
// ExecutionResult
// ---------------------------------------------------------------------------

/// Outcome of executing one step. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub step: PlanStep,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock milliseconds.
    #[serde(rename = "duration")]
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_type_names_roundtrip() {
        for t in StepType::all() {
            assert_eq!(&StepType::from(t.as_str().to_string()), t);
        }
    }

    #[test]
    fn unknown_step_type_is_preserved() {
        let t = StepType::from("deploy".to_string());
        assert_eq!(t, StepType::Unknown("deploy".into()));
        assert_eq!(t.to_string(), "deploy");
    }

    #[test]
    fn step_json_uses_camel_case_and_type_key() {
        let step = PlanStep::new(1, "Create config", StepType::CreateFile)
            .with_file_path("src/config.ts")
            .with_content("export {}");
        let json = serde_json::to_string(&step).unwrap();
        assert!(json.contains("\"type\":\"create-file\""));
        assert!(json.contains("\"filePath\":\"src/config.ts\""));
        assert!(!json.contains("description"));
    }

    #[test]
    fn step_json_defaults() {
        let step: PlanStep = serde_json::from_str(r#"{"title":"Think about it"}"#).unwrap();
        assert_eq!(step.step_type, StepType::Manual);
        assert_eq!(step.number, 0);
        assert!(step.command.is_none());
    }

    #[test]
    fn body_prefers_content_over_command() {
        let step = PlanStep::new(1, "x", StepType::CreateFile)
            .with_command("from command")
            .with_content("from content");
        assert_eq!(step.body(), "from content");

        let step = PlanStep::new(1, "x", StepType::CreateFile)
            .with_command("from command")
            .with_content("");
        assert_eq!(step.body(), "from command");

        assert_eq!(PlanStep::new(1, "x", StepType::CreateFile).body(), "");
    }

    #[test]
    fn trimmed_command_treats_whitespace_as_missing() {
        let step = PlanStep::new(1, "x", StepType::Command).with_command("   ");
        assert!(step.trimmed_command().is_none());
        let step = PlanStep::new(1, "x", StepType::Command).with_command(" ls \n");
        assert_eq!(step.trimmed_command(), Some("ls"));
    }
}
