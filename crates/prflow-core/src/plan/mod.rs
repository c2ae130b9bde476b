//! Implementation plans: parsing markdown or JSON into typed steps and
//! executing them one at a time.

pub mod executor;
pub mod json;
pub mod markdown;
pub mod operator;
pub mod runner;
pub mod step;
pub mod store;

pub use executor::{StepError, StepExecutor};
pub use json::parse_json_plan;
pub use markdown::{infer_step_type, parse_markdown_plan};
pub use operator::{Operator, ScriptedOperator};
pub use runner::{run_plan, PlanSummary};
pub use step::{ExecutionResult, PlanStep, StepType};
pub use store::{is_json_path, load_plan, save_plan, save_results};
