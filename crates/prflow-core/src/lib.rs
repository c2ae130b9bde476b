//! prflow-core: parsing AI output and running implementation plans.
//!
//! The crate is synchronous. AI agents are reached through the
//! [`assist::AgentInvoker`] trait, operators through [`plan::Operator`], and
//! git/forge/JIRA through thin command and HTTP wrappers.

pub mod assist;
pub mod config;
pub mod error;
pub mod forge;
pub mod git;
pub mod io;
pub mod jira;
pub mod naming;
pub mod parse;
pub mod paths;
pub mod plan;
pub mod prompts;
pub mod shell;

pub use error::{PrflowError, Result};
