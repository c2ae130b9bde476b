use anyhow::Context as _;
use std::path::{Path, PathBuf};

use prflow_core::config::{Config, LoadedConfig};
use prflow_core::git::{GitCli, Vcs};
use prflow_core::jira::{extract_ticket_key, JiraClient, TicketDetails};

use crate::agent::CliAgent;

/// Everything a command needs: where the repo is, the effective config and
/// how output should be rendered.
pub struct AppContext {
    pub root: PathBuf,
    pub config: Config,
    pub config_source: Option<PathBuf>,
    pub json: bool,
}

impl AppContext {
    pub fn load(root: &Path, config_path: Option<&Path>, json: bool) -> anyhow::Result<Self> {
        let LoadedConfig { config, source } =
            Config::resolve(root, config_path).context("failed to load config")?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
            config_source: source,
            json,
        })
    }

    pub fn git(&self) -> GitCli {
        GitCli::new(&self.root)
    }

    pub fn agent(&self) -> CliAgent {
        CliAgent::new(&self.config.agent, &self.root, self.config.agent.stream && !self.json)
    }

    /// Ticket for this invocation.
    ///
    /// An explicit key wins; otherwise one is read from the current branch
    /// name when JIRA is configured. Details are fetched from JIRA when it is
    /// configured; a key JIRA does not know is kept with an empty title.
    pub fn ticket(&self, explicit: Option<&str>) -> anyhow::Result<Option<TicketDetails>> {
        let jira = &self.config.jira;
        let key = match explicit {
            Some(k) => Some(k.trim().to_string()),
            None if jira.enabled() => self
                .git()
                .current_branch()
                .ok()
                .and_then(|b| extract_ticket_key(&b)),
            None => None,
        };
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            return Ok(None);
        };

        if !jira.enabled() {
            return Ok(Some(bare_ticket(key)));
        }

        let client = JiraClient::from_config(jira).context("cannot reach JIRA")?;
        match client
            .get_ticket_details(&key)
            .with_context(|| format!("failed to fetch {key}"))?
        {
            Some(details) => Ok(Some(details)),
            None => {
                tracing::warn!(%key, "ticket not found in JIRA");
                Ok(Some(bare_ticket(key)))
            }
        }
    }
}

fn bare_ticket(key: String) -> TicketDetails {
    TicketDetails {
        key,
        title: String::new(),
        description: None,
        issue_type: None,
        status: None,
    }
}
