use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// File layout constants
// ---------------------------------------------------------------------------

pub const REPO_CONFIG_FILE: &str = ".prflow.yaml";
pub const USER_CONFIG_DIR: &str = ".config/prflow";
pub const USER_CONFIG_FILE: &str = "config.yaml";

pub const PRFLOW_DIR: &str = ".prflow";
pub const PLANS_DIR: &str = ".prflow/plans";

pub const RESULTS_SUFFIX: &str = ".results.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn repo_config_path(root: &Path) -> PathBuf {
    root.join(REPO_CONFIG_FILE)
}

pub fn user_config_path(home: &Path) -> PathBuf {
    home.join(USER_CONFIG_DIR).join(USER_CONFIG_FILE)
}

pub fn plans_dir(root: &Path) -> PathBuf {
    root.join(PLANS_DIR)
}

/// Default location for a generated plan named after `source`.
pub fn plan_path(root: &Path, source: &str) -> PathBuf {
    plans_dir(root).join(format!("{}.md", slugify(source)))
}

/// `plans/add-login.md` → `plans/add-login.results.json`.
pub fn results_path_for(plan: &Path) -> PathBuf {
    let stem = plan
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "plan".to_string());
    plan.with_file_name(format!("{stem}{RESULTS_SUFFIX}"))
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

static NON_SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn non_slug_re() -> &'static Regex {
    NON_SLUG_RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").unwrap())
}

/// Lowercase `text`, collapse non-alphanumerics to `-`, cap at 64 chars.
/// Empty input gives `"plan"`.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let dashed = non_slug_re().replace_all(&lower, "-");
    let mut slug: String = dashed.trim_matches('-').chars().take(64).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        "plan".to_string()
    } else {
        slug
    }
}
