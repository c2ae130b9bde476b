use std::path::{Path, PathBuf};

use prflow_core::paths::REPO_CONFIG_FILE;

/// Resolve the repository root.
///
/// Priority:
/// 1. `--root` flag / `PRFLOW_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.prflow.yaml`
/// 3. Walk upward from `cwd` looking for `.git`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_root_from(&cwd)
}

fn find_root_from(start: &Path) -> PathBuf {
    ancestor_with(start, |d| d.join(REPO_CONFIG_FILE).is_file())
        // .git is a file inside worktrees and submodules
        .or_else(|| ancestor_with(start, |d| d.join(".git").exists()))
        .unwrap_or_else(|| start.to_path_buf())
}

fn ancestor_with(start: &Path, pred: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    start.ancestors().find(|d| pred(d)).map(Path::to_path_buf)
}
