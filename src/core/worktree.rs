//! # Worktree Helper
//!
//! Creates a git worktree beside the repository root so a command can be
//! launched against an isolated checkout. The branch is created on the fly
//! when it does not exist yet.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

#[derive(Debug)]
pub enum WorktreeError {
    /// The current directory is not inside a git repository.
    NotARepository,
    /// The derived worktree path is already occupied.
    TargetExists(PathBuf),
    GitFailed(String),
    Io(io::Error),
}

impl fmt::Display for WorktreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorktreeError::NotARepository => write!(f, "not inside a git repository"),
            WorktreeError::TargetExists(path) => {
                write!(f, "worktree target {} already exists", path.display())
            }
            WorktreeError::GitFailed(stderr) => write!(f, "git worktree add failed: {stderr}"),
            WorktreeError::Io(e) => write!(f, "failed to run git: {e}"),
        }
    }
}

impl std::error::Error for WorktreeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorktreeError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WorktreeError {
    fn from(e: io::Error) -> Self {
        WorktreeError::Io(e)
    }
}

/// Create a worktree for `branch` as a sibling of the repository root,
/// returning the new path.
pub fn create(branch: &str) -> Result<PathBuf, WorktreeError> {
    let root = repo_root()?;
    let path = worktree_path(&root, branch);
    if path.exists() {
        return Err(WorktreeError::TargetExists(path));
    }

    let mut command = Command::new("git");
    command.arg("worktree").arg("add");
    if branch_exists(branch) {
        command.arg(&path).arg(branch);
    } else {
        debug!("branch '{branch}' does not exist, creating it");
        command.arg("-b").arg(branch).arg(&path);
    }

    let output = command.output()?;
    if !output.status.success() {
        return Err(WorktreeError::GitFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }
    info!("created worktree for '{branch}' at {}", path.display());
    Ok(path)
}

fn repo_root() -> Result<PathBuf, WorktreeError> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()?;
    if !output.status.success() {
        return Err(WorktreeError::NotARepository);
    }
    Ok(PathBuf::from(
        String::from_utf8_lossy(&output.stdout).trim(),
    ))
}

fn branch_exists(branch: &str) -> bool {
    Command::new("git")
        .args(["rev-parse", "--verify", "--quiet", branch])
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// `<root>-<branch>` beside the repository, with path separators in the
/// branch name flattened.
fn worktree_path(root: &Path, branch: &str) -> PathBuf {
    let sanitized = branch.replace(['/', '\\'], "-");
    let name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "worktree".to_string());
    root.with_file_name(format!("{name}-{sanitized}"))
}
