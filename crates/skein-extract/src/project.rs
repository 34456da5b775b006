use std::path::Path;
use std::process::Command;

/// Derived project identity for a working directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectIdentity {
    pub project: String,
    pub worktree: Option<String>,
}

/// Resolve project identity for `dir`:
/// 1. the final path segment of the version-control remote URL,
/// 2. else a configured workspace root where paths follow
///    `{root}/{project}/{worktree}`,
/// 3. else the directory's base name.
pub fn identify(dir: &Path, workspace_roots: &[String]) -> ProjectIdentity {
    if let Some(project) = remote_project_name(dir) {
        // A worktree name is still worth keeping when the layout shows one.
        let worktree = workspace_identity(dir, workspace_roots).and_then(|id| id.worktree);
        return ProjectIdentity { project, worktree };
    }
    if let Some(id) = workspace_identity(dir, workspace_roots) {
        return id;
    }
    ProjectIdentity {
        project: basename(dir),
        worktree: None,
    }
}

/// Final path segment of `git remote get-url origin`, minus any `.git`.
/// Handles both `https://host/user/repo.git` and `git@host:user/repo.git`.
fn remote_project_name(dir: &Path) -> Option<String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["remote", "get-url", "origin"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    parse_remote_url(&url)
}

fn parse_remote_url(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    let tail = url.rsplit(['/', ':']).next()?;
    let name = tail.strip_suffix(".git").unwrap_or(tail).trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Match `dir` against configured workspace roots. The first component
/// under a root is the project, the second (if present) the worktree.
fn workspace_identity(dir: &Path, workspace_roots: &[String]) -> Option<ProjectIdentity> {
    for root in workspace_roots {
        let root_path = Path::new(root);
        let Ok(rel) = dir.strip_prefix(root_path) else {
            continue;
        };
        let mut components = rel
            .components()
            .filter_map(|c| c.as_os_str().to_str().map(String::from));
        let project = components.next()?;
        let worktree = components.next();
        return Some(ProjectIdentity { project, worktree });
    }
    None
}

fn basename(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
