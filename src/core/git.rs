//! Local git repository operations
//!
//! This module provides a wrapper around git2 for the operations the CLI needs:
//! - Repository discovery and validation
//! - Current branch lookup (for ticket and context extraction)
//! - Staged diff generation
//! - Committing the staged changes

use std::path::Path;

use git2::{DiffFormat, DiffOptions, Repository, Signature};

use crate::error::{CommitsmithError, Result};

/// Wrapper for local git repository operations
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Discover a git repository from the given path
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::discover(path).map_err(|_| CommitsmithError::NotGitRepository)?;
        Ok(Self { repo })
    }

    /// Get the current branch name
    pub fn current_branch(&self) -> Result<String> {
        match self.repo.head() {
            Ok(head) => {
                if head.is_branch() {
                    Ok(head.shorthand().unwrap_or("HEAD").to_string())
                } else {
                    // Detached HEAD state
                    Ok("HEAD".to_string())
                }
            }
            Err(e) => {
                // Handle unborn HEAD (no commits yet)
                if e.code() == git2::ErrorCode::UnbornBranch {
                    if let Ok(config) = self.repo.config() {
                        if let Ok(branch) = config.get_string("init.defaultBranch") {
                            return Ok(branch);
                        }
                    }
                    Ok("main".to_string())
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Get the diff of staged changes in unified patch format
    pub fn staged_diff(&self) -> Result<String> {
        // No HEAD yet: everything in the index is new
        let head = match self.repo.head() {
            Ok(head) => Some(head.peel_to_tree()?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };
        let index = self.repo.index()?;

        let diff = self.repo.diff_tree_to_index(
            head.as_ref(),
            Some(&index),
            Some(&mut DiffOptions::new()),
        )?;

        let mut diff_text = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                diff_text.push(line.origin());
            }
            diff_text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;

        Ok(diff_text)
    }

    /// Create a commit with the staged changes, returning its id
    pub fn commit(&self, message: &str) -> Result<String> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let signature = self.repo.signature().or_else(|_| {
            // Fallback signature if not configured
            Signature::now("commitsmith", "commitsmith@localhost")
        })?;

        let commit_id = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;

        Ok(commit_id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn init_repo(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        repo
    }

    fn stage(repo: &Repository, name: &str, contents: &str) {
        let workdir = repo.workdir().unwrap();
        fs::write(workdir.join(name), contents).unwrap();
        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
    }

    #[test]
    fn test_not_a_repository() {
        let dir = tempfile::tempdir().unwrap();
        let err = GitRepository::discover(dir.path().join("nowhere"));
        assert!(matches!(err, Err(CommitsmithError::NotGitRepository)));
    }

    #[test]
    fn test_staged_diff_and_commit() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo(dir.path());
        stage(&repo, "foo.txt", "hello\n");

        let git = GitRepository::discover(dir.path()).unwrap();
        let diff = git.staged_diff().unwrap();
        assert!(diff.contains("diff --git a/foo.txt b/foo.txt"));
        assert!(diff.contains("+hello"));

        let id = git.commit("DOC: AB-1 - add foo").unwrap();
        let commit = repo.find_commit(git2::Oid::from_str(&id).unwrap()).unwrap();
        assert_eq!(commit.message(), Some("DOC: AB-1 - add foo"));
        assert!(git.staged_diff().unwrap().is_empty());

        stage(&repo, "foo.txt", "hello\nworld\n");
        let diff = git.staged_diff().unwrap();
        assert!(diff.contains(" hello"));
        assert!(diff.contains("+world"));
        git.commit("DOC: AB-1 - extend foo").unwrap();
        assert_eq!(repo.head().unwrap().peel_to_commit().unwrap().parent_count(), 1);
    }

    #[test]
    fn test_current_branch_on_unborn_head() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo(dir.path());
        repo.config()
            .unwrap()
            .set_str("init.defaultBranch", "feature/AB-12-start")
            .unwrap();

        let git = GitRepository::discover(dir.path()).unwrap();
        assert_eq!(git.current_branch().unwrap(), "feature/AB-12-start");
    }
}
