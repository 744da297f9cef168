//! Git utility functions for pkglens.
//!
//! This module reads commit, tag, branch and contributor information for the
//! version probe through libgit2, so no `git` executable is required.

use crate::error::{PkglensError, Result};
use crate::snapshot::GitSummary;
use chrono::{DateTime, Utc};
use git2::{ErrorCode, Repository};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;

use tracing::instrument;

/// Number of tags kept in a [`GitSummary`].
pub const MAX_TAGS: usize = 10;

/// Summarizes the repository at `repo_path`.
///
/// A repository without commits yields zero counts and no last commit date.
///
/// # Errors
///
/// Returns [`PkglensError::GitError`] if the repository cannot be opened or
/// its history cannot be walked.
#[instrument(level = "debug", skip_all, fields(repo = %repo_path.display()), err)]
pub fn git_summary(repo_path: &Path) -> Result<GitSummary> {
    let repo = Repository::open(repo_path).map_err(|e| {
        PkglensError::git_error_with_repo("open repository", repo_path.to_path_buf(), e)
    })?;

    let mut all_tags = tag_names(&repo)?;
    all_tags.sort_by(|a, b| compare_version_refs(b, a));
    let tag_count = all_tags.len();
    all_tags.truncate(MAX_TAGS);

    let head = match repo.head() {
        Ok(head) => Some(head),
        Err(e) if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound => {
            tracing::debug!("repository has no commits yet");
            None
        }
        Err(e) => {
            return Err(PkglensError::git_error_with_repo(
                "resolve HEAD",
                repo_path.to_path_buf(),
                e,
            ));
        }
    };

    let Some(head) = head else {
        return Ok(GitSummary {
            last_commit_date: None,
            commit_count: 0,
            tags: all_tags,
            tag_count,
            current_branch: unborn_branch_name(&repo),
            contributors_count: 0,
        });
    };

    let current_branch = if head.is_branch() {
        head.shorthand().map(str::to_string)
    } else {
        Some("HEAD".to_string())
    };
    let last_commit_date = head
        .peel_to_commit()
        .ok()
        .and_then(|commit| DateTime::<Utc>::from_timestamp(commit.time().seconds(), 0));

    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;

    let mut commit_count = 0;
    let mut authors = HashSet::new();
    for oid in revwalk {
        let commit = repo.find_commit(oid?)?;
        commit_count += 1;
        authors.insert(commit.author().name().unwrap_or("Unknown").to_string());
    }

    tracing::debug!(commit_count, tag_count, contributors = authors.len(), "walked git history");

    Ok(GitSummary {
        last_commit_date,
        commit_count,
        tags: all_tags,
        tag_count,
        current_branch,
        contributors_count: authors.len(),
    })
}

fn tag_names(repo: &Repository) -> Result<Vec<String>> {
    let names = repo.tag_names(None)?;
    Ok(names.iter().flatten().map(str::to_string).collect())
}

fn unborn_branch_name(repo: &Repository) -> Option<String> {
    let head = repo.find_reference("HEAD").ok()?;
    head.symbolic_target()
        .map(|target| target.trim_start_matches("refs/heads/").to_string())
}

/// Orders two ref names the way `git tag --sort=v:refname` does: runs of
/// digits compare numerically, everything else compares as text.
///
/// ```
/// use pkglens_core::git_utils::compare_version_refs;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare_version_refs("v1.10.0", "v1.9.1"), Ordering::Greater);
/// ```
#[must_use]
pub fn compare_version_refs(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_num = take_digits(&mut left);
                let r_num = take_digits(&mut right);
                let ordering = compare_digit_runs(&l_num, &r_num);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(l), Some(r)) => {
                if l != r {
                    return l.cmp(&r);
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Signature;
    use std::fs;
    use tempfile::TempDir;

    fn commit_file(repo: &Repository, name: &str, author: &str, message: &str) -> git2::Oid {
        let workdir = repo.workdir().unwrap().to_path_buf();
        fs::write(workdir.join(name), message).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();

        let signature = Signature::now(author, &format!("{}@example.com", author)).unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
            .unwrap()
    }

    #[test]
    fn test_compare_version_refs_numeric_segments() {
        assert_eq!(compare_version_refs("v1.10.0", "v1.9.1"), Ordering::Greater);
        assert_eq!(compare_version_refs("v1.9.1", "v1.2.0"), Ordering::Greater);
        assert_eq!(compare_version_refs("v2.0.0", "v2.0.0"), Ordering::Equal);
        assert_eq!(compare_version_refs("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare_version_refs("v007", "v7"), Ordering::Equal);
    }

    #[test]
    fn test_tags_sorted_highest_version_first() {
        let mut tags = vec!["v1.2.0", "v1.10.0", "v1.9.1"];
        tags.sort_by(|a, b| compare_version_refs(b, a));
        assert_eq!(tags, vec!["v1.10.0", "v1.9.1", "v1.2.0"]);
    }

    #[test]
    fn test_git_summary_of_non_repository_is_git_error() {
        let dir = TempDir::new().unwrap();
        let err = git_summary(dir.path()).unwrap_err();
        assert!(matches!(err, PkglensError::GitError { .. }));
    }

    #[test]
    fn test_git_summary_of_empty_repository() {
        let dir = TempDir::new().unwrap();
        Repository::init(dir.path()).unwrap();
        let summary = git_summary(dir.path()).unwrap();
        assert_eq!(summary.commit_count, 0);
        assert_eq!(summary.contributors_count, 0);
        assert!(summary.last_commit_date.is_none());
        assert!(summary.current_branch.is_some());
    }

    #[test]
    fn test_git_summary_counts_commits_tags_and_authors() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        commit_file(&repo, "a.txt", "alice", "first");
        let second = commit_file(&repo, "b.txt", "bob", "second");
        commit_file(&repo, "c.txt", "alice", "third");

        let target = repo.find_object(second, None).unwrap();
        repo.tag_lightweight("v1.2.0", &target, false).unwrap();
        repo.tag_lightweight("v1.10.0", &target, false).unwrap();
        repo.tag_lightweight("v1.9.1", &target, false).unwrap();

        let summary = git_summary(dir.path()).unwrap();
        assert_eq!(summary.commit_count, 3);
        assert_eq!(summary.contributors_count, 2);
        assert_eq!(summary.tag_count, 3);
        assert_eq!(summary.tags, vec!["v1.10.0", "v1.9.1", "v1.2.0"]);
        assert!(summary.last_commit_date.is_some());
        assert!(summary.current_branch.is_some());
    }

    #[test]
    fn test_git_summary_keeps_at_most_ten_tags() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let oid = commit_file(&repo, "a.txt", "alice", "only");
        let target = repo.find_object(oid, None).unwrap();
        for minor in 0..12 {
            repo.tag_lightweight(&format!("v0.{}.0", minor), &target, false)
                .unwrap();
        }

        let summary = git_summary(dir.path()).unwrap();
        assert_eq!(summary.tag_count, 12);
        assert_eq!(summary.tags.len(), MAX_TAGS);
        assert_eq!(summary.tags[0], "v0.11.0");
    }
}
