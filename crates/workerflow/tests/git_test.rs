//! GitCli against a real repository

mod common;

use common::{TestRepo, git_available};
use std::path::PathBuf;
use workerflow::{ChangeDetector, ChangedPath, GitCli, SourceControl, Staleness};
use workerflow_core::{CommitRef, Worker};

fn repo_with_history() -> Option<(TestRepo, CommitRef)> {
    if !git_available() {
        eprintln!("git not available, skipping");
        return None;
    }

    let repo = TestRepo::new();
    repo.init_git();
    repo.add_flavor("whois", "Whois", "2.0", "whois.py");
    repo.write("whois", "whois.py", "print('v1')\n");
    repo.write("whois-legacy", "whois.py", "print('legacy')\n");
    let first = repo.commit_all("initial");
    Some((repo, CommitRef::new(first)))
}

#[tokio::test]
async fn head_commit_matches_rev_parse() {
    let Some((repo, first)) = repo_with_history() else {
        return;
    };
    let git = GitCli::new(repo.path());

    assert_eq!(git.head_commit().await.unwrap(), first);
}

#[tokio::test]
async fn changed_paths_lists_modifications_and_renames() {
    let Some((repo, first)) = repo_with_history() else {
        return;
    };
    repo.write("whois", "whois.py", "print('v2')\n");
    repo.git(&["mv", "analyzers/whois-legacy/whois.py", "analyzers/whois-legacy/main.py"]);
    let second = CommitRef::new(repo.commit_all("update"));
    let git = GitCli::new(repo.path());

    let mut changes = git.changed_paths(&first, &second).await.unwrap();
    changes.sort_by(|a, b| a.path.cmp(&b.path));

    assert_eq!(
        changes,
        vec![
            ChangedPath::new("analyzers/whois/whois.py"),
            ChangedPath::renamed(
                "analyzers/whois-legacy/whois.py",
                "analyzers/whois-legacy/main.py",
            ),
        ]
    );
}

#[tokio::test]
async fn detector_ignores_sibling_with_shared_prefix() {
    let Some((repo, first)) = repo_with_history() else {
        return;
    };
    repo.write("whois-legacy", "whois.py", "print('legacy v2')\n");
    repo.commit_all("legacy only");
    let git = GitCli::new(repo.path());
    let detector = ChangeDetector::new(&git);
    let head = detector.head_commit().await.unwrap();
    let whois = Worker::from_path("analyzers/whois").unwrap();
    let legacy = Worker::from_path("analyzers/whois-legacy").unwrap();

    assert_eq!(
        detector.staleness(&whois, Some(&first), &head).await,
        Staleness::Unchanged
    );
    assert_eq!(
        detector.staleness(&legacy, Some(&first), &head).await,
        Staleness::Changed(PathBuf::from("analyzers/whois-legacy/whois.py"))
    );
}

#[tokio::test]
async fn unknown_commit_is_stale() {
    let Some((repo, _first)) = repo_with_history() else {
        return;
    };
    let git = GitCli::new(repo.path());
    let detector = ChangeDetector::new(&git);
    let head = detector.head_commit().await.unwrap();
    let whois = Worker::from_path("analyzers/whois").unwrap();
    let garbage = CommitRef::new("deadbeefdeadbeefdeadbeefdeadbeefdeadbeef");

    assert!(matches!(
        detector.staleness(&whois, Some(&garbage), &head).await,
        Staleness::DiffFailed(_)
    ));
}

#[tokio::test]
async fn option_like_ref_is_rejected() {
    let Some((repo, first)) = repo_with_history() else {
        return;
    };
    let git = GitCli::new(repo.path());

    assert!(git
        .changed_paths(&CommitRef::new("--output=/tmp/pwned"), &first)
        .await
        .is_err());
}

#[tokio::test]
async fn head_commit_outside_a_repository_fails() {
    if !git_available() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let git = GitCli::new(dir.path());

    assert!(git.head_commit().await.is_err());
}
