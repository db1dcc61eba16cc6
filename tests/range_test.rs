mod common;

use git2::Repository as Git2Repo;
use release_notes_generator::git::{CheckoutTarget, Git2Repository, Repository};
use release_notes_generator::range::{self, RangeSpec};
use release_notes_generator::version::{version_at, VersionSource};
use release_notes_generator::{history, tags, ReleaseNotesError};

fn sorted(messages: &std::collections::HashSet<String>) -> Vec<String> {
    let mut messages: Vec<String> = messages.iter().map(|m| m.trim().to_string()).collect();
    messages.sort();
    messages
}

#[test]
fn test_clone_lists_both_tags_peeled_to_commits() {
    let fixture = common::setup();
    let repo = fixture.open();

    let listed = tags::list_tags(&repo).unwrap();
    assert_eq!(listed.len(), 2);

    let lightweight = tags::find_by_suffix(&listed, "1.2").unwrap();
    assert!(!lightweight.annotated);
    assert_eq!(lightweight.reference, "refs/tags/1.2");
    assert_eq!(lightweight.target, fixture.commits[1]);

    let annotated = tags::find_by_suffix(&listed, "1.3").unwrap();
    assert!(annotated.annotated);
    assert_eq!(annotated.target, fixture.commits[4]);
}

#[test]
fn test_walk_yields_history_newest_first() {
    let fixture = common::setup();
    let repo = fixture.open();

    let ids: Vec<String> = history::walk(&repo)
        .unwrap()
        .map(|c| c.unwrap().id)
        .collect();
    let mut expected = fixture.commits.clone();
    expected.reverse();
    assert_eq!(ids, expected);
}

#[test]
fn test_walk_of_empty_repository_is_unavailable() {
    let fixture = common::setup();
    let empty_dir = fixture.dir.path().join("empty");
    let empty = Git2Repository::from_git2(Git2Repo::init(&empty_dir).unwrap(), fixture.settings());

    assert!(matches!(
        history::walk(&empty),
        Err(ReleaseNotesError::HistoryUnavailable(_))
    ));
}

#[test]
fn test_tag_window_collects_four_messages_and_version() {
    let fixture = common::setup();
    let mut repo = fixture.open();

    let result = range::read_by_tag(&mut repo, Some("1.2"), Some("1.3")).unwrap();
    assert_eq!(
        sorted(&result.messages),
        vec![
            "SYM-31 release of version 1.2",
            "SYM-32 first part",
            "SYM-32 second part",
            "SYM-33 release of version 1.3",
        ]
    );
    assert_eq!(result.version, "1.3");
    assert_eq!(result.newest_commit, fixture.commits[4]);
}

#[test]
fn test_boundary_order_does_not_matter() {
    let fixture = common::setup();
    let mut repo = fixture.open();
    let (c1, c4) = (fixture.commits[1].as_str(), fixture.commits[4].as_str());

    let forward = range::read_by_commit(&mut repo, Some(c1), Some(c4)).unwrap();
    let backward = range::read_by_commit(&mut repo, Some(c4), Some(c1)).unwrap();
    assert_eq!(forward, backward);
}

#[test]
fn test_tags_and_their_commits_give_the_same_window() {
    let fixture = common::setup();
    let mut repo = fixture.open();

    let by_tag = range::read_by_tag(&mut repo, Some("1.3"), Some("1.2")).unwrap();
    let by_commit = range::read_by_commit(
        &mut repo,
        Some(&fixture.commits[4]),
        Some(&fixture.commits[1]),
    )
    .unwrap();
    assert_eq!(by_tag, by_commit);
}

#[test]
fn test_single_commit_window() {
    let fixture = common::setup();
    let mut repo = fixture.open();
    let c2 = fixture.commits[2].as_str();

    let result = range::read_by_commit(&mut repo, Some(c2), Some(c2)).unwrap();
    assert_eq!(sorted(&result.messages), vec!["SYM-32 first part"]);
    // no pom.xml change since c1
    assert_eq!(result.version, "1.2");
}

#[test]
fn test_missing_boundary_reads_from_head() {
    let fixture = common::setup();
    let mut repo = fixture.open();

    let result = range::read_by_commit(&mut repo, None, Some(&fixture.commits[3])).unwrap();
    assert_eq!(
        sorted(&result.messages),
        vec![
            "SYM-32 second part",
            "SYM-33 release of version 1.3",
            "SYM-41 prepare 1.4",
        ]
    );
    assert_eq!(result.version, "1.4-SNAPSHOT");
}

#[test]
fn test_latest_released_version_uses_two_newest_tags() {
    let fixture = common::setup();
    let mut repo = fixture.open();

    let result = range::resolve(&mut repo, &RangeSpec::Latest).unwrap();
    assert_eq!(result.messages.len(), 4);
    assert_eq!(result.version, "1.3");
}

#[test]
fn test_unknown_tag_is_a_missing_range() {
    let fixture = common::setup();
    let mut repo = fixture.open();

    let result = range::read_by_tag(&mut repo, Some("9.9"), Some("1.2"));
    assert!(matches!(
        result,
        Err(ReleaseNotesError::AmbiguousOrMissingRange { .. })
    ));
}

#[test]
fn test_version_extraction_restores_branch() {
    let fixture = common::setup();
    let mut repo = fixture.open();

    let initial = version_at(&mut repo, &fixture.commits[0]).unwrap();
    assert_eq!(initial.value, "1.0");
    assert_eq!(initial.source, VersionSource::Default);

    let snapshot = version_at(&mut repo, &fixture.commits[5]).unwrap();
    assert_eq!(snapshot.value, "1.4-SNAPSHOT");
    assert_eq!(snapshot.source, VersionSource::Manifest);

    assert_eq!(
        repo.current_checkout().unwrap(),
        CheckoutTarget::Branch("refs/heads/master".to_string())
    );
    // working tree is back at the tip
    let manifest = repo.read_root_file("pom.xml").unwrap().unwrap();
    assert!(manifest.contains("1.4-SNAPSHOT"));
}

#[test]
fn test_reopening_existing_clone_keeps_history() {
    let fixture = common::setup();
    fixture.open().close();

    let mut reopened = fixture.open();
    assert_eq!(
        reopened.current_checkout().unwrap(),
        CheckoutTarget::Branch("refs/heads/master".to_string())
    );
    let result = range::read_by_tag(&mut reopened, Some("1.2"), Some("1.3")).unwrap();
    assert_eq!(result.version, "1.3");
}

#[test]
fn test_unreachable_origin_falls_back_to_local_state() {
    let fixture = common::setup();
    fixture.open().close();
    std::fs::remove_dir_all(&fixture.origin).unwrap();

    let mut reopened = fixture.open();
    assert_eq!(
        reopened.current_checkout().unwrap(),
        CheckoutTarget::Branch("refs/heads/master".to_string())
    );
    let result = range::read_by_tag(&mut reopened, Some("1.2"), Some("1.3")).unwrap();
    assert_eq!(result.messages.len(), 4);
    assert_eq!(result.version, "1.3");
}

#[test]
fn test_walk_keeps_children_before_parents_with_skewed_clocks() {
    let fixture = common::setup();
    fixture.open().close();

    let git = Git2Repo::open(fixture.workdir()).unwrap();
    let (tip, base, skewed, side, merge) = {
        let tip = git.head().unwrap().peel_to_commit().unwrap();
        let tree = tip.tree().unwrap();
        let at = |offset: i64| {
            let time = git2::Time::new(tip.time().seconds() + offset, 0);
            git2::Signature::new("Tester", "tester@example.com", &time).unwrap()
        };
        let commit = |message: &str, offset: i64, parents: &[&git2::Commit]| {
            let oid = git
                .commit(None, &at(offset), &at(offset), message, &tree, parents)
                .unwrap();
            git.find_commit(oid).unwrap()
        };

        // the second branch's commit is dated before its own parent
        let base = commit("SYM-50 base", 10_000, &[&tip]);
        let skewed = commit("SYM-51 skewed", 9_000, &[&base]);
        let side = commit("SYM-52 side", 20_000, &[&base]);
        let merge = commit("SYM-53 merge", 30_000, &[&side, &skewed]);
        git.reference("refs/heads/master", merge.id(), true, "merge")
            .unwrap();
        (tip.id(), base.id(), skewed.id(), side.id(), merge.id())
    };

    let repo = Git2Repository::from_git2(git, fixture.settings());
    let ids: Vec<String> = history::walk(&repo)
        .unwrap()
        .map(|c| c.unwrap().id)
        .collect();
    let position = |id: git2::Oid| ids.iter().position(|i| *i == id.to_string()).unwrap();

    assert_eq!(position(merge), 0);
    assert!(position(skewed) < position(base));
    assert!(position(side) < position(base));
    assert!(position(base) < position(tip));
}
