// tests/common/mod.rs
//
// Seeded history shared by the integration tests, oldest first:
//
//   c0  SYM-1 initial                  README.md, no pom.xml
//   c1  SYM-31 release of version 1.2  pom 1.2            tag 1.2 (lightweight)
//   c2  SYM-32 first part
//   c3  SYM-32 second part
//   c4  SYM-33 release of version 1.3  pom 1.3            tag 1.3 (annotated)
//   c5  SYM-41 prepare 1.4             pom 1.4-SNAPSHOT
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use git2::{PushOptions, Repository, RepositoryInitOptions, Signature, Time};
use release_notes_generator::git::{Committer, Credentials, Git2Repository, RepositorySettings};
use tempfile::TempDir;

const BASE_TIME: i64 = 1_600_000_000;

pub struct Fixture {
    pub dir: TempDir,
    pub origin: PathBuf,
    /// Commit ids c0..c5
    pub commits: Vec<String>,
}

impl Fixture {
    pub fn workdir(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    pub fn settings(&self) -> RepositorySettings {
        settings_for(&self.workdir(), &self.origin)
    }

    /// Clone the origin into the fixture's working directory
    pub fn open(&self) -> Git2Repository {
        Git2Repository::open_or_clone(self.settings()).expect("clone of origin")
    }

    /// Fresh clone of the origin, independent of the working copy
    pub fn inspect_origin(&self, name: &str) -> Repository {
        let target = self.dir.path().join(name);
        Repository::clone(self.origin.to_str().unwrap(), target).expect("inspection clone")
    }
}

pub fn settings_for(workdir: &Path, origin: &Path) -> RepositorySettings {
    RepositorySettings {
        directory: workdir.to_path_buf(),
        branch: "master".to_string(),
        url: Some(origin.to_str().unwrap().to_string()),
        credentials: Credentials::default(),
        committer: Committer {
            name: "Release Bot".to_string(),
            mail: "release-bot@example.com".to_string(),
        },
    }
}

pub fn pom(version: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <groupId>com.example</groupId>
    <artifactId>symphony</artifactId>
    <version>{}</version>
</project>
"#,
        version
    )
}

fn signature(time: i64) -> Signature<'static> {
    Signature::new("Tester", "tester@example.com", &Time::new(time, 0)).unwrap()
}

fn commit(repo: &Repository, files: &[(&str, &str)], message: &str, time: i64) -> git2::Oid {
    let workdir = repo.workdir().unwrap();
    let mut index = repo.index().unwrap();
    for (name, contents) in files {
        fs::write(workdir.join(name), contents).unwrap();
        index.add_path(Path::new(name)).unwrap();
    }
    index.write().unwrap();

    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    let sig = signature(time);
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

/// Build the seeded history and push it to a bare origin.
pub fn setup() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let seed_path = dir.path().join("seed");
    let origin = dir.path().join("origin.git");

    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("master");
    let seed = Repository::init_opts(&seed_path, &opts).unwrap();

    let time = |i: i64| BASE_TIME + i * 1000;
    let mut commits = Vec::new();
    commits.push(commit(&seed, &[("README.md", "Symphony\n")], "SYM-1 initial", time(0)));
    commits.push(commit(
        &seed,
        &[("pom.xml", pom("1.2").as_str())],
        "SYM-31 release of version 1.2",
        time(1),
    ));
    commits.push(commit(&seed, &[("src.txt", "2\n")], "SYM-32 first part", time(2)));
    commits.push(commit(&seed, &[("src.txt", "3\n")], "SYM-32 second part", time(3)));
    commits.push(commit(
        &seed,
        &[("pom.xml", pom("1.3").as_str())],
        "SYM-33 release of version 1.3",
        time(4),
    ));
    commits.push(commit(
        &seed,
        &[("pom.xml", pom("1.4-SNAPSHOT").as_str())],
        "SYM-41 prepare 1.4",
        time(5),
    ));

    let c1 = seed.find_object(commits[1], None).unwrap();
    seed.tag_lightweight("1.2", &c1, false).unwrap();
    let c4 = seed.find_object(commits[4], None).unwrap();
    seed.tag("1.3", &c4, &signature(time(4) + 500), "Release 1.3", false)
        .unwrap();

    let mut bare_opts = RepositoryInitOptions::new();
    bare_opts.bare(true).initial_head("master");
    Repository::init_opts(&origin, &bare_opts).unwrap();

    let mut remote = seed.remote("origin", origin.to_str().unwrap()).unwrap();
    remote
        .push(
            &[
                "refs/heads/master:refs/heads/master",
                "refs/tags/1.2:refs/tags/1.2",
                "refs/tags/1.3:refs/tags/1.3",
            ],
            Some(&mut PushOptions::new()),
        )
        .unwrap();

    Fixture {
        dir,
        origin,
        commits: commits.iter().map(|oid| oid.to_string()).collect(),
    }
}
