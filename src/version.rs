//! Release version discovery from the project manifest at a given commit.
//!
//! Reading the manifest requires moving the working tree, so the checkout is
//! held by a [CheckoutGuard] that puts the original reference back on every
//! exit path.

use std::fmt;

use tracing::{error, info, warn};

use crate::boundary::BoundaryWarning;
use crate::error::{ReleaseNotesError, Result};
use crate::git::{CheckoutTarget, Repository};

/// Manifest file looked up at the repository root, matched by exact name
pub const MANIFEST_FILE: &str = "pom.xml";

/// Version used when no manifest exists at the commit
pub const DEFAULT_VERSION: &str = "1.0";

/// Where a version label came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSource {
    Manifest,
    Default,
}

/// A version label read at a specific commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestVersion {
    pub value: String,
    pub source: VersionSource,
}

impl ManifestVersion {
    pub fn from_manifest(value: impl Into<String>) -> Self {
        ManifestVersion {
            value: value.into(),
            source: VersionSource::Manifest,
        }
    }

    pub fn default_version() -> Self {
        ManifestVersion {
            value: DEFAULT_VERSION.to_string(),
            source: VersionSource::Default,
        }
    }
}

impl fmt::Display for ManifestVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Scoped checkout of another commit.
///
/// While the guard lives, the repository has `target` checked out. Call
/// [CheckoutGuard::restore] to put the original reference back and observe a
/// failure; dropping the guard without it still restores, logging any error.
pub struct CheckoutGuard<'r, R: Repository + ?Sized> {
    repo: &'r mut R,
    original: Option<CheckoutTarget>,
}

impl<'r, R: Repository + ?Sized> CheckoutGuard<'r, R> {
    /// Remember the current checkout and move to `target`.
    ///
    /// If the checkout itself fails, restoration is still attempted before the
    /// error is returned.
    pub fn acquire(repo: &'r mut R, target: &CheckoutTarget) -> Result<Self> {
        let original = repo.current_checkout()?;
        info!("Checkout to commit '{}'", target);

        if let Err(e) = repo.checkout(target) {
            error!("Checkout to '{}' failed: {}", target, e);
            repo.checkout(&original)
                .map_err(|restore| ReleaseNotesError::CheckoutRestore {
                    target: original.to_string(),
                    reason: restore.to_string(),
                })?;
            return Err(e);
        }

        Ok(CheckoutGuard {
            repo,
            original: Some(original),
        })
    }

    /// The repository, with the guarded target checked out
    pub fn repo(&self) -> &R {
        &*self.repo
    }

    /// Put the original checkout back.
    ///
    /// # Returns
    /// * `Err(CheckoutRestore)` - The working tree is in an unknown state
    pub fn restore(mut self) -> Result<()> {
        match self.original.take() {
            Some(original) => {
                info!("Restoring checkout of '{}'", original);
                self.repo
                    .checkout(&original)
                    .map_err(|e| ReleaseNotesError::CheckoutRestore {
                        target: original.to_string(),
                        reason: e.to_string(),
                    })
            }
            None => Ok(()),
        }
    }
}

impl<'r, R: Repository + ?Sized> Drop for CheckoutGuard<'r, R> {
    fn drop(&mut self) {
        if let Some(original) = self.original.take() {
            if let Err(e) = self.repo.checkout(&original) {
                error!(
                    "{}",
                    ReleaseNotesError::CheckoutRestore {
                        target: original.to_string(),
                        reason: e.to_string(),
                    }
                );
            }
        }
    }
}

/// Read the release version declared at `commit`.
///
/// The working tree is moved to `commit` and restored afterwards whatever the
/// outcome of the read. A failed restore wins over the read result.
///
/// # Returns
/// * `Ok(ManifestVersion)` - The manifest's version, or [DEFAULT_VERSION] without one
/// * `Err(CheckoutRestore)` - The original reference could not be checked out again
/// * `Err` - Checkout or manifest parsing failed
pub fn version_at<R: Repository + ?Sized>(repo: &mut R, commit: &str) -> Result<ManifestVersion> {
    let target = CheckoutTarget::Detached(commit.to_string());
    let guard = CheckoutGuard::acquire(repo, &target)?;
    let read = read_manifest_version(guard.repo(), commit);

    match guard.restore() {
        Ok(()) => read,
        Err(restore_err) => {
            if let Err(read_err) = &read {
                error!("Reading version at {} failed: {}", commit, read_err);
            }
            Err(restore_err)
        }
    }
}

fn read_manifest_version<R: Repository + ?Sized>(repo: &R, commit: &str) -> Result<ManifestVersion> {
    let Some(xml) = repo.read_root_file(MANIFEST_FILE)? else {
        warn!("{}", BoundaryWarning::ManifestMissing { commit: commit.to_string() });
        warn!("Using default version {}", DEFAULT_VERSION);
        return Ok(ManifestVersion::default_version());
    };

    match parse_manifest_version(&xml)? {
        Some(value) => {
            info!("Found version {} in {}", value, MANIFEST_FILE);
            Ok(ManifestVersion::from_manifest(value))
        }
        None => {
            warn!(
                "{}",
                BoundaryWarning::ManifestWithoutVersion { commit: commit.to_string() }
            );
            Ok(ManifestVersion::default_version())
        }
    }
}

/// Extract the text of `/project/version` from a manifest document.
///
/// Elements are matched by local name so namespaced manifests work. Blank
/// text counts as absent.
pub fn parse_manifest_version(xml: &str) -> Result<Option<String>> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| {
        ReleaseNotesError::manifest(format!("Failed to parse {}: {}", MANIFEST_FILE, e))
    })?;

    let project = doc.root_element();
    if project.tag_name().name() != "project" {
        return Ok(None);
    }

    let version = project
        .children()
        .find(|node| node.is_element() && node.tag_name().name() == "version")
        .and_then(|node| node.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);
    Ok(version)
}
