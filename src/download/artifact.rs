//! Release identity and artifact naming

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::InstallError;

/// Fixed target triple embedded in binary archive names
pub const TARGET_SUFFIX: &str = "linux_amd64";

/// File name of the template bundle attached to every release
pub const TEMPLATES_ARCHIVE: &str = "templates.tar.gz";

/// `owner/name` repository identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    owner: String,
    name: String,
}

impl RepoId {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for RepoId {
    type Err = InstallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(InstallError::InvalidRepository(s.to_string())),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Latest published release of the upstream project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub tag: String,
    pub clean_tag: String,
}

impl Release {
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        let clean_tag = clean_tag(&tag).to_string();
        Self { tag, clean_tag }
    }
}

/// Strip exactly one leading `v` from a release tag
pub fn clean_tag(tag: &str) -> &str {
    tag.strip_prefix('v').unwrap_or(tag)
}

/// One file to fetch: where it lives upstream and where it lands locally
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSpec {
    pub url: String,
    pub local_path: PathBuf,
}

impl ArtifactSpec {
    pub fn file_name(&self) -> &str {
        self.url.rsplit('/').next().unwrap_or(&self.url)
    }
}

/// `<project>_<clean_tag>_linux_amd64.tar.gz`
pub fn binary_archive_name(project: &str, release: &Release) -> String {
    format!("{}_{}_{}.tar.gz", project, release.clean_tag, TARGET_SUFFIX)
}

/// `{server}/{owner}/{name}/releases/download/{tag}`
pub fn release_download_base(server_url: &str, repo: &RepoId, release: &Release) -> String {
    format!(
        "{}/{}/{}/releases/download/{}",
        server_url.trim_end_matches('/'),
        repo.owner(),
        repo.name(),
        release.tag
    )
}

/// The binary archive and the template archive, in download order
pub fn release_artifacts(
    server_url: &str,
    repo: &RepoId,
    project: &str,
    release: &Release,
    work_dir: &Path,
) -> [ArtifactSpec; 2] {
    let base = release_download_base(server_url, repo, release);
    // Local names are the upstream names, so the binary archive never shares a
    // scratch file with the template archive.
    let binary = binary_archive_name(project, release);
    [
        ArtifactSpec {
            url: format!("{}/{}", base, binary),
            local_path: work_dir.join(&binary),
        },
        ArtifactSpec {
            url: format!("{}/{}", base, TEMPLATES_ARCHIVE),
            local_path: work_dir.join(TEMPLATES_ARCHIVE),
        },
    ]
}
