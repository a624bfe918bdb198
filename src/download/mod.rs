//! Release discovery, artifact download and archive extraction
//!
//! ## Module Organization
//!
//! - `artifact` - Release tags, repository ids and artifact naming
//! - `github` - Release API interaction
//! - `core` - Download with retry
//! - `extract` - gzip-tar extraction

pub mod artifact;
pub mod github;
pub mod extract;
pub mod core;

pub use artifact::{ArtifactSpec, Release, RepoId};
pub use self::core::{FetchOutcome, Fetcher};
pub use extract::extract_tar_gz;
pub use github::get_latest_release;
