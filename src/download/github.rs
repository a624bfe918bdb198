//! Release API interaction

use log::debug;
use serde::Deserialize;

use super::artifact::{Release, RepoId};
use crate::error::{InstallError, Result};

/// Release metadata from the API; only the tag is consumed
#[derive(Deserialize, Debug)]
pub struct GitHubRelease {
    pub tag_name: String,
}

/// `{api}/repos/{owner}/{name}/releases/latest`
pub fn latest_release_url(api_url: &str, repo: &RepoId) -> String {
    format!(
        "{}/repos/{}/{}/releases/latest",
        api_url.trim_end_matches('/'),
        repo.owner(),
        repo.name()
    )
}

/// Fetch the latest published release of `repo`
///
/// One request, no retry. Anything but HTTP 200 aborts the run.
pub async fn get_latest_release(
    client: &reqwest::Client,
    api_url: &str,
    repo: &RepoId,
    token: Option<&str>,
) -> Result<Release> {
    let url = latest_release_url(api_url, repo);
    debug!("Querying {}", url);

    let mut request = client
        .get(&url)
        .header(reqwest::header::ACCEPT, "application/vnd.github+json");
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let response = request
        .send()
        .await
        .map_err(|source| InstallError::ApiRequest {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(InstallError::ApiError {
            url,
            status: status.as_u16(),
        });
    }

    let body = response
        .text()
        .await
        .map_err(|source| InstallError::ApiRequest {
            url: url.clone(),
            source,
        })?;
    let release: GitHubRelease =
        serde_json::from_str(&body).map_err(|source| InstallError::ParseError { url, source })?;

    Ok(Release::new(release.tag_name))
}
