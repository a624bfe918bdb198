//! Installation flow
//!
//! resolve latest release → publish `installed-version` → download binary
//! and template archives → extract both into the install directory → write
//! `settings.json`. Every step is awaited before the next one
//! starts, so log lines come out in a fixed order.

use std::path::PathBuf;

use log::info;
use tokio_util::sync::CancellationToken;

use crate::action::{ActionOutputs, INSTALLED_VERSION};
use crate::config::InstallerConfig;
use crate::download::artifact::{release_artifacts, release_download_base};
use crate::download::{Fetcher, Release, extract_tar_gz, get_latest_release};
use crate::error::{InstallError, Result};
use crate::settings::InstallSettings;

/// What a successful run produced
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub release: Release,
    /// Entries unpacked from the binary archive, then the template archive
    pub extracted: Vec<PathBuf>,
    pub settings_path: PathBuf,
}

/// Run the whole installation once
pub async fn run_install(config: &InstallerConfig, cancel: CancellationToken) -> Result<InstallReport> {
    if !tokio::fs::metadata(&config.install_dir)
        .await
        .is_ok_and(|m| m.is_dir())
    {
        return Err(InstallError::InstallDirMissing(config.install_dir.clone()));
    }

    let client = config.http_client().map_err(InstallError::Client)?;

    info!("Resolving latest release of {}", config.repo);
    let release = get_latest_release(
        &client,
        &config.api_url,
        &config.repo,
        config.token.as_deref(),
    )
    .await?;
    info!("Latest release is {} (version {})", release.tag, release.clean_tag);
    // published before any download, a failed install still reports it
    ActionOutputs::new(config.output_file.clone()).set(INSTALLED_VERSION, &release.clean_tag)?;

    let base = release_download_base(&config.server_url, &config.repo, &release);
    info!("Constructed download URL: {}", base);

    let artifacts = release_artifacts(
        &config.server_url,
        &config.repo,
        &config.project,
        &release,
        &config.work_dir,
    );
    info!(
        "Two files will be downloaded: {} and {}",
        artifacts[0].file_name(),
        artifacts[1].file_name()
    );

    let fetcher = Fetcher::new(client, config.retry, cancel);
    for artifact in &artifacts {
        fetcher.fetch(artifact).await?;
    }

    let mut extracted = Vec::new();
    for artifact in &artifacts {
        let entries = extract_tar_gz(&artifact.local_path, &config.install_dir).await?;
        info!(
            "Extracted {} into {}: {}",
            artifact.local_path.display(),
            config.install_dir.display(),
            entries
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        extracted.extend(entries);
    }

    let settings_path = InstallSettings::from(&config.settings)
        .write_to(&config.install_dir)
        .await?;
    info!("Wrote {}", settings_path.display());

    Ok(InstallReport {
        release,
        extracted,
        settings_path,
    })
}
