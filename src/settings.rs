//! The `settings.json` document read by the installed software at startup

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{InstallError, Result};

pub const SETTINGS_FILE: &str = "settings.json";

/// Raw pass-through inputs, as the pipeline hands them over
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsInputs {
    pub github_username: String,
    pub website_name: String,
    pub template_dir: String,
    pub markdown_dir: String,
    pub output_dir: String,
    pub website_url: String,
    pub website_description: String,
    pub timestamps_from_filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallSettings {
    pub github_username: String,
    pub website_name: String,
    pub template_dir: String,
    pub markdown_dir: String,
    pub output_dir: String,
    #[serde(rename = "websiteURL")]
    pub website_url: String,
    pub website_description: String,
    pub timestamps_from_filename: bool,
}

impl From<&SettingsInputs> for InstallSettings {
    fn from(inputs: &SettingsInputs) -> Self {
        Self {
            github_username: inputs.github_username.clone(),
            website_name: inputs.website_name.clone(),
            template_dir: inputs.template_dir.clone(),
            markdown_dir: inputs.markdown_dir.clone(),
            output_dir: inputs.output_dir.clone(),
            website_url: inputs.website_url.clone(),
            website_description: inputs.website_description.clone(),
            // only the exact string "true" enables it
            timestamps_from_filename: inputs.timestamps_from_filename == "true",
        }
    }
}

impl InstallSettings {
    /// Pretty-printed JSON, 2-space indent, no trailing newline
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write `settings.json` into `install_dir`, replacing any previous copy
    pub async fn write_to(&self, install_dir: &Path) -> Result<PathBuf> {
        let path = install_dir.join(SETTINGS_FILE);
        let json = self.to_json().map_err(|e| InstallError::SettingsWriteError {
            path: path.clone(),
            source: e.into(),
        })?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| InstallError::SettingsWriteError {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}
