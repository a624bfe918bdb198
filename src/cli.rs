use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::action::OUTPUT_FILE_ENV;
use crate::config::{DEFAULT_API_URL, DEFAULT_SERVER_URL, InstallerConfig, RetryPolicy};
use crate::download::RepoId;
use crate::settings::SettingsInputs;

/// Action inputs. Each flag falls back to the `INPUT_*` variable the
/// pipeline runner sets for the input of the same name.
#[derive(Parser, Debug, Clone)]
#[command(version, about = "Install the latest release of a project and write its settings.json")]
pub struct Args {
    /// Upstream repository, owner/name
    #[arg(long, env = "INPUT_GITHUB-REPO")]
    pub github_repo: RepoId,

    /// Existing directory to extract into and write settings.json to
    #[arg(long, env = "INPUT_INSTALL-DIR")]
    pub install_dir: PathBuf,

    #[arg(long, env = "INPUT_GITHUB-USERNAME")]
    pub github_username: String,

    #[arg(long, env = "INPUT_WEBSITE-NAME")]
    pub website_name: String,

    #[arg(long, env = "INPUT_TEMPLATE-DIR")]
    pub template_dir: String,

    #[arg(long, env = "INPUT_MARKDOWN-DIR")]
    pub markdown_dir: String,

    #[arg(long, env = "INPUT_OUTPUT-DIR")]
    pub output_dir: String,

    #[arg(long, env = "INPUT_WEBSITE-URL")]
    pub website_url: String,

    #[arg(long, env = "INPUT_WEBSITE-DESCRIPTION")]
    pub website_description: String,

    /// "true" enables it, anything else disables it
    #[arg(long, env = "INPUT_TIMESTAMPS-FROM-FILENAME")]
    pub timestamps_from_filename: String,

    /// Project name in the binary archive name (defaults to the repository name)
    #[arg(long, env = "INPUT_PROJECT")]
    pub project: Option<String>,

    /// Token for the release API
    #[arg(long, env = "INPUT_GITHUB-TOKEN", hide_env_values = true)]
    pub github_token: Option<String>,

    #[arg(long, env = "INPUT_API-URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[arg(long, env = "GITHUB_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    pub server_url: String,

    /// Where the downloaded archives are kept
    #[arg(long, env = "INPUT_WORK-DIR", default_value = ".")]
    pub work_dir: PathBuf,

    /// Attempts per artifact
    #[arg(long, env = "INPUT_RETRIES", default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub retries: u32,

    #[arg(long, env = "INPUT_RETRY-DELAY-MS", default_value_t = 1000)]
    pub retry_delay_ms: u64,

    /// Per-request timeout
    #[arg(long, env = "INPUT_TIMEOUT-SECS", default_value_t = 60)]
    pub timeout_secs: u64,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn settings_inputs(&self) -> SettingsInputs {
        SettingsInputs {
            github_username: self.github_username.clone(),
            website_name: self.website_name.clone(),
            template_dir: self.template_dir.clone(),
            markdown_dir: self.markdown_dir.clone(),
            output_dir: self.output_dir.clone(),
            website_url: self.website_url.clone(),
            website_description: self.website_description.clone(),
            timestamps_from_filename: self.timestamps_from_filename.clone(),
        }
    }

    /// Validated run configuration; `GITHUB_TOKEN` and `GITHUB_OUTPUT` are
    /// read from the environment
    pub fn into_config(self) -> InstallerConfig {
        let token = self
            .github_token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok());
        let output_file = std::env::var_os(OUTPUT_FILE_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        self.to_config(token, output_file)
    }

    fn to_config(&self, token: Option<String>, output_file: Option<PathBuf>) -> InstallerConfig {
        let mut config =
            InstallerConfig::new(self.github_repo.clone(), &self.install_dir, self.settings_inputs())
                .with_work_dir(&self.work_dir)
                .with_api_url(&self.api_url)
                .with_server_url(&self.server_url)
                .with_token(token)
                .with_retry(RetryPolicy {
                    attempts: self.retries,
                    delay: Duration::from_millis(self.retry_delay_ms),
                })
                .with_request_timeout(Duration::from_secs(self.timeout_secs))
                .with_output_file(output_file);
        if let Some(project) = self.project.as_deref().filter(|p| !p.is_empty()) {
            config = config.with_project(project);
        }
        config
    }
}
