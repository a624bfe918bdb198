use std::path::PathBuf;
use std::time::Duration;

use crate::download::artifact::RepoId;
use crate::settings::SettingsInputs;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// Identifying header required by the release API
pub const USER_AGENT: &str = "Custom-Installer-Action";

fn default_retries() -> u32 {
    3
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Bounded retry applied to every artifact download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts per artifact, including the first one
    pub attempts: u32,
    /// Fixed wait between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: default_retries(),
            delay: default_retry_delay(),
        }
    }
}

/// Everything one installer run needs, already validated
#[derive(Debug, Clone)]
pub struct InstallerConfig {
    pub repo: RepoId,
    /// Project name embedded in the binary archive name
    pub project: String,
    pub install_dir: PathBuf,
    /// Directory receiving the downloaded archives
    pub work_dir: PathBuf,
    pub api_url: String,
    pub server_url: String,
    pub token: Option<String>,
    pub retry: RetryPolicy,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// File the `installed-version` output is appended to; stdout when unset
    pub output_file: Option<PathBuf>,
    pub settings: SettingsInputs,
}

impl InstallerConfig {
    /// Config with defaults for everything except the required inputs
    pub fn new(repo: RepoId, install_dir: impl Into<PathBuf>, settings: SettingsInputs) -> Self {
        Self {
            project: repo.name().to_string(),
            repo,
            install_dir: install_dir.into(),
            work_dir: PathBuf::from("."),
            api_url: DEFAULT_API_URL.to_string(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            token: None,
            retry: RetryPolicy::default(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            output_file: None,
            settings,
        }
    }

    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        self.project = project.into();
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_output_file(mut self, path: Option<PathBuf>) -> Self {
        self.output_file = path;
        self
    }

    /// Shared HTTP client: identifying header, timeouts, redirect following
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
    }
}
