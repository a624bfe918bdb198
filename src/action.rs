//! Pipeline runner integration: step outputs

use std::io::Write;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{InstallError, Result};

/// Name of the output carrying the installed (clean) version
pub const INSTALLED_VERSION: &str = "installed-version";

/// Environment variable naming the runner's step-output file
pub const OUTPUT_FILE_ENV: &str = "GITHUB_OUTPUT";

/// True when running inside a pipeline runner
pub fn in_pipeline() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

/// Destination for step outputs
#[derive(Debug, Clone, Default)]
pub struct ActionOutputs {
    file: Option<PathBuf>,
}

impl ActionOutputs {
    /// Append to `file` when set, print to stdout otherwise
    pub fn new(file: Option<PathBuf>) -> Self {
        Self { file }
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        let line = format!("{}={}\n", name, value);
        let written = match &self.file {
            Some(path) => std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .and_then(|mut f| f.write_all(line.as_bytes())),
            None => std::io::stdout().lock().write_all(line.as_bytes()),
        };
        written.map_err(|source| InstallError::OutputError {
            name: name.to_string(),
            source,
        })?;
        info!("Output {} = {}", name, value);
        Ok(())
    }
}
