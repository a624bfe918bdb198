//! Release installer library
//!
//! Installs the latest tagged release of an upstream project into a
//! directory and writes the `settings.json` the installed software reads at
//! startup. The `release-installer` binary is a thin wrapper that maps
//! pipeline inputs onto [`InstallerConfig`] and calls [`run_install`].

pub mod action;
pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod logging;
pub mod orchestration;
pub mod settings;

pub use config::{InstallerConfig, RetryPolicy};
pub use error::InstallError;
pub use orchestration::{InstallReport, run_install};
pub use settings::{InstallSettings, SettingsInputs};
