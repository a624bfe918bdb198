use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use release_installer::cli::Args;
use release_installer::{action, logging, run_install};

fn main() {
    let args = Args::parse_args();
    logging::init_logger(action::in_pipeline());

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("FATAL: Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };
    if let Err(e) = rt.block_on(real_main(args)) {
        // one terminal failure message for the whole run
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn real_main(args: Args) -> Result<()> {
    let config = args.into_config();
    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone());

    let report = run_install(&config, cancel)
        .await
        .with_context(|| format!("Failed to install {}", config.repo))?;

    info!(
        "Installed {} {} into {} ({} entries)",
        config.project,
        report.release.clean_tag,
        config.install_dir.display(),
        report.extracted.len()
    );
    Ok(())
}

/// Cancel the run on Ctrl-C or SIGTERM (pipeline timeout)
fn spawn_signal_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    warn!("Cannot listen for SIGTERM: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = terminate => {}
        }
        warn!("Termination requested, cancelling installation");
        cancel.cancel();
    });
}
