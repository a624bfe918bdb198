//! Artifact download with bounded, cancellable retry

use std::path::Path;

use futures::StreamExt;
use log::{debug, info, warn};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use super::artifact::ArtifactSpec;
use crate::config::RetryPolicy;
use crate::error::{InstallError, Result};

/// Outcome of a successful fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Attempts used, including the successful one
    pub attempts: u32,
    pub bytes: u64,
}

/// Downloads artifacts one at a time over a shared client
pub struct Fetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
    cancel: CancellationToken,
}

impl Fetcher {
    pub fn new(client: reqwest::Client, retry: RetryPolicy, cancel: CancellationToken) -> Self {
        Self {
            client,
            retry,
            cancel,
        }
    }

    /// Fetch `artifact` to its local path, retrying per the policy
    ///
    /// Every failed attempt is logged as a warning. On exhaustion the local
    /// path does not exist.
    pub async fn fetch(&self, artifact: &ArtifactSpec) -> Result<FetchOutcome> {
        let url = artifact.url.as_str();
        let dest = artifact.local_path.as_path();
        let attempts = self.retry.attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            if self.cancel.is_cancelled() {
                return Err(InstallError::Cancelled);
            }

            match self.download_once(url, dest).await {
                Ok(bytes) => {
                    info!("Downloaded {} ({} bytes)", artifact.file_name(), bytes);
                    return Ok(FetchOutcome { attempts: attempt, bytes });
                }
                Err(InstallError::Cancelled) => return Err(InstallError::Cancelled),
                Err(e) => {
                    if attempt < attempts {
                        warn!(
                            "Attempt {}/{} to download {} failed: {}. Retrying in {}ms",
                            attempt,
                            attempts,
                            url,
                            e,
                            self.retry.delay.as_millis()
                        );
                        tokio::select! {
                            _ = self.cancel.cancelled() => return Err(InstallError::Cancelled),
                            _ = tokio::time::sleep(self.retry.delay) => {}
                        }
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(InstallError::DownloadExhaustedError {
            url: url.to_string(),
            attempts,
            last: Box::new(
                last_error.unwrap_or_else(|| InstallError::download(url, "no attempt made")),
            ),
        })
    }

    /// Single attempt; removes `dest` on any failure, cancellation included
    async fn download_once(&self, url: &str, dest: &Path) -> Result<u64> {
        let result = tokio::select! {
            r = self.stream_to_file(url, dest) => r,
            _ = self.cancel.cancelled() => Err(InstallError::Cancelled),
        };
        if result.is_err() {
            // best effort, the file may never have been created
            if let Err(e) = tokio::fs::remove_file(dest).await
                && e.kind() != std::io::ErrorKind::NotFound
            {
                debug!("Failed to remove partial download {}: {}", dest.display(), e);
            }
        }
        result
    }

    async fn stream_to_file(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| InstallError::download(url, format!("request failed: {}", e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(InstallError::download(url, format!("HTTP {}", status)));
        }
        let expected = response.content_length();

        let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
            InstallError::download(url, format!("cannot create {}: {}", dest.display(), e))
        })?;

        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.map_err(|e| InstallError::download(url, format!("stream error: {}", e)))?;
            file.write_all(&chunk).await.map_err(|e| {
                InstallError::download(url, format!("write to {} failed: {}", dest.display(), e))
            })?;
            written += chunk.len() as u64;
        }

        check_complete(url, written, expected)?;

        file.flush()
            .await
            .map_err(|e| InstallError::download(url, format!("flush failed: {}", e)))?;
        file.sync_all()
            .await
            .map_err(|e| InstallError::download(url, format!("sync failed: {}", e)))?;

        Ok(written)
    }
}

/// A body shorter or longer than the declared `Content-Length` is a failed attempt
fn check_complete(url: &str, written: u64, expected: Option<u64>) -> Result<()> {
    match expected {
        Some(expected) if written != expected => Err(InstallError::download(
            url,
            format!("stream ended after {} of {} bytes", written, expected),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use std::cell::Cell;
    use std::io::Write;
    use std::sync::Once;
    use std::time::Duration;

    thread_local! {
        static WARNINGS: Cell<usize> = const { Cell::new(0) };
    }

    /// Counts this crate's warnings on the current thread; `#[tokio::test]`
    /// runs the fetcher on the test's own thread
    struct WarningCounter;

    impl log::Log for WarningCounter {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.level() <= log::Level::Warn
        }

        fn log(&self, record: &log::Record) {
            if record.level() == log::Level::Warn && record.target().starts_with(env!("CARGO_CRATE_NAME")) {
                WARNINGS.with(|w| w.set(w.get() + 1));
            }
        }

        fn flush(&self) {}
    }

    static COUNTER: WarningCounter = WarningCounter;
    static INSTALL_COUNTER: Once = Once::new();

    fn count_warnings() {
        INSTALL_COUNTER.call_once(|| {
            log::set_logger(&COUNTER).unwrap();
            log::set_max_level(log::LevelFilter::Warn);
        });
        WARNINGS.with(|w| w.set(0));
    }

    fn warnings() -> usize {
        WARNINGS.with(Cell::get)
    }

    fn fetcher(cancel: CancellationToken) -> Fetcher {
        Fetcher::new(
            reqwest::Client::new(),
            RetryPolicy {
                attempts: 3,
                delay: Duration::from_millis(10),
            },
            cancel,
        )
    }

    fn artifact(base: &str, dir: &Path) -> ArtifactSpec {
        ArtifactSpec {
            url: format!("{}/download/templates.tar.gz", base),
            local_path: dir.join("templates.tar.gz"),
        }
    }

    #[tokio::test]
    async fn writes_body_on_first_try() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/download/templates.tar.gz")
            .with_status(200)
            .with_body("payload")
            .expect(1)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let spec = artifact(&server.url(), dir.path());

        let outcome = fetcher(CancellationToken::new()).fetch(&spec).await.unwrap();

        assert_eq!(outcome, FetchOutcome { attempts: 1, bytes: 7 });
        assert_eq!(std::fs::read(&spec.local_path).unwrap(), b"payload");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn follows_redirects() {
        let mut server = Server::new_async().await;
        let redirect = server
            .mock("GET", "/download/templates.tar.gz")
            .with_status(302)
            .with_header("location", &format!("{}/storage/blob", server.url()))
            .create_async()
            .await;
        let blob = server
            .mock("GET", "/storage/blob")
            .with_status(200)
            .with_body("real bytes")
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let spec = artifact(&server.url(), dir.path());

        fetcher(CancellationToken::new()).fetch(&spec).await.unwrap();

        assert_eq!(std::fs::read(&spec.local_path).unwrap(), b"real bytes");
        redirect.assert_async().await;
        blob.assert_async().await;
    }

    #[tokio::test]
    async fn succeeds_on_third_attempt() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("GET", "/download/templates.tar.gz")
            .with_status(500)
            .expect(2)
            .create_async()
            .await;
        let ok = server
            .mock("GET", "/download/templates.tar.gz")
            .with_status(200)
            .with_body("third time")
            .expect(1)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let spec = artifact(&server.url(), dir.path());
        count_warnings();

        let outcome = fetcher(CancellationToken::new()).fetch(&spec).await.unwrap();

        assert_eq!(outcome.attempts, 3);
        assert_eq!(warnings(), 2);
        assert_eq!(std::fs::read(&spec.local_path).unwrap(), b"third time");
        failing.assert_async().await;
        ok.assert_async().await;
    }

    #[tokio::test]
    async fn exhaustion_leaves_no_file() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/download/templates.tar.gz")
            .with_status(503)
            .expect(3)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let spec = artifact(&server.url(), dir.path());
        count_warnings();

        let err = fetcher(CancellationToken::new())
            .fetch(&spec)
            .await
            .unwrap_err();

        match err {
            InstallError::DownloadExhaustedError { url, attempts, .. } => {
                assert_eq!(url, spec.url);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // no retry is announced after the last attempt
        assert_eq!(warnings(), 2);
        assert!(!spec.local_path.exists());
        m.assert_async().await;
    }

    #[tokio::test]
    async fn dropped_connection_mid_body_is_retried_then_removed() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/download/templates.tar.gz")
            .with_status(200)
            .with_chunked_body(|w| {
                w.write_all(b"partial")?;
                w.flush()?;
                // let the headers and first chunk reach the client
                std::thread::sleep(Duration::from_millis(100));
                Err(std::io::Error::other("connection dropped"))
            })
            .expect(3)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let spec = artifact(&server.url(), dir.path());

        let err = fetcher(CancellationToken::new())
            .fetch(&spec)
            .await
            .unwrap_err();

        match err {
            InstallError::DownloadExhaustedError { last, .. } => match *last {
                InstallError::DownloadError { reason, .. } => {
                    assert!(reason.starts_with("stream error"), "{reason}")
                }
                other => panic!("unexpected cause: {other:?}"),
            },
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!spec.local_path.exists());
        m.assert_async().await;
    }

    #[test]
    fn short_body_against_content_length_is_download_error() {
        let err = check_complete("https://example.test/a.tar.gz", 4, Some(10)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "download of https://example.test/a.tar.gz failed: stream ended after 4 of 10 bytes"
        );
        assert!(check_complete("https://example.test/a.tar.gz", 10, Some(10)).is_ok());
        assert!(check_complete("https://example.test/a.tar.gz", 4, None).is_ok());
    }

    #[tokio::test]
    async fn stale_file_removed_after_failure() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/download/templates.tar.gz")
            .with_status(404)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let spec = artifact(&server.url(), dir.path());
        std::fs::write(&spec.local_path, b"left over from a previous run").unwrap();

        assert!(fetcher(CancellationToken::new()).fetch(&spec).await.is_err());
        assert!(!spec.local_path.exists());
    }

    #[tokio::test]
    async fn cancellation_interrupts_retry_delay() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/download/templates.tar.gz")
            .with_status(500)
            .expect(1)
            .create_async()
            .await;
        let dir = tempfile::tempdir().unwrap();
        let spec = artifact(&server.url(), dir.path());

        let cancel = CancellationToken::new();
        let slow = Fetcher::new(
            reqwest::Client::new(),
            RetryPolicy {
                attempts: 3,
                delay: Duration::from_secs(3600),
            },
            cancel.clone(),
        );
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let err = tokio::time::timeout(Duration::from_secs(10), slow.fetch(&spec))
            .await
            .expect("retry delay was not cancelled")
            .unwrap_err();

        assert!(matches!(err, InstallError::Cancelled));
        m.assert_async().await;
    }
}
