use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::domain::{BatchItem, HistoryRecord, ItemResult, Platform, ProgressEvent};
use crate::refresh::config::RefreshConfig;
use crate::refresh::extractor::{extract_metrics, Extraction};
use crate::refresh::login::LoginDetector;
use crate::refresh::progress::ProgressSink;
use crate::refresh::{BatchError, PageSession, SessionError};
use crate::store::Store;

pub const MISSING_URL_ERROR: &str = "missing target url";
pub const RELOGIN_ERROR: &str = "requires re-login, restart the batch";
const ZERO_METRICS_WARNING: &str =
    "no interaction data extracted, check the login state or the page markup";

/// Per-item states. `LoginWait` is only reachable from the first attempted item.
#[derive(Debug)]
enum Step {
    Navigate,
    CheckLogin,
    LoginWait,
    Settle,
    Extract,
    Persist(Extraction),
    Delay(ItemResult),
    Done(ItemResult),
}

/// Failures that end the batch instead of a single item.
#[derive(Debug)]
enum Abort {
    LoginTimeout,
    Session(SessionError),
}

/// Position of an item within the batch.
#[derive(Debug, Clone, Copy)]
struct Turn {
    /// First item that actually reaches the browser in this run.
    first: bool,
    /// No later item will be navigated, so no delay is needed.
    last: bool,
}

/// Sequential interaction refresh over one browser session.
///
/// The session outlives a batch only when `debug_keep_session_open` is set;
/// otherwise it is closed after every run and reopened by the next one.
pub struct RefreshController<P: PageSession, S: Store> {
    session: P,
    store: Arc<S>,
    config: RefreshConfig,
    login: LoginDetector,
    platform: Platform,
}

impl<P: PageSession, S: Store + Send + Sync> RefreshController<P, S> {
    pub fn new(session: P, store: Arc<S>, config: RefreshConfig) -> Self {
        let login = LoginDetector::new(config.login_phrases.iter().cloned());
        Self {
            session,
            store,
            config,
            login,
            platform: Platform::Xiaohongshu,
        }
    }

    pub fn session(&self) -> &P {
        &self.session
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    /// Close a session left open by `debug_keep_session_open`.
    pub async fn close_session(&mut self) -> Result<(), SessionError> {
        if self.session.is_open() {
            self.session.close().await?;
        }
        Ok(())
    }

    /// Refresh `items` in order, reporting to `sink`.
    ///
    /// Returns one result per item. A login timeout on the first item or a
    /// browser failure aborts the run; the results gathered so far travel in
    /// the error. `sink` always receives exactly one `Completed` event.
    pub async fn run_batch(
        &mut self,
        items: &[BatchItem],
        sink: &dyn ProgressSink,
    ) -> Result<Vec<ItemResult>, BatchError> {
        let total = items.len();
        let mut results = Vec::with_capacity(total);

        if items.is_empty() {
            sink.emit(ProgressEvent::Completed {
                current: 0,
                total: 0,
                results: Vec::new(),
            });
            return Ok(results);
        }

        info!("Refreshing interaction data for {} items", total);
        let outcome = self.run_items(items, sink, &mut results).await;
        self.finish_session(sink).await;

        let succeeded = results.iter().filter(|r| r.success).count();
        info!(
            "Refresh finished: {} succeeded, {} failed, {} of {} processed",
            succeeded,
            results.len() - succeeded,
            results.len(),
            total
        );

        sink.emit(ProgressEvent::Completed {
            current: results.len(),
            total,
            results: results.clone(),
        });

        match outcome {
            Ok(()) => Ok(results),
            Err(Abort::LoginTimeout) => {
                error!("Login was not completed in time, batch aborted");
                Err(BatchError::LoginTimeout {
                    waited_ms: self.config.first_run_login_wait_ms,
                    partial: results,
                })
            }
            Err(Abort::Session(source)) => {
                error!("Browser session failed, batch aborted: {}", source);
                Err(BatchError::Session {
                    source,
                    partial: results,
                })
            }
        }
    }

    async fn run_items(
        &mut self,
        items: &[BatchItem],
        sink: &dyn ProgressSink,
        results: &mut Vec<ItemResult>,
    ) -> Result<(), Abort> {
        let total = items.len();
        let mut attempted = 0usize;

        for (index, item) in items.iter().enumerate() {
            let Some(url) = item.target_url() else {
                warn!(
                    "[{}/{}] {}: no post link, skipped",
                    index + 1,
                    total,
                    item.display_name
                );
                results.push(ItemResult::failed(item, self.platform, MISSING_URL_ERROR));
                continue;
            };

            if !self.session.is_open() {
                self.session.open().await.map_err(Abort::Session)?;
            }

            sink.emit(ProgressEvent::Processing {
                current: index + 1,
                total,
                display_name: item.display_name.clone(),
            });
            info!("[{}/{}] {}: {}", index + 1, total, item.display_name, url);

            let turn = Turn {
                first: attempted == 0,
                last: items[index + 1..].iter().all(|i| i.target_url().is_none()),
            };
            attempted += 1;

            let result = self.process_item(item, url, turn, sink).await?;
            if let Some(ref error) = result.error {
                warn!("{}: refresh failed: {}", item.display_name, error);
            }
            results.push(result);
        }

        Ok(())
    }

    async fn process_item(
        &mut self,
        item: &BatchItem,
        url: &str,
        turn: Turn,
        sink: &dyn ProgressSink,
    ) -> Result<ItemResult, Abort> {
        let mut step = Step::Navigate;
        let mut login_waited = false;

        loop {
            debug!("{}: {:?}", item.display_name, step);
            step = match step {
                Step::Navigate => match self.navigate(url).await {
                    Ok(()) => Step::CheckLogin,
                    Err(e) if e.is_fatal() => return Err(Abort::Session(e)),
                    Err(e) => Step::Delay(self.failed(item, e.to_string())),
                },
                Step::CheckLogin => match self.login_prompt().await {
                    Ok(None) => Step::Settle,
                    Ok(Some(phrase)) if turn.first && !login_waited => {
                        warn!(
                            "Login prompt detected ({}), log in within {}s in the browser window",
                            phrase,
                            self.config.login_wait().as_secs()
                        );
                        Step::LoginWait
                    }
                    Ok(Some(_)) if turn.first => return Err(Abort::LoginTimeout),
                    Ok(Some(phrase)) => {
                        warn!("{}: login prompt detected ({})", item.display_name, phrase);
                        Step::Delay(self.failed(item, RELOGIN_ERROR))
                    }
                    Err(e) if e.is_fatal() => return Err(Abort::Session(e)),
                    Err(e) => Step::Delay(self.failed(item, e.to_string())),
                },
                Step::LoginWait => {
                    login_waited = true;
                    if !self.wait_for_login().await? {
                        return Err(Abort::LoginTimeout);
                    }
                    info!("Login completed, reloading {}", url);
                    Step::Navigate
                }
                Step::Settle => {
                    tokio::time::sleep(self.config.settle()).await;
                    self.capture_screenshot(item, sink).await;
                    Step::Extract
                }
                Step::Extract => Step::Persist(self.extract(item, sink).await?),
                Step::Persist(extraction) => Step::Delay(self.persist(item, extraction)),
                Step::Delay(result) => {
                    if !turn.last {
                        let delay = jittered_delay(&self.config);
                        debug!("Waiting {}ms before the next item", delay.as_millis());
                        tokio::time::sleep(delay).await;
                    }
                    Step::Done(result)
                }
                Step::Done(result) => return Ok(result),
            };
        }
    }

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let timeout = self.config.navigation_timeout();
        match tokio::time::timeout(timeout, self.session.navigate(url)).await {
            Ok(result) => result,
            Err(_) => Err(SessionError::NavigationTimeout {
                url: url.to_string(),
                timeout_ms: self.config.navigation_timeout_ms,
            }),
        }
    }

    /// The login phrase shown on the current page, if any.
    async fn login_prompt(&mut self) -> Result<Option<String>, SessionError> {
        let text = self.session.page_text().await?;
        Ok(self.login.detect(&text).map(str::to_string))
    }

    /// Poll until the login prompt disappears or the ceiling passes.
    async fn wait_for_login(&mut self) -> Result<bool, Abort> {
        let deadline = Instant::now() + self.config.login_wait();
        let poll = self.config.login_poll_interval();

        loop {
            match self.login_prompt().await {
                Ok(None) => return Ok(true),
                Ok(Some(_)) => {}
                Err(e) if e.is_fatal() => return Err(Abort::Session(e)),
                // The page may be mid-redirect while the user logs in
                Err(e) => debug!("Could not read page text: {}", e),
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(poll.min(deadline - now)).await;
        }
    }

    async fn capture_screenshot(&mut self, item: &BatchItem, sink: &dyn ProgressSink) {
        let Some(dir) = self.config.screenshot_dir.clone() else {
            return;
        };
        let path = dir.join(format!(
            "{}-{}-{}.png",
            self.platform,
            item.id,
            Utc::now().timestamp_millis()
        ));

        if let Err(e) = self.session.screenshot(&path).await {
            warn!("{}: {}", item.display_name, e);
            sink.emit(ProgressEvent::Error {
                display_name: item.display_name.clone(),
                message: e.to_string(),
            });
        }
    }

    async fn extract(
        &mut self,
        item: &BatchItem,
        sink: &dyn ProgressSink,
    ) -> Result<Extraction, Abort> {
        let extraction = match self.session.snapshot().await {
            Ok(snapshot) => extract_metrics(&snapshot),
            Err(e) if e.is_fatal() => return Err(Abort::Session(e)),
            Err(e) => Extraction::failed(e.to_string()),
        };

        debug!(
            "{}: extracted {:?} from {} counters",
            item.display_name, extraction.metrics, extraction.matched
        );

        if let Some(ref note) = extraction.diagnostic {
            warn!("{}: {}", item.display_name, note);
            sink.emit(ProgressEvent::Error {
                display_name: item.display_name.clone(),
                message: note.clone(),
            });
        }

        Ok(extraction)
    }

    /// Save metrics and one history row. Extracted-but-unsaved is a failure.
    fn persist(&self, item: &BatchItem, extraction: Extraction) -> ItemResult {
        let metrics = extraction.metrics;
        let saved = self
            .store
            .record_refresh(&HistoryRecord::new(item.id, self.platform, metrics));

        let mut result = match saved {
            Ok(_) => {
                let mut result = ItemResult::succeeded(item, self.platform, metrics);
                if metrics.is_zero() {
                    warn!("{}: {}", item.display_name, ZERO_METRICS_WARNING);
                    result.warning = Some(ZERO_METRICS_WARNING.to_string());
                } else {
                    info!(
                        "{}: likes {}, favorites {}, comments {}, shares {}",
                        item.display_name,
                        metrics.likes,
                        metrics.favorites,
                        metrics.comments,
                        metrics.shares
                    );
                }
                result
            }
            Err(e) => self.failed(item, format!("failed to save metrics: {}", e)),
        };
        result.diagnostic = extraction.diagnostic;
        result
    }

    fn failed(&self, item: &BatchItem, error: impl Into<String>) -> ItemResult {
        ItemResult::failed(item, self.platform, error)
    }

    async fn finish_session(&mut self, sink: &dyn ProgressSink) {
        if self.config.debug_keep_session_open {
            info!("Debug mode: browser left open, close it manually when done");
            return;
        }
        if let Err(e) = self.close_session().await {
            warn!("Failed to close browser session: {}", e);
            sink.emit(ProgressEvent::Error {
                display_name: "browser session".to_string(),
                message: e.to_string(),
            });
        }
    }
}

/// Random pause inside the configured delay window, bounds included.
pub fn jittered_delay(config: &RefreshConfig) -> Duration {
    let (min, max) = config.delay_bounds();
    let millis = rand::rng().random_range(min..=max);
    Duration::from_millis(millis)
}
