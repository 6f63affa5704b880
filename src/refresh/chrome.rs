use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::refresh::config::RefreshConfig;
use crate::refresh::extractor::{page_text_script, snapshot_script, PageSnapshot};
use crate::refresh::{PageSession, SessionError};

/// Chrome session backed by chromiumoxide with an on-disk profile, so a
/// manual login survives across runs.
pub struct ChromeSession {
    config: RefreshConfig,
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
}

impl ChromeSession {
    pub fn new(config: RefreshConfig) -> Self {
        Self {
            config,
            browser: None,
            page: None,
            handler: None,
        }
    }

    /// Directory holding cookies and login state
    pub fn profile_dir(&self) -> Option<PathBuf> {
        self.config.resolved_profile_dir()
    }

    fn browser_config(&self) -> Result<BrowserConfig, SessionError> {
        let mut builder = BrowserConfig::builder()
            .window_size(1280, 800)
            .viewport(None)
            // Keep CDP requests alive past the controller's own navigation timeout
            .request_timeout(self.config.navigation_timeout() + Duration::from_secs(5))
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg("--no-sandbox")
            .arg("--no-first-run")
            .arg("--lang=zh-CN");

        if !self.config.headless {
            builder = builder.with_head();
        }

        if let Some(dir) = self.profile_dir() {
            std::fs::create_dir_all(&dir)?;
            debug!("Using browser profile at {}", dir.display());
            builder = builder.user_data_dir(dir);
        }

        if let Some(ref exe) = self.config.chrome_executable {
            builder = builder.chrome_executable(exe);
        }

        if let Some(ref ua) = self.config.user_agent {
            builder = builder.arg(format!("--user-agent={}", ua));
        }

        builder
            .build()
            .map_err(|e| SessionError::Launch(format!("Failed to build browser config: {}", e)))
    }

    fn page(&self) -> Result<&Page, SessionError> {
        self.page.as_ref().ok_or(SessionError::NotOpen)
    }

    fn handler_finished(&self) -> bool {
        self.handler.as_ref().is_some_and(|h| h.is_finished())
    }

    /// A CDP failure after the handler loop ended means Chrome itself is gone.
    fn session_error(&self, err: CdpError, wrap: fn(String) -> SessionError) -> SessionError {
        if self.handler_finished() {
            SessionError::Closed(err.to_string())
        } else {
            wrap(err.to_string())
        }
    }
}

#[async_trait]
impl PageSession for ChromeSession {
    async fn open(&mut self) -> Result<(), SessionError> {
        if self.is_open() {
            return Ok(());
        }
        // A crashed browser leaves stale handles behind
        self.close().await.ok();

        let browser_config = self.browser_config()?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            SessionError::Launch(format!(
                "{}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        // Spawn the browser handler
        let task = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {
                // Handle browser events
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Launch(format!("Failed to create page: {}", e)))?;

        info!(
            "Browser started ({})",
            if self.config.headless { "headless" } else { "visible" }
        );

        self.browser = Some(browser);
        self.page = Some(page);
        self.handler = Some(task);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.browser.is_some() && self.page.is_some() && !self.handler_finished()
    }

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let page = self.page()?;
        match page.goto(url).await {
            Ok(_) => Ok(()),
            Err(e) => Err(self.session_error(e, SessionError::Navigation)),
        }
    }

    async fn page_text(&mut self) -> Result<String, SessionError> {
        let page = self.page()?;
        let evaluated = match page.evaluate(page_text_script()).await {
            Ok(v) => v,
            Err(e) => return Err(self.session_error(e, SessionError::Script)),
        };

        evaluated
            .into_value::<String>()
            .map_err(|e| SessionError::Script(format!("Failed to parse result: {:?}", e)))
    }

    async fn snapshot(&mut self) -> Result<PageSnapshot, SessionError> {
        let page = self.page()?;
        let evaluated = match page.evaluate(snapshot_script()).await {
            Ok(v) => v,
            Err(e) => return Err(self.session_error(e, SessionError::Script)),
        };

        evaluated
            .into_value::<PageSnapshot>()
            .map_err(|e| SessionError::Script(format!("Failed to parse result: {:?}", e)))
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let page = self.page()?;
        page.save_screenshot(ScreenshotParams::builder().full_page(false).build(), path)
            .await
            .map_err(|e| SessionError::Screenshot(e.to_string()))?;

        debug!("Screenshot saved to {}", path.display());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Failed to close page: {}", e);
            }
        }

        let mut result = Ok(());
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Failed to close browser cleanly: {}", e);
                result = Err(SessionError::Closed(format!("Failed to close browser: {}", e)));
            }
            if let Err(e) = browser.wait().await {
                debug!("Failed to wait for browser exit: {}", e);
            }
            info!("Browser closed");
        }

        if let Some(handler) = self.handler.take() {
            handler.abort();
        }

        result
    }
}
