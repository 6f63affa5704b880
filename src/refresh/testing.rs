//! Scripted browser session for controller tests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::refresh::{CounterElement, PageSession, PageSnapshot, SessionError};

const LOGIN_WALL_TEXT: &str = "扫码登录 手机号登录 立即登录";

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub text: String,
    pub counters: Vec<CounterElement>,
    /// Shows a login prompt until the session is logged in.
    pub login_wall: bool,
    /// Navigation never completes.
    pub hang: bool,
    /// Navigating here kills the browser.
    pub crash: bool,
    /// The snapshot script throws.
    pub script_error: bool,
}

impl FakePage {
    /// A post page with the four interaction counters.
    pub fn note(likes: &str, favorites: &str, comments: &str, shares: &str) -> Self {
        Self {
            text: format!("笔记正文 {} {} {} {}", likes, favorites, comments, shares),
            counters: vec![
                CounterElement::new(likes, "like-wrapper"),
                CounterElement::new(favorites, "collect-wrapper"),
                CounterElement::new(comments, "chat-wrapper"),
                CounterElement::new(shares, "share-wrapper"),
            ],
            ..Default::default()
        }
    }

    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Default::default()
        }
    }

    pub fn crashing() -> Self {
        Self {
            crash: true,
            ..Default::default()
        }
    }

    pub fn script_error() -> Self {
        Self {
            text: "笔记正文".into(),
            script_error: true,
            ..Default::default()
        }
    }

    pub fn behind_login(mut self) -> Self {
        self.login_wall = true;
        self
    }
}

/// In-memory [`PageSession`] that records what the controller did with it.
#[derive(Debug, Default)]
pub struct FakeSession {
    pages: HashMap<String, FakePage>,
    current: Option<String>,
    open: bool,
    fail_open: bool,
    /// Blocked page reads before the simulated user finishes logging in.
    login_after_polls: Option<usize>,
    blocked_reads: usize,
    logged_in: bool,
    /// The next navigation after logging in drops the login for good.
    login_lost_on_reload: bool,
    pub opens: usize,
    pub closes: usize,
    pub visited: Vec<String>,
    pub text_reads: usize,
    pub screenshots: Vec<PathBuf>,
}

impl FakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    pub fn login_after_polls(mut self, polls: usize) -> Self {
        self.login_after_polls = Some(polls);
        self
    }

    pub fn login_lost_on_reload(mut self) -> Self {
        self.login_lost_on_reload = true;
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    fn ensure_open(&self) -> Result<(), SessionError> {
        if self.open {
            Ok(())
        } else {
            Err(SessionError::NotOpen)
        }
    }

    fn current_page(&self) -> Option<&FakePage> {
        self.current.as_ref().and_then(|url| self.pages.get(url))
    }

    fn walled(&self) -> bool {
        !self.logged_in && self.current_page().is_some_and(|p| p.login_wall)
    }
}

#[async_trait]
impl PageSession for FakeSession {
    async fn open(&mut self) -> Result<(), SessionError> {
        if self.fail_open {
            return Err(SessionError::Launch("chrome not found".into()));
        }
        if !self.open {
            self.open = true;
            self.opens += 1;
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.visited.push(url.to_string());

        let Some(page) = self.pages.get(url).cloned() else {
            self.current = None;
            return Err(SessionError::Navigation(format!(
                "net::ERR_HTTP_RESPONSE_CODE_FAILURE at {}",
                url
            )));
        };

        if page.crash {
            self.open = false;
            self.current = None;
            return Err(SessionError::Closed("target crashed".into()));
        }
        if page.hang {
            std::future::pending::<()>().await;
        }
        if self.login_lost_on_reload && self.logged_in {
            self.logged_in = false;
            self.login_after_polls = None;
        }

        self.current = Some(url.to_string());
        Ok(())
    }

    async fn page_text(&mut self) -> Result<String, SessionError> {
        self.ensure_open()?;
        self.text_reads += 1;

        if self.walled() {
            self.blocked_reads += 1;
            match self.login_after_polls {
                Some(polls) if self.blocked_reads > polls => self.logged_in = true,
                _ => return Ok(LOGIN_WALL_TEXT.to_string()),
            }
        }

        Ok(self
            .current_page()
            .map(|p| p.text.clone())
            .unwrap_or_default())
    }

    async fn snapshot(&mut self) -> Result<PageSnapshot, SessionError> {
        self.ensure_open()?;
        if self.walled() {
            return Ok(PageSnapshot {
                text: LOGIN_WALL_TEXT.to_string(),
                ..Default::default()
            });
        }

        let page = self.current_page().cloned().unwrap_or_default();
        if page.script_error {
            return Err(SessionError::Script(
                "TypeError: Cannot read properties of null".into(),
            ));
        }

        Ok(PageSnapshot {
            text: page.text,
            counters: page.counters,
            error: None,
        })
    }

    async fn screenshot(&mut self, path: &Path) -> Result<(), SessionError> {
        self.ensure_open()?;
        self.screenshots.push(path.to_path_buf());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        if self.open {
            self.open = false;
            self.closes += 1;
        }
        self.current = None;
        Ok(())
    }
}
