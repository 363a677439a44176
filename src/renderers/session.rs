use crate::error::Error;
use crate::extractors::dom::PageSnapshot;
use crate::renderers::browser::{BrowserConnector, BrowserSession};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

/// Interval between `document.readyState` polls while a page settles
const SETTLE_POLL: Duration = Duration::from_millis(100);

/// Lifecycle of one browser-backed extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Acquiring,
    Navigated,
    Extracted,
    Closed,
}

/// Per-suspension-point time budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    pub acquire: Duration,
    pub navigation: Duration,
    pub evaluate: Duration,
}

/// A browser session owned by a single extraction.
///
/// The browser is released by [`RenderSession::close`], which every exit
/// path of [`render`] awaits. A session dropped while still open (for
/// example when the caller's future is cancelled) closes the browser on a
/// background task instead.
pub struct RenderSession<B: BrowserSession> {
    state: SessionState,
    browser: Option<B>,
    timeouts: SessionTimeouts,
}

impl<B: BrowserSession> RenderSession<B> {
    pub fn new(timeouts: SessionTimeouts) -> Self {
        Self {
            state: SessionState::Idle,
            browser: None,
            timeouts,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Obtain a browser from `connector`
    pub async fn acquire<C>(&mut self, connector: &C) -> Result<(), Error>
    where
        C: BrowserConnector<Session = B>,
    {
        self.state = SessionState::Acquiring;
        let limit = self.timeouts.acquire;

        let browser = match timeout(limit, connector.connect()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(Error::RenderBackend(format!(
                    "timed out after {:?} acquiring a browser session",
                    limit
                )));
            }
        };
        self.browser = Some(browser);
        Ok(())
    }

    /// Load `url` and wait until the document is no longer loading
    pub async fn navigate(&mut self, url: &str) -> Result<(), Error> {
        let limit = self.timeouts.navigation;
        let browser = self.browser_mut()?;

        bounded(limit, "loading page", async {
            browser.goto(url).await?;
            while browser.ready_state().await? == "loading" {
                tokio::time::sleep(SETTLE_POLL).await;
            }
            Ok::<_, Error>(())
        })
        .await?;

        ::log::debug!("Navigated to {}", url);
        self.state = SessionState::Navigated;
        Ok(())
    }

    /// Capture the live DOM plus the requested computed styles
    pub async fn snapshot(
        &mut self,
        style_queries: &[(String, String)],
    ) -> Result<PageSnapshot, Error> {
        let limit = self.timeouts.evaluate;
        let browser = self.browser_mut()?;

        let snapshot = bounded(limit, "evaluating page", async {
            let computed_styles = browser.computed_styles(style_queries).await?;
            let html = browser.source().await?;
            let url = browser.current_url().await?;
            Ok::<_, Error>(PageSnapshot {
                url,
                html,
                computed_styles,
            })
        })
        .await?;

        self.state = SessionState::Extracted;
        Ok(snapshot)
    }

    /// Release the browser. Safe to call any number of times.
    ///
    /// Waits at most the evaluation budget for the backend to acknowledge;
    /// the session counts as closed either way.
    pub async fn close(&mut self) {
        if let Some(browser) = self.browser.take() {
            release(browser, self.timeouts.evaluate).await;
        }
        self.state = SessionState::Closed;
    }

    fn browser_mut(&mut self) -> Result<&mut B, Error> {
        self.browser
            .as_mut()
            .ok_or_else(|| Error::RenderBackend("no browser session acquired".to_string()))
    }
}

impl<B: BrowserSession> Drop for RenderSession<B> {
    fn drop(&mut self) {
        let Some(browser) = self.browser.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                ::log::warn!("Browser session dropped while open, closing in background");
                handle.spawn(release(browser, self.timeouts.evaluate));
            }
            Err(_) => {
                ::log::error!("Browser session dropped outside a runtime; it may leak");
            }
        }
    }
}

/// Renders `url` in a fresh browser session and snapshots it.
///
/// The session is closed before this returns, whatever the outcome.
pub async fn render<C: BrowserConnector>(
    connector: &C,
    url: &str,
    style_queries: &[(String, String)],
    timeouts: SessionTimeouts,
) -> Result<PageSnapshot, Error> {
    let mut session = RenderSession::new(timeouts);
    let result = drive(&mut session, connector, url, style_queries).await;
    session.close().await;

    if let Err(e) = &result {
        ::log::error!("Rendering {} failed: {}", url, e);
    }
    result
}

async fn drive<C: BrowserConnector>(
    session: &mut RenderSession<C::Session>,
    connector: &C,
    url: &str,
    style_queries: &[(String, String)],
) -> Result<PageSnapshot, Error> {
    session.acquire(connector).await?;
    session.navigate(url).await?;
    session.snapshot(style_queries).await
}

async fn release<B: BrowserSession>(browser: B, limit: Duration) {
    match timeout(limit, browser.close()).await {
        Ok(Ok(())) => ::log::debug!("Browser session closed"),
        Ok(Err(e)) => ::log::warn!("Failed to close browser session: {}", e),
        Err(_) => ::log::warn!(
            "Browser session did not close within {:?}, abandoning it",
            limit
        ),
    }
}

/// Runs `fut` under `limit`; expiry becomes a navigation error
async fn bounded<T>(
    limit: Duration,
    what: &str,
    fut: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    match timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(Error::Navigation(format!(
            "timed out after {:?} while {}",
            limit, what
        ))),
    }
}
