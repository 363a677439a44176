pub mod browser;
pub mod session;
pub mod static_page;

use crate::config::ScraperConfig;
use crate::error::Error;
use crate::extractors::extract_record;
use crate::extractors::strategy::StrategyTable;
use crate::results::{ExtractedRecord, ExtractionTarget};
use browser::{BrowserConnector, WebDriverConnector};
use serde::{Deserialize, Serialize};
use session::SessionTimeouts;
use static_page::StaticFetcher;

/// How a page gets turned into a DOM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Fetch markup over HTTP, no scripts
    Static,
    /// Render in a WebDriver-controlled browser
    Browser,
    /// Static first; render in a browser only when the static page had
    /// neither a title nor a subtitle
    #[default]
    Auto,
}

/// Turns URLs into [`ExtractedRecord`]s.
///
/// Holds only immutable configuration, so one instance can serve any
/// number of concurrent calls. Each browser-backed call opens and closes
/// its own session.
pub struct Extractor<C = WebDriverConnector> {
    mode: RenderMode,
    strategies: StrategyTable,
    fetcher: StaticFetcher,
    connector: C,
    timeouts: SessionTimeouts,
}

impl Extractor<WebDriverConnector> {
    /// Build an extractor driving a WebDriver server as configured
    pub fn from_config(config: &ScraperConfig) -> Result<Self, Error> {
        let connector = WebDriverConnector::new(
            config.webdriver_url.clone(),
            config.browser.capabilities(),
        );
        Self::with_connector(config, connector)
    }
}

impl<C: BrowserConnector> Extractor<C> {
    /// Build an extractor that acquires browsers from `connector`
    pub fn with_connector(config: &ScraperConfig, connector: C) -> Result<Self, Error> {
        let strategies = config.strategy_table()?;
        let fetcher = StaticFetcher::new(&config.user_agent, config.fetch_timeout())?;

        Ok(Self {
            mode: config.render_mode,
            strategies,
            fetcher,
            connector,
            timeouts: config.session_timeouts(),
        })
    }

    /// Override the render mode
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace the selector table
    pub fn with_strategies(mut self, strategies: StrategyTable) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Extract one record from `url`.
    ///
    /// A single attempt is made per backend; navigation failures are
    /// returned as-is for the caller to retry if it wants to.
    pub async fn extract(&self, url: &str) -> Result<ExtractedRecord, Error> {
        let target = ExtractionTarget::new(url).validated()?;
        ::log::info!("Extracting {} ({:?})", target.url, self.mode);

        let record = match self.mode {
            RenderMode::Static => self.extract_static(&target.url).await?,
            RenderMode::Browser => self.extract_rendered(&target.url).await?,
            RenderMode::Auto => {
                let record = self.extract_static(&target.url).await?;
                if record.lacks_text() {
                    ::log::info!(
                        "No title or subtitle in static markup of {}, rendering in browser",
                        target.url
                    );
                    self.extract_rendered(&target.url).await?
                } else {
                    record
                }
            }
        };

        ::log::info!("Extracted record: {:?}", record);
        Ok(record)
    }

    async fn extract_static(&self, url: &str) -> Result<ExtractedRecord, Error> {
        let snapshot = self.fetcher.fetch(url).await?;
        Ok(extract_record(&snapshot, &self.strategies))
    }

    async fn extract_rendered(&self, url: &str) -> Result<ExtractedRecord, Error> {
        let queries = self.strategies.style_queries();
        let snapshot = session::render(&self.connector, url, &queries, self.timeouts).await?;
        Ok(extract_record(&snapshot, &self.strategies))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::dom::ComputedStyle;
    use crate::renderers::browser::BrowserSession;
    use crate::results::NOT_FOUND;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RENDERED: &str = r#"
        <html><body>
            <div class="sc-6ab2981a-0 hero"></div>
            <h2 class="sc-e612944f-4">Rendered headline</h2>
            <p class="sc-2af63f48-19">Rendered lead</p>
        </body></html>
    "#;

    struct PageBrowser {
        url: String,
        closed: Arc<AtomicBool>,
    }

    impl BrowserSession for PageBrowser {
        async fn goto(&mut self, url: &str) -> Result<(), Error> {
            self.url = url.to_string();
            Ok(())
        }

        async fn ready_state(&mut self) -> Result<String, Error> {
            Ok("complete".to_string())
        }

        async fn computed_styles(
            &mut self,
            queries: &[(String, String)],
        ) -> Result<Vec<ComputedStyle>, Error> {
            Ok(queries
                .iter()
                .map(|(selector, property)| ComputedStyle {
                    selector: selector.clone(),
                    property: property.clone(),
                    value: r#"url("/img/hero.jpg")"#.to_string(),
                })
                .collect())
        }

        async fn source(&mut self) -> Result<String, Error> {
            Ok(RENDERED.to_string())
        }

        async fn current_url(&mut self) -> Result<String, Error> {
            Ok(self.url.clone())
        }

        async fn close(self) -> Result<(), Error> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct PageConnector {
        connects: AtomicUsize,
        closed: Arc<AtomicBool>,
    }

    impl BrowserConnector for PageConnector {
        type Session = PageBrowser;

        async fn connect(&self) -> Result<PageBrowser, Error> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(PageBrowser {
                url: String::new(),
                closed: Arc::clone(&self.closed),
            })
        }
    }

    async fn serve(body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
            .mount(&server)
            .await;
        server
    }

    fn extractor(mode: RenderMode) -> Extractor<PageConnector> {
        Extractor::with_connector(&ScraperConfig::default(), PageConnector::default())
            .unwrap()
            .with_mode(mode)
    }

    #[tokio::test]
    async fn test_rejects_missing_url() {
        let extractor = extractor(RenderMode::Static);
        assert!(matches!(extractor.extract("").await, Err(Error::Validation(_))));
        assert!(matches!(
            extractor.extract("ftp://x.test/file").await,
            Err(Error::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_static_mode_never_opens_browser() {
        let server = serve("<html><body><p>nothing here</p></body></html>").await;
        let extractor = extractor(RenderMode::Static);

        let url = format!("{}/news/1", server.uri());
        let record = extractor.extract(&url).await.unwrap();

        assert_eq!(record.title, NOT_FOUND);
        assert_eq!(record.link, url);
        assert_eq!(extractor.connector.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_browser_mode() {
        let extractor = extractor(RenderMode::Browser);
        let record = extractor.extract("https://news.test/a/1").await.unwrap();

        assert_eq!(record.title, "Rendered headline");
        assert_eq!(record.subtitle, "Rendered lead");
        assert_eq!(record.link, "https://news.test/a/1");
        assert_eq!(record.image, "https://news.test/img/hero.jpg");
        assert!(extractor.connector.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_auto_falls_back_when_static_is_empty() {
        let server = serve("<html><body><div id=\"root\"></div></body></html>").await;
        let extractor = extractor(RenderMode::Auto);

        let record = extractor.extract(&server.uri()).await.unwrap();
        assert_eq!(record.title, "Rendered headline");
        assert_eq!(extractor.connector.connects.load(Ordering::SeqCst), 1);
        assert!(extractor.connector.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_auto_keeps_static_result() {
        let server = serve(r#"<html><body><h1 class="sc-6ab2981a-2"><span>Static</span></h1></body></html>"#).await;
        let extractor = extractor(RenderMode::Auto);

        let record = extractor.extract(&server.uri()).await.unwrap();
        assert_eq!(record.title, "Static");
        assert_eq!(record.subtitle, NOT_FOUND);
        assert_eq!(extractor.connector.connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_auto_does_not_retry_navigation_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let extractor = extractor(RenderMode::Auto);

        let result = extractor.extract(&server.uri()).await;
        assert!(matches!(result, Err(Error::Navigation(_))));
        assert_eq!(extractor.connector.connects.load(Ordering::SeqCst), 0);
    }
}
