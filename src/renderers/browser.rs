use crate::error::Error;
use crate::extractors::dom::ComputedStyle;
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder};
use serde_json::{Value, json};
use std::future::Future;

/// Reads computed style values for `[selector, property]` pairs
const COMPUTED_STYLES_SCRIPT: &str = r#"
const out = [];
for (const [selector, property] of arguments[0]) {
    let el = null;
    try { el = document.querySelector(selector); } catch (e) {}
    if (el) {
        out.push([selector, property, window.getComputedStyle(el).getPropertyValue(property)]);
    }
}
return out;
"#;

const READY_STATE_SCRIPT: &str = "return document.readyState;";

/// Operations on a live, exclusively owned browser session
pub trait BrowserSession: Send + 'static {
    /// Load `url` in the session's window
    fn goto(&mut self, url: &str) -> impl Future<Output = Result<(), Error>> + Send;

    /// Current `document.readyState`
    fn ready_state(&mut self) -> impl Future<Output = Result<String, Error>> + Send;

    /// Evaluate computed styles for `(selector, property)` pairs
    fn computed_styles(
        &mut self,
        queries: &[(String, String)],
    ) -> impl Future<Output = Result<Vec<ComputedStyle>, Error>> + Send;

    /// Serialized live DOM
    fn source(&mut self) -> impl Future<Output = Result<String, Error>> + Send;

    /// URL after any redirects
    fn current_url(&mut self) -> impl Future<Output = Result<String, Error>> + Send;

    /// End the session and release the browser
    fn close(self) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Acquires a fresh browser session per call
pub trait BrowserConnector: Send + Sync {
    type Session: BrowserSession;

    fn connect(&self) -> impl Future<Output = Result<Self::Session, Error>> + Send;
}

/// Opens sessions on a WebDriver server (chromedriver, selenium, ...)
#[derive(Debug, Clone)]
pub struct WebDriverConnector {
    webdriver_url: String,
    capabilities: Capabilities,
}

impl WebDriverConnector {
    pub fn new(webdriver_url: impl Into<String>, capabilities: Capabilities) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
            capabilities,
        }
    }
}

impl BrowserConnector for WebDriverConnector {
    type Session = Client;

    async fn connect(&self) -> Result<Client, Error> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities.clone());

        match builder.connect(&self.webdriver_url).await {
            Ok(client) => {
                ::log::debug!("Connected to WebDriver at {}", self.webdriver_url);
                Ok(client)
            }
            Err(e) => {
                ::log::error!(
                    "Failed to connect to WebDriver at {}: {}",
                    self.webdriver_url,
                    e
                );
                Err(Error::RenderBackend(format!(
                    "could not start a session on {}: {}",
                    self.webdriver_url, e
                )))
            }
        }
    }
}

fn command_error(context: &str, error: fantoccini::error::CmdError) -> Error {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost WebDriver session while {}", context);
    }
    Error::Navigation(format!("{}: {}", context, error))
}

impl BrowserSession for Client {
    async fn goto(&mut self, url: &str) -> Result<(), Error> {
        Client::goto(self, url)
            .await
            .map_err(|e| command_error("loading page", e))
    }

    async fn ready_state(&mut self) -> Result<String, Error> {
        let value = self
            .execute(READY_STATE_SCRIPT, Vec::new())
            .await
            .map_err(|e| command_error("reading document state", e))?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn computed_styles(
        &mut self,
        queries: &[(String, String)],
    ) -> Result<Vec<ComputedStyle>, Error> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let pairs: Vec<Value> = queries.iter().map(|(s, p)| json!([s, p])).collect();
        let value = self
            .execute(COMPUTED_STYLES_SCRIPT, vec![Value::Array(pairs)])
            .await
            .map_err(|e| command_error("evaluating computed styles", e))?;

        let triples: Vec<(String, String, String)> = serde_json::from_value(value)
            .map_err(|e| Error::Navigation(format!("unexpected computed style result: {}", e)))?;

        Ok(triples
            .into_iter()
            .map(|(selector, property, value)| ComputedStyle {
                selector,
                property,
                value,
            })
            .collect())
    }

    async fn source(&mut self) -> Result<String, Error> {
        Client::source(self)
            .await
            .map_err(|e| command_error("getting page source", e))
    }

    async fn current_url(&mut self) -> Result<String, Error> {
        Client::current_url(self)
            .await
            .map(|url| url.to_string())
            .map_err(|e| command_error("reading current URL", e))
    }

    async fn close(self) -> Result<(), Error> {
        Client::close(self)
            .await
            .map_err(|e| Error::RenderBackend(format!("failed to close session: {}", e)))
    }
}
