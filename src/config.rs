use crate::error::Error;
use crate::extractors::strategy::StrategyTable;
use crate::renderers::RenderMode;
use crate::renderers::session::SessionTimeouts;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration for the scraper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    /// Which backend renders pages
    #[serde(default)]
    pub render_mode: RenderMode,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    /// User-Agent sent by the static fetcher
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout for static fetches, in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Time allowed to open a browser session, in seconds
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,

    /// Time allowed for navigation and load-settle, in seconds
    #[serde(default = "default_navigation_timeout_secs")]
    pub navigation_timeout_secs: u64,

    /// Time allowed for in-page script evaluation, in seconds
    #[serde(default = "default_evaluate_timeout_secs")]
    pub evaluate_timeout_secs: u64,

    /// Browser launch options
    #[serde(default)]
    pub browser: BrowserLaunchConfig,

    /// JSON file replacing the built-in selector table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategies: Option<PathBuf>,
}

/// Launch options passed to the browser through WebDriver capabilities.
/// These differ between a developer machine and a hosted container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserLaunchConfig {
    /// Run without a visible window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Extra command-line switches for the browser
    #[serde(default = "default_browser_args")]
    pub args: Vec<String>,

    /// Browser executable, if not the driver's default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<String>,
}

/// Default value for webdriver_url
fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    15
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

fn default_navigation_timeout_secs() -> u64 {
    30
}

fn default_evaluate_timeout_secs() -> u64 {
    10
}

fn default_headless() -> bool {
    true
}

/// Switches needed to run Chrome inside an unprivileged container
fn default_browser_args() -> Vec<String> {
    [
        "--no-sandbox",
        "--disable-setuid-sandbox",
        "--disable-dev-shm-usage",
        "--disable-gpu",
        "--no-zygote",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for BrowserLaunchConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            args: default_browser_args(),
            binary: None,
        }
    }
}

impl BrowserLaunchConfig {
    /// WebDriver capabilities for a Chrome session.
    ///
    /// Page loads return at DOMContentLoaded rather than the full load event.
    pub fn capabilities(&self) -> Map<String, Value> {
        let mut args = self.args.clone();
        if self.headless && !args.iter().any(|a| a.starts_with("--headless")) {
            args.push("--headless=new".to_string());
        }

        let mut chrome = Map::new();
        chrome.insert("args".to_string(), json!(args));
        if let Some(binary) = &self.binary {
            chrome.insert("binary".to_string(), json!(binary));
        }

        let mut caps = Map::new();
        caps.insert("goog:chromeOptions".to_string(), Value::Object(chrome));
        caps.insert("pageLoadStrategy".to_string(), json!("eager"));
        caps
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::default(),
            webdriver_url: default_webdriver_url(),
            user_agent: default_user_agent(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            navigation_timeout_secs: default_navigation_timeout_secs(),
            evaluate_timeout_secs: default_evaluate_timeout_secs(),
            browser: BrowserLaunchConfig::default(),
            strategies: None,
        }
    }
}

impl ScraperConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Apply environment overrides. Called once at startup.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
        if let Ok(binary) = std::env::var("BROWSER_BINARY") {
            if !binary.is_empty() {
                self.browser.binary = Some(binary);
            }
        }
        self
    }

    /// Selector table from the configured file, or the built-in one
    pub fn strategy_table(&self) -> Result<StrategyTable, Error> {
        match &self.strategies {
            Some(path) => {
                ::log::info!("Loading selector strategies from {}", path.display());
                StrategyTable::from_file(path)
            }
            None => Ok(StrategyTable::default()),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn session_timeouts(&self) -> SessionTimeouts {
        SessionTimeouts {
            acquire: Duration::from_secs(self.acquire_timeout_secs),
            navigation: Duration::from_secs(self.navigation_timeout_secs),
            evaluate: Duration::from_secs(self.evaluate_timeout_secs),
        }
    }
}
