use crate::core::{
    AuthenticatedContext, BrowserConfig, Locator, LocatorRef, PageHandle, SessionCookie, WaitState,
};
use crate::dom::scripts;
use crate::errors::{EngineError, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ffi::OsStr;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const WAIT_POLL: Duration = Duration::from_millis(50);
const DEFAULT_CLICK_TIMEOUT: Duration = Duration::from_secs(5);

/// Element predicates shared by every generated script.
const HELPERS: &str = r#"
    const isVisible = (el) => {
        if (!el || !el.isConnected) return false;
        const style = window.getComputedStyle(el);
        if (style.visibility === 'hidden' || style.display === 'none') return false;
        const rect = el.getBoundingClientRect();
        return rect.width > 0 && rect.height > 0;
    };
    const resolve = (chain) => {
        let nodes = [document];
        for (const step of chain) {
            if ('nth' in step) {
                nodes = step.nth < nodes.length ? [nodes[step.nth]] : [];
            } else {
                const next = [];
                for (const node of nodes) {
                    for (const match of node.querySelectorAll(step.css)) {
                        if (!next.includes(match)) next.push(match);
                    }
                }
                nodes = next;
            }
        }
        return nodes;
    };
"#;

/// Headless Chrome process; pages stay usable while it is alive.
pub struct ChromeBrowser {
    browser: Browser,
    config: BrowserConfig,
}

impl ChromeBrowser {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let window_size_arg = format!(
            "--window-size={},{}",
            config.viewport.width, config.viewport.height
        );
        let user_agent_arg = config
            .user_agent
            .as_ref()
            .map(|ua| format!("--user-agent={}", ua));

        let mut args = vec![
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new(&window_size_arg),
        ];
        if let Some(ref ua_arg) = user_agent_arg {
            args.push(OsStr::new(ua_arg));
        }
        for arg in &config.args {
            args.push(OsStr::new(arg));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .args(args)
            .build()
            .map_err(|e| EngineError::LaunchFailed(e.to_string()))?;
        let browser =
            Browser::new(launch_options).map_err(|e| EngineError::LaunchFailed(e.to_string()))?;

        info!(
            "Launched Chrome (headless: {}, viewport {}x{})",
            config.headless, config.viewport.width, config.viewport.height
        );
        Ok(Self {
            browser,
            config: config.clone(),
        })
    }

    pub fn new_page(&self) -> Result<ChromePage> {
        let tab = self
            .browser
            .new_tab()
            .map_err(|e| EngineError::LaunchFailed(e.to_string()))?;
        tab.set_default_timeout(Duration::from_millis(self.config.navigation_timeout_ms));
        Ok(ChromePage { tab })
    }
}

/// One browser tab.
#[derive(Clone)]
pub struct ChromePage {
    tab: Arc<Tab>,
}

impl ChromePage {
    /// Navigate to the context's base address and install its session cookies.
    pub async fn open_authenticated(&self, context: &AuthenticatedContext) -> Result<()> {
        self.goto(context.base_url.as_str()).await?;
        for cookie in &context.cookies {
            let script = format!("document.cookie = {};", js_string(&cookie_string(cookie))?);
            run_script(&self.tab, &script)?;
        }
        debug!(
            "Installed {} cookie(s) for user '{}'",
            context.cookies.len(),
            context.username
        );
        // Reload so the first request already carries the session.
        self.goto(context.base_url.as_str()).await
    }
}

#[async_trait]
impl PageHandle for ChromePage {
    fn locator(&self, selector: &str) -> LocatorRef {
        Arc::new(ChromeLocator {
            tab: self.tab.clone(),
            chain: vec![Step::Css(selector.to_string())],
        })
    }

    async fn goto(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.tab
            .navigate_to(url)
            .map_err(|e| EngineError::NavigationFailed(e.to_string()))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| EngineError::NavigationFailed(e.to_string()))?;
        Ok(())
    }

    async fn url(&self) -> Result<String> {
        Ok(self.tab.get_url())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Step {
    Css(String),
    Nth(usize),
}

/// Result envelope returned by every element script.
#[derive(Debug, Deserialize)]
struct FirstMatch {
    found: bool,
    #[serde(default)]
    value: Value,
}

/// Locator backed by a selector chain re-resolved in the page on every call.
#[derive(Clone)]
pub struct ChromeLocator {
    tab: Arc<Tab>,
    chain: Vec<Step>,
}

impl fmt::Debug for ChromeLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChromeLocator({})", self.describe())
    }
}

impl ChromeLocator {
    fn derive(&self, step: Step) -> LocatorRef {
        let mut chain = self.chain.clone();
        chain.push(step);
        Arc::new(ChromeLocator {
            tab: self.tab.clone(),
            chain,
        })
    }

    /// Evaluate `body` with `nodes` bound to the resolved matches; `body`
    /// must produce a value for the first-match envelope.
    fn query(&self, body: &str) -> Result<Value> {
        let chain = serde_json::to_string(&self.chain)?;
        let script = element_script(&chain, body);
        let raw = run_script(&self.tab, &script)?;
        let text = raw
            .as_str()
            .ok_or_else(|| EngineError::JavaScriptFailed("script returned no JSON".to_string()))?;
        Ok(serde_json::from_str(text)?)
    }

    /// Like [`Self::query`] on the first match; no match is an error.
    fn query_first(&self, body: &str) -> Result<Value> {
        let first: FirstMatch = serde_json::from_value(self.query(&format!(
            "const el = nodes[0]; if (!el) return {{ found: false }}; return {{ found: true, value: ({}) }};",
            body
        ))?)?;
        if !first.found {
            return Err(EngineError::Driver(format!(
                "no element matches {}",
                self.describe()
            )));
        }
        Ok(first.value)
    }

    fn query_bool(&self, body: &str) -> Result<bool> {
        Ok(self.query_first(body)?.as_bool().unwrap_or(false))
    }
}

#[async_trait]
impl Locator for ChromeLocator {
    fn describe(&self) -> String {
        self.chain
            .iter()
            .map(|step| match step {
                Step::Css(selector) => selector.clone(),
                Step::Nth(index) => format!("nth={}", index),
            })
            .collect::<Vec<_>>()
            .join(" >> ")
    }

    fn locator(&self, selector: &str) -> LocatorRef {
        self.derive(Step::Css(selector.to_string()))
    }

    fn first(&self) -> LocatorRef {
        self.derive(Step::Nth(0))
    }

    async fn count(&self) -> Result<usize> {
        let count = self.query("return nodes.length;")?;
        Ok(count.as_u64().unwrap_or(0) as usize)
    }

    async fn all(&self) -> Result<Vec<LocatorRef>> {
        let count = self.count().await?;
        Ok((0..count).map(|index| self.derive(Step::Nth(index))).collect())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        let body = format!("el.getAttribute({})", js_string(name)?);
        Ok(self.query_first(&body)?.as_str().map(str::to_string))
    }

    async fn text(&self) -> Result<String> {
        let value = self.query_first("el.innerText ?? el.textContent ?? ''")?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn input_value(&self) -> Result<String> {
        let value = self.query_first("el.value ?? ''")?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn is_visible(&self) -> Result<bool> {
        let visible = self.query("return isVisible(nodes[0]);")?;
        Ok(visible.as_bool().unwrap_or(false))
    }

    async fn is_disabled(&self) -> Result<bool> {
        self.query_bool("el.disabled === true || el.hasAttribute('disabled')")
    }

    async fn is_checked(&self) -> Result<bool> {
        self.query_bool("el.checked === true")
    }

    async fn click(&self, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout.unwrap_or(DEFAULT_CLICK_TIMEOUT);
        self.wait_for(WaitState::Visible, timeout).await?;
        self.query_first("(el.scrollIntoView({ block: 'center' }), el.click(), true)")?;
        Ok(())
    }

    async fn fill(&self, text: &str) -> Result<()> {
        self.evaluate(scripts::FILL_VALUE, Value::String(text.to_string()))
            .await?;
        Ok(())
    }

    async fn wait_for(&self, state: WaitState, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let status = self.query(
                "return { count: nodes.length, visible: nodes.some((node) => isVisible(node)) };",
            )?;
            let count = status["count"].as_u64().unwrap_or(0);
            let any_visible = status["visible"].as_bool().unwrap_or(false);
            let reached = match state {
                WaitState::Attached => count > 0,
                WaitState::Detached => count == 0,
                WaitState::Visible => any_visible,
                WaitState::Hidden => !any_visible,
            };
            if reached {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(EngineError::Timeout {
                    what: format!("{} to be {}", self.describe(), state),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
            tokio::time::sleep(WAIT_POLL).await;
        }
    }

    async fn evaluate(&self, script: &str, arg: Value) -> Result<Value> {
        let body = format!("({})(el, {})", script, serde_json::to_string(&arg)?);
        self.query_first(&body)
    }
}

fn element_script(chain_json: &str, body: &str) -> String {
    format!(
        "(() => {{ {helpers} const nodes = resolve({chain}); const result = (() => {{ {body} }})(); return JSON.stringify(result === undefined ? null : result); }})()",
        helpers = HELPERS,
        chain = chain_json,
        body = body
    )
}

fn run_script(tab: &Tab, script: &str) -> Result<Value> {
    let result = tab
        .evaluate(script, false)
        .map_err(|e| EngineError::JavaScriptFailed(e.to_string()))?;
    Ok(result.value.unwrap_or(Value::Null))
}

fn js_string(value: &str) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// `document.cookie` assignment for one session cookie.
pub fn cookie_string(cookie: &SessionCookie) -> String {
    let mut parts = vec![
        format!("{}={}", cookie.name, cookie.value),
        format!("path={}", cookie.path),
    ];
    if let Some(domain) = cookie.domain.as_deref().filter(|d| !d.is_empty()) {
        parts.push(format!("domain={}", domain));
    }
    if cookie.secure {
        parts.push("secure".to_string());
    }
    parts.join("; ")
}
