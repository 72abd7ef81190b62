//! In-memory page fakes for exercising fields and buttons without a browser.
//!
//! Elements are registered under the exact selector strings the engine
//! queries, so fixtures build selectors through [`crate::dom::selectors`].

use crate::core::{Locator, LocatorRef, PageHandle, WaitState};
use crate::dom::{scripts, selectors};
use crate::errors::{EngineError, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const WAIT_POLL: Duration = Duration::from_millis(25);

type ClickHook = Arc<dyn Fn(&FakeElement) + Send + Sync>;
type FillHook = Arc<dyn Fn(&FakeElement, &str) + Send + Sync>;

#[derive(Default)]
struct ElementState {
    attributes: HashMap<String, String>,
    text: String,
    value: String,
    visible: bool,
    disabled: bool,
    checked: bool,
    children: HashMap<String, Vec<FakeElement>>,
    on_click: Option<ClickHook>,
    on_fill: Option<FillHook>,
    clicks: usize,
    fills: Vec<String>,
    evaluations: Vec<(String, Value)>,
}

/// A mutable element shared between the fixture and the locators that match it.
#[derive(Clone)]
pub struct FakeElement {
    state: Arc<Mutex<ElementState>>,
}

impl FakeElement {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ElementState {
                visible: true,
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ElementState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn with_attr(self, name: &str, value: &str) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_text(self, text: &str) -> Self {
        self.set_text(text);
        self
    }

    pub fn with_value(self, value: &str) -> Self {
        self.set_value(value);
        self
    }

    pub fn hidden(self) -> Self {
        self.set_visible(false);
        self
    }

    pub fn disabled(self) -> Self {
        self.set_disabled(true);
        self
    }

    pub fn checked(self, checked: bool) -> Self {
        self.set_checked(checked);
        self
    }

    pub fn with_child(self, selector: &str, child: FakeElement) -> Self {
        self.add_child(selector, child);
        self
    }

    pub fn on_click<F>(self, hook: F) -> Self
    where
        F: Fn(&FakeElement) + Send + Sync + 'static,
    {
        self.lock().on_click = Some(Arc::new(hook));
        self
    }

    pub fn on_fill<F>(self, hook: F) -> Self
    where
        F: Fn(&FakeElement, &str) + Send + Sync + 'static,
    {
        self.lock().on_fill = Some(Arc::new(hook));
        self
    }

    pub fn set_attr(&self, name: &str, value: &str) {
        self.lock()
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_attr(&self, name: &str) {
        self.lock().attributes.remove(name);
    }

    pub fn set_text(&self, text: &str) {
        self.lock().text = text.to_string();
    }

    pub fn set_value(&self, value: &str) {
        self.lock().value = value.to_string();
    }

    pub fn set_visible(&self, visible: bool) {
        self.lock().visible = visible;
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.lock().disabled = disabled;
    }

    pub fn set_checked(&self, checked: bool) {
        self.lock().checked = checked;
    }

    pub fn add_child(&self, selector: &str, child: FakeElement) {
        self.lock()
            .children
            .entry(selector.to_string())
            .or_default()
            .push(child);
    }

    pub fn set_children(&self, selector: &str, children: Vec<FakeElement>) {
        self.lock().children.insert(selector.to_string(), children);
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.lock().attributes.get(name).cloned()
    }

    pub fn text(&self) -> String {
        self.lock().text.clone()
    }

    pub fn value(&self) -> String {
        self.lock().value.clone()
    }

    pub fn is_visible(&self) -> bool {
        self.lock().visible
    }

    pub fn is_checked(&self) -> bool {
        self.lock().checked
    }

    pub fn is_disabled(&self) -> bool {
        let state = self.lock();
        state.disabled || state.attributes.contains_key("disabled")
    }

    pub fn children(&self, selector: &str) -> Vec<FakeElement> {
        self.lock()
            .children
            .get(selector)
            .cloned()
            .unwrap_or_default()
    }

    pub fn click_count(&self) -> usize {
        self.lock().clicks
    }

    pub fn fills(&self) -> Vec<String> {
        self.lock().fills.clone()
    }

    pub fn evaluations(&self) -> Vec<(String, Value)> {
        self.lock().evaluations.clone()
    }

    fn perform_click(&self) -> Result<()> {
        let hook = {
            let mut state = self.lock();
            if !state.visible {
                return Err(EngineError::Driver("element is not visible".to_string()));
            }
            if state.disabled || state.attributes.contains_key("disabled") {
                return Err(EngineError::Driver("element is disabled".to_string()));
            }
            state.clicks += 1;
            state.on_click.clone()
        };
        if let Some(hook) = hook {
            hook(self);
        }
        Ok(())
    }

    fn perform_fill(&self, text: &str) -> Result<()> {
        let hook = {
            let mut state = self.lock();
            if state.disabled || state.attributes.contains_key("disabled") {
                return Err(EngineError::Driver("element is disabled".to_string()));
            }
            state.value = text.to_string();
            if state.attributes.contains_key("contenteditable") {
                state.text = text.to_string();
            }
            state.fills.push(text.to_string());
            state.on_fill.clone()
        };
        if let Some(hook) = hook {
            hook(self, text);
        }
        Ok(())
    }
}

impl Default for FakeElement {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FakeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("FakeElement")
            .field("attributes", &state.attributes)
            .field("text", &state.text)
            .field("value", &state.value)
            .field("visible", &state.visible)
            .finish()
    }
}

#[derive(Default)]
struct PageState {
    elements: HashMap<String, Vec<FakeElement>>,
    url: String,
    visited: Vec<String>,
    waits: HashMap<String, usize>,
    failing_waits: usize,
    fatal_waits: usize,
}

/// Page whose elements are looked up by exact selector string.
#[derive(Clone, Default)]
pub struct FakePage {
    state: Arc<Mutex<PageState>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PageState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn handle(&self) -> Arc<dyn PageHandle> {
        Arc::new(self.clone())
    }

    pub fn add(&self, selector: &str, element: FakeElement) {
        self.lock()
            .elements
            .entry(selector.to_string())
            .or_default()
            .push(element);
    }

    pub fn remove_all(&self, selector: &str) {
        self.lock().elements.remove(selector);
    }

    pub fn elements(&self, selector: &str) -> Vec<FakeElement> {
        self.lock()
            .elements
            .get(selector)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of `wait_for` calls issued against a top-level selector
    pub fn wait_count(&self, selector: &str) -> usize {
        self.lock().waits.get(selector).copied().unwrap_or(0)
    }

    /// Make the next `count` waits fail with a driver error
    pub fn fail_next_waits(&self, count: usize) {
        self.lock().failing_waits = count;
    }

    /// Make the next `count` waits fail as if the browser had gone away
    pub fn fail_next_waits_fatally(&self, count: usize) {
        self.lock().fatal_waits = count;
    }

    pub fn visited(&self) -> Vec<String> {
        self.lock().visited.clone()
    }

    fn record_wait(&self, key: &str) -> Result<()> {
        let mut state = self.lock();
        *state.waits.entry(key.to_string()).or_default() += 1;
        if state.fatal_waits > 0 {
            state.fatal_waits -= 1;
            return Err(EngineError::LaunchFailed(
                "browser process has exited".to_string(),
            ));
        }
        if state.failing_waits > 0 {
            state.failing_waits -= 1;
            return Err(EngineError::Driver(format!("injected failure waiting for {}", key)));
        }
        Ok(())
    }
}

#[async_trait]
impl PageHandle for FakePage {
    fn locator(&self, selector: &str) -> LocatorRef {
        Arc::new(FakeLocator {
            page: self.clone(),
            source: Source::Page(selector.to_string()),
        })
    }

    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.lock();
        state.visited.push(url.to_string());
        state.url = url.to_string();
        Ok(())
    }

    async fn url(&self) -> Result<String> {
        Ok(self.lock().url.clone())
    }
}

#[derive(Clone)]
enum Source {
    Page(String),
    Scoped(Arc<FakeLocator>, String),
    Nth(Arc<FakeLocator>, usize),
}

#[derive(Clone)]
pub struct FakeLocator {
    page: FakePage,
    source: Source,
}

impl FakeLocator {
    fn resolve(&self) -> Vec<FakeElement> {
        match &self.source {
            Source::Page(selector) => self.page.elements(selector),
            Source::Scoped(parent, selector) => parent
                .resolve()
                .iter()
                .flat_map(|element| element.children(selector))
                .collect(),
            Source::Nth(parent, index) => parent.resolve().into_iter().skip(*index).take(1).collect(),
        }
    }

    fn first_element(&self) -> Result<FakeElement> {
        self.resolve()
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::Driver(format!("no element matches {}", self.describe())))
    }

    fn derive(&self, source: Source) -> LocatorRef {
        Arc::new(FakeLocator {
            page: self.page.clone(),
            source,
        })
    }
}

impl fmt::Debug for FakeLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FakeLocator({})", self.describe())
    }
}

#[async_trait]
impl Locator for FakeLocator {
    fn describe(&self) -> String {
        match &self.source {
            Source::Page(selector) => selector.clone(),
            Source::Scoped(parent, selector) => format!("{} >> {}", parent.describe(), selector),
            Source::Nth(parent, index) => format!("{} >> nth={}", parent.describe(), index),
        }
    }

    fn locator(&self, selector: &str) -> LocatorRef {
        self.derive(Source::Scoped(Arc::new(self.clone()), selector.to_string()))
    }

    fn first(&self) -> LocatorRef {
        self.derive(Source::Nth(Arc::new(self.clone()), 0))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.resolve().len())
    }

    async fn all(&self) -> Result<Vec<LocatorRef>> {
        let parent = Arc::new(self.clone());
        Ok((0..self.resolve().len())
            .map(|index| self.derive(Source::Nth(parent.clone(), index)))
            .collect())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.first_element()?.attr(name))
    }

    async fn text(&self) -> Result<String> {
        Ok(self.first_element()?.text())
    }

    async fn input_value(&self) -> Result<String> {
        Ok(self.first_element()?.value())
    }

    async fn is_visible(&self) -> Result<bool> {
        Ok(self
            .resolve()
            .first()
            .map(FakeElement::is_visible)
            .unwrap_or(false))
    }

    async fn is_disabled(&self) -> Result<bool> {
        Ok(self.first_element()?.is_disabled())
    }

    async fn is_checked(&self) -> Result<bool> {
        Ok(self.first_element()?.is_checked())
    }

    async fn click(&self, _timeout: Option<Duration>) -> Result<()> {
        self.first_element()?.perform_click()
    }

    async fn fill(&self, text: &str) -> Result<()> {
        self.first_element()?.perform_fill(text)
    }

    async fn wait_for(&self, state: WaitState, timeout: Duration) -> Result<()> {
        self.page.record_wait(&self.describe())?;

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let elements = self.resolve();
            let any_visible = elements.iter().any(FakeElement::is_visible);
            let reached = match state {
                WaitState::Attached => !elements.is_empty(),
                WaitState::Detached => elements.is_empty(),
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
        let element = self.first_element()?;
        element
            .lock()
            .evaluations
            .push((script.to_string(), arg.clone()));
        if script == scripts::ASSIGN_VALUE {
            if let Some(value) = arg.as_str() {
                element.set_value(value);
            }
            return Ok(Value::String(element.value()));
        }
        Ok(Value::Null)
    }
}

/// Field container whose caption reads `label`.
pub fn field_container(label: &str) -> FakeElement {
    FakeElement::new().with_child(selectors::LABEL, FakeElement::new().with_text(label))
}
