use crate::errors::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub type LocatorRef = Arc<dyn Locator>;

/// States a locator can be waited into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitState {
    Attached,
    Detached,
    Visible,
    Hidden,
}

impl fmt::Display for WaitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WaitState::Attached => "attached",
            WaitState::Detached => "detached",
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
        };
        f.write_str(name)
    }
}

/// Handle to zero or more elements of a live page.
///
/// Single-element operations act on the first match. Reads on a locator that
/// matches nothing fail with a driver error, so callers check optional
/// sub-elements with [`Locator::count`] first.
#[async_trait]
pub trait Locator: Send + Sync + fmt::Debug {
    /// Human-readable description of the selector chain
    fn describe(&self) -> String;

    /// Descendants of every current match that satisfy `selector`
    fn locator(&self, selector: &str) -> LocatorRef;

    /// The first match only
    fn first(&self) -> LocatorRef;

    /// Number of elements currently matched
    async fn count(&self) -> Result<usize>;

    /// One locator per current match, in document order
    async fn all(&self) -> Result<Vec<LocatorRef>>;

    /// Attribute value of the first match, `None` when absent
    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// Rendered text of the first match
    async fn text(&self) -> Result<String>;

    /// Current `value` of the first match (inputs, textareas)
    async fn input_value(&self) -> Result<String>;

    /// False when nothing matches
    async fn is_visible(&self) -> Result<bool>;

    async fn is_disabled(&self) -> Result<bool>;

    async fn is_checked(&self) -> Result<bool>;

    /// Click the first match, waiting up to `timeout` for it to become actionable
    async fn click(&self, timeout: Option<Duration>) -> Result<()>;

    /// Replace the text of the first match as if typed by the user
    async fn fill(&self, text: &str) -> Result<()>;

    /// Wait until at least one match reaches `state` (for `Detached`/`Hidden`: until none is left)
    async fn wait_for(&self, state: WaitState, timeout: Duration) -> Result<()>;

    /// Evaluate `script`, a function expression `(element, arg) => ...`, against the first match
    async fn evaluate(&self, script: &str, arg: Value) -> Result<Value>;
}
