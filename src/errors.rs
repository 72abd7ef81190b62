use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Timed out after {timeout_ms}ms waiting for {what}")]
    Timeout { what: String, timeout_ms: u64 },

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Field {field} was not found on the page")]
    FieldNotFound { field: String },

    #[error("Button {0} was not found on the page")]
    ButtonNotFound(String),

    #[error("Button {0} is disabled and cannot be clicked")]
    ButtonDisabled(String),

    #[error("Field {field} is declared as {declared} but a {supplied} value was supplied")]
    NumberTypeMismatch {
        field: String,
        declared: String,
        supplied: String,
    },

    #[error("Field {field}: checkbox is {actual} after click, expected {expected}")]
    BooleanStateMismatch {
        field: String,
        expected: bool,
        actual: bool,
    },

    #[error("Field {field}: no autocomplete panel appeared within {timeout_ms}ms after typing '{text}'")]
    PanelNotShown {
        field: String,
        text: String,
        timeout_ms: u64,
    },

    #[error("Field {field}: option '{text}' was not offered within {budget_ms}ms")]
    OptionNotFound {
        field: String,
        text: String,
        budget_ms: u64,
    },

    #[error("Field {field}: option '{text}' was clicked but the selection was not applied")]
    SelectionNotApplied { field: String, text: String },

    #[error("Field {field}: email input did not become visible after clicking the add trigger")]
    EmailInputHidden { field: String },

    #[error("Page '{page}' has no field with code '{code}'")]
    UnknownField { page: String, code: String },

    #[error("Page '{page}' has no button with code '{code}'")]
    UnknownButton { page: String, code: String },

    #[error("Field '{code}' is a {actual} field, not a {requested} field")]
    FieldKindMismatch {
        code: String,
        actual: String,
        requested: String,
    },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Anyhow error: {0}")]
    Anyhow(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;

// headless_chrome reports failures as anyhow::Error
impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Anyhow(err.to_string())
    }
}

impl EngineError {
    pub fn config(message: impl Into<String>) -> Self {
        EngineError::Configuration(message.into())
    }

    /// Message without the variant prefix, for nesting in another message.
    pub fn detail(&self) -> String {
        match self {
            EngineError::Configuration(message) => message.clone(),
            other => other.to_string(),
        }
    }

    /// Errors raised by the automation driver itself rather than by a field contract.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EngineError::Driver(_)
                | EngineError::Timeout { .. }
                | EngineError::JavaScriptFailed(_)
                | EngineError::NavigationFailed(_)
                | EngineError::Anyhow(_)
        )
    }
}
