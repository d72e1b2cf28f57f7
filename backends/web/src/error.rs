use core::fmt;

use singultus::DomError;

/// Error type produced by the web backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebError {
    /// The DOM APIs are not accessible (e.g., when executed outside of a browser).
    DomUnavailable,
    /// The requested mounting node cannot be located.
    RootNotFound(String),
    /// The markup passed from JavaScript is not valid JSON.
    InvalidMarkup(String),
    /// Wrapper around JavaScript exceptions.
    Js(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DomUnavailable => write!(f, "DOM is not available"),
            Self::RootNotFound(id) => write!(f, "Failed to find DOM element with id `{id}`"),
            Self::InvalidMarkup(msg) => write!(f, "Invalid hyperscript JSON: {msg}"),
            Self::Js(msg) => write!(f, "JavaScript error: {msg}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<wasm_bindgen::JsValue> for WebError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        value
            .as_string()
            .map_or_else(|| Self::Js(format!("{value:?}")), Self::Js)
    }
}

impl From<WebError> for wasm_bindgen::JsValue {
    fn from(value: WebError) -> Self {
        Self::from(value.to_string())
    }
}

impl From<WebError> for DomError {
    fn from(value: WebError) -> Self {
        match value {
            WebError::Js(msg) => Self::Host(msg),
            WebError::RootNotFound(id) => Self::MissingNode(id),
            other => Self::Unsupported(other.to_string()),
        }
    }
}

pub(crate) fn js_error(value: wasm_bindgen::JsValue) -> DomError {
    WebError::from(value).into()
}
