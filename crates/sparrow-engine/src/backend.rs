//! The backend trait every browser driver must implement.
//!
//! Scenarios and the resolver only ever talk to this trait, never to a
//! concrete browser. Interaction mechanisms are exposed at the lowest
//! useful granularity (native click vs. scripted click, native typing vs.
//! scripted content assignment) so the interaction executor can compose
//! its fallback chains without knowing the driver.

use crate::locator::Locator;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Opaque handle to a live DOM element.
///
/// Valid only until the next navigation or refresh; backends invalidate
/// all outstanding handles when the page changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle {
    pub id: u64,
}

/// Interactability snapshot of a resolved element.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementState {
    pub visible: bool,
    pub enabled: bool,
}

/// One cookie of the persisted session bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub expires: Option<f64>,
    pub http_only: Option<bool>,
    pub secure: Option<bool>,
}

#[derive(thiserror::Error, Debug, Clone)]
pub enum BackendError {
    #[error("Navigation failed: {0}")]
    Navigation(String),

    #[error("Element {id} is stale (removed from DOM)")]
    ElementStale { id: u64 },

    #[error("Element is not interactable: {0}")]
    ElementNotInteractable(String),

    #[error("Script execution error: {0}")]
    ScriptError(String),

    #[error("Timeout: {operation}")]
    Timeout { operation: String },

    #[error("Not ready")]
    NotReady,

    #[error("IO error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Other: {0}")]
    Other(String),
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        BackendError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::Serialization(err.to_string())
    }
}

/// Unified browser interface.
///
/// Required methods cover the element lifecycle every scenario depends on;
/// the rest default to `NotSupported` so partial drivers (and test mocks)
/// only implement what they exercise.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Launch the driver (start browser, open the root page).
    async fn launch(&mut self) -> Result<(), BackendError>;

    /// Close the driver and release resources.
    async fn close(&mut self) -> Result<(), BackendError>;

    /// Navigate the current page. Invalidates all element handles.
    async fn navigate(&mut self, url: &str) -> Result<(), BackendError>;

    /// URL of the current page.
    async fn current_url(&mut self) -> Result<String, BackendError>;

    /// Title of the current page.
    async fn page_title(&mut self) -> Result<String, BackendError>;

    /// Find the first element matching a locator, if any.
    async fn query(&mut self, locator: &Locator) -> Result<Option<ElementHandle>, BackendError>;

    /// Find all elements matching a locator, in document order.
    async fn query_all(&mut self, locator: &Locator) -> Result<Vec<ElementHandle>, BackendError>;

    /// Visibility and enabled state of an element.
    async fn element_state(&mut self, el: ElementHandle) -> Result<ElementState, BackendError>;

    /// Rendered text content of an element.
    async fn element_text(&mut self, el: ElementHandle) -> Result<String, BackendError>;

    /// Fire a real (trusted) click on an element.
    async fn click_native(&mut self, el: ElementHandle) -> Result<(), BackendError>;

    /// Fire a scripted `el.click()` on an element.
    async fn click_scripted(&mut self, el: ElementHandle) -> Result<(), BackendError>;

    /// Type text into an element through synthesized key input.
    async fn type_native(&mut self, el: ElementHandle, text: &str) -> Result<(), BackendError>;

    /// Assign element content directly from script. Fallback for editors
    /// that swallow synthesized key events.
    async fn set_text_scripted(&mut self, el: ElementHandle, text: &str)
    -> Result<(), BackendError>;

    /// Scroll an element into the viewport center.
    async fn scroll_into_view(&mut self, el: ElementHandle) -> Result<(), BackendError>;

    /// Reload the current page. Invalidates all element handles.
    async fn refresh(&mut self) -> Result<(), BackendError> {
        Err(BackendError::NotSupported("refresh".into()))
    }

    /// Read an attribute of an element.
    async fn element_attr(
        &mut self,
        _el: ElementHandle,
        _name: &str,
    ) -> Result<Option<String>, BackendError> {
        Err(BackendError::NotSupported("element_attr".into()))
    }

    /// Lowercase tag name of an element.
    async fn element_tag(&mut self, _el: ElementHandle) -> Result<String, BackendError> {
        Err(BackendError::NotSupported("element_tag".into()))
    }

    /// Move the pointer over an element (for render-on-hover menus).
    async fn hover(&mut self, _el: ElementHandle) -> Result<(), BackendError> {
        Err(BackendError::NotSupported("hover".into()))
    }

    /// Clear the content of an input element.
    async fn clear(&mut self, el: ElementHandle) -> Result<(), BackendError> {
        self.set_text_scripted(el, "").await
    }

    /// Press a single key on the focused element.
    async fn press_key(&mut self, _key: &str) -> Result<(), BackendError> {
        Err(BackendError::NotSupported("press_key".into()))
    }

    /// Attach a local file to a native file input.
    async fn upload_file(
        &mut self,
        _el: ElementHandle,
        _path: &Path,
    ) -> Result<(), BackendError> {
        Err(BackendError::NotSupported("upload_file".into()))
    }

    /// Scroll the page to the bottom (triggers lazy loading).
    async fn scroll_to_bottom(&mut self) -> Result<(), BackendError> {
        Err(BackendError::NotSupported("scroll_to_bottom".into()))
    }

    /// Scroll the page back to the top.
    async fn scroll_to_top(&mut self) -> Result<(), BackendError> {
        Err(BackendError::NotSupported("scroll_to_top".into()))
    }

    /// Current scroll height of the document.
    async fn page_height(&mut self) -> Result<f64, BackendError> {
        Err(BackendError::NotSupported("page_height".into()))
    }

    /// Whether the rendered page contains a text fragment anywhere.
    async fn page_contains(&mut self, _needle: &str) -> Result<bool, BackendError> {
        Err(BackendError::NotSupported("page_contains".into()))
    }

    /// Open a URL in a new tab and make it current. The previous tab stays
    /// open underneath; callers must pair this with `close_tab`.
    async fn open_tab(&mut self, _url: &str) -> Result<(), BackendError> {
        Err(BackendError::NotSupported("open_tab".into()))
    }

    /// Close the current tab and return control to the one below it.
    async fn close_tab(&mut self) -> Result<(), BackendError> {
        Err(BackendError::NotSupported("close_tab".into()))
    }

    /// All cookies of the current session.
    async fn cookies(&mut self) -> Result<Vec<Cookie>, BackendError> {
        Err(BackendError::NotSupported("cookies".into()))
    }

    /// Apply a previously captured cookie bundle.
    async fn set_cookies(&mut self, _cookies: Vec<Cookie>) -> Result<(), BackendError> {
        Err(BackendError::NotSupported("set_cookies".into()))
    }

    /// PNG screenshot of the current viewport.
    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError> {
        Err(BackendError::NotSupported("screenshot".into()))
    }
}
