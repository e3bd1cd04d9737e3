use crate::cdp::CdpClient;
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::element::Element;
use sparrow_engine::backend::{Backend, BackendError, Cookie, ElementHandle, ElementState};
use sparrow_engine::locator::{Locator, Strategy};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Chromium backend speaking the DevTools protocol.
///
/// Element handles index into a registry of live `Element` objects; the
/// registry is flushed on every navigation, reload, or tab switch so stale
/// handles surface as `ElementStale` instead of acting on the wrong node.
pub struct HeadlessBackend {
    client: Option<CdpClient>,
    visible: bool,
    /// Extra tabs stacked above the root page; the last one is current.
    tabs: Vec<Page>,
    elements: HashMap<u64, Element>,
    next_id: u64,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::new_with_visibility(false)
    }

    pub fn new_with_visibility(visible: bool) -> Self {
        Self {
            client: None,
            visible,
            tabs: Vec::new(),
            elements: HashMap::new(),
            next_id: 1,
        }
    }

    fn page(&self) -> Result<Page, BackendError> {
        let client = self.client.as_ref().ok_or(BackendError::NotReady)?;
        Ok(self.tabs.last().unwrap_or(&client.page).clone())
    }

    fn element(&self, el: ElementHandle) -> Result<&Element, BackendError> {
        self.elements
            .get(&el.id)
            .ok_or(BackendError::ElementStale { id: el.id })
    }

    fn register(&mut self, element: Element) -> ElementHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.elements.insert(id, element);
        ElementHandle { id }
    }

    fn invalidate_handles(&mut self) {
        self.elements.clear();
    }

    async fn find_all(&mut self, locator: &Locator) -> Result<Vec<Element>, BackendError> {
        let page = self.page()?;
        let found = match locator.strategy {
            Strategy::Css => page.find_elements(&locator.pattern).await,
            Strategy::XPath => page.find_xpaths(&locator.pattern).await,
        };
        match found {
            Ok(elements) => Ok(elements),
            Err(e) => {
                // A query against a mid-navigation page is a miss, not a fault.
                debug!(locator = %locator, error = %e, "element query failed");
                Ok(Vec::new())
            }
        }
    }

    /// Run a JS function against an element and deserialize its return value.
    async fn eval_on<T: serde::de::DeserializeOwned>(
        &self,
        el: ElementHandle,
        function: &str,
    ) -> Result<T, BackendError> {
        let element = self.element(el)?;
        let returns = element
            .call_js_fn(function, false)
            .await
            .map_err(|e| BackendError::ScriptError(e.to_string()))?;
        let value = returns
            .result
            .value
            .ok_or_else(|| BackendError::ScriptError("script returned no value".into()))?;
        Ok(serde_json::from_value(value)?)
    }

    async fn run_on(&self, el: ElementHandle, function: &str) -> Result<(), BackendError> {
        let element = self.element(el)?;
        element
            .call_js_fn(function, false)
            .await
            .map_err(|e| BackendError::ScriptError(e.to_string()))?;
        Ok(())
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(serde::Deserialize)]
struct JsElementState {
    visible: bool,
    enabled: bool,
}

#[async_trait]
impl Backend for HeadlessBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        info!("Launching Headless Backend (Chromium)...");
        let client = CdpClient::launch(self.visible)
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?;
        self.client = Some(client);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        self.invalidate_handles();
        for page in self.tabs.drain(..) {
            if let Err(e) = page.close().await {
                debug!(error = %e, "could not close leftover tab");
            }
        }
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|e| BackendError::Other(e.to_string()))?;
        }
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<(), BackendError> {
        let page = self.page()?;
        info!("Navigating to: {}", url);
        self.invalidate_handles();
        page.goto(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        let page = self.page()?;
        let url = page
            .url()
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?;
        Ok(url.unwrap_or_default())
    }

    async fn page_title(&mut self) -> Result<String, BackendError> {
        let page = self.page()?;
        let title = page
            .get_title()
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?;
        Ok(title.unwrap_or_default())
    }

    async fn query(&mut self, locator: &Locator) -> Result<Option<ElementHandle>, BackendError> {
        let mut found = self.find_all(locator).await?;
        if found.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.register(found.remove(0))))
    }

    async fn query_all(&mut self, locator: &Locator) -> Result<Vec<ElementHandle>, BackendError> {
        let found = self.find_all(locator).await?;
        Ok(found.into_iter().map(|e| self.register(e)).collect())
    }

    async fn element_state(&mut self, el: ElementHandle) -> Result<ElementState, BackendError> {
        let state: JsElementState = self
            .eval_on(
                el,
                r#"function() {
                    const style = window.getComputedStyle(this);
                    const rect = this.getBoundingClientRect();
                    return {
                        visible: style.visibility !== 'hidden'
                            && style.display !== 'none'
                            && rect.width > 0
                            && rect.height > 0,
                        enabled: !this.disabled
                            && this.getAttribute('aria-disabled') !== 'true'
                    };
                }"#,
            )
            .await?;
        Ok(ElementState {
            visible: state.visible,
            enabled: state.enabled,
        })
    }

    async fn element_text(&mut self, el: ElementHandle) -> Result<String, BackendError> {
        let element = self.element(el)?;
        let text = element
            .inner_text()
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?;
        Ok(text.unwrap_or_default())
    }

    async fn click_native(&mut self, el: ElementHandle) -> Result<(), BackendError> {
        let element = self.element(el)?;
        element
            .click()
            .await
            .map_err(|e| BackendError::ElementNotInteractable(e.to_string()))?;
        Ok(())
    }

    async fn click_scripted(&mut self, el: ElementHandle) -> Result<(), BackendError> {
        self.run_on(el, "function() { this.click(); }").await
    }

    async fn type_native(&mut self, el: ElementHandle, text: &str) -> Result<(), BackendError> {
        let element = self.element(el)?;
        element
            .focus()
            .await
            .map_err(|e| BackendError::ElementNotInteractable(e.to_string()))?;
        element
            .type_str(text)
            .await
            .map_err(|e| BackendError::ElementNotInteractable(e.to_string()))?;
        Ok(())
    }

    async fn set_text_scripted(
        &mut self,
        el: ElementHandle,
        text: &str,
    ) -> Result<(), BackendError> {
        // A JSON string literal is also a valid JS string literal.
        let literal = serde_json::to_string(text)?;
        let function = format!(
            "function() {{ \
                if ('value' in this) {{ this.value = {literal}; }} \
                else {{ this.textContent = {literal}; }} \
                this.dispatchEvent(new Event('input', {{ bubbles: true }})); \
                this.dispatchEvent(new Event('change', {{ bubbles: true }})); \
            }}"
        );
        self.run_on(el, &function).await
    }

    async fn scroll_into_view(&mut self, el: ElementHandle) -> Result<(), BackendError> {
        let element = self.element(el)?;
        element
            .scroll_into_view()
            .await
            .map_err(|e| BackendError::Other(e.to_string()))?;
        Ok(())
    }

    async fn refresh(&mut self) -> Result<(), BackendError> {
        let page = self.page()?;
        self.invalidate_handles();
        page.reload()
            .await
            .map_err(|e| BackendError::Navigation(format!("refresh failed: {}", e)))?;
        Ok(())
    }

    async fn element_attr(
        &mut self,
        el: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BackendError> {
        let element = self.element(el)?;
        element
            .attribute(name)
            .await
            .map_err(|e| BackendError::Other(e.to_string()))
    }

    async fn element_tag(&mut self, el: ElementHandle) -> Result<String, BackendError> {
        self.eval_on(el, "function() { return this.tagName.toLowerCase(); }")
            .await
    }

    async fn hover(&mut self, el: ElementHandle) -> Result<(), BackendError> {
        let element = self.element(el)?;
        element
            .hover()
            .await
            .map_err(|e| BackendError::ElementNotInteractable(e.to_string()))?;
        Ok(())
    }

    async fn press_key(&mut self, key: &str) -> Result<(), BackendError> {
        use chromiumoxide::cdp::browser_protocol::input::{
            DispatchKeyEventParams, DispatchKeyEventType,
        };
        let page = self.page()?;

        let mut down = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyDown)
            .key(key);
        // Enter must carry its text payload to reach editable surfaces.
        if key == "Enter" {
            down = down.code("Enter").windows_virtual_key_code(13).text("\r");
        }
        let down = down
            .build()
            .map_err(|e| BackendError::Other(format!("Failed to build key event: {:?}", e)))?;
        page.execute(down)
            .await
            .map_err(|e| BackendError::Other(format!("press_key down failed: {}", e)))?;

        let up = DispatchKeyEventParams::builder()
            .r#type(DispatchKeyEventType::KeyUp)
            .key(key)
            .build()
            .map_err(|e| BackendError::Other(format!("Failed to build key event: {:?}", e)))?;
        page.execute(up)
            .await
            .map_err(|e| BackendError::Other(format!("press_key up failed: {}", e)))?;
        Ok(())
    }

    async fn upload_file(&mut self, el: ElementHandle, path: &Path) -> Result<(), BackendError> {
        use chromiumoxide::cdp::browser_protocol::dom::SetFileInputFilesParams;
        let page = self.page()?;
        let element = self.element(el)?;
        let params = SetFileInputFilesParams::builder()
            .file(path.to_string_lossy().to_string())
            .backend_node_id(element.backend_node_id.clone())
            .build()
            .map_err(|e| BackendError::Other(format!("Failed to build file params: {:?}", e)))?;
        page.execute(params)
            .await
            .map_err(|e| BackendError::Other(format!("upload_file failed: {}", e)))?;
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BackendError> {
        let page = self.page()?;
        page.evaluate("window.scrollTo(0, document.body.scrollHeight);")
            .await
            .map_err(|e| BackendError::ScriptError(e.to_string()))?;
        Ok(())
    }

    async fn scroll_to_top(&mut self) -> Result<(), BackendError> {
        let page = self.page()?;
        page.evaluate("window.scrollTo(0, 0);")
            .await
            .map_err(|e| BackendError::ScriptError(e.to_string()))?;
        Ok(())
    }

    async fn page_height(&mut self) -> Result<f64, BackendError> {
        let page = self.page()?;
        let height: f64 = page
            .evaluate("document.body.scrollHeight")
            .await
            .map_err(|e| BackendError::ScriptError(e.to_string()))?
            .into_value()
            .map_err(|e| BackendError::ScriptError(e.to_string()))?;
        Ok(height)
    }

    async fn page_contains(&mut self, needle: &str) -> Result<bool, BackendError> {
        let page = self.page()?;
        let literal = serde_json::to_string(needle)?;
        let found: bool = page
            .evaluate(format!(
                "!!document.body && document.body.innerText.includes({literal})"
            ))
            .await
            .map_err(|e| BackendError::ScriptError(e.to_string()))?
            .into_value()
            .map_err(|e| BackendError::ScriptError(e.to_string()))?;
        Ok(found)
    }

    async fn open_tab(&mut self, url: &str) -> Result<(), BackendError> {
        let client = self.client.as_ref().ok_or(BackendError::NotReady)?;
        info!("Opening tab: {}", url);
        let page = client
            .browser
            .new_page(url)
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?;
        self.invalidate_handles();
        self.tabs.push(page);
        Ok(())
    }

    async fn close_tab(&mut self) -> Result<(), BackendError> {
        let page = self
            .tabs
            .pop()
            .ok_or_else(|| BackendError::Other("no tab above the root page".into()))?;
        self.invalidate_handles();
        page.close()
            .await
            .map_err(|e| BackendError::Other(format!("close_tab failed: {}", e)))?;
        Ok(())
    }

    async fn cookies(&mut self) -> Result<Vec<Cookie>, BackendError> {
        let page = self.page()?;
        let cookies = page
            .get_cookies()
            .await
            .map_err(|e| BackendError::Other(format!("Get cookies failed: {}", e)))?;
        Ok(cookies
            .into_iter()
            .map(|c| Cookie {
                name: c.name,
                value: c.value,
                domain: Some(c.domain),
                path: Some(c.path),
                expires: Some(c.expires),
                http_only: Some(c.http_only),
                secure: Some(c.secure),
            })
            .collect())
    }

    async fn set_cookies(&mut self, cookies: Vec<Cookie>) -> Result<(), BackendError> {
        use chromiumoxide::cdp::browser_protocol::network::{
            CookieParam, SetCookiesParams, TimeSinceEpoch,
        };
        let page = self.page()?;
        let mut params = Vec::with_capacity(cookies.len());
        for c in cookies {
            let mut builder = CookieParam::builder().name(c.name).value(c.value);
            if let Some(domain) = c.domain {
                builder = builder.domain(domain);
            }
            if let Some(path) = c.path {
                builder = builder.path(path);
            }
            if let Some(expires) = c.expires {
                builder = builder.expires(TimeSinceEpoch::new(expires));
            }
            if let Some(http_only) = c.http_only {
                builder = builder.http_only(http_only);
            }
            if let Some(secure) = c.secure {
                builder = builder.secure(secure);
            }
            params.push(
                builder
                    .build()
                    .map_err(|e| BackendError::Other(format!("Bad cookie: {:?}", e)))?,
            );
        }
        page.execute(SetCookiesParams::new(params))
            .await
            .map_err(|e| BackendError::Other(format!("Set cookies failed: {}", e)))?;
        Ok(())
    }

    async fn screenshot(&mut self) -> Result<Vec<u8>, BackendError> {
        let page = self.page()?;
        let bytes = page
            .screenshot(chromiumoxide::page::ScreenshotParams::builder().build())
            .await
            .map_err(|e| BackendError::Other(format!("Screenshot failed: {}", e)))?;
        Ok(bytes)
    }
}
