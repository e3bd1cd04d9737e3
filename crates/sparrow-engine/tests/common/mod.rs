#![allow(dead_code)]

use async_trait::async_trait;
use sparrow_engine::backend::{Backend, BackendError, Cookie, ElementHandle, ElementState};
use sparrow_engine::config::SparrowConfig;
use sparrow_engine::locator::Locator;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One fake DOM node. `marker` is a distinctive fragment of the real
/// selector; a locator matches the node when its pattern contains the
/// marker.
#[derive(Debug, Clone)]
pub struct Node {
    pub marker: String,
    pub text: String,
    pub visible: bool,
    pub enabled: bool,
    pub tag: String,
    pub attrs: HashMap<String, String>,
}

impl Node {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            text: String::new(),
            visible: true,
            enabled: true,
            tag: "div".into(),
            attrs: HashMap::new(),
        }
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }
}

/// DOM mutation fired once when a node is clicked.
#[derive(Debug, Clone)]
pub enum ClickEffect {
    Add(Node),
    Remove(String),
    SetText { marker: String, text: String },
}

/// In-memory backend with spies on every interaction channel.
#[derive(Default)]
pub struct MockBackend {
    nodes: Vec<(u64, Node)>,
    next_id: u64,
    pub url: String,
    pub title: String,
    pub navigations: Vec<String>,
    pub refreshes: usize,
    pub native_clicks: Vec<u64>,
    pub scripted_clicks: Vec<u64>,
    pub typed: Vec<(u64, String)>,
    pub assigned: Vec<(u64, String)>,
    pub hovered: Vec<u64>,
    pub pressed: Vec<String>,
    pub uploads: Vec<(u64, PathBuf)>,
    pub open_tabs: Vec<String>,
    pub closed_tabs: usize,
    pub cookie_jar: Vec<Cookie>,
    pub applied_cookies: Vec<Vec<Cookie>>,
    /// Markers whose native click raises.
    pub fail_native_clicks: Vec<String>,
    /// Markers whose native typing raises.
    pub fail_native_typing: Vec<String>,
    /// Native typing fires without updating the node (editor swallows it).
    pub swallow_typing: bool,
    /// Reload re-renders from server state: locally typed text vanishes.
    pub clear_texts_on_refresh: bool,
    pub click_effects: HashMap<String, Vec<ClickEffect>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn with_nodes(nodes: Vec<Node>) -> Self {
        let mut backend = Self::new();
        for node in nodes {
            backend.add(node);
        }
        backend
    }

    pub fn add(&mut self, node: Node) -> ElementHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.push((id, node));
        ElementHandle { id }
    }

    pub fn on_click(&mut self, marker: &str, effect: ClickEffect) {
        self.click_effects
            .entry(marker.to_string())
            .or_default()
            .push(effect);
    }

    pub fn handle(&self, marker: &str) -> Option<ElementHandle> {
        self.nodes
            .iter()
            .find(|(_, n)| n.marker == marker)
            .map(|(id, _)| ElementHandle { id: *id })
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.nodes.iter().any(|(_, n)| n.marker == marker)
    }

    pub fn node_text(&self, marker: &str) -> Option<String> {
        self.nodes
            .iter()
            .find(|(_, n)| n.marker == marker)
            .map(|(_, n)| n.text.clone())
    }

    fn node(&self, el: ElementHandle) -> Result<&Node, BackendError> {
        self.nodes
            .iter()
            .find(|(id, _)| *id == el.id)
            .map(|(_, n)| n)
            .ok_or(BackendError::ElementStale { id: el.id })
    }

    fn node_mut(&mut self, el: ElementHandle) -> Result<&mut Node, BackendError> {
        self.nodes
            .iter_mut()
            .find(|(id, _)| *id == el.id)
            .map(|(_, n)| n)
            .ok_or(BackendError::ElementStale { id: el.id })
    }

    fn apply_click_effects(&mut self, el: ElementHandle) {
        let Ok(marker) = self.node(el).map(|n| n.marker.clone()) else {
            return;
        };
        let effects = self.click_effects.remove(&marker).unwrap_or_default();
        for effect in effects {
            match effect {
                ClickEffect::Add(node) => {
                    self.add(node);
                }
                ClickEffect::Remove(marker) => {
                    self.nodes.retain(|(_, n)| n.marker != marker);
                }
                ClickEffect::SetText { marker, text } => {
                    for (_, n) in self.nodes.iter_mut().filter(|(_, n)| n.marker == marker) {
                        n.text = text.clone();
                    }
                }
            }
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn navigate(&mut self, url: &str) -> Result<(), BackendError> {
        self.url = url.to_string();
        self.navigations.push(url.to_string());
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        Ok(self.url.clone())
    }

    async fn page_title(&mut self) -> Result<String, BackendError> {
        Ok(self.title.clone())
    }

    async fn query(&mut self, locator: &Locator) -> Result<Option<ElementHandle>, BackendError> {
        Ok(self
            .nodes
            .iter()
            .find(|(_, n)| locator.pattern.contains(&n.marker))
            .map(|(id, _)| ElementHandle { id: *id }))
    }

    async fn query_all(&mut self, locator: &Locator) -> Result<Vec<ElementHandle>, BackendError> {
        Ok(self
            .nodes
            .iter()
            .filter(|(_, n)| locator.pattern.contains(&n.marker))
            .map(|(id, _)| ElementHandle { id: *id })
            .collect())
    }

    async fn element_state(&mut self, el: ElementHandle) -> Result<ElementState, BackendError> {
        let node = self.node(el)?;
        Ok(ElementState {
            visible: node.visible,
            enabled: node.enabled,
        })
    }

    async fn element_text(&mut self, el: ElementHandle) -> Result<String, BackendError> {
        Ok(self.node(el)?.text.clone())
    }

    async fn click_native(&mut self, el: ElementHandle) -> Result<(), BackendError> {
        let marker = self.node(el)?.marker.clone();
        self.native_clicks.push(el.id);
        if self.fail_native_clicks.contains(&marker) {
            return Err(BackendError::ElementNotInteractable(
                "intercepted by overlay".into(),
            ));
        }
        self.apply_click_effects(el);
        Ok(())
    }

    async fn click_scripted(&mut self, el: ElementHandle) -> Result<(), BackendError> {
        self.node(el)?;
        self.scripted_clicks.push(el.id);
        self.apply_click_effects(el);
        Ok(())
    }

    async fn type_native(&mut self, el: ElementHandle, text: &str) -> Result<(), BackendError> {
        let marker = self.node(el)?.marker.clone();
        if self.fail_native_typing.contains(&marker) {
            return Err(BackendError::ElementNotInteractable(
                "element not focusable".into(),
            ));
        }
        self.typed.push((el.id, text.to_string()));
        if !self.swallow_typing {
            self.node_mut(el)?.text.push_str(text);
        }
        Ok(())
    }

    async fn set_text_scripted(
        &mut self,
        el: ElementHandle,
        text: &str,
    ) -> Result<(), BackendError> {
        self.assigned.push((el.id, text.to_string()));
        self.node_mut(el)?.text = text.to_string();
        Ok(())
    }

    async fn scroll_into_view(&mut self, el: ElementHandle) -> Result<(), BackendError> {
        self.node(el)?;
        Ok(())
    }

    async fn refresh(&mut self) -> Result<(), BackendError> {
        self.refreshes += 1;
        if self.clear_texts_on_refresh {
            for (_, node) in self.nodes.iter_mut() {
                node.text.clear();
            }
        }
        Ok(())
    }

    async fn element_attr(
        &mut self,
        el: ElementHandle,
        name: &str,
    ) -> Result<Option<String>, BackendError> {
        Ok(self.node(el)?.attrs.get(name).cloned())
    }

    async fn element_tag(&mut self, el: ElementHandle) -> Result<String, BackendError> {
        Ok(self.node(el)?.tag.clone())
    }

    async fn hover(&mut self, el: ElementHandle) -> Result<(), BackendError> {
        self.node(el)?;
        self.hovered.push(el.id);
        Ok(())
    }

    async fn press_key(&mut self, key: &str) -> Result<(), BackendError> {
        self.pressed.push(key.to_string());
        Ok(())
    }

    async fn upload_file(&mut self, el: ElementHandle, path: &Path) -> Result<(), BackendError> {
        self.node(el)?;
        self.uploads.push((el.id, path.to_path_buf()));
        Ok(())
    }

    async fn scroll_to_bottom(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn scroll_to_top(&mut self) -> Result<(), BackendError> {
        Ok(())
    }

    async fn page_height(&mut self) -> Result<f64, BackendError> {
        Ok(1000.0)
    }

    async fn page_contains(&mut self, needle: &str) -> Result<bool, BackendError> {
        Ok(self.nodes.iter().any(|(_, n)| n.text.contains(needle)))
    }

    async fn open_tab(&mut self, url: &str) -> Result<(), BackendError> {
        self.url = url.to_string();
        self.open_tabs.push(url.to_string());
        Ok(())
    }

    async fn close_tab(&mut self) -> Result<(), BackendError> {
        self.closed_tabs += 1;
        Ok(())
    }

    async fn cookies(&mut self) -> Result<Vec<Cookie>, BackendError> {
        Ok(self.cookie_jar.clone())
    }

    async fn set_cookies(&mut self, cookies: Vec<Cookie>) -> Result<(), BackendError> {
        self.applied_cookies.push(cookies);
        Ok(())
    }
}

/// Config with all file paths under a temp dir and timings shrunk so the
/// resolver and settle pauses finish in test time.
pub fn fast_config(dir: &Path) -> SparrowConfig {
    let mut config = SparrowConfig::default();
    config.files.cookie_file = dir.join("cookies.json");
    config.files.ledger_file = dir.join("commented_articles.csv");
    config.files.titles_file = dir.join("explore_titles.csv");
    config.files.articles_file = dir.join("scraped_articles.csv");
    config.files.summary_file = dir.join("articles_summary.csv");
    config.files.screenshot_dir = dir.join("screenshots");
    config.files.upload_image = dir.join("miao.jpeg");
    config.timing.resolve_timeout_ms = 200;
    config.timing.short_timeout_ms = 100;
    config.timing.article_timeout_ms = 200;
    config.timing.settle_ms = 0;
    config.timing.scroll_rounds = 1;
    config.timing.challenge_timeout_secs = 0;
    config.timing.probe_interval_secs = 0;
    config
}

pub fn cookie(name: &str, value: &str) -> Cookie {
    Cookie {
        name: name.into(),
        value: value.into(),
        domain: Some(".yuque.com".into()),
        path: Some("/".into()),
        expires: Some(4102444800.0),
        http_only: Some(true),
        secure: Some(true),
    }
}
