use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SparrowConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub commenter: CommenterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_dashboard_url")]
    pub dashboard_url: String,
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default = "default_notes_url")]
    pub notes_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            dashboard_url: default_dashboard_url(),
            login_url: default_login_url(),
            notes_url: default_notes_url(),
        }
    }
}

fn default_dashboard_url() -> String {
    "https://www.yuque.com/dashboard".into()
}

fn default_login_url() -> String {
    "https://www.yuque.com/login".into()
}

fn default_notes_url() -> String {
    "https://www.yuque.com/dashboard/notes".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_cookie_file")]
    pub cookie_file: PathBuf,
    #[serde(default = "default_ledger_file")]
    pub ledger_file: PathBuf,
    #[serde(default = "default_titles_file")]
    pub titles_file: PathBuf,
    #[serde(default = "default_articles_file")]
    pub articles_file: PathBuf,
    #[serde(default = "default_summary_file")]
    pub summary_file: PathBuf,
    #[serde(default = "default_screenshot_dir")]
    pub screenshot_dir: PathBuf,
    #[serde(default = "default_upload_image")]
    pub upload_image: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            cookie_file: default_cookie_file(),
            ledger_file: default_ledger_file(),
            titles_file: default_titles_file(),
            articles_file: default_articles_file(),
            summary_file: default_summary_file(),
            screenshot_dir: default_screenshot_dir(),
            upload_image: default_upload_image(),
        }
    }
}

fn default_cookie_file() -> PathBuf {
    "cookies.json".into()
}

fn default_ledger_file() -> PathBuf {
    "commented_articles.csv".into()
}

fn default_titles_file() -> PathBuf {
    "explore_titles.csv".into()
}

fn default_articles_file() -> PathBuf {
    "scraped_articles.csv".into()
}

fn default_summary_file() -> PathBuf {
    "articles_summary.csv".into()
}

fn default_screenshot_dir() -> PathBuf {
    "screenshots".into()
}

fn default_upload_image() -> PathBuf {
    "miao.jpeg".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Total resolver budget for required elements.
    #[serde(default = "default_resolve_timeout_ms")]
    pub resolve_timeout_ms: u64,
    /// Shorter budget for optional / probe resolutions.
    #[serde(default = "default_short_timeout_ms")]
    pub short_timeout_ms: u64,
    /// Budget for article pages that load slowly behind share links.
    #[serde(default = "default_article_timeout_ms")]
    pub article_timeout_ms: u64,
    /// Fixed settle pause for animations and re-renders.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Lazy-load scroll passes over the feed.
    #[serde(default = "default_scroll_rounds")]
    pub scroll_rounds: u32,
    /// Upper bound on the interactive login challenge.
    #[serde(default = "default_challenge_timeout_secs")]
    pub challenge_timeout_secs: u64,
    /// Poll interval for the login validity probe.
    #[serde(default = "default_probe_interval_secs")]
    pub probe_interval_secs: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            resolve_timeout_ms: default_resolve_timeout_ms(),
            short_timeout_ms: default_short_timeout_ms(),
            article_timeout_ms: default_article_timeout_ms(),
            settle_ms: default_settle_ms(),
            scroll_rounds: default_scroll_rounds(),
            challenge_timeout_secs: default_challenge_timeout_secs(),
            probe_interval_secs: default_probe_interval_secs(),
        }
    }
}

fn default_resolve_timeout_ms() -> u64 {
    20000
}

fn default_short_timeout_ms() -> u64 {
    5000
}

fn default_article_timeout_ms() -> u64 {
    40000
}

fn default_settle_ms() -> u64 {
    2000
}

fn default_scroll_rounds() -> u32 {
    3
}

fn default_challenge_timeout_secs() -> u64 {
    120
}

fn default_probe_interval_secs() -> u64 {
    3
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommenterConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key; never stored in config.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for CommenterConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.siliconflow.cn/v1".into()
}

fn default_model() -> String {
    "Qwen/Qwen3-8B".into()
}

fn default_api_key_env() -> String {
    "SPARROW_API_KEY".into()
}

fn default_request_timeout_secs() -> u64 {
    60
}
