//! Locator tables for the Yuque frontend.
//!
//! All knowledge about the target site's markup lives here as data.
//! Generated CSS module classes (`index-module_note_…`) churn between
//! deployments, so every table leads with the most specific selector
//! observed and degrades toward text- or role-based matches.

use crate::locator::{Locator, LocatorSet};

// ---- session ----

/// UI fragments only an authenticated session can see.
pub fn authenticated_markers() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::css("button[data-testid='header-avatar']"),
        Locator::css(".larkui-avatar"),
        Locator::css("div[class*='index-module_notesList_']"),
        Locator::css("[data-testid='note-editor-btn']"),
        Locator::css("div[class*='index-module_note_']"),
    ])
}

// ---- notes ----

pub fn note_editor() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::css(r#"div.ne-engine[contenteditable="true"]"#),
        Locator::css(r#"div.larkui-editor[contenteditable="true"]"#),
        Locator::css(r#"div[role="textbox"]"#),
        Locator::css("div.ne-viewer-body"),
    ])
}

pub fn note_publish_button() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::css(r#"button[data-testid="note-publish"]"#),
        Locator::css("button.larkui-button-primary"),
        Locator::css("button[class*='index-module_primaryBtn_']"),
    ])
}

/// Any element whose text contains the given fragment.
pub fn any_text(fragment: &str) -> LocatorSet {
    LocatorSet::new(vec![Locator::xpath(format!(
        "//*[contains(text(), '{fragment}')]"
    ))])
}

/// The note list row containing a title, located via ancestor walk from
/// the title text node.
pub fn note_item_containing(title: &str) -> LocatorSet {
    LocatorSet::new(vec![
        Locator::xpath(format!(
            "//*[contains(text(), '{title}')]/ancestor::*[contains(@class, 'index-module_note_')][1]"
        )),
        Locator::xpath(format!(
            "//*[contains(text(), '{title}')]/ancestor::*[contains(@class, 'note-list-item')][1]"
        )),
    ])
}

/// Per-row overflow menu trigger, rendered on hover.
pub fn note_more_button() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::css("span[class*='index-module_moreBtn_']"),
        Locator::css("span[class*='moreBtn']"),
        Locator::css("span.ant-dropdown-trigger"),
        Locator::css("span.note-item-more-btn"),
        Locator::css("span[class*='more']"),
    ])
}

pub fn note_delete_item() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::xpath("//div[contains(@class, 'index-module_menuItem_')]//span[text()='删除']"),
        Locator::xpath("//div[contains(@class, 'menuItem')]//span[text()='删除']"),
        Locator::xpath("//div[contains(@class, 'ant-dropdown-menu-item')]//span[text()='删除']"),
        Locator::xpath("//span[text()='删除']"),
    ])
}

pub fn modal_confirm_button() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::xpath("//div[@class='ant-modal-confirm-btns']//button[.//span[text()='确 定']]"),
        Locator::xpath("//button[contains(@class, 'ant-btn-primary') and contains(., '确')]"),
        Locator::xpath("//div[contains(@class, 'modal-footer')]//button[contains(., '确认')]"),
        Locator::xpath(
            "//button[contains(@class, 'primary') and (contains(., '确定') or contains(., '确认'))]",
        ),
    ])
}

// ---- explore feed ----

pub fn explore_nav() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::xpath("//span[contains(@class, 'ant-menu-title-content') and contains(., '逛逛')]"),
        Locator::css("a[href='/dashboard/explore']"),
        Locator::xpath("//li[@title='逛逛']//a"),
    ])
}

pub fn feed_list_container() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::css("div[class*='HeadlineSelections-module_mainList_']"),
        Locator::css("div[class*='DocFeed-module_']"),
    ])
}

/// Article title links in the feed (use with `query_all`).
pub fn feed_title_link() -> Locator {
    Locator::css("a[class*='DocFeed-module_title_']")
}

/// Like controls on visible feed cards (use with `query_all`).
pub fn feed_like_control() -> Locator {
    Locator::css("div[class*='like-module_simplifyLike_']")
}

/// Author bylines in the feed (use with `query_all`).
pub fn feed_author_link() -> Locator {
    Locator::css("a[class^='Feed-module_uname_']")
}

pub fn article_body() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::css("div.yuque-doc-content"),
        Locator::css("h1"),
    ])
}

pub fn article_content() -> LocatorSet {
    LocatorSet::new(vec![Locator::css("div.yuque-doc-content")])
}

pub fn comment_input() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::css(r#"div.ne-engine.ne-typography-traditional[contenteditable="true"]"#),
        Locator::css(r#"div[contenteditable="true"][class*="ne-engine"]"#),
        Locator::css(r#"div[contenteditable="true"]"#),
        Locator::css(r#"textarea[placeholder*="评论"]"#),
    ])
}

pub fn reply_button() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::xpath("//button[contains(@class, 'ant-btn-primary') and .//span[text()='回复']]"),
        Locator::xpath("//button[.//span[text()='回复']]"),
    ])
}

// ---- knowledge base ----

pub fn first_book_link() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::css("div[class*='index-module_bookItem_'] a[class*='index-module_link_']"),
        Locator::css("div[class*='bookItem'] a"),
    ])
}

/// The "new" trigger inside a knowledge base; the creation menu renders
/// on hover, not on click.
pub fn book_add_trigger() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::css("svg[data-name='Add']"),
        Locator::css("svg.larkui-icon-add"),
        Locator::css("*[class*='actionItem'][class*='ReaderLayout-module']"),
        Locator::css("span[class*='actionItem']"),
        Locator::css("button[class*='add']"),
    ])
}

pub fn popover_menu() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::css("div.ant-popover"),
        Locator::css("div.larkui-popover-content"),
        Locator::css("div[class*='popover-content']"),
        Locator::css("div[class*='dropdown-menu']"),
        Locator::css("div[role='menu']"),
    ])
}

pub fn document_menu_item() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::xpath("//div[contains(@class, 'ant-popover-inner-content')]//div[text()='文档']"),
        Locator::xpath("//span[contains(text(), '文档')]"),
        Locator::xpath("//div[contains(text(), '文档')]"),
        Locator::xpath("//li[contains(text(), '文档')]"),
        Locator::css("span[title='文档']"),
    ])
}

pub fn doc_title_input() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::css(r#"textarea[data-testid="input"]"#),
        Locator::css(r#"div[data-testid="title-editor"] textarea"#),
        Locator::css(r#"textarea[placeholder*="标题"]"#),
        Locator::css(r#"input[placeholder*="标题"]"#),
        Locator::css("div.ne-title"),
    ])
}

pub fn doc_editor() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::css(r#"div.ne-engine[contenteditable="true"]"#),
        Locator::css(r#"div.ne-viewer-body[contenteditable="true"]"#),
        Locator::css(r#"div[role="textbox"]"#),
        Locator::css(r#"div[contenteditable="true"]"#),
    ])
}

pub fn doc_publish_button() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::css("button#lake-doc-publish-button"),
        Locator::css("button[data-testid='doc-header-publish-btn']"),
        Locator::xpath("//button[contains(., '发布')]"),
        Locator::xpath("//button[contains(., '更新')]"),
    ])
}

pub fn doc_edit_button() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::xpath("//button[contains(@class, 'ant-btn-primary')]//span[text()='编辑']"),
        Locator::xpath("//button//span[text()='编辑']"),
    ])
}

pub fn slash_command_input() -> LocatorSet {
    LocatorSet::new(vec![Locator::css("input.ne-ui-slash-command-input")])
}

pub fn file_input() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::css("input[type='file']"),
        Locator::css("input[accept*='image']"),
    ])
}

// ---- user profile ----

pub fn profile_container() -> LocatorSet {
    LocatorSet::new(vec![Locator::css(
        "div[class*='UserInfo-module_userWrapper_']",
    )])
}

/// Follow control, located by its stable text rather than the volatile
/// generated class alone.
pub fn follow_button() -> LocatorSet {
    LocatorSet::new(vec![
        Locator::xpath(
            "//button[contains(@class, 'UserInfo-module_followBtn_') and .//span[text()='关注']]",
        ),
        Locator::css("button[class*='UserInfo-module_followBtn_']"),
    ])
}

/// Any follow control, regardless of current label (for the flip wait).
pub fn follow_button_any() -> LocatorSet {
    LocatorSet::new(vec![Locator::xpath(
        "//button[contains(@class, 'UserInfo-module_followBtn_')]",
    )])
}

/// Label shown once the user is followed.
pub const FOLLOWED_LABEL: &str = "已关注";

/// Page-title heuristic inputs for the login probe.
pub const SITE_TITLE_MARK: &str = "语雀";
pub const LOGIN_TITLE_MARK: &str = "登录";
