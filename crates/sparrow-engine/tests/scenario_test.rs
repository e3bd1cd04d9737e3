mod common;

use async_trait::async_trait;
use common::{ClickEffect, MockBackend, Node, fast_config};
use sparrow_engine::commenter::{CommentError, CommentSource, NO_COMMENT};
use sparrow_engine::ledger::CommentLedger;
use sparrow_engine::scenario;
use sparrow_engine::store::{ArticleStore, TitleSnapshot};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Deterministic comment source that counts how often it is asked.
struct SpySource {
    calls: AtomicUsize,
    reply: &'static str,
}

impl SpySource {
    fn new(reply: &'static str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            reply,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommentSource for SpySource {
    async fn generate(&self, _title: &str, _excerpt: &str) -> Result<String, CommentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.to_string())
    }
}

fn explore_dom() -> Vec<Node> {
    vec![
        Node::new("逛逛"),
        Node::new("HeadlineSelections-module_mainList_"),
        Node::new("DocFeed-module_title_")
            .text("A")
            .attr("href", "/articles/a"),
        Node::new("DocFeed-module_title_").text("A"),
        Node::new("DocFeed-module_title_").text("B"),
        Node::new("Feed-module_uname_").text("作者甲"),
        Node::new("like-module_simplifyLike_"),
        Node::new("like-module_simplifyLike_"),
        Node::new("yuque-doc-content").text("这是一篇关于效率工具的文章正文。"),
        Node::new("ne-typography-traditional"),
        Node::new("回复"),
    ]
}

#[tokio::test(start_paused = true)]
async fn explore_dedupes_titles_and_comments_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(dir.path());
    let mut backend = MockBackend::with_nodes(explore_dom());
    let spy = SpySource::new("这篇文章对工具链的取舍讲得很细，让我想起自己迁移编辑器的经历。");

    scenario::explore::run(&mut backend, &config, Some(&spy))
        .await
        .unwrap();

    // ["A", "A", "B"] collapses to ["A", "B"], first-seen order kept.
    let titles = TitleSnapshot::new(&config.files.titles_file).read().unwrap();
    assert_eq!(titles, vec!["A".to_string(), "B".to_string()]);

    assert_eq!(spy.calls(), 1);
    let ledger = CommentLedger::new(&config.files.ledger_file);
    assert!(ledger.has("A").unwrap());

    let articles = ArticleStore::new(&config.files.articles_file).read().unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].author, "作者甲");
    assert_eq!(articles[0].title, "A");
    assert_eq!(articles[0].ai_comment, spy.reply);

    // The comment reached the input on the article page.
    assert!(
        backend
            .node_text("ne-typography-traditional")
            .unwrap()
            .contains(spy.reply)
    );
    assert_eq!(backend.open_tabs, vec!["https://www.yuque.com/articles/a"]);
    assert_eq!(backend.closed_tabs, 1);
    assert!(backend.scripted_clicks.len() >= 2, "both like controls clicked");
}

#[tokio::test(start_paused = true)]
async fn explore_skips_comment_when_ledger_already_has_the_title() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(dir.path());
    let ledger = CommentLedger::new(&config.files.ledger_file);
    ledger.record("A", "2026-01-01 00:00:00").unwrap();

    let mut backend = MockBackend::with_nodes(explore_dom());
    let spy = SpySource::new("不应该出现的评论");

    scenario::explore::run(&mut backend, &config, Some(&spy))
        .await
        .unwrap();

    assert_eq!(spy.calls(), 0, "the ledger gates generation, not just submission");
    assert!(backend.typed.is_empty(), "comment input never touched");
    assert_eq!(backend.node_text("ne-typography-traditional").unwrap(), "");
    assert_eq!(ledger.entries().unwrap().len(), 1, "no duplicate row");

    // The article is still harvested, with the placeholder marker.
    let articles = ArticleStore::new(&config.files.articles_file).read().unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].ai_comment, NO_COMMENT);
}

#[tokio::test(start_paused = true)]
async fn note_lifecycle_creates_verifies_and_deletes() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(dir.path());

    let mut backend = MockBackend::with_nodes(vec![
        Node::new("ne-engine"),
        Node::new("note-publish"),
        Node::new("moreBtn"),
        Node::new("删除"),
        Node::new("确 定"),
    ]);
    backend.clear_texts_on_refresh = true;
    // Publishing makes the note row appear; confirming the modal removes it.
    backend.on_click(
        "note-publish",
        ClickEffect::Add(Node::new("自动化测试笔记")),
    );
    backend.on_click("确 定", ClickEffect::Remove("自动化测试笔记".into()));

    scenario::notes::run(&mut backend, &config).await.unwrap();

    assert!(
        !backend.has_marker("自动化测试笔记"),
        "the note must be gone after the delete flow"
    );
    assert!(!backend.hovered.is_empty(), "delete goes through the hover menu");
    assert!(backend.refreshes >= 2, "both verifications happen on a fresh page");
}

#[tokio::test(start_paused = true)]
async fn note_lifecycle_fails_when_the_note_never_appears() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(dir.path());

    // Publish control present but clicking it has no effect.
    let mut backend =
        MockBackend::with_nodes(vec![Node::new("ne-engine"), Node::new("note-publish")]);
    backend.clear_texts_on_refresh = true;

    let err = scenario::notes::run(&mut backend, &config)
        .await
        .expect_err("creation must be verified, not assumed");
    assert!(err.to_string().contains("not found after publish"));
}

#[tokio::test(start_paused = true)]
async fn follow_waits_for_the_label_to_flip() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(dir.path());

    let mut backend = MockBackend::with_nodes(vec![
        Node::new("逛逛"),
        Node::new("HeadlineSelections-module_mainList_"),
        Node::new("Feed-module_uname_")
            .text("作者甲")
            .attr("href", "/u/jia"),
        Node::new("UserInfo-module_userWrapper_"),
        Node::new("UserInfo-module_followBtn_").text("关注"),
    ]);
    backend.on_click(
        "UserInfo-module_followBtn_",
        ClickEffect::SetText {
            marker: "UserInfo-module_followBtn_".into(),
            text: "已关注".into(),
        },
    );

    scenario::follow::run(&mut backend, &config).await.unwrap();

    assert_eq!(backend.open_tabs, vec!["https://www.yuque.com/u/jia"]);
    assert_eq!(backend.closed_tabs, 1);
    assert_eq!(
        backend.node_text("UserInfo-module_followBtn_").unwrap(),
        "已关注"
    );
}

#[tokio::test(start_paused = true)]
async fn follow_tolerates_an_already_followed_author() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(dir.path());

    // No follow control on the profile at all.
    let mut backend = MockBackend::with_nodes(vec![
        Node::new("逛逛"),
        Node::new("HeadlineSelections-module_mainList_"),
        Node::new("Feed-module_uname_")
            .text("作者甲")
            .attr("href", "/u/jia"),
        Node::new("UserInfo-module_userWrapper_"),
    ]);

    scenario::follow::run(&mut backend, &config)
        .await
        .expect("a missing follow control is not a failure");
    assert_eq!(backend.closed_tabs, 1, "the profile tab is still closed");
}

#[tokio::test(start_paused = true)]
async fn docs_authoring_uploads_image_and_republishes() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(dir.path());
    std::fs::write(&config.files.upload_image, b"\xff\xd8\xff\xe0fakejpeg").unwrap();

    let mut backend = MockBackend::with_nodes(vec![
        Node::new("index-module_bookItem_"),
        Node::new("data-name='Add'"),
        Node::new("larkui-popover-content"),
        Node::new("文档"),
        Node::new("data-testid=\"input\"").tag("textarea"),
        Node::new("ne-viewer-body"),
        Node::new("lake-doc-publish-button"),
        Node::new("编辑"),
        Node::new("ne-ui-slash-command-input").tag("input"),
        Node::new("input[type='file']").tag("input").attr("type", "file"),
        Node::new("ne-typography-traditional"),
        Node::new("回复"),
    ]);

    scenario::docs::run(&mut backend, &config).await.unwrap();

    assert_eq!(backend.uploads.len(), 1);
    assert_eq!(backend.uploads[0].1, config.files.upload_image);
    assert!(backend.pressed.iter().filter(|k| *k == "Enter").count() >= 2);

    // Publish, then update after the re-edit.
    let publish = backend.handle("lake-doc-publish-button").unwrap();
    assert_eq!(
        backend.native_clicks.iter().filter(|id| **id == publish.id).count(),
        2
    );

    // The title went in, and the fixed comment was left at the end.
    assert!(
        backend
            .node_text("data-testid=\"input\"")
            .unwrap()
            .contains("自动化测试文档")
    );
    assert!(
        backend
            .node_text("ne-typography-traditional")
            .unwrap()
            .contains("评论")
    );
}
