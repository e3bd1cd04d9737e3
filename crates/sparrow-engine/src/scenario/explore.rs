//! Feed harvest and engagement: scrape the explore feed, snapshot the
//! titles, like what is visible, then open the first article and comment
//! on it exactly once across all runs.

use super::{
    ScenarioError, absolutize, ledger_for, now_stamp, require, settle, verification_failed,
};
use crate::backend::Backend;
use crate::commenter::{CommentClient, CommentSource, NO_COMMENT};
use crate::config::SparrowConfig;
use crate::diagnostics;
use crate::interact::{self, Interaction};
use crate::resolver::{self, ResolveOptions};
use crate::site;
use crate::store::{ArticleRecord, ArticleStore, TitleSnapshot};
use tracing::{info, warn};

/// Bound on the load-more scroll loop inside an article.
const MAX_CONTENT_SCROLLS: u32 = 20;

pub async fn run<B: Backend + ?Sized>(
    backend: &mut B,
    config: &SparrowConfig,
    commenter: Option<&dyn CommentSource>,
) -> Result<(), ScenarioError> {
    let shots = config.files.screenshot_dir.as_path();
    let timing = &config.timing;

    info!("navigating to the explore feed");
    backend.navigate(&config.site.dashboard_url).await?;
    let nav = require(
        backend,
        shots,
        "explore_nav_missing",
        &site::explore_nav(),
        ResolveOptions::timeout_ms(timing.resolve_timeout_ms),
    )
    .await?;
    interact::perform(backend, nav.element, Interaction::Click).await?;

    require(
        backend,
        shots,
        "explore_feed_missing",
        &site::feed_list_container(),
        ResolveOptions::presence_ms(timing.resolve_timeout_ms),
    )
    .await?;

    // Lazy-load passes.
    for round in 0..timing.scroll_rounds {
        backend.scroll_to_bottom().await?;
        info!(round = round + 1, total = timing.scroll_rounds, "scrolled feed");
        settle(timing.settle_ms).await;
    }

    // Harvest titles, deduplicated in first-seen order.
    let mut titles: Vec<String> = Vec::new();
    for handle in backend.query_all(&site::feed_title_link()).await? {
        let text = backend.element_text(handle).await.unwrap_or_default();
        let text = text.trim().to_string();
        if !text.is_empty() && !titles.contains(&text) {
            titles.push(text);
        }
    }
    if titles.is_empty() {
        warn!("no titles harvested from the feed");
        diagnostics::capture(backend, shots, "explore_no_titles").await;
    } else {
        info!(count = titles.len(), "titles harvested");
        // A snapshot write failure must not abort the browsing flow.
        if let Err(e) = TitleSnapshot::new(&config.files.titles_file).write(&titles) {
            warn!(error = %e, "could not write title snapshot");
        }
    }

    // Best-effort likes; individual failures are logged, never fatal.
    backend.scroll_to_top().await?;
    settle(1000).await;
    let mut liked = 0usize;
    for handle in backend.query_all(&site::feed_like_control()).await? {
        match backend.click_scripted(handle).await {
            Ok(()) => liked += 1,
            Err(e) => warn!(error = %e, "like click failed"),
        }
        settle(200).await;
    }
    info!(liked, "like pass finished");

    // First article: author + title from the top of the feed.
    let authors = backend.query_all(&site::feed_author_link()).await?;
    let title_links = backend.query_all(&site::feed_title_link()).await?;
    let (Some(&author_el), Some(&title_el)) = (authors.first(), title_links.first()) else {
        return Err(verification_failed(
            backend,
            shots,
            "explore_no_articles",
            "no articles visible in the feed",
        )
        .await);
    };
    let author = backend.element_text(author_el).await?.trim().to_string();
    let title = backend.element_text(title_el).await?.trim().to_string();
    let Some(href) = backend.element_attr(title_el, "href").await? else {
        return Err(verification_failed(
            backend,
            shots,
            "explore_title_without_href",
            format!("article '{title}' has no link target"),
        )
        .await);
    };
    let article_url = absolutize(backend, &href).await?;
    info!(%title, %author, url = %article_url, "opening first article");

    backend.open_tab(&article_url).await?;
    let result = harvest_article(backend, config, commenter, &author, &title).await;
    if let Err(e) = backend.close_tab().await {
        warn!(error = %e, "could not close article tab");
    }
    result
}

/// Inside the article tab: extract the body, comment if the ledger does
/// not already gate this title, persist the detail row.
async fn harvest_article<B: Backend + ?Sized>(
    backend: &mut B,
    config: &SparrowConfig,
    commenter: Option<&dyn CommentSource>,
    author: &str,
    title: &str,
) -> Result<(), ScenarioError> {
    let shots = config.files.screenshot_dir.as_path();
    let timing = &config.timing;

    // Share links can take a long path to the document view.
    require(
        backend,
        shots,
        "article_load_timeout",
        &site::article_body(),
        ResolveOptions::presence_ms(timing.article_timeout_ms),
    )
    .await?;

    // Scroll until the document height stops growing.
    let mut last_height = backend.page_height().await?;
    for _ in 0..MAX_CONTENT_SCROLLS {
        backend.scroll_to_bottom().await?;
        settle(timing.settle_ms).await;
        let height = backend.page_height().await?;
        if (height - last_height).abs() < f64::EPSILON {
            break;
        }
        last_height = height;
    }

    let content_el = require(
        backend,
        shots,
        "article_content_missing",
        &site::article_content(),
        ResolveOptions::presence_ms(timing.short_timeout_ms),
    )
    .await?;
    let content = backend.element_text(content_el.element).await?;
    info!(chars = content.chars().count(), "article body extracted");

    let ledger = ledger_for(config);
    let mut ai_comment = NO_COMMENT.to_string();

    // The ledger is consulted, not the page: visible comment state is not
    // trustworthy across renders. An unreadable ledger skips commenting
    // rather than risking a double post.
    match ledger.has(title) {
        Ok(true) => info!(%title, "already commented, skipping"),
        Err(e) => warn!(error = %e, "ledger unreadable, skipping comment step"),
        Ok(false) => {
            if let Some(generated) = generate_comment(commenter, title, &content).await {
                ai_comment = generated;
                if submit_comment(backend, config, &ai_comment).await {
                    match ledger.record(title, &now_stamp()) {
                        Ok(()) => info!(%title, "comment recorded in ledger"),
                        Err(e) => warn!(error = %e, "could not record comment in ledger"),
                    }
                }
            }
        }
    }

    // Detail row is appended whether or not a comment went out.
    let record = ArticleRecord {
        author: author.to_string(),
        title: title.to_string(),
        content,
        ai_comment,
    };
    if let Err(e) = ArticleStore::new(&config.files.articles_file).append(&record) {
        warn!(error = %e, "could not append article detail");
    }
    Ok(())
}

async fn generate_comment(
    commenter: Option<&dyn CommentSource>,
    title: &str,
    content: &str,
) -> Option<String> {
    let Some(source) = commenter else {
        warn!("no comment source configured, skipping comment");
        return None;
    };
    match source
        .generate(title, &CommentClient::excerpt(content, 500))
        .await
    {
        Ok(comment) => Some(comment),
        Err(e) => {
            warn!(error = %e, "comment generation failed");
            None
        }
    }
}

/// Type and submit the comment. Best-effort: any missing control logs a
/// warning and reports the comment as not submitted.
async fn submit_comment<B: Backend + ?Sized>(
    backend: &mut B,
    config: &SparrowConfig,
    comment: &str,
) -> bool {
    let timing = &config.timing;
    if let Err(e) = backend.scroll_to_bottom().await {
        warn!(error = %e, "could not scroll to the comment area");
        return false;
    }
    settle(timing.settle_ms).await;

    let input = match resolver::resolve(
        backend,
        &site::comment_input(),
        ResolveOptions::presence_ms(timing.short_timeout_ms),
    )
    .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "comment input not found, skipping comment");
            return false;
        }
    };
    if let Err(e) = interact::perform(backend, input.element, Interaction::Click).await {
        warn!(error = %e, "could not focus comment input");
        return false;
    }
    if let Err(e) = interact::perform(backend, input.element, Interaction::Type(comment)).await {
        warn!(error = %e, "could not type comment");
        return false;
    }
    settle(1000).await;

    let reply = match resolver::resolve(
        backend,
        &site::reply_button(),
        ResolveOptions::timeout_ms(timing.short_timeout_ms),
    )
    .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "reply button not found, comment left unsubmitted");
            return false;
        }
    };
    if let Err(e) = interact::perform(backend, reply.element, Interaction::Click).await {
        warn!(error = %e, "could not click the reply button");
        return false;
    }
    settle(timing.settle_ms).await;
    info!("comment submitted");
    true
}
