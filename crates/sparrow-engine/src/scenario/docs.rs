//! Document authoring inside the first knowledge base: create a document
//! from the hover menu, publish, re-edit with a file upload, republish,
//! then leave one comment. There is no ledger gating here; every run
//! targets the document it just created.

use super::{ScenarioError, require, settle};
use crate::backend::Backend;
use crate::config::SparrowConfig;
use crate::interact::{self, InteractError, Interaction};
use crate::resolver::{self, ResolveOptions};
use crate::site;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

pub async fn run<B: Backend + ?Sized>(
    backend: &mut B,
    config: &SparrowConfig,
) -> Result<(), ScenarioError> {
    let shots = config.files.screenshot_dir.as_path();
    let timing = &config.timing;

    info!(url = %config.site.dashboard_url, "entering the first knowledge base");
    backend.navigate(&config.site.dashboard_url).await?;
    let book = require(
        backend,
        shots,
        "kb_book_missing",
        &site::first_book_link(),
        ResolveOptions::timeout_ms(timing.resolve_timeout_ms),
    )
    .await?;
    interact::perform(backend, book.element, Interaction::Click).await?;
    settle(timing.settle_ms).await;

    // The creation menu renders on hover, not on click.
    let trigger = require(
        backend,
        shots,
        "kb_add_trigger_missing",
        &site::book_add_trigger(),
        ResolveOptions::presence_ms(timing.resolve_timeout_ms),
    )
    .await?;
    backend.scroll_into_view(trigger.element).await?;
    backend.hover(trigger.element).await?;
    settle(1000).await;

    if resolver::resolve(
        backend,
        &site::popover_menu(),
        ResolveOptions::timeout_ms(timing.short_timeout_ms),
    )
    .await
    .is_err()
    {
        // A second hover usually lands when the first animation was missed.
        backend.hover(trigger.element).await?;
        settle(1000).await;
        require(
            backend,
            shots,
            "kb_popover_missing",
            &site::popover_menu(),
            ResolveOptions::timeout_ms(timing.short_timeout_ms),
        )
        .await?;
    }

    let doc_item = require(
        backend,
        shots,
        "kb_doc_item_missing",
        &site::document_menu_item(),
        ResolveOptions::timeout_ms(timing.short_timeout_ms),
    )
    .await?;
    interact::perform(backend, doc_item.element, Interaction::Click).await?;
    settle(timing.settle_ms).await;

    let doc_title = format!(
        "自动化测试文档 - {}",
        chrono::Local::now().timestamp()
    );
    let doc_body = format!("这是一篇由自动化流程创建的知识库文档。\n\n创建时间: {}", super::now_stamp());

    // Title field is optional across editor versions; without it the
    // first line of the body becomes the title.
    let title_input = resolver::resolve(
        backend,
        &site::doc_title_input(),
        ResolveOptions::timeout_ms(timing.short_timeout_ms),
    )
    .await
    .ok();
    let editor = require(
        backend,
        shots,
        "doc_editor_missing",
        &site::doc_editor(),
        ResolveOptions::timeout_ms(timing.resolve_timeout_ms),
    )
    .await?;

    match &title_input {
        Some(title_el) => {
            interact::perform(backend, title_el.element, Interaction::Click).await?;
            interact::perform(backend, title_el.element, Interaction::Type(&doc_title)).await?;
            interact::perform(backend, editor.element, Interaction::Click).await?;
            interact::perform(backend, editor.element, Interaction::Type(&doc_body)).await?;
        }
        None => {
            let full = format!("{doc_title}\n\n{doc_body}");
            interact::perform(backend, editor.element, Interaction::Click).await?;
            interact::perform(backend, editor.element, Interaction::Type(&full)).await?;
        }
    }
    info!(%doc_title, "document content entered");

    let publish = require(
        backend,
        shots,
        "doc_publish_missing",
        &site::doc_publish_button(),
        ResolveOptions::timeout_ms(timing.resolve_timeout_ms),
    )
    .await?;
    interact::perform(backend, publish.element, Interaction::Click).await?;

    // Layered verification: URL shape, then the title in the rendered page.
    if !publish_verified(backend, &doc_title, Duration::from_millis(timing.resolve_timeout_ms))
        .await
    {
        warn!("could not confirm the publish directly, continuing on the redirect");
    } else {
        info!(%doc_title, "document published");
    }

    // Re-enter edit mode and extend the document.
    let edit = require(
        backend,
        shots,
        "doc_edit_button_missing",
        &site::doc_edit_button(),
        ResolveOptions::timeout_ms(timing.resolve_timeout_ms),
    )
    .await?;
    interact::perform(backend, edit.element, Interaction::Click).await?;
    settle(timing.settle_ms).await;

    let editor = require(
        backend,
        shots,
        "doc_reedit_editor_missing",
        &site::doc_editor(),
        ResolveOptions::presence_ms(timing.resolve_timeout_ms),
    )
    .await?;
    interact::perform(backend, editor.element, Interaction::Click).await?;
    settle(1000).await;
    interact::perform(
        backend,
        editor.element,
        Interaction::Type("这是编辑模式下追加的内容，接下来测试图片上传。"),
    )
    .await?;

    // Slash command opens the upload dialog.
    backend.press_key("Enter").await?;
    settle(500).await;
    interact::perform(backend, editor.element, Interaction::Type("/tp")).await?;
    settle(1000).await;
    match resolver::resolve(
        backend,
        &site::slash_command_input(),
        ResolveOptions::presence_ms(timing.short_timeout_ms),
    )
    .await
    {
        Ok(slash) => {
            interact::perform(backend, slash.element, Interaction::Clear).await?;
            interact::perform(backend, slash.element, Interaction::Type("tp")).await?;
            backend.press_key("Enter").await?;
        }
        Err(_) => {
            backend.press_key("Enter").await?;
        }
    }
    settle(timing.settle_ms).await;

    upload_image(backend, config).await;

    // Republish with whatever label the button carries now.
    match resolver::resolve(
        backend,
        &site::doc_publish_button(),
        ResolveOptions::timeout_ms(timing.resolve_timeout_ms),
    )
    .await
    {
        Ok(update) => {
            interact::perform(backend, update.element, Interaction::Click).await?;
            settle(timing.settle_ms).await;
            info!("document updated");
        }
        Err(e) => warn!(error = %e, "update button not found, relying on autosave"),
    }

    leave_comment(backend, config).await;
    Ok(())
}

async fn publish_verified<B: Backend + ?Sized>(
    backend: &mut B,
    doc_title: &str,
    timeout: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(url) = backend.current_url().await
            && url.contains("/docs/")
        {
            return true;
        }
        if backend.page_contains(doc_title).await.unwrap_or(false) {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        settle(1000).await;
    }
}

/// Upload is best-effort: a missing dialog or a non-file target skips the
/// step instead of failing the scenario.
async fn upload_image<B: Backend + ?Sized>(backend: &mut B, config: &SparrowConfig) {
    let image = config.files.upload_image.as_path();
    if !image.exists() {
        warn!(path = %image.display(), "upload image not found, skipping upload");
        return;
    }
    let input = match resolver::resolve(
        backend,
        &site::file_input(),
        ResolveOptions::presence_ms(config.timing.short_timeout_ms),
    )
    .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, "no file input appeared, skipping upload");
            return;
        }
    };
    match interact::perform(backend, input.element, Interaction::Upload(image)).await {
        Ok(()) => {
            info!(path = %image.display(), "image uploaded");
        }
        Err(InteractError::UnsupportedTarget { got, .. }) => {
            warn!(%got, "upload target is not a file input, skipping upload");
        }
        Err(e) => warn!(error = %e, "image upload failed"),
    }
    settle(config.timing.settle_ms).await;
}

/// Fixed comment on the freshly created document; best-effort throughout.
async fn leave_comment<B: Backend + ?Sized>(backend: &mut B, config: &SparrowConfig) {
    let timing = &config.timing;
    if let Err(e) = backend.scroll_to_bottom().await {
        warn!(error = %e, "could not scroll to the comment area");
        return;
    }
    settle(1000).await;

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
            return;
        }
    };
    let text = "这是一条自动化流程留下的评论，用于验证评论功能。";
    if let Err(e) = interact::perform(backend, input.element, Interaction::Click).await {
        warn!(error = %e, "could not focus comment input");
        return;
    }
    if let Err(e) = interact::perform(backend, input.element, Interaction::Type(text)).await {
        warn!(error = %e, "could not type comment");
        return;
    }
    match resolver::resolve(
        backend,
        &site::reply_button(),
        ResolveOptions::timeout_ms(timing.short_timeout_ms),
    )
    .await
    {
        Ok(reply) => {
            if let Err(e) = interact::perform(backend, reply.element, Interaction::Click).await {
                warn!(error = %e, "could not click the reply button");
            } else {
                info!("document comment submitted");
            }
        }
        Err(e) => warn!(error = %e, "reply button not found"),
    }
}
