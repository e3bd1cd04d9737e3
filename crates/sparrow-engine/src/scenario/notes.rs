//! Note lifecycle: create a uniquely titled note, verify it appeared,
//! delete it through the hover menu, verify it is gone.

use super::{ScenarioError, require, settle, verification_failed};
use crate::backend::Backend;
use crate::config::SparrowConfig;
use crate::interact::{self, Interaction};
use crate::resolver::{self, ResolveOptions};
use crate::site;
use tracing::{info, warn};

pub async fn run<B: Backend + ?Sized>(
    backend: &mut B,
    config: &SparrowConfig,
) -> Result<(), ScenarioError> {
    let shots = config.files.screenshot_dir.as_path();
    let timing = &config.timing;

    info!(url = %config.site.notes_url, "opening notes page");
    backend.navigate(&config.site.notes_url).await?;
    settle(timing.settle_ms).await;

    // Timestamp suffix keeps the title collision-free within a run.
    let title = format!(
        "自动化测试笔记 - {}",
        chrono::Local::now().timestamp()
    );
    let body = "这是由自动化流程创建的笔记内容。";
    info!(%title, "creating note");

    let editor = require(
        backend,
        shots,
        "note_editor_missing",
        &site::note_editor(),
        ResolveOptions::timeout_ms(timing.resolve_timeout_ms),
    )
    .await?;
    interact::perform(backend, editor.element, Interaction::Click).await?;
    interact::perform(
        backend,
        editor.element,
        Interaction::Type(&format!("{title}\n\n{body}")),
    )
    .await?;
    settle(1000).await;

    // Some deployments autosave without an explicit publish control.
    match resolver::resolve(
        backend,
        &site::note_publish_button(),
        ResolveOptions::timeout_ms(timing.short_timeout_ms),
    )
    .await
    {
        Ok(publish) => {
            interact::perform(backend, publish.element, Interaction::Click).await?;
            settle(timing.settle_ms).await;
        }
        Err(e) => {
            warn!(error = %e, "no publish button found, assuming autosave");
            settle(timing.settle_ms).await;
        }
    }

    backend.refresh().await?;
    settle(timing.settle_ms).await;

    // Presence check: targeted element search, then raw page text.
    let created = resolver::resolve(
        backend,
        &site::any_text(&title),
        ResolveOptions::presence_ms(timing.short_timeout_ms),
    )
    .await
    .is_ok()
        || backend.page_contains(&title).await.unwrap_or(false);
    if !created {
        return Err(verification_failed(
            backend,
            shots,
            "note_create_not_verified",
            format!("note '{title}' not found after publish"),
        )
        .await);
    }
    info!(%title, "note created");

    // Delete path: hover the row to reveal the overflow menu.
    let row = require(
        backend,
        shots,
        "note_row_missing",
        &site::note_item_containing(&title),
        ResolveOptions::presence_ms(timing.resolve_timeout_ms),
    )
    .await?;
    backend.scroll_into_view(row.element).await?;
    settle(1000).await;
    backend.hover(row.element).await?;
    settle(1000).await;

    let more = match resolver::resolve(
        backend,
        &site::note_more_button(),
        ResolveOptions::timeout_ms(timing.short_timeout_ms),
    )
    .await
    {
        Ok(r) => r,
        Err(_) => {
            // First hover sometimes does not trigger the menu.
            backend.hover(row.element).await?;
            settle(1000).await;
            require(
                backend,
                shots,
                "note_more_button_missing",
                &site::note_more_button(),
                ResolveOptions::timeout_ms(timing.short_timeout_ms),
            )
            .await?
        }
    };
    // Scripted click dodges overlay interception on the hover menu.
    backend.click_scripted(more.element).await?;
    settle(1000).await;

    let delete = require(
        backend,
        shots,
        "note_delete_item_missing",
        &site::note_delete_item(),
        ResolveOptions::timeout_ms(timing.short_timeout_ms),
    )
    .await?;
    backend.click_scripted(delete.element).await?;
    settle(1000).await;

    let confirm = require(
        backend,
        shots,
        "note_confirm_missing",
        &site::modal_confirm_button(),
        ResolveOptions::timeout_ms(timing.short_timeout_ms),
    )
    .await?;
    interact::perform(backend, confirm.element, Interaction::Click).await?;
    settle(timing.settle_ms).await;

    backend.refresh().await?;
    settle(timing.settle_ms).await;

    // Negative lookup: the title must be gone from the feed.
    if resolver::resolve(
        backend,
        &site::any_text(&title),
        ResolveOptions::presence_ms(timing.short_timeout_ms),
    )
    .await
    .is_ok()
    {
        return Err(verification_failed(
            backend,
            shots,
            "note_delete_not_verified",
            format!("note '{title}' still present after delete"),
        )
        .await);
    }

    info!(%title, "note deleted and absence verified");
    Ok(())
}
