//! User follow: open the first author profile from the explore feed and
//! follow them, verifying the control label flips.

use super::{ScenarioError, absolutize, require, settle, verification_failed, wait_for_text};
use crate::backend::Backend;
use crate::config::SparrowConfig;
use crate::diagnostics;
use crate::interact::{self, Interaction};
use crate::resolver::{self, ResolveOptions};
use crate::site;
use std::time::Duration;
use tracing::{info, warn};

pub async fn run<B: Backend + ?Sized>(
    backend: &mut B,
    config: &SparrowConfig,
) -> Result<(), ScenarioError> {
    let shots = config.files.screenshot_dir.as_path();
    let timing = &config.timing;

    info!("navigating to the explore feed");
    backend.navigate(&config.site.dashboard_url).await?;
    let nav = require(
        backend,
        shots,
        "follow_explore_nav_missing",
        &site::explore_nav(),
        ResolveOptions::timeout_ms(timing.resolve_timeout_ms),
    )
    .await?;
    interact::perform(backend, nav.element, Interaction::Click).await?;
    require(
        backend,
        shots,
        "follow_feed_missing",
        &site::feed_list_container(),
        ResolveOptions::presence_ms(timing.resolve_timeout_ms),
    )
    .await?;

    for _ in 0..2 {
        backend.scroll_to_bottom().await?;
        settle(timing.settle_ms).await;
    }
    backend.scroll_to_top().await?;
    settle(1000).await;

    let authors = backend.query_all(&site::feed_author_link()).await?;
    let Some(&author_el) = authors.first() else {
        return Err(verification_failed(
            backend,
            shots,
            "follow_no_authors",
            "no author bylines visible in the feed",
        )
        .await);
    };
    let username = backend.element_text(author_el).await?.trim().to_string();
    let Some(href) = backend.element_attr(author_el, "href").await? else {
        return Err(verification_failed(
            backend,
            shots,
            "follow_author_without_href",
            format!("author '{username}' has no profile link"),
        )
        .await);
    };
    let profile_url = absolutize(backend, &href).await?;
    info!(%username, url = %profile_url, "opening profile");

    backend.open_tab(&profile_url).await?;
    let result = follow_on_profile(backend, config, &username).await;
    if let Err(e) = backend.close_tab().await {
        warn!(error = %e, "could not close profile tab");
    }
    result
}

async fn follow_on_profile<B: Backend + ?Sized>(
    backend: &mut B,
    config: &SparrowConfig,
    username: &str,
) -> Result<(), ScenarioError> {
    let shots = config.files.screenshot_dir.as_path();
    let timing = &config.timing;

    require(
        backend,
        shots,
        "follow_profile_missing",
        &site::profile_container(),
        ResolveOptions::presence_ms(timing.article_timeout_ms),
    )
    .await?;

    // The control is found by its stable text; the generated class alone
    // is not trusted. Absence usually means the user is already followed.
    let follow = match resolver::resolve(
        backend,
        &site::follow_button(),
        ResolveOptions::timeout_ms(timing.resolve_timeout_ms),
    )
    .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!(%username, error = %e, "follow control not found, possibly already followed");
            diagnostics::capture(backend, shots, "follow_button_missing").await;
            return Ok(());
        }
    };

    interact::perform(backend, follow.element, Interaction::Click).await?;
    info!(%username, "follow clicked, waiting for the label to flip");

    let flipped = wait_for_text(
        backend,
        &site::follow_button_any(),
        site::FOLLOWED_LABEL,
        Duration::from_secs(10),
    )
    .await?;
    if !flipped {
        return Err(verification_failed(
            backend,
            shots,
            "follow_not_confirmed",
            format!("follow control never showed '{}'", site::FOLLOWED_LABEL),
        )
        .await);
    }

    info!(%username, "now following");
    Ok(())
}
