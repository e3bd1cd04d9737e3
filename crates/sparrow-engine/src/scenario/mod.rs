//! End-to-end automation scenarios.
//!
//! Each scenario is a fixed sequence of resolver and executor calls with
//! settle pauses where the frontend animates. Structural failures capture
//! a diagnostic snapshot tagged with the failure point before they
//! propagate; per-item best-effort steps log and move on. Durable state
//! (ledger, cookie bundle) stays consistent on abort; partial browser
//! effects are not rolled back.

pub mod docs;
pub mod explore;
pub mod follow;
pub mod notes;

use crate::backend::{Backend, BackendError};
use crate::commenter::CommentError;
use crate::config::SparrowConfig;
use crate::diagnostics;
use crate::interact::InteractError;
use crate::ledger::CommentLedger;
use crate::resolver::{self, ResolveError, ResolveOptions, Resolved};
use crate::session::SessionError;
use crate::store::StoreError;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

#[derive(Error, Debug)]
pub enum ScenarioError {
    #[error("Element resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    #[error("Interaction failed: {0}")]
    Interact(#[from] InteractError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Verification failed: {0}")]
    VerificationFailed(String),

    #[error("Comment generation failed: {0}")]
    Collaborator(#[from] CommentError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Fixed pause for animations and re-renders. Not a synchronization
/// primitive; condition waits live in the resolver.
pub(crate) async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Resolve a required element, snapshotting on failure before bubbling.
pub(crate) async fn require<B: Backend + ?Sized>(
    backend: &mut B,
    shots: &Path,
    tag: &str,
    set: &crate::locator::LocatorSet,
    opts: ResolveOptions,
) -> Result<Resolved, ScenarioError> {
    match resolver::resolve(backend, set, opts).await {
        Ok(resolved) => Ok(resolved),
        Err(e) => {
            diagnostics::capture(backend, shots, tag).await;
            Err(e.into())
        }
    }
}

/// Fail a required assertion, snapshotting first.
pub(crate) async fn verification_failed<B: Backend + ?Sized>(
    backend: &mut B,
    shots: &Path,
    tag: &str,
    message: impl Into<String>,
) -> ScenarioError {
    diagnostics::capture(backend, shots, tag).await;
    ScenarioError::VerificationFailed(message.into())
}

/// Wait until the element behind a locator set carries the given text.
pub(crate) async fn wait_for_text<B: Backend + ?Sized>(
    backend: &mut B,
    set: &crate::locator::LocatorSet,
    needle: &str,
    timeout: Duration,
) -> Result<bool, ScenarioError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Ok(resolved) =
            resolver::resolve(backend, set, ResolveOptions::presence_ms(500)).await
            && let Ok(text) = backend.element_text(resolved.element).await
            && text.contains(needle)
        {
            return Ok(true);
        }
        if Instant::now() >= deadline {
            return Ok(false);
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
}

/// Resolve a possibly relative href against the current page URL.
pub(crate) async fn absolutize<B: Backend + ?Sized>(
    backend: &mut B,
    href: &str,
) -> Result<String, ScenarioError> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Ok(href.to_string());
    }
    let base = backend.current_url().await?;
    match url::Url::parse(&base).and_then(|b| b.join(href)) {
        Ok(joined) => Ok(joined.to_string()),
        Err(e) => {
            tracing::warn!(error = %e, href, "could not join href, using it verbatim");
            Ok(href.to_string())
        }
    }
}

/// Ledger handle for a config, shared by scenarios and the summary view.
pub(crate) fn ledger_for(config: &SparrowConfig) -> CommentLedger {
    CommentLedger::new(&config.files.ledger_file)
}

/// Timestamp format shared by the ledger and generated titles.
pub(crate) fn now_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
