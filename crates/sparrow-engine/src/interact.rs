//! Interaction execution with mechanism fallback chains.
//!
//! A logical action is attempted through an ordered list of mechanisms
//! with an observable check between attempts, so exactly one mechanism
//! takes effect. Scroll-into-view precedes every action because the
//! element may sit under a sticky header or off-screen after a lazy-load
//! pass. This layer never touches durable files; callers own bookkeeping.

use crate::backend::{Backend, BackendError, ElementHandle};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum InteractError {
    #[error("Unsupported target for {action}: expected {expected}, got {got}")]
    UnsupportedTarget {
        action: &'static str,
        expected: &'static str,
        got: String,
    },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// A logical action against one resolved element.
#[derive(Debug, Clone)]
pub enum Interaction<'a> {
    Click,
    Type(&'a str),
    Clear,
    Upload(&'a Path),
}

pub async fn perform<B: Backend + ?Sized>(
    backend: &mut B,
    el: ElementHandle,
    action: Interaction<'_>,
) -> Result<(), InteractError> {
    // On-screen position may be stale after scrolling or re-render.
    if let Err(e) = backend.scroll_into_view(el).await {
        tracing::debug!(error = %e, "scroll_into_view failed, continuing");
    }

    match action {
        Interaction::Click => click(backend, el).await,
        Interaction::Type(text) => type_text(backend, el, text).await,
        Interaction::Clear => Ok(backend.clear(el).await?),
        Interaction::Upload(path) => upload(backend, el, path).await,
    }
}

/// Native click first; scripted click only if the native one raised.
/// A native click that fired but had no visible effect is still a fired
/// click, so no second mechanism runs (double-submission hazard).
async fn click<B: Backend + ?Sized>(
    backend: &mut B,
    el: ElementHandle,
) -> Result<(), InteractError> {
    match backend.click_native(el).await {
        Ok(()) => Ok(()),
        Err(e) => {
            tracing::debug!(error = %e, "native click failed, falling back to scripted click");
            Ok(backend.click_scripted(el).await?)
        }
    }
}

/// Native key input with a post-condition check; scripted content
/// assignment when the editor swallowed the keystrokes silently.
async fn type_text<B: Backend + ?Sized>(
    backend: &mut B,
    el: ElementHandle,
    text: &str,
) -> Result<(), InteractError> {
    let typed = match backend.type_native(el, text).await {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "native typing failed");
            false
        }
    };

    if typed && post_condition_holds(backend, el, text).await {
        return Ok(());
    }

    tracing::debug!("typing post-condition not observed, assigning content from script");
    Ok(backend.set_text_scripted(el, text).await?)
}

/// The observable check between typing mechanisms: the element's rendered
/// content must reflect what was sent. Rich-text editors rewrap text, so
/// containment of the first line is accepted rather than equality.
async fn post_condition_holds<B: Backend + ?Sized>(
    backend: &mut B,
    el: ElementHandle,
    text: &str,
) -> bool {
    let probe = text.lines().next().unwrap_or(text);
    if probe.is_empty() {
        return true;
    }
    match backend.element_text(el).await {
        Ok(content) => content.contains(probe),
        Err(e) => {
            tracing::debug!(error = %e, "could not read element content for post-condition");
            false
        }
    }
}

/// File upload requires a real `<input type="file">`; there is no script
/// fallback that can populate one.
async fn upload<B: Backend + ?Sized>(
    backend: &mut B,
    el: ElementHandle,
    path: &Path,
) -> Result<(), InteractError> {
    let tag = backend.element_tag(el).await?;
    let input_type = backend
        .element_attr(el, "type")
        .await?
        .unwrap_or_default()
        .to_ascii_lowercase();

    if tag != "input" || input_type != "file" {
        return Err(InteractError::UnsupportedTarget {
            action: "upload",
            expected: "input[type=file]",
            got: if input_type.is_empty() {
                tag
            } else {
                format!("{tag}[type={input_type}]")
            },
        });
    }

    Ok(backend.upload_file(el, path).await?)
}
