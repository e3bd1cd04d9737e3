//! Selector resolution over a locator priority list.
//!
//! Each candidate gets an equal slice of the total timeout and is polled
//! for presence (and optionally interactability) within that slice. The
//! list is a priority order, not a race: once a candidate's slice is
//! spent the resolver moves on and never backtracks. One call is one
//! pass; callers that want retry-after-failure compose multiple calls.

use crate::backend::{Backend, BackendError, ElementHandle};
use crate::locator::LocatorSet;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

/// Poll cadence within a candidate's slice.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("No element matched any of {} candidates: {attempted:?}", attempted.len())]
    NotFound { attempted: Vec<String> },

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

/// Element found by resolution, plus which candidate matched it.
#[derive(Debug, Clone, Copy)]
pub struct Resolved {
    pub element: ElementHandle,
    /// Index into the locator set, for diagnostics.
    pub candidate_index: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions {
    /// Total budget across all candidates.
    pub timeout: Duration,
    /// Also require the element to be visible and enabled.
    pub require_visible: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(20),
            require_visible: true,
        }
    }
}

impl ResolveOptions {
    pub fn timeout_ms(timeout_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            ..Self::default()
        }
    }

    pub fn presence_ms(timeout_ms: u64) -> Self {
        Self {
            timeout: Duration::from_millis(timeout_ms),
            require_visible: false,
        }
    }
}

/// Resolve the first satisfying candidate of a locator set.
///
/// Backend failures while probing one candidate (bad selector syntax on
/// an older markup variant, stale queries mid-render) count as a miss for
/// that candidate rather than aborting the whole set.
pub async fn resolve<B: Backend + ?Sized>(
    backend: &mut B,
    set: &LocatorSet,
    opts: ResolveOptions,
) -> Result<Resolved, ResolveError> {
    if set.is_empty() {
        return Err(ResolveError::NotFound { attempted: vec![] });
    }

    let slice = opts.timeout / set.len() as u32;

    for (index, locator) in set.candidates().iter().enumerate() {
        let deadline = Instant::now() + slice;
        loop {
            match probe_once(backend, locator, opts.require_visible).await {
                Ok(Some(element)) => {
                    tracing::debug!(candidate = %locator, index, "locator matched");
                    return Ok(Resolved {
                        element,
                        candidate_index: index,
                    });
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(candidate = %locator, error = %e, "candidate probe failed");
                    break;
                }
            }

            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let remaining = deadline - now;
            tokio::time::sleep(POLL_INTERVAL.min(remaining)).await;
        }
    }

    Err(ResolveError::NotFound {
        attempted: set.descriptions(),
    })
}

async fn probe_once<B: Backend + ?Sized>(
    backend: &mut B,
    locator: &crate::locator::Locator,
    require_visible: bool,
) -> Result<Option<ElementHandle>, BackendError> {
    let Some(element) = backend.query(locator).await? else {
        return Ok(None);
    };
    if !require_visible {
        return Ok(Some(element));
    }
    let state = backend.element_state(element).await?;
    if state.visible && state.enabled {
        Ok(Some(element))
    } else {
        Ok(None)
    }
}
