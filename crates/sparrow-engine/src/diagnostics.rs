//! Best-effort failure snapshots.
//!
//! Written at scenario failure points so the operator can see what the
//! page looked like; never read back, and a snapshot failure must never
//! mask the error that triggered it.

use crate::backend::Backend;
use chrono::Local;
use std::path::Path;
use tracing::{info, warn};

/// Capture a screenshot tagged with a failure point. Errors are logged
/// and swallowed.
pub async fn capture<B: Backend + ?Sized>(backend: &mut B, dir: &Path, tag: &str) {
    let bytes = match backend.screenshot().await {
        Ok(b) => b,
        Err(e) => {
            warn!(tag, error = %e, "diagnostic screenshot failed");
            return;
        }
    };

    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "could not create screenshot directory");
        return;
    }

    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("{}_{stamp}.png", sanitize(tag)));
    match std::fs::write(&path, bytes) {
        Ok(()) => info!(path = %path.display(), "diagnostic screenshot saved"),
        Err(e) => warn!(path = %path.display(), error = %e, "could not write screenshot"),
    }
}

fn sanitize(tag: &str) -> String {
    tag.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::sanitize;

    #[test]
    fn sanitize_keeps_safe_chars() {
        assert_eq!(sanitize("note_delete-failed"), "note_delete-failed");
        assert_eq!(sanitize("a b/c"), "a_b_c");
    }
}
