//! Chromium process lifecycle: launch, handler loop, dialog handling,
//! profile-directory management.

use chromiumoxide::cdp::browser_protocol::page::{
    EventJavascriptDialogOpening, HandleJavaScriptDialogParams,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum CdpError {
    #[error("browser config rejected: {0}")]
    Config(String),

    #[error("CDP failure: {0}")]
    Protocol(#[from] chromiumoxide::error::CdpError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("handler task failed: {0}")]
    Handler(#[from] tokio::task::JoinError),
}

pub struct CdpClient {
    pub browser: Browser,
    pub handler_task: JoinHandle<()>,
    pub page: Page,
    user_data_dir: Option<PathBuf>,
    cleanup_user_data_dir: bool,
}

impl CdpClient {
    pub async fn launch(visible: bool) -> Result<Self, CdpError> {
        let (user_data_dir, cleanup_user_data_dir) = resolve_user_data_dir()?;

        // no_sandbox: containers and CI lack the sandbox helper.
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(&user_data_dir);
        if visible {
            // The QR login challenge needs a window the operator can see.
            builder = builder.with_head();
        }
        if let Ok(chrome_bin) = std::env::var("CHROME_BIN") {
            info!(%chrome_bin, "using Chrome binary from CHROME_BIN");
            builder = builder.chrome_executable(chrome_bin);
        }
        info!(visible, profile = %user_data_dir.display(), "launching Chromium");

        let (browser, mut handler) =
            Browser::launch(builder.build().map_err(CdpError::Config)?).await?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    error!(error = %e, "browser handler error, continuing");
                }
            }
            debug!("browser handler drained");
        });

        let page = browser.new_page("about:blank").await?;
        spawn_dialog_autoaccept(&page).await?;

        Ok(Self {
            browser,
            handler_task,
            page,
            user_data_dir: Some(user_data_dir),
            cleanup_user_data_dir,
        })
    }

    pub async fn close(mut self) -> Result<(), CdpError> {
        self.browser.close().await?;
        self.handler_task.await?;

        if self.cleanup_user_data_dir
            && let Some(dir) = self.user_data_dir.take()
            && let Err(e) = std::fs::remove_dir_all(&dir)
        {
            debug!(dir = %dir.display(), error = %e, "could not remove profile dir");
        }
        Ok(())
    }
}

/// Delete confirms and the occasional login page raise JS dialogs; accept
/// them all so no scenario blocks on a prompt.
async fn spawn_dialog_autoaccept(page: &Page) -> Result<(), CdpError> {
    let mut dialogs = page.event_listener::<EventJavascriptDialogOpening>().await?;
    let page = page.clone();
    tokio::spawn(async move {
        while let Some(event) = dialogs.next().await {
            info!(message = %event.message, kind = ?event.r#type, "accepting JavaScript dialog");
            if let Err(e) = page.execute(HandleJavaScriptDialogParams::new(true)).await {
                error!(error = %e, "could not accept dialog");
            }
        }
    });
    Ok(())
}

/// `SPARROW_USER_DATA_DIR` pins a persistent profile; otherwise each run
/// gets a throwaway directory under the system temp dir, removed on close.
fn resolve_user_data_dir() -> Result<(PathBuf, bool), CdpError> {
    if let Ok(dir) = std::env::var("SPARROW_USER_DATA_DIR") {
        let path = PathBuf::from(dir);
        std::fs::create_dir_all(&path)?;
        info!(path = %path.display(), "using profile from SPARROW_USER_DATA_DIR");
        return Ok((path, false));
    }

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let unique = format!("sparrow-chromium-profile-{}-{}", std::process::id(), nanos);
    let path = std::env::temp_dir().join(unique);
    std::fs::create_dir_all(&path)?;
    info!(path = %path.display(), "using throwaway profile");
    Ok((path, true))
}
