//! Session establishment and validity probing.
//!
//! The guard owns the cookie bundle and the decision of whether the
//! browsing context is authenticated. Establishment first tries to
//! restore a stored bundle; only when that fails does it fall back to the
//! interactive QR challenge, polling the probe until a bound. The guard
//! never heals an expired session on its own: scenarios surface the
//! failure and the operator re-runs.

use crate::backend::{Backend, BackendError, Cookie};
use crate::config::{SiteConfig, TimingConfig};
use crate::resolver::{self, ResolveOptions};
use crate::site;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoSession,
    Restoring,
    ChallengePending,
    Active,
    Expired,
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Login challenge not completed within {0:?}")]
    LoginTimeout(Duration),

    #[error("Session expired")]
    Expired,

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),
}

pub struct SessionGuard {
    state: SessionState,
    site: SiteConfig,
    token_path: PathBuf,
    challenge_timeout: Duration,
    probe_interval: Duration,
    probe_budget_ms: u64,
}

impl SessionGuard {
    pub fn new(site: SiteConfig, token_path: PathBuf, timing: &TimingConfig) -> Self {
        Self {
            state: SessionState::NoSession,
            site,
            token_path,
            challenge_timeout: Duration::from_secs(timing.challenge_timeout_secs),
            probe_interval: Duration::from_secs(timing.probe_interval_secs),
            probe_budget_ms: timing.short_timeout_ms,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Establish an authenticated session: restore-by-token first, else
    /// interactive challenge. On success the guard is `Active`.
    pub async fn establish<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<(), SessionError> {
        self.state = SessionState::Restoring;

        if self.try_restore(backend).await? && self.probe(backend).await? {
            info!("Session restored from stored cookies");
            self.state = SessionState::Active;
            return Ok(());
        }

        self.state = SessionState::ChallengePending;
        self.run_challenge(backend).await
    }

    /// Apply the stored cookie bundle, if any, and reload the landing page.
    async fn try_restore<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<bool, SessionError> {
        let bundle = match std::fs::read(&self.token_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No stored cookie bundle, manual login required");
                return Ok(false);
            }
            Err(e) => {
                warn!(path = %self.token_path.display(), error = %e, "failed to read cookie bundle");
                return Ok(false);
            }
        };

        let cookies: Vec<Cookie> = match serde_json::from_slice(&bundle) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "cookie bundle is malformed, ignoring it");
                return Ok(false);
            }
        };

        // The browser only accepts cookies for a domain it has visited.
        backend.navigate(&self.site.dashboard_url).await?;
        backend.set_cookies(cookies).await?;
        backend.refresh().await?;
        Ok(true)
    }

    /// Interactive QR challenge: block on the operator, polling the probe
    /// until it passes or the bound elapses.
    async fn run_challenge<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<(), SessionError> {
        backend.navigate(&self.site.login_url).await?;
        info!(
            "Scan the QR code in the browser to log in (waiting up to {:?})",
            self.challenge_timeout
        );

        let deadline = Instant::now() + self.challenge_timeout;
        loop {
            tokio::time::sleep(self.probe_interval).await;

            if self.probe(backend).await? {
                info!("Login challenge completed");
                self.capture_token(backend).await;
                self.state = SessionState::Active;
                return Ok(());
            }

            if Instant::now() >= deadline {
                warn!("Login challenge timed out");
                return Err(SessionError::LoginTimeout(self.challenge_timeout));
            }
        }
    }

    /// Persist the current cookie bundle. Failure to persist is logged but
    /// does not invalidate the freshly authenticated session.
    async fn capture_token<B: Backend + ?Sized>(&mut self, backend: &mut B) {
        let cookies = match backend.cookies().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "could not read cookies after login");
                return;
            }
        };
        match serde_json::to_vec(&cookies) {
            Ok(bytes) => {
                if let Err(e) = std::fs::write(&self.token_path, bytes) {
                    warn!(path = %self.token_path.display(), error = %e, "could not store cookie bundle");
                } else {
                    info!(path = %self.token_path.display(), "cookie bundle stored");
                }
            }
            Err(e) => warn!(error = %e, "could not serialize cookie bundle"),
        }
    }

    /// Layered validity probe. No single signal survives every frontend
    /// release, so the layers are tried in order of cheapness: URL, then
    /// an authenticated-only UI fragment, then the page title.
    pub async fn probe<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<bool, SessionError> {
        let url = backend.current_url().await?;
        if url.contains("dashboard") {
            debug!("probe passed on URL layer");
            return Ok(true);
        }

        let markers = site::authenticated_markers();
        if resolver::resolve(
            backend,
            &markers,
            ResolveOptions::timeout_ms(self.probe_budget_ms),
        )
        .await
        .is_ok()
        {
            debug!("probe passed on UI-fragment layer");
            return Ok(true);
        }

        let title = backend.page_title().await?;
        if title.contains(site::SITE_TITLE_MARK) && !title.contains(site::LOGIN_TITLE_MARK) {
            debug!("probe passed on title layer");
            return Ok(true);
        }

        debug!(url, title, "probe failed on all layers");
        Ok(false)
    }

    /// Probe, demoting the guard to `Expired` on failure. The dispatcher
    /// calls this before each privileged task; recovery is the
    /// operator's job.
    pub async fn ensure_active<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
    ) -> Result<(), SessionError> {
        if self.state != SessionState::Active {
            return Err(SessionError::Expired);
        }
        if self.probe(backend).await? {
            Ok(())
        } else {
            self.state = SessionState::Expired;
            Err(SessionError::Expired)
        }
    }
}
