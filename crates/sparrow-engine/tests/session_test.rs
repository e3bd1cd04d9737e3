mod common;

use common::{MockBackend, Node, cookie, fast_config};
use sparrow_engine::backend::Cookie;
use sparrow_engine::session::{SessionError, SessionGuard, SessionState};

#[tokio::test(start_paused = true)]
async fn stored_bundle_restores_without_touching_the_login_page() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(dir.path());
    let bundle = vec![cookie("yuque_ctoken", "abc")];
    std::fs::write(
        &config.files.cookie_file,
        serde_json::to_vec(&bundle).unwrap(),
    )
    .unwrap();

    let mut backend = MockBackend::new();
    let mut guard = SessionGuard::new(
        config.site.clone(),
        config.files.cookie_file.clone(),
        &config.timing,
    );

    guard.establish(&mut backend).await.unwrap();

    assert_eq!(guard.state(), SessionState::Active);
    assert_eq!(backend.applied_cookies.len(), 1);
    assert_eq!(backend.applied_cookies[0][0].name, "yuque_ctoken");
    assert_eq!(backend.refreshes, 1);
    assert!(
        !backend.navigations.contains(&config.site.login_url),
        "restore must win before the challenge is even offered"
    );
}

#[tokio::test(start_paused = true)]
async fn malformed_bundle_falls_back_to_the_challenge() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(dir.path());
    std::fs::write(&config.files.cookie_file, b"not json at all").unwrap();

    let mut backend = MockBackend::new();
    backend.title = "登录 · 语雀".to_string();
    let mut guard = SessionGuard::new(
        config.site.clone(),
        config.files.cookie_file.clone(),
        &config.timing,
    );

    let err = guard.establish(&mut backend).await.expect_err("nobody scans the QR");
    assert!(matches!(err, SessionError::LoginTimeout(_)));
    assert!(
        backend.navigations.contains(&config.site.login_url),
        "challenge path must have been entered"
    );
    assert!(backend.applied_cookies.is_empty(), "garbage is never applied");
}

#[tokio::test(start_paused = true)]
async fn challenge_timeout_leaves_no_token_behind() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(dir.path());

    let mut backend = MockBackend::new();
    let mut guard = SessionGuard::new(
        config.site.clone(),
        config.files.cookie_file.clone(),
        &config.timing,
    );

    let err = guard.establish(&mut backend).await.expect_err("probe never passes");
    assert!(matches!(err, SessionError::LoginTimeout(_)));
    assert!(
        !config.files.cookie_file.exists(),
        "a failed challenge must not persist a token"
    );
    assert_ne!(guard.state(), SessionState::Active);
}

#[tokio::test(start_paused = true)]
async fn completed_challenge_persists_the_cookie_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fast_config(dir.path());
    // Give the operator one probe round to "scan".
    config.timing.challenge_timeout_secs = 30;

    // The authenticated-only marker is present, so the first probe passes.
    let mut backend = MockBackend::with_nodes(vec![Node::new("larkui-avatar")]);
    backend.cookie_jar = vec![cookie("session", "s3cret")];

    let mut guard = SessionGuard::new(
        config.site.clone(),
        config.files.cookie_file.clone(),
        &config.timing,
    );
    guard.establish(&mut backend).await.unwrap();

    assert_eq!(guard.state(), SessionState::Active);
    let stored: Vec<Cookie> =
        serde_json::from_slice(&std::fs::read(&config.files.cookie_file).unwrap()).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].name, "session");
}

#[tokio::test(start_paused = true)]
async fn ensure_active_demotes_an_expired_session() {
    let dir = tempfile::tempdir().unwrap();
    let config = fast_config(dir.path());
    let bundle = vec![cookie("yuque_ctoken", "abc")];
    std::fs::write(
        &config.files.cookie_file,
        serde_json::to_vec(&bundle).unwrap(),
    )
    .unwrap();

    let mut backend = MockBackend::new();
    let mut guard = SessionGuard::new(
        config.site.clone(),
        config.files.cookie_file.clone(),
        &config.timing,
    );
    guard.establish(&mut backend).await.unwrap();

    // Simulate the site bouncing the session back to the login page.
    backend.url = config.site.login_url.clone();
    backend.title = "登录 · 语雀".to_string();

    let err = guard.ensure_active(&mut backend).await.expect_err("probe now fails");
    assert!(matches!(err, SessionError::Expired));
    assert_eq!(guard.state(), SessionState::Expired);
}
