use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::*;

const NOW: i64 = 1_700_000_000_000;

fn temp_path(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir()
        .join(format!("choufprice-session-{}-{n}", std::process::id()))
        .join(name)
}

fn user(id: &str) -> User {
    User {
        id: id.to_owned(),
        email: "karim@example.dz".to_owned(),
        name: "karim".to_owned(),
        is_anonymous: false,
        created_at: NOW,
    }
}

struct FakeAuth {
    fail: bool,
}

#[async_trait]
impl AuthBackend for FakeAuth {
    async fn login(&self, email: &str, _password: &str) -> Result<AuthSession, ApiError> {
        if self.fail {
            return Err(ApiError::Response { status: 401, body: "bad credentials".to_owned() });
        }
        let mut u = user("user-1");
        u.email = email.to_owned();
        Ok(AuthSession { user: u, token: Some("jwt-1".to_owned()) })
    }

    async fn register(&self, email: &str, _password: &str, name: &str) -> Result<AuthSession, ApiError> {
        let mut u = user("user-2");
        u.email = email.to_owned();
        u.name = name.to_owned();
        Ok(AuthSession { user: u, token: Some("jwt-2".to_owned()) })
    }

    async fn me(&self) -> Result<User, ApiError> {
        Ok(user("user-1"))
    }
}

#[test]
fn load_missing_file_is_empty_session() {
    let session = Session::load(&temp_path("missing.json")).expect("load");
    assert_eq!(session, Session::default());
    assert!(!session.is_authenticated());
}

#[test]
fn save_then_load_restores_session() {
    let path = temp_path("nested/session.json");
    let session = Session {
        user: Some(user("user-1")),
        token: Some("jwt".to_owned()),
        locale: Some(Locale::Ar),
        dismissed_alerts: ["seed-3".to_owned()].into(),
    };
    session.save(&path).expect("save");
    assert_eq!(Session::load(&path).expect("load"), session);

    Session::clear(&path).expect("clear");
    Session::clear(&path).expect("clear twice");
    assert_eq!(Session::load(&path).expect("load"), Session::default());
}

#[test]
fn load_rejects_corrupt_file() {
    let path = temp_path("corrupt.json");
    std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
    std::fs::write(&path, "{not json").expect("write");
    assert!(matches!(Session::load(&path), Err(SessionError::Json(_))));
}

#[test]
fn anonymous_login_uses_given_or_generated_name() {
    let mut session = Session::default();
    let named = session.login_anonymous(Some("Yacine"), NOW).clone();
    assert_eq!(named.id, format!("anon-{NOW}"));
    assert_eq!(named.name, "Yacine");
    assert!(named.is_anonymous);
    assert!(session.token().is_none());

    let generated = session.login_anonymous(Some("  "), NOW).clone();
    let suffix = generated.name.strip_prefix("Anonyme_").expect("prefix");
    assert!(suffix.parse::<u32>().expect("number") < 10_000);
}

#[test]
fn logout_keeps_locale() {
    let mut session = Session {
        user: Some(user("user-1")),
        token: Some("jwt".to_owned()),
        locale: Some(Locale::En),
        ..Session::default()
    };
    session.logout();
    assert!(session.user().is_none());
    assert!(session.token().is_none());
    assert_eq!(session.locale, Some(Locale::En));
}

#[tokio::test]
async fn login_applies_user_and_token() {
    let mut session = Session::default();
    let backend = FakeAuth { fail: false };
    let name = session.login(&backend, "karim@example.dz", "secret").await.expect("login").name.clone();
    assert_eq!(name, "karim");
    assert_eq!(session.token(), Some("jwt-1"));
    session.refresh_user(&backend).await.expect("me");
    assert_eq!(session.token(), Some("jwt-1"));
}

#[tokio::test]
async fn register_uses_submitted_name() {
    let mut session = Session::default();
    let backend = FakeAuth { fail: false };
    let registered = session.register(&backend, "amina@example.dz", "pw", "Amina").await.expect("register");
    assert_eq!(registered.name, "Amina");
    assert_eq!(session.token(), Some("jwt-2"));
}

#[tokio::test]
async fn failed_login_leaves_session_unchanged() {
    let mut session = Session::default();
    let err = session.login(&FakeAuth { fail: true }, "x@y.z", "bad").await.expect_err("fail");
    assert!(matches!(err, ApiError::Response { status: 401, .. }));
    assert_eq!(session, Session::default());
}
