#![allow(dead_code)]

use agora::{
    config::session::SessionConfig,
    migration::Migrator,
    services::{
        email::{EmailService, OutboxMailer},
        upload::UploadConfig,
    },
    AppContext,
};
use reqwest::{header, redirect::Policy, Client, Response};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Once,
};

static INIT: Once = Once::new();
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub const PASSWORD: &str = "test_password_123";

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    pub outbox: OutboxMailer,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();

    let database_url = std::env::var("TEST_DATABASE_URL").unwrap_or_else(|_| {
        let path = std::env::temp_dir().join(format!("agora-test-{}.db", uuid::Uuid::new_v4()));
        format!("sqlite://{}?mode=rwc", path.display())
    });

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    if std::env::var("TEST_DATABASE_URL").is_ok() {
        cleanup_tables(&db).await;
    }

    let outbox = OutboxMailer::new();
    let email_service = EmailService::new(
        Arc::new(outbox.clone()),
        "Forum <noreply@example.com>".to_string(),
        "http://forum.test".to_string(),
    );
    let upload_config = UploadConfig {
        upload_dir: std::env::temp_dir().join(format!("agora-uploads-{}", uuid::Uuid::new_v4())),
    };

    let app = agora::create_app(AppContext {
        db: db.clone(),
        email_service,
        session_config: SessionConfig::default(),
        upload_config,
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("Failed to build HTTP client");

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client,
        outbox,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let backend = db.get_database_backend();
    for table in ["sessions", "comments", "topics", "users"] {
        let _ = db
            .execute(Statement::from_string(
                backend,
                format!("DELETE FROM {table}"),
            ))
            .await;
    }
}

pub fn unique_email(prefix: &str) -> String {
    let n = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{prefix}_{n}_{}@test.com", std::process::id())
}

pub fn location(resp: &Response) -> &str {
    resp.headers()
        .get(header::LOCATION)
        .expect("response has no Location header")
        .to_str()
        .unwrap()
}

/// Value of the cookie `name` set by `resp`, if any.
pub fn set_cookie(resp: &Response, name: &str) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|c| {
            let first = c.split(';').next()?;
            let (key, value) = first.split_once('=')?;
            (key == name).then(|| value.to_string())
        })
}

pub async fn register(app: &TestApp, email: &str, password: &str) -> Response {
    app.client
        .post(app.url("/auth/register"))
        .form(&[
            ("username", email),
            ("password", password),
            ("confirm_password", password),
        ])
        .send()
        .await
        .expect("Failed to send register request")
}

pub async fn login(app: &TestApp, email: &str, password: &str) -> Response {
    app.client
        .post(app.url("/auth/login"))
        .form(&[("username", email), ("password", password)])
        .send()
        .await
        .expect("Failed to send login request")
}

/// Register a fresh account and log in. Returns (email, session token).
pub async fn create_test_user(app: &TestApp, prefix: &str) -> (String, String) {
    let email = unique_email(prefix);

    let resp = register(app, &email, PASSWORD).await;
    assert_eq!(resp.status(), 303, "register failed for {email}");

    let resp = login(app, &email, PASSWORD).await;
    assert_eq!(resp.status(), 303, "login failed for {email}");
    let token = set_cookie(&resp, "session_id").expect("login did not set a session cookie");

    (email, token)
}

/// Create a topic as the holder of `token` and return its id.
pub async fn create_topic(app: &TestApp, token: &str, title: &str, message: &str) -> i32 {
    let resp = app
        .client
        .post(app.url("/topics"))
        .bearer_auth(token)
        .form(&[("title", title), ("description", message)])
        .send()
        .await
        .expect("Failed to create topic");
    assert_eq!(resp.status(), 303);

    location(&resp)
        .rsplit('/')
        .next()
        .and_then(|id| id.parse().ok())
        .expect("topic redirect does not end with an id")
}

pub async fn add_comment(app: &TestApp, token: &str, topic_id: i32, reply: &str) -> Response {
    app.client
        .post(app.url(&format!("/topics/{topic_id}")))
        .bearer_auth(token)
        .form(&[("reply", reply)])
        .send()
        .await
        .expect("Failed to add comment")
}
