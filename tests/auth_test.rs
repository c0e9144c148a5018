mod common;

use agora::models::{session, Session, User};
use common::{location, login, register, set_cookie, unique_email, PASSWORD};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::Value;

#[tokio::test]
async fn register_login_and_fetch_profile() {
    let app = common::spawn_app().await;
    let email = unique_email("alice");

    let resp = register(&app, &email, PASSWORD).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/api/v1/auth/login");
    assert!(set_cookie(&resp, "flash").is_some());

    let user = User::find()
        .filter(agora::models::user::Column::Email.eq(email.as_str()))
        .one(&app.db)
        .await
        .unwrap()
        .expect("user row missing");
    assert_eq!(user.level, "newbie");
    assert_eq!(user.first_name, email.split('@').next().unwrap());
    assert_ne!(user.password_hash, PASSWORD);

    let resp = login(&app, &email, PASSWORD).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/api/v1/topics");
    let token = set_cookie(&resp, "session_id").unwrap();
    let flash = set_cookie(&resp, "flash").unwrap();

    // The cookie alone authenticates, and the pending flash is shown once.
    let resp = app
        .client
        .get(app.url("/profile"))
        .header(
            reqwest::header::COOKIE,
            format!("session_id={token}; flash={flash}"),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(set_cookie(&resp, "flash").as_deref(), Some(""));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "Successfully logged in.");
    assert_eq!(body["data"]["email"], email.as_str());
    assert_eq!(body["data"]["level_label"], "Newbie");
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = common::spawn_app().await;
    let email = unique_email("bob");

    assert_eq!(register(&app, &email, PASSWORD).await.status(), 303);

    let resp = register(&app, &email, "another_password").await;
    assert_eq!(resp.status(), 409);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "An account with this email already exists.");
}

#[tokio::test]
async fn password_confirmation_must_match_exactly() {
    let app = common::spawn_app().await;
    let email = unique_email("carol");

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .form(&[
            ("username", email.as_str()),
            ("password", "Secret123"),
            ("confirm_password", "secret123"),
        ])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Password and confirmation don’t match.");

    let count = User::find()
        .filter(agora::models::user::Column::Email.eq(email.as_str()))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn registration_validates_fields_then_email() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .form(&[("username", "dave@test.com"), ("password", PASSWORD)])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Please fill in all the fields.");

    let resp = register(&app, "not-an-email", PASSWORD).await;
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "The entered email is invalid.");
}

#[tokio::test]
async fn wrong_password_and_unknown_user_look_the_same() {
    let app = common::spawn_app().await;
    let email = unique_email("erin");
    register(&app, &email, PASSWORD).await;

    let wrong_password = login(&app, &email, "nope").await;
    assert_eq!(wrong_password.status(), 401);
    let body: Value = wrong_password.json().await.unwrap();
    assert_eq!(body["error"], "Incorrect credentials.");

    let unknown = login(&app, &unique_email("ghost"), PASSWORD).await;
    assert_eq!(unknown.status(), 401);
    let body: Value = unknown.json().await.unwrap();
    assert_eq!(body["error"], "Incorrect credentials.");
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let app = common::spawn_app().await;

    let resp = app.client.get(app.url("/topics")).send().await.unwrap();
    assert_eq!(resp.status(), 401);

    let resp = app
        .client
        .get(app.url("/topics"))
        .bearer_auth("not-a-real-session")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "frank").await;

    let resp = app
        .client
        .post(app.url("/auth/logout"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/api/v1/auth/login");
    assert_eq!(set_cookie(&resp, "session_id").as_deref(), Some(""));

    let remaining = Session::find()
        .filter(session::Column::TokenHash.eq(agora::utils::hash_token(&token)))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(remaining, 0);

    let resp = app
        .client
        .get(app.url("/profile"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn login_page_shows_flash_once() {
    let app = common::spawn_app().await;
    let email = unique_email("gina");

    let resp = register(&app, &email, PASSWORD).await;
    let flash = set_cookie(&resp, "flash").unwrap();

    let resp = app
        .client
        .get(app.url("/auth/login"))
        .header(reqwest::header::COOKIE, format!("flash={flash}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["message"],
        "Account successfully created, please log in."
    );

    let resp = app.client.get(app.url("/auth/login")).send().await.unwrap();
    let body: Value = resp.json().await.unwrap();
    assert!(body["message"].is_null());
}
