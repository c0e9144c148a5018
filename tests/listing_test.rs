mod common;

use common::{add_comment, create_topic, location, TestApp};
use serde_json::Value;

async fn list(app: &TestApp, token: &str, query: &[(&str, &str)]) -> reqwest::Response {
    app.client
        .get(app.url("/topics"))
        .bearer_auth(token)
        .query(query)
        .send()
        .await
        .unwrap()
}

async fn list_page(app: &TestApp, token: &str, query: &[(&str, &str)]) -> Value {
    let resp = list(app, token, query).await;
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    body["data"].clone()
}

fn titles(page: &Value) -> Vec<String> {
    page["topics"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn empty_forum_serves_a_single_empty_page() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "reader").await;

    let page = list_page(&app, &token, &[]).await;
    assert_eq!(page["total"], 0);
    assert_eq!(page["nb_pages"], 1);
    assert_eq!(page["current_page"], 1);
    assert!(page["topics"].as_array().unwrap().is_empty());

    // Any page beyond it lands back on page 1, not in a redirect loop.
    let resp = list(&app, &token, &[("page", "2")]).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/api/v1/topics?filter=all&page=1");
}

#[tokio::test]
async fn twelve_topics_make_three_pages() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "author").await;
    for i in 1..=12 {
        create_topic(&app, &token, &format!("Topic {i}"), "body").await;
    }

    let first = list_page(&app, &token, &[]).await;
    assert_eq!(first["nb_pages"], 3);
    assert_eq!(first["total"], 12);
    assert_eq!(
        titles(&first),
        vec!["Topic 12", "Topic 11", "Topic 10", "Topic 9", "Topic 8"]
    );

    let last = list_page(&app, &token, &[("page", "3")]).await;
    assert_eq!(titles(&last), vec!["Topic 2", "Topic 1"]);

    let resp = list(&app, &token, &[("page", "5")]).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/api/v1/topics?filter=all&page=3");

    let resp = list(&app, &token, &[("page", "0")]).await;
    assert_eq!(resp.status(), 303);
    assert_eq!(location(&resp), "/api/v1/topics?filter=all&page=1");
}

#[tokio::test]
async fn out_of_range_redirect_keeps_filter_and_search() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "author").await;
    create_topic(&app, &token, "Lonely", "nobody answers").await;

    let resp = list(
        &app,
        &token,
        &[("filter", "no_replies"), ("search", "lonely"), ("page", "4")],
    )
    .await;
    assert_eq!(resp.status(), 303);
    assert_eq!(
        location(&resp),
        "/api/v1/topics?filter=no_replies&page=1&search=lonely"
    );
}

#[tokio::test]
async fn no_replies_filter_follows_comments() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "author").await;
    let quiet = create_topic(&app, &token, "Quiet", "body").await;
    create_topic(&app, &token, "Also quiet", "body").await;

    let page = list_page(&app, &token, &[("filter", "no_replies")]).await;
    assert_eq!(titles(&page), vec!["Also quiet", "Quiet"]);
    assert_eq!(page["filter"], "no_replies");

    add_comment(&app, &token, quiet, "now it has one").await;

    let page = list_page(&app, &token, &[("filter", "no_replies")]).await;
    assert_eq!(titles(&page), vec!["Also quiet"]);
    assert_eq!(page["total"], 1);

    let all = list_page(&app, &token, &[]).await;
    let quiet_row = all["topics"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["id"] == quiet)
        .unwrap()
        .clone();
    assert_eq!(quiet_row["comment_count"], 1);
}

#[tokio::test]
async fn solved_and_unsolved_filters() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "author").await;
    let done = create_topic(&app, &token, "Done", "body").await;
    create_topic(&app, &token, "Open", "body").await;

    app.client
        .post(app.url(&format!("/topics/{done}/solved")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    let solved = list_page(&app, &token, &[("filter", "solved")]).await;
    assert_eq!(titles(&solved), vec!["Done"]);

    let unsolved = list_page(&app, &token, &[("filter", "unsolved")]).await;
    assert_eq!(titles(&unsolved), vec!["Open"]);

    let unknown = list_page(&app, &token, &[("filter", "bogus")]).await;
    assert_eq!(unknown["filter"], "all");
    assert_eq!(unknown["total"], 2);
}

#[tokio::test]
async fn search_matches_title_or_message_ignoring_case() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "author").await;
    create_topic(&app, &token, "Lifetimes explained", "a long read").await;
    create_topic(&app, &token, "Unrelated title", "mentions LIFETIMES in the body").await;
    create_topic(&app, &token, "Something else", "nothing to see").await;

    let page = list_page(&app, &token, &[("search", "lifetimes")]).await;
    assert_eq!(
        titles(&page),
        vec!["Unrelated title", "Lifetimes explained"]
    );
    assert_eq!(page["search"], "lifetimes");

    let page = list_page(&app, &token, &[("search", "zzz-no-match")]).await;
    assert_eq!(page["total"], 0);
    assert_eq!(page["nb_pages"], 1);
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "author").await;
    create_topic(&app, &token, "100% safe", "body").await;
    create_topic(&app, &token, "100 safe", "body").await;

    let page = list_page(&app, &token, &[("search", "100%")]).await;
    assert_eq!(titles(&page), vec!["100% safe"]);
}

#[tokio::test]
async fn search_combines_with_filter() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "author").await;
    let answered = create_topic(&app, &token, "Async traits", "body").await;
    create_topic(&app, &token, "Async closures", "body").await;
    add_comment(&app, &token, answered, "use the crate").await;

    let page = list_page(
        &app,
        &token,
        &[("filter", "no_replies"), ("search", "async")],
    )
    .await;
    assert_eq!(titles(&page), vec!["Async closures"]);
}
