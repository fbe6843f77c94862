mod support;

use axum::http::{Method, StatusCode};
use domain::UserId;
use serde_json::{json, Value};
use support::TestApp;

async fn create_post(app: &TestApp, token: &str, title: &str, is_public: bool) -> Value {
    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/posts",
            Some(token),
            Some(json!({
                "title": title,
                "contentMd": format!("# {title}\n\nSome words about {title}."),
                "isPublic": is_public,
                "tags": ["rust"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body
}

#[tokio::test]
async fn same_title_gets_a_suffixed_slug() {
    let app = TestApp::new();
    let token = app.token_for(UserId::generate());

    let first = create_post(&app, &token, "Hello, World!", true).await;
    let second = create_post(&app, &token, "Hello, World!", true).await;
    assert_eq!(first["slug"], "hello-world");
    assert_eq!(second["slug"], "hello-world-1");
}

#[tokio::test]
async fn post_is_readable_by_author_and_slug() {
    let app = TestApp::new();
    let author = UserId::generate();
    let token = app.token_for(author);
    let post = create_post(&app, &token, "Async Rust", true).await;

    let uri = format!("/api/v1/users/{author}/posts/async-rust");
    let (status, body) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], post["id"]);
    assert!(body["excerpt"].as_str().unwrap().len() <= 153);
}

#[tokio::test]
async fn drafts_are_hidden_from_everyone_but_the_author() {
    let app = TestApp::new();
    let author = UserId::generate();
    let token = app.token_for(author);
    let reader = app.token_for(UserId::generate());
    create_post(&app, &token, "Work in progress", false).await;

    let uri = format!("/api/v1/users/{author}/posts/work-in-progress");
    let (status, _) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::GET, &uri, Some(&reader), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.send(Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, page) = app.send(Method::GET, "/api/v1/posts", None, None).await;
    assert_eq!(page["totalItems"], 0);
}

#[tokio::test]
async fn public_listing_supports_search() {
    let app = TestApp::new();
    let token = app.token_for(UserId::generate());
    create_post(&app, &token, "Tokio internals", true).await;
    create_post(&app, &token, "Gardening notes", true).await;

    let (status, page) = app
        .send(Method::GET, "/api/v1/posts?search=TOKIO", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalItems"], 1);
    assert_eq!(page["items"][0]["title"], "Tokio internals");
}

#[tokio::test]
async fn comments_come_back_as_a_tree() {
    let app = TestApp::new();
    let token = app.token_for(UserId::generate());
    let post = create_post(&app, &token, "Threaded", true).await;
    let uri = format!("/api/v1/posts/{}/comments", post["id"].as_str().unwrap());

    let (status, root) = app
        .send(Method::POST, &uri, Some(&token), Some(json!({ "content": "first" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(root["depth"], 0);

    let (status, reply) = app
        .send(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "content": "reply", "parentId": root["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["depth"], 1);

    let (status, tree) = app.send(Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let roots = tree.as_array().unwrap();
    assert_eq!(roots.len(), 1);
    assert_eq!(roots[0]["replies"][0]["content"], "reply");
}

#[tokio::test]
async fn replies_stop_at_the_depth_limit() {
    let app = TestApp::new();
    let token = app.token_for(UserId::generate());
    let post = create_post(&app, &token, "Deep thread", true).await;
    let uri = format!("/api/v1/posts/{}/comments", post["id"].as_str().unwrap());

    let (_, mut parent) = app
        .send(Method::POST, &uri, Some(&token), Some(json!({ "content": "d0" })))
        .await;
    for depth in 1..=5 {
        let (status, child) = app
            .send(
                Method::POST,
                &uri,
                Some(&token),
                Some(json!({ "content": format!("d{depth}"), "parentId": parent["id"] })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        parent = child;
    }

    let (status, body) = app
        .send(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "content": "too deep", "parentId": parent["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "COMMENT_DEPTH_EXCEEDED");
}

#[tokio::test]
async fn commenting_requires_a_token() {
    let app = TestApp::new();
    let token = app.token_for(UserId::generate());
    let post = create_post(&app, &token, "Quiet", true).await;
    let uri = format!("/api/v1/posts/{}/comments", post["id"].as_str().unwrap());

    let (status, _) = app
        .send(Method::POST, &uri, None, Some(json!({ "content": "anon" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
