/// End-to-end tests through the router
///
/// The first group runs without a database. The rest need `DATABASE_URL`
/// and return early when it is unset.

mod common;

use axum::http::StatusCode;
use common::{get, json_request, lazy_app, raw_request, send, TestContext};
use coursehub_shared::models::{profile::Profile, role::AppRole};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_health_reports_degraded_without_database() {
    let (app, _) = lazy_app();

    let (status, body) = send(app, get("/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "disconnected");
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let (app, _) = lazy_app();
    let (status, _) = send(app, get("/v1/nothing-here", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_anonymous_moderation_request_redirects_home() {
    let (app, _) = lazy_app();

    let (status, body) = send(app, get("/v1/moderation/queue", None)).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "access_denied");
    assert_eq!(body["redirect_to"], "/");
}

#[tokio::test]
async fn test_invalid_token_is_401() {
    let (app, _) = lazy_app();

    let (status, _) = send(app, get("/v1/auth/me", Some("not-a-jwt"))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_route_without_token_is_401() {
    let (app, _) = lazy_app();

    let (status, _) = send(
        app,
        json_request("POST", "/v1/forum/topics", None, json!({"title": "Hello", "body": "World"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_login_and_me() {
    let Some(ctx) = TestContext::new().await else { return };
    let tag = Uuid::new_v4().simple().to_string()[..10].to_string();
    let email = format!("reg-{}@example.test", tag);
    let username = format!("reg_{}", tag);

    let (status, body) = ctx
        .send(json_request(
            "POST",
            "/v1/auth/register",
            None,
            json!({"email": email, "password": "correct horse 42", "username": username}),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["username"], username.as_str());
    assert!(body["access_token"].is_string());

    let (status, _) = ctx
        .send(json_request(
            "POST",
            "/v1/auth/register",
            None,
            json!({"email": email, "password": "correct horse 42", "username": format!("{}x", username)}),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = ctx
        .send(json_request(
            "POST",
            "/v1/auth/login",
            None,
            json!({"email": email, "password": "correct horse 42"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().unwrap().to_string();

    let (status, _) = ctx
        .send(json_request(
            "POST",
            "/v1/auth/login",
            None,
            json!({"email": email, "password": "wrong horse 42"}),
        ))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx.send(get("/v1/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "user");
    assert_eq!(body["roles"], json!(["user"]));
}

#[tokio::test]
async fn test_moderation_guard_by_role() {
    let Some(ctx) = TestContext::new().await else { return };
    let (_, member) = ctx.member(AppRole::User).await;
    let (_, moderator) = ctx.member(AppRole::Moderator).await;

    let (status, body) = ctx.send(get("/v1/moderation/queue", Some(&member))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied");
    assert_eq!(body["redirect_to"], "/");

    let (status, _) = ctx.send(get("/v1/moderation/queue", Some(&moderator))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx.send(get("/v1/admin/stats", Some(&moderator))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_course_hidden_until_approved() {
    let Some(ctx) = TestContext::new().await else { return };
    let (_, author) = ctx.member(AppRole::User).await;
    let (_, moderator) = ctx.member(AppRole::Moderator).await;

    let (status, course) = ctx
        .send(json_request(
            "POST",
            "/v1/courses",
            Some(&author),
            json!({
                "title": "Lifetimes in practice",
                "description": "Borrowing across async boundaries",
                "video": {"source": "link", "url": "https://videos.example.com/watch/lt"}
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", course);
    assert_eq!(course["status"], "pending");
    let uri = format!("/v1/courses/{}", course["id"].as_str().unwrap());

    let (status, _) = ctx.send(get(&uri, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.send(get(&uri, Some(&author))).await;
    assert_eq!(status, StatusCode::OK);

    let approve = format!("/v1/moderation/courses/{}/approve", course["id"].as_str().unwrap());

    let (status, _) = ctx
        .send(raw_request("POST", &approve, Some(&moderator), "{\"reason\": "))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .send(raw_request("POST", &approve, Some(&moderator), ""))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.send(get(&uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");

    let (status, _) = ctx
        .send(json_request("POST", &approve, Some(&moderator), json!({})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_admin_ban_locks_user_out() {
    let Some(ctx) = TestContext::new().await else { return };
    let (admin_id, admin) = ctx.member(AppRole::Admin).await;
    let (target_id, target) = ctx.member(AppRole::User).await;

    let (status, _) = ctx
        .send(json_request(
            "POST",
            &format!("/v1/admin/users/{}/ban", admin_id),
            Some(&admin),
            json!({}),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = ctx
        .send(json_request(
            "POST",
            &format!("/v1/admin/users/{}/ban", target_id),
            Some(&admin),
            json!({"reason": "spam"}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["identity_deleted"], true);

    assert!(Profile::is_banned(&ctx.db, target_id).await.unwrap());

    let (status, _) = ctx.send(get("/v1/auth/me", Some(&target))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
