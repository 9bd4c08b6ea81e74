//! Integration tests for role administration and the default-role grant.
//!
//! These tests require a running PostgreSQL instance.

mod common;

use axum::http::{Method, StatusCode};
use common::{
    cleanup_all_test_data, create_authenticated_user, create_test_app, create_test_pool,
    create_user_with_role, json_request_with_jwt, parse_response_body, request_with_jwt,
    run_migrations,
};
use sqlx::PgPool;
use tower::ServiceExt;
use uuid::Uuid;

async fn setup() -> (axum::Router, PgPool) {
    let pool = create_test_pool().await;
    run_migrations(&pool).await;
    cleanup_all_test_data(&pool).await;
    let app = create_test_app(pool.clone());
    (app, pool)
}

#[tokio::test]
async fn set_user_role_requires_admin_regardless_of_payload() {
    let (app, pool) = setup().await;
    let caller = create_authenticated_user(&app).await;
    let target = create_authenticated_user(&app).await;

    // Even a nonsense role and uid must yield permission denied for
    // non-admin callers.
    for (uid, role) in [
        (target.user_id.to_string(), "therapist"),
        (Uuid::new_v4().to_string(), "not-a-role"),
    ] {
        let request = json_request_with_jwt(
            Method::PUT,
            &format!("/api/v1/admin/users/{}/role", uid),
            serde_json::json!({ "role": role }),
            &caller.token,
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    // Target unchanged.
    let (role,): (Option<String>,) =
        sqlx::query_as("SELECT role::text FROM users WHERE id = $1")
            .bind(target.user_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(role.as_deref(), Some("patient"));
}

#[tokio::test]
async fn admin_can_change_role_and_sessions_are_revoked() {
    let (app, pool) = setup().await;
    let admin = create_user_with_role(&app, &pool, "admin").await;
    let target = create_authenticated_user(&app).await;

    let request = json_request_with_jwt(
        Method::PUT,
        &format!("/api/v1/admin/users/{}/role", target.user_id),
        serde_json::json!({ "role": "therapist" }),
        &admin.token,
    );
    let response = app.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["role"], "therapist");
    assert!(body["sessionsRevoked"].as_u64().unwrap() >= 1);

    // The target's old refresh token is dead.
    let refresh = app
        .oneshot(common::json_request(
            Method::POST,
            "/api/v1/auth/refresh",
            serde_json::json!({ "refreshToken": target.refresh_token }),
        ))
        .await
        .unwrap();
    assert_eq!(refresh.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn set_user_role_validates_role_value() {
    let (app, pool) = setup().await;
    let admin = create_user_with_role(&app, &pool, "admin").await;
    let target = create_authenticated_user(&app).await;

    let request = json_request_with_jwt(
        Method::PUT,
        &format!("/api/v1/admin/users/{}/role", target.user_id),
        serde_json::json!({ "role": "superuser" }),
        &admin.token,
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "invalid_argument");
}

#[tokio::test]
async fn set_user_role_unknown_target_is_not_found() {
    let (app, pool) = setup().await;
    let admin = create_user_with_role(&app, &pool, "admin").await;

    let request = json_request_with_jwt(
        Method::PUT,
        &format!("/api/v1/admin/users/{}/role", Uuid::new_v4()),
        serde_json::json!({ "role": "therapist" }),
        &admin.token,
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_users_is_admin_only() {
    let (app, pool) = setup().await;
    let patient = create_authenticated_user(&app).await;
    let admin = create_user_with_role(&app, &pool, "admin").await;

    let forbidden = app
        .clone()
        .oneshot(request_with_jwt(
            Method::GET,
            "/api/v1/admin/users",
            &patient.token,
        ))
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let allowed = app
        .oneshot(request_with_jwt(
            Method::GET,
            "/api/v1/admin/users",
            &admin.token,
        ))
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
    let body = parse_response_body(allowed).await;
    assert!(body["total"].as_i64().unwrap() >= 2);
}

#[tokio::test]
async fn ensure_role_returns_existing_role_without_downgrade() {
    let (app, pool) = setup().await;
    let therapist = create_user_with_role(&app, &pool, "therapist").await;

    let response = app
        .oneshot(request_with_jwt(
            Method::POST,
            "/api/v1/auth/ensure-role",
            &therapist.token,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["role"], "therapist");
    assert_eq!(body["granted"], false);
}

#[tokio::test]
async fn ensure_role_grants_patient_to_roleless_profile() {
    let (app, pool) = setup().await;
    let user = create_authenticated_user(&app).await;

    // Simulate an identity imported without a role claim.
    sqlx::query("UPDATE users SET role = NULL WHERE id = $1")
        .bind(user.user_id)
        .execute(&pool)
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request_with_jwt(
            Method::POST,
            "/api/v1/auth/ensure-role",
            &user.token,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["role"], "patient");
    assert_eq!(body["granted"], true);

    // Idempotent: the second call grants nothing.
    let again = app
        .oneshot(request_with_jwt(
            Method::POST,
            "/api/v1/auth/ensure-role",
            &user.token,
        ))
        .await
        .unwrap();
    let again_body = parse_response_body(again).await;
    assert_eq!(again_body["role"], "patient");
    assert_eq!(again_body["granted"], false);
}
