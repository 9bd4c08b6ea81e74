//! Admin user management routes.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use domain::models::{SetUserRoleRequest, UserResponse, UserRole};
use persistence::repositories::UserRepository;
use tracing::info;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_role_change;

/// Query parameters for the user listing.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl ListUsersQuery {
    fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(50).clamp(1, 100)
    }

    fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }
}

/// Response for the user listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersResponse {
    pub users: Vec<UserResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Response after a role change.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetUserRoleResponse {
    pub user_id: Uuid,
    pub role: UserRole,
    pub sessions_revoked: u64,
}

/// GET /api/v1/admin/users
///
/// List user profiles.
pub async fn list_users(
    State(state): State<AppState>,
    auth: UserAuth,
    Query(query): Query<ListUsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;

    let users = UserRepository::new(state.pool.clone());

    let entities = users.list(query.per_page(), query.offset()).await?;
    let total = users.count().await?;

    let users: Vec<UserResponse> = entities
        .into_iter()
        .map(|entity| UserResponse::from(domain::models::User::from(entity)))
        .collect();

    Ok(Json(ListUsersResponse {
        users,
        total,
        page: query.page(),
        per_page: query.per_page(),
    }))
}

/// PUT /api/v1/admin/users/{id}/role
///
/// Set a user's role. Admin-only; the check runs before any payload
/// validation, so a non-admin caller always gets a permission error. On
/// success the target's sessions are revoked so stale refresh tokens
/// cannot resurrect the old claims.
pub async fn set_user_role(
    State(state): State<AppState>,
    auth: UserAuth,
    Path(user_id): Path<Uuid>,
    Json(request): Json<SetUserRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;
    request.validate()?;

    let role = UserRole::from_str(request.role.trim())
        .map_err(|_| ApiError::InvalidArgument("role is invalid".to_string()))?;

    let users = UserRepository::new(state.pool.clone());

    if !users.set_role(user_id, role).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    let sessions_revoked = state
        .auth
        .revoke_sessions(user_id)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(
        admin_id = %auth.user_id,
        user_id = %user_id,
        role = %role,
        sessions_revoked = sessions_revoked,
        "User role changed"
    );
    record_role_change(role.as_str());

    Ok(Json(SetUserRoleResponse {
        user_id,
        role,
        sessions_revoked,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_users_query_defaults() {
        let query = ListUsersQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 50);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_list_users_query_clamping() {
        let query = ListUsersQuery {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 100);
    }

    #[test]
    fn test_role_parse_rejects_unknown() {
        assert!(UserRole::from_str("owner").is_err());
        assert!(UserRole::from_str("therapist").is_ok());
    }
}
