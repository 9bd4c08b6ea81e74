//! Rate limiting middleware for the invite claim endpoint.
//!
//! Invite codes are short; an authenticated caller must not be able to
//! enumerate them. Claims are limited per user with a sliding window.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovRateLimiter,
};
use serde_json::json;
use std::{
    collections::HashMap,
    num::NonZeroU32,
    sync::{Arc, RwLock},
};
use uuid::Uuid;

use crate::app::AppState;
use crate::extractors::UserAuth;

/// Type alias for the rate limiter used per user.
type UserRateLimiter = GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter state shared across all requests, keyed by user ID.
pub struct RateLimiterState {
    limiters: RwLock<HashMap<Uuid, Arc<UserRateLimiter>>>,
    limit_per_minute: u32,
}

impl RateLimiterState {
    /// Create a new rate limiter state with the specified limit per minute.
    pub fn new(limit_per_minute: u32) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            limit_per_minute,
        }
    }

    /// Get or create a rate limiter for the given user.
    fn get_or_create_limiter(&self, user_id: Uuid) -> Arc<UserRateLimiter> {
        {
            let limiters = self.limiters.read().unwrap();
            if let Some(limiter) = limiters.get(&user_id) {
                return limiter.clone();
            }
        }

        let mut limiters = self.limiters.write().unwrap();

        // Double-check in case another thread created it
        if let Some(limiter) = limiters.get(&user_id) {
            return limiter.clone();
        }

        let quota = Quota::per_minute(
            NonZeroU32::new(self.limit_per_minute).unwrap_or(NonZeroU32::new(10).unwrap()),
        );
        let limiter = Arc::new(GovRateLimiter::direct(quota));
        limiters.insert(user_id, limiter.clone());
        limiter
    }

    /// Check whether a request from the given user should be allowed.
    ///
    /// Returns Ok(()) if allowed, or Err with retry-after seconds.
    pub fn check(&self, user_id: Uuid) -> Result<(), u64> {
        let limiter = self.get_or_create_limiter(user_id);

        match limiter.check() {
            Ok(_) => Ok(()),
            Err(not_until) => {
                let wait_time = not_until.wait_time_from(governor::clock::Clock::now(
                    &governor::clock::DefaultClock::default(),
                ));
                Err(wait_time.as_secs().max(1))
            }
        }
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("limit_per_minute", &self.limit_per_minute)
            .field("active_limiters", &self.limiters.read().unwrap().len())
            .finish()
    }
}

/// Middleware that applies per-user rate limiting to claim attempts.
///
/// Must run AFTER authentication so the user ID is available in request
/// extensions; unauthenticated requests pass through and fail auth instead.
pub async fn claim_rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let auth = match req.extensions().get::<UserAuth>() {
        Some(auth) => auth.clone(),
        None => return next.run(req).await,
    };

    if let Some(ref rate_limiter) = state.claim_rate_limiter {
        if let Err(retry_after) = rate_limiter.check(auth.user_id) {
            return rate_limited_response(retry_after);
        }
    }

    next.run(req).await
}

/// Create a rate limited response with a Retry-After header.
fn rate_limited_response(retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": "Too many claim attempts. Please try again later.",
        "retryAfter": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();

    response.headers_mut().insert(
        header::RETRY_AFTER,
        retry_after.to_string().parse().unwrap(),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_allows_within_limit() {
        let state = RateLimiterState::new(10);
        let user_id = Uuid::new_v4();

        for _ in 0..10 {
            assert!(state.check(user_id).is_ok());
        }
    }

    #[test]
    fn test_rate_limiter_blocks_over_limit() {
        let state = RateLimiterState::new(3);
        let user_id = Uuid::new_v4();

        for _ in 0..3 {
            assert!(state.check(user_id).is_ok());
        }

        let result = state.check(user_id);
        assert!(result.is_err());
        assert!(result.unwrap_err() >= 1);
    }

    #[test]
    fn test_rate_limiter_is_per_user() {
        let state = RateLimiterState::new(1);
        let user_a = Uuid::new_v4();
        let user_b = Uuid::new_v4();

        assert!(state.check(user_a).is_ok());
        assert!(state.check(user_a).is_err());
        // A different user has their own window
        assert!(state.check(user_b).is_ok());
    }

    #[test]
    fn test_rate_limited_response_headers() {
        let response = rate_limited_response(30);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            "30"
        );
    }

    #[test]
    fn test_rate_limiter_debug() {
        let state = RateLimiterState::new(5);
        let debug = format!("{:?}", state);
        assert!(debug.contains("RateLimiterState"));
        assert!(debug.contains("5"));
    }
}
