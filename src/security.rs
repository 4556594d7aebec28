//! Request hardening: admin authentication, rate limiting, and the
//! security headers applied to every response.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use std::sync::Mutex;
use std::time::Instant;

use crate::AppState;

/// Middleware guarding the admin API.
///
/// The password is accepted in an `X-Admin-Password` header or as a
/// bearer token; anything else is 401.
pub async fn admin_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let headers = request.headers();

    let presented = headers
        .get("x-admin-password")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
        });

    match presented {
        Some(password) if password == state.config.security.admin_password => {
            Ok(next.run(request).await)
        }
        Some(_) => {
            tracing::warn!("Rejected admin request with wrong password");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => Err(StatusCode::UNAUTHORIZED),
    }
}

/// Token-bucket rate limiter shared by all requests.
///
/// A single global bucket: tokens refill continuously at `rate_per_sec`
/// up to `burst_size`, and each request spends one.
#[derive(Debug)]
pub struct RateLimiter {
    /// (last refill instant, tokens remaining)
    state: Mutex<(Instant, f32)>,
    rate_per_sec: f32,
    burst_size: f32,
}

impl RateLimiter {
    #[must_use]
    pub fn new(rate_per_sec: f32, burst_size: f32) -> Self {
        Self {
            state: Mutex::new((Instant::now(), burst_size)),
            rate_per_sec,
            burst_size,
        }
    }

    /// Try to take one token. Returns whether the request may proceed.
    pub fn check(&self) -> bool {
        let mut guard = self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let (last_update, tokens) = *guard;
        let now = Instant::now();
        let elapsed = now.duration_since(last_update).as_secs_f32();

        let refilled = (tokens + elapsed * self.rate_per_sec).min(self.burst_size);
        if refilled >= 1.0 {
            *guard = (now, refilled - 1.0);
            true
        } else {
            // Time passage still counts when a request is denied.
            *guard = (now, refilled);
            false
        }
    }
}

/// Middleware enforcing the global rate limit.
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if state.config.resilience.rate_limit_enabled && !state.rate_limiter.check() {
        return Err(StatusCode::TOO_MANY_REQUESTS);
    }
    Ok(next.run(request).await)
}

/// Middleware applying the deployment's security headers to every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        "permissions-policy",
        HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_rate_limiter_burst_then_refill() {
        let limiter = RateLimiter::new(2.0, 5.0); // 2 req/s, burst of 5

        for _ in 0..5 {
            assert!(limiter.check());
        }
        assert!(!limiter.check());

        // 0.6s refills 1.2 tokens: one request passes, the next fails.
        std::thread::sleep(Duration::from_millis(600));
        assert!(limiter.check());
        assert!(!limiter.check());
    }

    #[test]
    fn test_rate_limiter_caps_at_burst() {
        let limiter = RateLimiter::new(1000.0, 2.0);
        std::thread::sleep(Duration::from_millis(50));
        assert!(limiter.check());
        assert!(limiter.check());
        assert!(!limiter.check());
    }
}
