use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::AppState;

/// Attempts allowed per key inside one window.
const MAX_ATTEMPTS: u32 = 5;
const WINDOW: Duration = Duration::from_secs(60);
/// Idle keys older than this are dropped by [`RateLimitState::cleanup`].
const RETENTION: Duration = Duration::from_secs(120);

/// Fixed-window counters for login and register attempts, keyed by `ip:path`.
/// Counters live in process memory, so every replica limits on its own.
#[derive(Clone, Default)]
pub struct RateLimitState {
    windows: Arc<Mutex<HashMap<String, AttemptWindow>>>,
}

struct AttemptWindow {
    attempts: u32,
    opened_at: Instant,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one attempt for `key`. Returns the attempts left in the current
    /// window, or how long the caller has to wait once the window is used up.
    pub async fn check(&self, key: &str) -> Result<u32, Duration> {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();

        let window = windows.entry(key.to_string()).or_insert(AttemptWindow {
            attempts: 0,
            opened_at: now,
        });

        if now.duration_since(window.opened_at) > WINDOW {
            window.attempts = 0;
            window.opened_at = now;
        }

        if window.attempts >= MAX_ATTEMPTS {
            return Err(WINDOW.saturating_sub(now.duration_since(window.opened_at)));
        }

        window.attempts += 1;
        Ok(MAX_ATTEMPTS - window.attempts)
    }

    pub async fn cleanup(&self) {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        windows.retain(|_, window| now.duration_since(window.opened_at) < RETENTION);
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.windows.lock().await.len()
    }
}

/// Background task that prunes the limiter every five minutes.
pub fn spawn_cleanup_worker(limiter: RateLimitState) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.cleanup().await;
            tracing::debug!("Rate limiter cleanup complete");
        }
    });
}

/// Rate limiting middleware for login and register.
pub async fn rate_limit_auth(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let path = req.uri().path().to_string();

    // Login and register are counted separately
    let key = format!("{}:{}", ip, path);

    match state.rate_limiter.check(&key).await {
        Ok(remaining) => {
            tracing::debug!(ip = %ip, path = %path, remaining, "Auth attempt allowed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(
                ip = %ip,
                path = %path,
                retry_after_secs = retry_after.as_secs(),
                "Too many auth attempts"
            );
            Err(AppError::RateLimited)
        }
    }
}
