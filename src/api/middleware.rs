//! API key authentication and rate limiting for remote deployments.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr},
    sync::{Arc, Mutex, MutexGuard},
    time::{Duration, Instant},
};

/// Security settings, normally loaded from the environment.
#[derive(Clone, Debug, Default)]
pub struct SecurityConfig {
    /// Shared API key (from PLANBOARD_API_KEY). `None` disables the check.
    pub api_key: Option<String>,
    /// Allowed CORS origins (from PLANBOARD_CORS_ORIGINS, comma-separated).
    /// `None` means permissive CORS.
    pub cors_origins: Option<Vec<String>>,
    pub rate_limiter: Option<RateLimiter>,
}

impl SecurityConfig {
    /// Load security settings from environment variables.
    ///
    /// The rate limiter (PLANBOARD_RATE_LIMIT requests per minute, default
    /// 100) is only enabled together with an API key.
    pub fn from_env() -> Self {
        let api_key = std::env::var("PLANBOARD_API_KEY")
            .ok()
            .filter(|k| !k.is_empty());

        let cors_origins = std::env::var("PLANBOARD_CORS_ORIGINS")
            .ok()
            .map(|s| parse_origins(&s))
            .filter(|origins| !origins.is_empty());

        let rate_limit = std::env::var("PLANBOARD_RATE_LIMIT")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(100);

        let rate_limiter = api_key
            .as_ref()
            .map(|_| RateLimiter::new(rate_limit, Duration::from_secs(60)));

        Self {
            api_key,
            cors_origins,
            rate_limiter,
        }
    }

    /// No authentication, permissive CORS, no rate limit.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn with_rate_limit(max_requests: u32) -> Self {
        Self {
            rate_limiter: Some(RateLimiter::new(max_requests, Duration::from_secs(60))),
            ..Self::default()
        }
    }
}

fn parse_origins(s: &str) -> Vec<String> {
    s.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// In-memory sliding-window rate limiter keyed by client IP.
///
/// Clients with no request inside the window are dropped at most one window
/// after their last request, so the map only holds recently active IPs.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    state: Arc<Mutex<LimiterState>>,
}

#[derive(Debug)]
struct LimiterState {
    requests: HashMap<IpAddr, Vec<Instant>>,
    last_sweep: Instant,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Arc::new(Mutex::new(LimiterState {
                requests: HashMap::new(),
                last_sweep: Instant::now(),
            })),
        }
    }

    /// Record a request from `ip`. Returns false if it exceeds the limit.
    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        let mut state = self.lock();

        if now.duration_since(state.last_sweep) >= self.window {
            self.sweep(&mut state.requests, now);
            state.last_sweep = now;
        }

        let entry = state.requests.entry(ip).or_default();
        entry.retain(|&t| now.duration_since(t) < self.window);

        if entry.len() < self.max_requests as usize {
            entry.push(now);
            true
        } else {
            false
        }
    }

    /// Drop every client with no request inside the window.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let mut state = self.lock();
        self.sweep(&mut state.requests, now);
        state.last_sweep = now;
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.lock().requests.len()
    }

    fn sweep(&self, requests: &mut HashMap<IpAddr, Vec<Instant>>, now: Instant) {
        let before = requests.len();
        requests.retain(|_, hits| {
            hits.retain(|&t| now.duration_since(t) < self.window);
            !hits.is_empty()
        });
        let dropped = before - requests.len();
        if dropped > 0 {
            tracing::debug!("Rate limiter dropped {} idle clients", dropped);
        }
    }

    fn lock(&self) -> MutexGuard<'_, LimiterState> {
        self.state.lock().expect("rate limiter lock poisoned")
    }
}

/// Reject requests without `Authorization: Bearer <api key>` when a key is configured.
pub async fn auth_middleware(
    State(config): State<SecurityConfig>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected_key) = &config.api_key else {
        return Ok(next.run(request).await);
    };

    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    match auth_header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(token) if token == expected_key => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("Invalid API key provided");
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("Missing or malformed Authorization header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

pub async fn rate_limit_middleware(
    State(rate_limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let ip = extract_client_ip(&request);

    if rate_limiter.check(ip) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!("Rate limit exceeded for IP: {}", ip);
        Err(StatusCode::TOO_MANY_REQUESTS)
    }
}

/// Client IP from proxy headers, falling back to localhost.
fn extract_client_ip(request: &Request<Body>) -> IpAddr {
    let forwarded = request
        .headers()
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|ip| ip.trim().parse().ok());

    let real_ip = || {
        request
            .headers()
            .get("X-Real-IP")
            .and_then(|v| v.to_str().ok())
            .and_then(|ip| ip.trim().parse().ok())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
