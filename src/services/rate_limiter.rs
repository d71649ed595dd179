//! Login rate limiter
//!
//! Sliding-window counters kept in memory:
//! - failed logins per identifier (email): 5 per 15 minutes
//! - login requests per client IP: 10 per minute
//!
//! Identifiers are case-insensitive. User and admin logins share one
//! limiter but use distinct identifier prefixes.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::net::IpAddr;
use tokio::sync::RwLock;

pub const MAX_FAILED_ATTEMPTS: usize = 5;
pub const FAILED_ATTEMPT_WINDOW_MINUTES: i64 = 15;
pub const MAX_IP_REQUESTS: usize = 10;
pub const IP_WINDOW_MINUTES: i64 = 1;

type Window<K> = RwLock<HashMap<K, Vec<DateTime<Utc>>>>;

/// Login rate limiter
pub struct LoginRateLimiter {
    failed_attempts: Window<String>,
    ip_requests: Window<IpAddr>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            failed_attempts: RwLock::new(HashMap::new()),
            ip_requests: RwLock::new(HashMap::new()),
        }
    }

    /// True when the identifier has too many recent failures
    pub async fn is_identifier_limited(&self, identifier: &str) -> bool {
        let cutoff = Utc::now() - Duration::minutes(FAILED_ATTEMPT_WINDOW_MINUTES);
        let mut attempts = self.failed_attempts.write().await;
        match attempts.get_mut(&identifier.to_lowercase()) {
            Some(times) => {
                times.retain(|t| *t > cutoff);
                times.len() >= MAX_FAILED_ATTEMPTS
            }
            None => false,
        }
    }

    pub async fn record_failed_attempt(&self, identifier: &str) {
        self.failed_attempts
            .write()
            .await
            .entry(identifier.to_lowercase())
            .or_default()
            .push(Utc::now());
    }

    /// Forget failures after a successful login
    pub async fn clear_identifier(&self, identifier: &str) {
        self.failed_attempts
            .write()
            .await
            .remove(&identifier.to_lowercase());
    }

    /// True when the IP has made too many login requests in the window
    pub async fn is_ip_limited(&self, ip: IpAddr) -> bool {
        let cutoff = Utc::now() - Duration::minutes(IP_WINDOW_MINUTES);
        let mut requests = self.ip_requests.write().await;
        match requests.get_mut(&ip) {
            Some(times) => {
                times.retain(|t| *t > cutoff);
                times.len() >= MAX_IP_REQUESTS
            }
            None => false,
        }
    }

    pub async fn record_ip_request(&self, ip: IpAddr) {
        self.ip_requests
            .write()
            .await
            .entry(ip)
            .or_default()
            .push(Utc::now());
    }

    /// Drop expired entries; run periodically from a background task
    pub async fn cleanup(&self) {
        let now = Utc::now();
        prune(
            &self.failed_attempts,
            now - Duration::minutes(FAILED_ATTEMPT_WINDOW_MINUTES),
        )
        .await;
        prune(&self.ip_requests, now - Duration::minutes(IP_WINDOW_MINUTES)).await;
    }

    /// Number of tracked identifiers and IPs
    pub async fn tracked(&self) -> (usize, usize) {
        (
            self.failed_attempts.read().await.len(),
            self.ip_requests.read().await.len(),
        )
    }
}

async fn prune<K: std::hash::Hash + Eq>(window: &Window<K>, cutoff: DateTime<Utc>) {
    window.write().await.retain(|_, times| {
        times.retain(|t| *t > cutoff);
        !times.is_empty()
    });
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_identifier_limit() {
        let limiter = LoginRateLimiter::new();

        for _ in 0..MAX_FAILED_ATTEMPTS - 1 {
            limiter.record_failed_attempt("user:ada@example.com").await;
        }
        assert!(!limiter.is_identifier_limited("user:ada@example.com").await);

        limiter.record_failed_attempt("user:ADA@example.com").await;
        assert!(limiter.is_identifier_limited("user:ada@example.com").await);

        // Other identifiers are unaffected
        assert!(!limiter.is_identifier_limited("admin:ada@example.com").await);

        limiter.clear_identifier("user:ada@example.com").await;
        assert!(!limiter.is_identifier_limited("user:ada@example.com").await);
    }

    #[tokio::test]
    async fn test_ip_limit() {
        let limiter = LoginRateLimiter::new();
        let ip = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));

        for _ in 0..MAX_IP_REQUESTS {
            assert!(!limiter.is_ip_limited(ip).await);
            limiter.record_ip_request(ip).await;
        }
        assert!(limiter.is_ip_limited(ip).await);
        assert!(!limiter.is_ip_limited(IpAddr::V4(Ipv4Addr::LOCALHOST)).await);
    }

    #[tokio::test]
    async fn test_cleanup_keeps_recent_entries() {
        let limiter = LoginRateLimiter::new();
        limiter.record_failed_attempt("a").await;
        limiter.record_ip_request(IpAddr::V4(Ipv4Addr::LOCALHOST)).await;

        limiter.cleanup().await;
        assert_eq!(limiter.tracked().await, (1, 1));
    }
}
