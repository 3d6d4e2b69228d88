use reqwest::{Client, RequestBuilder, Response};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};

/// Counters describing outbound provider traffic
#[derive(Debug, Default)]
pub struct RequestMetrics {
    pub total_requests: AtomicU64,
    pub successful_requests: AtomicU64,
    pub failed_requests: AtomicU64,
    pub active_requests: AtomicUsize,
    pub peak_concurrent: AtomicUsize,
}

impl RequestMetrics {
    /// Get a formatted summary of metrics
    pub fn summary(&self) -> String {
        format!(
            "Requests - Total: {}, Success: {}, Failed: {}, Active: {}, Peak: {}",
            self.total_requests.load(Ordering::Relaxed),
            self.successful_requests.load(Ordering::Relaxed),
            self.failed_requests.load(Ordering::Relaxed),
            self.active_requests.load(Ordering::Relaxed),
            self.peak_concurrent.load(Ordering::Relaxed),
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReqManagerError {
    #[error("Invalid request manager configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(#[from] reqwest::Error),
    #[error("Request manager closed")]
    Closed,
}

/// Connection settings for provider traffic.
///
/// Every provider call sits on the caller's turn latency, so connects fail
/// fast and idle connections are kept warm.
#[derive(Debug, Clone)]
pub struct ReqManagerConfig {
    pub max_concurrent_requests: usize,
    pub pool_max_idle_per_host: usize,
    pub tcp_keepalive: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ReqManagerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 32,
            pool_max_idle_per_host: 64,
            tcp_keepalive: Duration::from_secs(5),
            connect_timeout: Duration::from_millis(500),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl ReqManagerConfig {
    pub fn with_request_timeout(timeout: Duration) -> Self {
        Self {
            request_timeout: timeout,
            ..Default::default()
        }
    }
}

/// Shared HTTP client with a concurrency cap and traffic metrics.
///
/// One instance is shared by all provider clients; the underlying
/// `reqwest::Client` already pools connections per host.
pub struct ReqManager {
    max_concurrent_requests: usize,
    client: Client,
    semaphore: Semaphore,
    metrics: RequestMetrics,
}

/// A permit to issue one request. Releases its slot when dropped.
pub struct ClientGuard<'a> {
    manager: &'a ReqManager,
    _permit: SemaphorePermit<'a>,
}

impl ClientGuard<'_> {
    pub fn client(&self) -> &Client {
        &self.manager.client
    }

    /// Send a prepared request, tracking the outcome
    pub async fn send(&self, request: RequestBuilder) -> Result<Response, reqwest::Error> {
        let metrics = &self.manager.metrics;
        metrics.total_requests.fetch_add(1, Ordering::Relaxed);

        let result = request.send().await;
        match &result {
            Ok(response) if response.status().is_success() => {
                metrics.successful_requests.fetch_add(1, Ordering::Relaxed);
            }
            _ => {
                metrics.failed_requests.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }
}

impl Drop for ClientGuard<'_> {
    fn drop(&mut self) {
        self.manager
            .metrics
            .active_requests
            .fetch_sub(1, Ordering::Relaxed);
    }
}

impl ReqManager {
    pub fn new(config: ReqManagerConfig) -> Result<Self, ReqManagerError> {
        if config.max_concurrent_requests == 0 {
            return Err(ReqManagerError::InvalidConfiguration(
                "max_concurrent_requests must be greater than 0".to_string(),
            ));
        }
        if config.max_concurrent_requests > 1000 {
            return Err(ReqManagerError::InvalidConfiguration(
                "max_concurrent_requests must not exceed 1000".to_string(),
            ));
        }

        let client = Client::builder()
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .tcp_keepalive(config.tcp_keepalive)
            .tcp_nodelay(true)
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(concat!("voxcall/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            max_concurrent_requests: config.max_concurrent_requests,
            client,
            semaphore: Semaphore::new(config.max_concurrent_requests),
            metrics: RequestMetrics::default(),
        })
    }

    /// Wait for a free request slot.
    pub async fn acquire(&self) -> Result<ClientGuard<'_>, ReqManagerError> {
        let permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ReqManagerError::Closed)?;

        let active = self.metrics.active_requests.fetch_add(1, Ordering::Relaxed) + 1;
        self.metrics
            .peak_concurrent
            .fetch_max(active, Ordering::Relaxed);

        Ok(ClientGuard {
            manager: self,
            _permit: permit,
        })
    }

    pub fn metrics(&self) -> &RequestMetrics {
        &self.metrics
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent_requests
    }

    pub fn active_requests(&self) -> usize {
        self.metrics.active_requests.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn manager(max: usize) -> ReqManager {
        ReqManager::new(ReqManagerConfig {
            max_concurrent_requests: max,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_req_manager_rejects_invalid_limits() {
        for max in [0, 1001] {
            let result = ReqManager::new(ReqManagerConfig {
                max_concurrent_requests: max,
                ..Default::default()
            });
            assert!(matches!(result, Err(ReqManagerError::InvalidConfiguration(_))));
        }
    }

    #[test]
    fn test_with_request_timeout() {
        let config = ReqManagerConfig::with_request_timeout(Duration::from_secs(3));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.max_concurrent_requests, 32);
    }

    #[tokio::test]
    async fn test_acquire_and_release() {
        let manager = manager(2);

        let guard1 = manager.acquire().await.unwrap();
        let guard2 = manager.acquire().await.unwrap();
        assert_eq!(manager.active_requests(), 2);

        drop(guard1);
        assert_eq!(manager.active_requests(), 1);
        drop(guard2);
        assert_eq!(manager.active_requests(), 0);
        assert_eq!(manager.metrics().peak_concurrent.load(Ordering::Relaxed), 2);
    }

    #[tokio::test]
    async fn test_concurrent_requests_limited() {
        let manager = Arc::new(manager(3));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move {
                    let _guard = manager.acquire().await.unwrap();
                    tokio::time::sleep(Duration::from_millis(10)).await;
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(manager.metrics().peak_concurrent.load(Ordering::Relaxed) <= 3);
        assert_eq!(manager.active_requests(), 0);
    }

    #[test]
    fn test_metrics_summary_format() {
        let metrics = RequestMetrics::default();
        metrics.total_requests.fetch_add(2, Ordering::Relaxed);
        assert_eq!(
            metrics.summary(),
            "Requests - Total: 2, Success: 0, Failed: 0, Active: 0, Peak: 0"
        );
    }
}
