//! Host registry implementation
//!
//! The process-wide map from hostname to its channel. Viewers create
//! channels; inbound requests only look them up, so traffic to hostnames
//! nobody is watching never grows the map.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::channel::HostChannel;
use super::config::RegistryConfig;
use super::host::Hostname;

/// Central registry for all host channels
///
/// Thread-safe via `RwLock`. Lookups from the request path share the read
/// lock; the write lock is only taken to insert a new channel.
pub struct HostRegistry {
    /// Map of hostname to its channel
    hosts: RwLock<HashMap<Hostname, Arc<HostChannel>>>,

    /// Configuration
    config: RegistryConfig,
}

impl HostRegistry {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            hosts: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Get the channel for `hostname`, creating it if this is the first access
    ///
    /// Concurrent first accesses all observe the same channel: the insert
    /// re-checks the map under the write lock.
    pub async fn get_or_create(&self, hostname: &Hostname) -> Arc<HostChannel> {
        if let Some(channel) = self.hosts.read().await.get(hostname) {
            return Arc::clone(channel);
        }

        let mut hosts = self.hosts.write().await;
        let total = hosts.len();
        let channel = hosts.entry(hostname.clone()).or_insert_with(|| {
            tracing::info!(host = %hostname, hosts = total + 1, "Host channel created");
            Arc::new(HostChannel::new(hostname.clone()))
        });

        Arc::clone(channel)
    }

    /// Get the channel for `hostname` without creating one
    pub async fn get(&self, hostname: &Hostname) -> Option<Arc<HostChannel>> {
        self.hosts.read().await.get(hostname).cloned()
    }

    /// Get total number of tracked hosts
    pub async fn host_count(&self) -> usize {
        self.hosts.read().await.len()
    }

    /// Ask every viewer on every host to close
    pub async fn close_all(&self) {
        let channels: Vec<Arc<HostChannel>> = self.hosts.read().await.values().cloned().collect();

        for channel in channels {
            channel.close_all().await;
        }
    }
}

impl Default for HostRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_does_not_create() {
        let registry = HostRegistry::new();
        let host = Hostname::new("scanner.example.com");

        assert!(registry.get(&host).await.is_none());
        assert!(registry.get(&host).await.is_none());
        assert_eq!(registry.host_count().await, 0);
    }

    #[tokio::test]
    async fn test_get_or_create_returns_same_channel() {
        let registry = HostRegistry::new();
        let host = Hostname::new("hooks.example.com");

        let first = registry.get_or_create(&host).await;
        let second = registry.get_or_create(&Hostname::new("HOOKS.example.com:8080")).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.host_count().await, 1);

        let looked_up = registry.get(&host).await.unwrap();
        assert!(Arc::ptr_eq(&first, &looked_up));
    }

    #[tokio::test]
    async fn test_hosts_are_isolated() {
        let registry = HostRegistry::new();

        let a = registry.get_or_create(&Hostname::new("a.example.com")).await;
        let b = registry.get_or_create(&Hostname::new("b.example.com")).await;

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a.hostname().as_str(), "a.example.com");
        assert_eq!(b.hostname().as_str(), "b.example.com");
        assert_eq!(registry.host_count().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_first_access_creates_one_channel() {
        let registry = Arc::new(HostRegistry::new());
        let host = Hostname::new("race.example.com");

        let tasks: Vec<_> = (0..64)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let host = host.clone();
                tokio::spawn(async move { registry.get_or_create(&host).await })
            })
            .collect();

        let mut channels = Vec::new();
        for task in tasks {
            channels.push(task.await.unwrap());
        }

        assert_eq!(registry.host_count().await, 1);
        assert!(channels.iter().all(|c| Arc::ptr_eq(c, &channels[0])));
    }

    #[tokio::test]
    async fn test_custom_config() {
        let config = RegistryConfig::default().viewer_queue_capacity(2);
        let registry = HostRegistry::with_config(config.clone());

        assert_eq!(registry.config(), &config);
    }
}
