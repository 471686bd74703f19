//! Registry configuration

/// Default bound on each viewer's outbound queue
pub const DEFAULT_VIEWER_QUEUE_CAPACITY: usize = 64;

/// Default cap on captured body bytes (1 MiB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Configuration shared by the registry and every channel it creates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Captures a viewer may have queued before further deliveries are dropped
    pub viewer_queue_capacity: usize,

    /// Body bytes kept per capture; anything beyond is truncated
    pub max_body_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            viewer_queue_capacity: DEFAULT_VIEWER_QUEUE_CAPACITY,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl RegistryConfig {
    /// Set the per-viewer queue capacity (at least 1)
    pub fn viewer_queue_capacity(mut self, capacity: usize) -> Self {
        self.viewer_queue_capacity = capacity.max(1);
        self
    }

    /// Set the captured body cap
    pub fn max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.viewer_queue_capacity, DEFAULT_VIEWER_QUEUE_CAPACITY);
        assert_eq!(config.max_body_size, DEFAULT_MAX_BODY_SIZE);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let config = RegistryConfig::default().viewer_queue_capacity(0);
        assert_eq!(config.viewer_queue_capacity, 1);
    }

    #[test]
    fn test_builder_chaining() {
        let config = RegistryConfig::default()
            .viewer_queue_capacity(8)
            .max_body_size(16);

        assert_eq!(config.viewer_queue_capacity, 8);
        assert_eq!(config.max_body_size, 16);
    }
}
